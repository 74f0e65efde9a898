use anyhow::Result;
use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;

use rig_tracker::backdrop::{environment_faces, PngBackdropStore};
use rig_tracker::camera::OpenCvCamera;
use rig_tracker::config::Config;
use rig_tracker::pipeline::{self, Pipeline};
use rig_tracker::pose::OnnxPoseDetector;
use rig_tracker::render::{MinifbRenderer, Renderer, SceneCamera};

const CONFIG_PATH: &str = "config.toml";

/// 背景を描くかどうかを尋ねる。"Yes" のときだけ true
fn ask_draw_backdrop() -> Result<bool> {
    println!("Do you want to capture the environment? Yes or No?");
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim() == "Yes")
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::load_or_default(CONFIG_PATH);
    log::info!("rig_tracker {}", env!("RIG_TRACKER_VERSION"));

    let draw_backdrop = ask_draw_backdrop()?;
    println!("Capturing images shortly...");
    std::thread::sleep(Duration::from_secs_f32(config.app.startup_delay_secs.max(0.0)));

    let mut renderer = MinifbRenderer::new(
        "Tracking",
        SceneCamera::from_config(&config.scene),
        config.scene.width as usize,
        config.scene.height as usize,
        config.scene.point_radius,
    )?;
    // 前回の背景が残っていれば撮り直すまで使う
    let background_path = Path::new(&config.calibration.background_path);
    renderer.rebuild_environment(&environment_faces(background_path))?;

    let mut camera = match OpenCvCamera::open(config.camera.index, config.camera.width, config.camera.height) {
        Ok(camera) => camera,
        Err(e) => {
            log::error!("{:#}", e);
            println!("Cannot open camera");
            std::process::exit(1);
        }
    };

    let mut detector = OnnxPoseDetector::new(&config.model.path, config.model.presence_threshold)?;
    log::info!("model loaded from {}", config.model.path);

    let mut backdrop = PngBackdropStore::new(background_path);
    let mut pipeline = Pipeline::new(&config, draw_backdrop);

    pipeline::run(&mut pipeline, &mut camera, &mut detector, &mut renderer, &mut backdrop)?;

    println!("Shutting down...");
    Ok(())
}
