use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub app: AppConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub calibration: CalibrationConfig,
    #[serde(default)]
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub scene: SceneConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// 起動プロンプト後、キャリブレーション開始までの待ち時間（秒）
    #[serde(default = "default_startup_delay_secs")]
    pub startup_delay_secs: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CameraConfig {
    #[serde(default = "default_camera_index")]
    pub index: i32,
    #[serde(default = "default_camera_width")]
    pub width: u32,
    #[serde(default = "default_camera_height")]
    pub height: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// ポーズランドマークモデル (ONNX)
    #[serde(default = "default_model_path")]
    pub path: String,
    /// 人物存在確率（シグモイド後）の閾値。下回ったフレームはランドマーク0個として扱う
    #[serde(default = "default_presence_threshold")]
    pub presence_threshold: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CalibrationConfig {
    /// カウントダウンの秒数（1秒刻みで表示）
    #[serde(default = "default_countdown_secs")]
    pub countdown_secs: u32,
    /// 背景クロップの左端オフセット（ピクセル）。x座標の補正量にも使う
    #[serde(default = "default_crop_offset")]
    pub crop_offset: u32,
    /// 背景プレートの保存先
    #[serde(default = "default_background_path")]
    pub background_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackerConfig {
    /// フレーム間の大きさ変化がこれを超えたときだけ方向判定する
    #[serde(default = "default_magnitude_threshold")]
    pub magnitude_threshold: f32,
    /// 頭の向き判定に使うマージン（ピクセル）
    #[serde(default = "default_head_direction_margin")]
    pub head_direction_margin: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SceneConfig {
    #[serde(default = "default_scene_width")]
    pub width: u32,
    #[serde(default = "default_scene_height")]
    pub height: u32,
    #[serde(default = "default_camera_fov_deg")]
    pub camera_fov_deg: f32,
    #[serde(default = "default_skybox_fov_deg")]
    pub skybox_fov_deg: f32,
    #[serde(default = "default_point_radius")]
    pub point_radius: i32,
}

fn default_startup_delay_secs() -> f32 { 2.0 }
fn default_camera_index() -> i32 { 0 }
fn default_camera_width() -> u32 { 640 }
fn default_camera_height() -> u32 { 480 }
fn default_model_path() -> String { "models/pose_landmark_full.onnx".to_string() }
fn default_presence_threshold() -> f32 { 0.5 }
fn default_countdown_secs() -> u32 { 5 }
fn default_crop_offset() -> u32 { 80 }
fn default_background_path() -> String { "skybox/left.png".to_string() }
fn default_magnitude_threshold() -> f32 { 1.5 }
fn default_head_direction_margin() -> f32 { 3.0 }
fn default_scene_width() -> u32 { 480 }
fn default_scene_height() -> u32 { 480 }
fn default_camera_fov_deg() -> f32 { 130.0 }
fn default_skybox_fov_deg() -> f32 { 90.0 }
fn default_point_radius() -> i32 { 3 }

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            startup_delay_secs: default_startup_delay_secs(),
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            index: default_camera_index(),
            width: default_camera_width(),
            height: default_camera_height(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: default_model_path(),
            presence_threshold: default_presence_threshold(),
        }
    }
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            countdown_secs: default_countdown_secs(),
            crop_offset: default_crop_offset(),
            background_path: default_background_path(),
        }
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            magnitude_threshold: default_magnitude_threshold(),
            head_direction_margin: default_head_direction_margin(),
        }
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            width: default_scene_width(),
            height: default_scene_height(),
            camera_fov_deg: default_camera_fov_deg(),
            skybox_fov_deg: default_skybox_fov_deg(),
            point_radius: default_point_radius(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Invalid config")?;
        Ok(config)
    }

    /// 読めなければ警告を出してデフォルト値で続行
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(&path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("{:#}; using defaults", e);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.calibration.countdown_secs, 5);
        assert_eq!(config.calibration.crop_offset, 80);
        assert_eq!(config.calibration.background_path, "skybox/left.png");
        assert_eq!(config.tracker.magnitude_threshold, 1.5);
        assert_eq!(config.tracker.head_direction_margin, 3.0);
        assert_eq!((config.scene.width, config.scene.height), (480, 480));
        assert_eq!((config.camera.width, config.camera.height), (640, 480));
    }

    #[test]
    fn test_partial_toml() {
        let config = Config::parse(
            r#"
            [calibration]
            countdown_secs = 3

            [scene]
            camera_fov_deg = 100.0
            "#,
        )
        .unwrap();
        assert_eq!(config.calibration.countdown_secs, 3);
        assert_eq!(config.calibration.crop_offset, 80);
        assert_eq!(config.scene.camera_fov_deg, 100.0);
        assert_eq!(config.scene.width, 480);
        assert_eq!(config.camera.index, 0);
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.model.presence_threshold, 0.5);
        assert_eq!(config.app.startup_delay_secs, 2.0);
    }

    #[test]
    fn test_invalid_toml() {
        assert!(Config::parse("[calibration]\ncountdown_secs = \"five\"").is_err());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = Config::load_or_default("does/not/exist.toml");
        assert_eq!(config.calibration.countdown_secs, 5);
    }
}
