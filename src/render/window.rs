use anyhow::{Context, Result};
use image::RgbImage;
use minifb::{Key, Window, WindowOptions};
use std::path::PathBuf;

use crate::backdrop::CUBE_FACES;
use crate::render::scene::cube_face_uv;
use crate::render::{Renderer, SceneCamera};
use crate::tracker::TurnEvent;

/// 背景なしのときの塗りつぶし色（グリーンバック）
const CLEAR_COLOR: u32 = 0x18BF06;
/// ランドマーク点の色
const POINT_COLOR: u32 = 0xFFFFFF;

/// minifbを使用したレンダラー
pub struct MinifbRenderer {
    window: Window,
    buffer: Vec<u32>,
    width: usize,
    height: usize,
    camera: SceneCamera,
    point_radius: i32,
    /// 環境マップを視線ごとにサンプルした背景。カメラは固定なので作り直すまで使い回す
    backdrop: Option<Vec<u32>>,
    pending_points: Vec<f32>,
    pending_backdrop: bool,
}

impl MinifbRenderer {
    /// ウィンドウを作成
    pub fn new(title: &str, camera: SceneCamera, width: usize, height: usize, point_radius: i32) -> Result<Self> {
        let window = Window::new(
            title,
            width,
            height,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        )?;

        Ok(Self {
            window,
            buffer: vec![CLEAR_COLOR; width * height],
            width,
            height,
            camera,
            point_radius,
            backdrop: None,
            pending_points: Vec::new(),
            pending_backdrop: false,
        })
    }

    fn blit_backdrop(&mut self) {
        if let Some(ref backdrop) = self.backdrop {
            self.buffer.copy_from_slice(backdrop);
        }
    }

    fn draw_pending_points(&mut self) {
        let points = std::mem::take(&mut self.pending_points);
        for xy in points.chunks_exact(2) {
            if let Some((px, py)) = self.camera.project_to_pixel(xy[0], xy[1]) {
                self.draw_circle(px, py, self.point_radius, POINT_COLOR);
            }
        }
    }

    /// 円を描画（塗りつぶし）
    fn draw_circle(&mut self, cx: i32, cy: i32, radius: i32, color: u32) {
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx * dx + dy * dy <= radius * radius {
                    self.set_pixel(cx + dx, cy + dy, color);
                }
            }
        }
    }

    /// ピクセルをセット（境界チェック付き）
    fn set_pixel(&mut self, x: i32, y: i32, color: u32) {
        if x >= 0 && x < self.width as i32 && y >= 0 && y < self.height as i32 {
            self.buffer[y as usize * self.width + x as usize] = color;
        }
    }
}

/// 面内座標 (u, v) の最近傍画素を 0RGB で返す
fn sample_nearest(image: &RgbImage, u: f32, v: f32) -> u32 {
    let x = ((u * image.width() as f32) as u32).min(image.width().saturating_sub(1));
    let y = ((v * image.height() as f32) as u32).min(image.height().saturating_sub(1));
    let p = image.get_pixel(x, y);
    ((p[0] as u32) << 16) | ((p[1] as u32) << 8) | p[2] as u32
}

impl Renderer for MinifbRenderer {
    fn is_open(&self) -> bool {
        self.window.is_open() && !self.window.is_key_down(Key::Escape)
    }

    fn rebuild_environment(&mut self, faces: &[PathBuf; CUBE_FACES]) -> Result<()> {
        // 同じパスの面は一度だけ読む
        let mut loaded: Vec<(&PathBuf, RgbImage)> = Vec::new();
        let mut face_images = [0usize; CUBE_FACES];
        for (slot, path) in face_images.iter_mut().zip(faces) {
            if let Some(i) = loaded.iter().position(|(p, _)| *p == path) {
                *slot = i;
                continue;
            }
            match image::open(path) {
                Ok(img) => {
                    *slot = loaded.len();
                    loaded.push((path, img.to_rgb8()));
                }
                Err(e) => {
                    log::warn!("environment face {} unavailable: {}", path.display(), e);
                    self.backdrop = None;
                    return Ok(());
                }
            }
        }

        let rays = self
            .camera
            .skybox_rays()
            .context("Skybox projection is not invertible")?;
        anyhow::ensure!(rays.len() == self.buffer.len(), "backdrop size mismatch");
        let pixels = rays
            .iter()
            .map(|dir| {
                let (face, u, v) = cube_face_uv(dir);
                sample_nearest(&loaded[face_images[face]].1, u, v)
            })
            .collect::<Vec<_>>();
        self.backdrop = Some(pixels);
        log::info!("environment rebuilt from {}", faces[0].display());
        Ok(())
    }

    fn draw_points(&mut self, points_2d: &[f32]) {
        self.pending_points.clear();
        self.pending_points.extend_from_slice(points_2d);
    }

    fn draw_backdrop(&mut self) {
        self.pending_backdrop = true;
    }

    fn report_turns(&mut self, events: &[TurnEvent]) {
        for event in events {
            println!("{}", event);
        }
    }

    /// 背景 → 点の順に合成してウィンドウに表示
    fn present(&mut self) -> Result<()> {
        self.buffer.fill(CLEAR_COLOR);
        if std::mem::take(&mut self.pending_backdrop) {
            self.blit_backdrop();
        }
        self.draw_pending_points();
        self.window
            .update_with_buffer(&self.buffer, self.width, self.height)
            .context("Failed to update window")?;
        Ok(())
    }
}
