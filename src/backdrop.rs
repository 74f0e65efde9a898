//! 背景プレートの切り出しと保存
//!
//! 背景は左右反転したカメラ画像の中央帯。保存した1枚を
//! キューブマップ6面すべてに貼る。

use anyhow::{bail, Context, Result};
use image::{imageops, RgbImage};
use std::fs;
use std::path::{Path, PathBuf};

/// キューブマップの面数 (+X, -X, +Y, -Y, +Z, -Z)
pub const CUBE_FACES: usize = 6;

/// 左右反転してから `[crop_offset, crop_offset + target_width)` の列を切り出す。高さはそのまま
pub fn crop_background(image: &RgbImage, crop_offset: u32, target_width: u32) -> Result<RgbImage> {
    let needed = crop_offset + target_width;
    if image.width() < needed {
        bail!(
            "Camera image too narrow for background crop ({}px < {}px)",
            image.width(),
            needed
        );
    }
    let flipped = imageops::flip_horizontal(image);
    let plate = imageops::crop_imm(&flipped, crop_offset, 0, target_width, image.height()).to_image();
    Ok(plate)
}

/// 6面とも同じ画像を指す環境マップ
pub fn environment_faces(path: &Path) -> [PathBuf; CUBE_FACES] {
    std::array::from_fn(|_| path.to_path_buf())
}

/// 1ティック分の生のカメラ画像
pub trait PlateSource {
    /// 画像の高さ。ランドマークの y 反転に使う
    fn height(&self) -> u32;

    /// 変換コストがかかるので、実際に背景を撮るティックでだけ呼ばれる
    fn to_rgb(&self) -> Result<RgbImage>;
}

impl PlateSource for RgbImage {
    fn height(&self) -> u32 {
        self.dimensions().1
    }

    fn to_rgb(&self) -> Result<RgbImage> {
        Ok(self.clone())
    }
}

/// 背景プレートの永続化先
pub trait BackdropStore {
    /// 保存して、そのパスを返す
    fn store(&mut self, plate: &RgbImage) -> Result<PathBuf>;
}

/// PNG ファイルとして保存
pub struct PngBackdropStore {
    path: PathBuf,
}

impl PngBackdropStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

impl BackdropStore for PngBackdropStore {
    fn store(&mut self, plate: &RgbImage) -> Result<PathBuf> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        plate
            .save_with_format(&self.path, image::ImageFormat::Png)
            .with_context(|| format!("Failed to write background {}", self.path.display()))?;
        log::info!("background plate saved to {}", self.path.display());
        Ok(self.path.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    /// 列番号を赤チャンネルに入れた画像
    fn column_image(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| Rgb([x as u8, y as u8, 0]))
    }

    #[test]
    fn test_crop_geometry() {
        let plate = crop_background(&column_image(10, 4), 2, 6).unwrap();
        assert_eq!(plate.dimensions(), (6, 4));
        // 反転後の列2は元の列7
        assert_eq!(plate.get_pixel(0, 0)[0], 7);
        assert_eq!(plate.get_pixel(5, 0)[0], 2);
        assert_eq!(plate.get_pixel(3, 3)[1], 3);
    }

    #[test]
    fn test_crop_camera_sized_frame() {
        let plate = crop_background(&column_image(640, 2), 80, 480).unwrap();
        assert_eq!(plate.dimensions(), (480, 2));
        // 元の列 559 → 反転後の列 80 → プレート先頭
        assert_eq!(plate.get_pixel(0, 0)[0], (559u32 % 256) as u8);
        assert_eq!(plate.get_pixel(479, 0)[0], (80u32 % 256) as u8);
    }

    #[test]
    fn test_crop_too_narrow() {
        assert!(crop_background(&column_image(500, 2), 80, 480).is_err());
    }

    #[test]
    fn test_environment_faces() {
        let faces = environment_faces(Path::new("skybox/left.png"));
        assert_eq!(faces.len(), CUBE_FACES);
        assert!(faces.iter().all(|p| p == Path::new("skybox/left.png")));
    }

    #[test]
    fn test_png_store_writes_file() {
        let dir = std::env::temp_dir().join(format!("rig_tracker_backdrop_{}", std::process::id()));
        let path = dir.join("skybox").join("left.png");
        let mut store = PngBackdropStore::new(&path);
        let written = store.store(&column_image(8, 8)).unwrap();
        assert_eq!(written, path);
        let loaded = image::open(&path).unwrap().to_rgb8();
        assert_eq!(loaded.dimensions(), (8, 8));
        assert_eq!(loaded.get_pixel(5, 2), &Rgb([5, 2, 0]));
        let _ = fs::remove_dir_all(&dir);
    }
}
