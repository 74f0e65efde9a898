use anyhow::{ensure, Result};
use ndarray::Array4;
use opencv::{
    core::{AlgorithmHint, Mat, Size, CV_32FC3},
    imgproc,
    prelude::*,
};

/// ランドマークモデルの入力サイズ
pub const LANDMARK_INPUT_SIZE: i32 = 256;

/// OpenCV Mat をランドマークモデルの入力テンソルに変換
///
/// - BGR -> RGB
/// - 256x256 に引き伸ばし（アスペクト比は検出後に縦横別スケールで戻す）
/// - [1, 256, 256, 3] の f32 テンソル (0.0-1.0)
pub fn preprocess_for_landmarks(frame: &Mat) -> Result<Array4<f32>> {
    let mut rgb = Mat::default();
    imgproc::cvt_color(frame, &mut rgb, imgproc::COLOR_BGR2RGB, 0, AlgorithmHint::ALGO_HINT_DEFAULT)?;

    let mut resized = Mat::default();
    imgproc::resize(
        &rgb,
        &mut resized,
        Size::new(LANDMARK_INPUT_SIZE, LANDMARK_INPUT_SIZE),
        0.0,
        0.0,
        imgproc::INTER_LINEAR,
    )?;

    let mut float_mat = Mat::default();
    resized.convert_to(&mut float_mat, CV_32FC3, 1.0 / 255.0, 0.0)?;

    let size = LANDMARK_INPUT_SIZE as usize;
    let data = float_mat.data_typed::<opencv::core::Vec3f>()?;
    ensure!(data.len() == size * size, "unexpected tensor size {}", data.len());

    let tensor = Array4::from_shape_fn((1, size, size, 3), |(_, y, x, c)| data[y * size + x][c]);
    Ok(tensor)
}
