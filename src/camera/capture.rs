use anyhow::{Context, Result};
use image::RgbImage;
use opencv::{
    core::{AlgorithmHint, Mat},
    imgproc,
    prelude::*,
    videoio::{self, VideoCapture, VideoCaptureAPIs, VideoCaptureTrait},
};

use super::FrameSource;
use crate::backdrop::PlateSource;

/// OpenCVを使用したカメラキャプチャ
pub struct OpenCvCamera {
    capture: VideoCapture,
}

impl OpenCvCamera {
    /// 解像度を指定してカメラを開く。開けなければエラー
    pub fn open(index: i32, width: u32, height: u32) -> Result<Self> {
        let mut capture =
            VideoCapture::new(index, VideoCaptureAPIs::CAP_ANY as i32).context("Failed to open camera")?;

        if !capture.is_opened()? {
            anyhow::bail!("Camera {} is not available", index);
        }

        capture.set(videoio::CAP_PROP_FRAME_WIDTH, width as f64)?;
        capture.set(videoio::CAP_PROP_FRAME_HEIGHT, height as f64)?;
        capture.set(videoio::CAP_PROP_BUFFERSIZE, 1.0)?;

        let actual_width = capture.get(videoio::CAP_PROP_FRAME_WIDTH)? as u32;
        let actual_height = capture.get(videoio::CAP_PROP_FRAME_HEIGHT)? as u32;
        log::info!("camera {} opened at {}x{}", index, actual_width, actual_height);

        Ok(Self { capture })
    }
}

impl FrameSource for OpenCvCamera {
    type Image = Mat;

    /// フレームを読み込む（BGR形式）
    fn read_frame(&mut self) -> Result<Mat> {
        let mut frame = Mat::default();
        self.capture
            .read(&mut frame)
            .context("Failed to read frame")?;

        if frame.empty() {
            anyhow::bail!("Empty frame received");
        }

        Ok(frame)
    }
}

/// 背景撮影用に BGR Mat を RGB 画像へ変換
impl PlateSource for Mat {
    fn height(&self) -> u32 {
        self.rows() as u32
    }

    fn to_rgb(&self) -> Result<RgbImage> {
        let mut rgb = Mat::default();
        imgproc::cvt_color(self, &mut rgb, imgproc::COLOR_BGR2RGB, 0, AlgorithmHint::ALGO_HINT_DEFAULT)?;
        let width = rgb.cols() as u32;
        let height = rgb.rows() as u32;
        let bytes = rgb.data_bytes()?.to_vec();
        RgbImage::from_raw(width, height, bytes).context("Unexpected camera frame layout")
    }
}
