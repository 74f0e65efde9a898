use anyhow::Result;

use super::landmark::{Landmark, LandmarkIndex};

/// 外部のポーズ検出器
///
/// 1画像につき、ランドマーク0個（人物なし）か33個を返す。
pub trait LandmarkDetector {
    type Image;

    fn detect(&mut self, image: &Self::Image) -> Result<Vec<Landmark>>;
}

/// モデル出力1ランドマークあたりの値 (x, y, z, visibility, presence)
pub const VALUES_PER_LANDMARK: usize = 5;

/// ポーズランドマークモデルの生出力をカメラ画像のピクセル座標へ変換
///
/// - `raw`: 入力解像度基準の座標。先頭33点だけ使う（残りは補助点）
/// - `presence_logit`: 人物存在スコアの生値（ロジット）。シグモイド後の確率が閾値未満なら空
/// - `scale`: (画像幅 / 入力幅, 画像高さ / 入力高さ)
pub fn decode_landmarks(raw: &[f32], presence_logit: f32, threshold: f32, scale: (f32, f32)) -> Vec<Landmark> {
    if sigmoid(presence_logit) < threshold || raw.len() < LandmarkIndex::COUNT * VALUES_PER_LANDMARK {
        return Vec::new();
    }
    let (sx, sy) = scale;
    raw.chunks_exact(VALUES_PER_LANDMARK)
        .take(LandmarkIndex::COUNT)
        .map(|v| Landmark::new(v[0] * sx, v[1] * sy, v[2] * sx))
        .collect()
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(feature = "desktop")]
pub use onnx::OnnxPoseDetector;

#[cfg(feature = "desktop")]
mod onnx {
    use anyhow::{Context, Result};
    use opencv::core::Mat;
    use opencv::prelude::*;
    use ort::session::builder::GraphOptimizationLevel;
    use ort::session::Session;
    use ort::value::Tensor;
    use std::path::Path;

    use super::{decode_landmarks, LandmarkDetector};
    use crate::pose::landmark::Landmark;
    use crate::pose::preprocess::{preprocess_for_landmarks, LANDMARK_INPUT_SIZE};

    const INPUT_NAME: &str = "input_1";
    const LANDMARKS_OUTPUT: &str = "Identity";
    const PRESENCE_OUTPUT: &str = "Identity_1";

    /// BlazePose ランドマークモデル (ONNX) による検出器
    pub struct OnnxPoseDetector {
        session: Session,
        presence_threshold: f32,
    }

    impl OnnxPoseDetector {
        /// ONNXモデルを読み込んで初期化
        pub fn new<P: AsRef<Path>>(model_path: P, presence_threshold: f32) -> Result<Self> {
            let session = Session::builder()?
                .with_optimization_level(GraphOptimizationLevel::Level3)?
                .commit_from_file(model_path.as_ref())
                .context("Failed to load ONNX model")?;

            Ok(Self {
                session,
                presence_threshold,
            })
        }
    }

    impl LandmarkDetector for OnnxPoseDetector {
        type Image = Mat;

        fn detect(&mut self, image: &Mat) -> Result<Vec<Landmark>> {
            let input = preprocess_for_landmarks(image)?;
            let input_tensor = Tensor::from_array(input)?;
            let outputs = self
                .session
                .run(ort::inputs![INPUT_NAME => input_tensor])
                .context("Inference failed")?;

            let raw: ndarray::ArrayViewD<f32> = outputs[LANDMARKS_OUTPUT]
                .try_extract_array()
                .context("Failed to extract landmark tensor")?;
            let presence: ndarray::ArrayViewD<f32> = outputs[PRESENCE_OUTPUT]
                .try_extract_array()
                .context("Failed to extract presence tensor")?;

            let raw: Vec<f32> = raw.iter().copied().collect();
            // 存在フラグはシグモイド前の値。出力が空なら不在扱い
            let presence = presence.iter().next().copied().unwrap_or(f32::NEG_INFINITY);

            let input_size = LANDMARK_INPUT_SIZE as f32;
            let scale = (image.cols() as f32 / input_size, image.rows() as f32 / input_size);
            Ok(decode_landmarks(&raw, presence, self.presence_threshold, scale))
        }
    }
}
