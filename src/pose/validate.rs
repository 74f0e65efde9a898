use std::fmt;

use super::landmark::{LandmarkFrame, ValidFrame, POINTS_2D_LEN, POINTS_3D_LEN};

/// フレームを使えない理由
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidReason {
    /// 2D座標が66スカラーに満たない
    InsufficientLandmarks { found: usize },
    /// 2Dは揃っているが3D側の長さが合わない、あるいは過剰
    UnexpectedLength { points_2d: usize, points_3d: usize },
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsufficientLandmarks { found } => {
                write!(f, "insufficient landmarks ({}/{} scalars)", found, POINTS_2D_LEN)
            }
            Self::UnexpectedLength { points_2d, points_3d } => {
                write!(f, "unexpected landmark length (2D: {}, 3D: {})", points_2d, points_3d)
            }
        }
    }
}

/// 検証結果。`Valid` のときだけ座標にアクセスできる
#[derive(Debug, Clone, PartialEq)]
pub enum FrameStatus {
    Valid(ValidFrame),
    /// 人物なし。背景撮影の条件として使う正常系
    Empty,
    Invalid(InvalidReason),
}

impl FrameStatus {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn valid(&self) -> Option<&ValidFrame> {
        match self {
            Self::Valid(frame) => Some(frame),
            _ => None,
        }
    }
}

/// ランドマーク数を検査し、下流に渡してよいフレームか判定
pub fn validate(frame: &LandmarkFrame) -> FrameStatus {
    let n2 = frame.points_2d.len();
    let n3 = frame.points_3d.len();

    if n2 == 0 && n3 == 0 {
        return FrameStatus::Empty;
    }
    if n2 < POINTS_2D_LEN {
        return FrameStatus::Invalid(InvalidReason::InsufficientLandmarks { found: n2 });
    }

    let points_2d: Result<[f32; POINTS_2D_LEN], _> = frame.points_2d.as_slice().try_into();
    let points_3d: Result<[f32; POINTS_3D_LEN], _> = frame.points_3d.as_slice().try_into();
    match (points_2d, points_3d) {
        (Ok(p2), Ok(p3)) => FrameStatus::Valid(ValidFrame::new(p2, p3)),
        _ => FrameStatus::Invalid(InvalidReason::UnexpectedLength {
            points_2d: n2,
            points_3d: n3,
        }),
    }
}
