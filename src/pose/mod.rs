pub mod detector;
pub mod landmark;
#[cfg(feature = "desktop")]
pub mod preprocess;
pub mod validate;

pub use detector::LandmarkDetector;
#[cfg(feature = "desktop")]
pub use detector::OnnxPoseDetector;
pub use landmark::{Landmark, LandmarkFrame, LandmarkIndex, ValidFrame, POINTS_2D_LEN, POINTS_3D_LEN};
#[cfg(feature = "desktop")]
pub use preprocess::preprocess_for_landmarks;
pub use validate::{validate, FrameStatus, InvalidReason};
