#[cfg(feature = "desktop")]
pub mod capture;

use anyhow::Result;

#[cfg(feature = "desktop")]
pub use capture::OpenCvCamera;

/// カメラなどのフレーム供給元。読み込みはブロッキング
pub trait FrameSource {
    type Image;

    fn read_frame(&mut self) -> Result<Self::Image>;
}
