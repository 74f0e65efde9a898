pub mod scene;
#[cfg(feature = "desktop")]
pub mod window;

use anyhow::Result;
use std::path::PathBuf;

use crate::backdrop::CUBE_FACES;
use crate::tracker::TurnEvent;

pub use scene::SceneCamera;
#[cfg(feature = "desktop")]
pub use window::MinifbRenderer;

/// パイプラインから見た描画側のインターフェース
pub trait Renderer {
    /// false になったらループを抜ける
    fn is_open(&self) -> bool;

    /// 環境マップを作り直す。6面それぞれの画像パス
    fn rebuild_environment(&mut self, faces: &[PathBuf; CUBE_FACES]) -> Result<()>;

    /// 正規化済み2D座標 (x, y が交互に並ぶ)
    fn draw_points(&mut self, points_2d: &[f32]);

    fn draw_backdrop(&mut self);

    fn report_turns(&mut self, events: &[TurnEvent]);

    /// 1ティック分を表示する
    fn present(&mut self) -> Result<()>;
}
