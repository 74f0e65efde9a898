//! 1ティック分の処理の順序付け
//!
//! 検証 → キャリブレーション → x補正 → 向き推定 → 描画。
//! キャリブレーションが終わるまでは後段を一切実行しない。

use anyhow::{Context, Result};
use std::time::Instant;

use crate::backdrop::{crop_background, environment_faces, BackdropStore, PlateSource};
use crate::calibration::{CalibrationAction, CalibrationSequencer, CalibrationState};
use crate::camera::FrameSource;
use crate::config::Config;
use crate::pose::{validate, FrameStatus, Landmark, LandmarkDetector, LandmarkFrame};
use crate::render::Renderer;
use crate::tracker::{CalibratedDistances, CoordinateNormalizer, TurnEstimator, TurnEvent, TurnState};

/// 1ティックの結果
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// キャリブレーション中。後段はスキップ
    Calibrating,
    /// キャリブレーション後の無効フレーム。点は送らない
    Skipped,
    Tracked {
        points_2d: Vec<f32>,
        events: Vec<TurnEvent>,
        calibrated: CalibratedDistances,
    },
}

pub struct Pipeline {
    sequencer: CalibrationSequencer,
    normalizer: CoordinateNormalizer,
    estimator: TurnEstimator,
    turn_state: TurnState,
    crop_offset: u32,
    plate_width: u32,
    draw_backdrop: bool,
}

impl Pipeline {
    pub fn new(config: &Config, draw_backdrop: bool) -> Self {
        Self {
            sequencer: CalibrationSequencer::new(config.calibration.countdown_secs),
            normalizer: CoordinateNormalizer::new(config.calibration.crop_offset as f32),
            estimator: TurnEstimator::from_config(&config.tracker),
            turn_state: TurnState::neutral(config.scene.width as f32),
            crop_offset: config.calibration.crop_offset,
            plate_width: config.scene.width,
            draw_backdrop,
        }
    }

    pub fn calibration(&self) -> &CalibrationState {
        self.sequencer.state()
    }

    pub fn turn_state(&self) -> &TurnState {
        &self.turn_state
    }

    pub fn tick<P, R, B>(
        &mut self,
        frame: &LandmarkFrame,
        image: &P,
        now: Instant,
        renderer: &mut R,
        backdrop: &mut B,
    ) -> Result<TickOutcome>
    where
        P: PlateSource + ?Sized,
        R: Renderer + ?Sized,
        B: BackdropStore + ?Sized,
    {
        let status = validate(frame);

        if !self.sequencer.is_calibrated() {
            let step = self.sequencer.step(&status, now);
            for notice in &step.notices {
                println!("{}", notice);
            }
            if let Some(CalibrationAction::CaptureBackground) = step.action {
                let plate = crop_background(&image.to_rgb()?, self.crop_offset, self.plate_width)?;
                let path = backdrop.store(&plate)?;
                renderer.rebuild_environment(&environment_faces(&path))?;
            }
            if !self.sequencer.is_calibrated() {
                renderer.present()?;
                return Ok(TickOutcome::Calibrating);
            }
        }

        let (frame, reference) = match (status, self.sequencer.state().reference()) {
            (FrameStatus::Valid(frame), Some(reference)) => (frame, reference),
            (status, _) => {
                if let FrameStatus::Invalid(reason) = status {
                    log::trace!("frame skipped: {}", reason);
                }
                renderer.present()?;
                return Ok(TickOutcome::Skipped);
            }
        };

        let normalized = self.normalizer.normalize(&frame);
        let output = self.estimator.estimate(&normalized, reference, &mut self.turn_state);
        log::trace!(
            "calibrated distance head={:.1} body={:.1}",
            output.calibrated.head,
            output.calibrated.body
        );

        renderer.draw_points(normalized.points_2d());
        if self.draw_backdrop {
            renderer.draw_backdrop();
        }
        renderer.report_turns(&output.events);
        renderer.present()?;

        Ok(TickOutcome::Tracked {
            points_2d: normalized.points_2d().to_vec(),
            events: output.events,
            calibrated: output.calibrated,
        })
    }
}

/// y 反転にはそのフレーム自身の高さを使う
fn landmark_frame<P: PlateSource + ?Sized>(landmarks: &[Landmark], image: &P) -> LandmarkFrame {
    LandmarkFrame::from_landmarks(landmarks, image.height() as f32)
}

/// 終了シグナル（ウィンドウが閉じる）までティックを回す
///
/// 1ティック = カメラ読み込み + 検出 + パイプライン + 描画。重ならない。
pub fn run<S, D, R, B>(
    pipeline: &mut Pipeline,
    source: &mut S,
    detector: &mut D,
    renderer: &mut R,
    backdrop: &mut B,
) -> Result<()>
where
    S: FrameSource,
    S::Image: PlateSource,
    D: LandmarkDetector<Image = S::Image>,
    R: Renderer,
    B: BackdropStore,
{
    while renderer.is_open() {
        // カメラが止まったらループごと止める。ここでは再試行しない
        let image = source.read_frame().context("Camera stopped delivering frames")?;
        let landmarks = detector.detect(&image)?;
        let frame = landmark_frame(&landmarks, &image);
        pipeline.tick(&frame, &image, Instant::now(), renderer, backdrop)?;
    }

    Ok(())
}
