//! 起動時キャリブレーション
//!
//! 1. 人物が映っていない状態で背景プレートを撮影
//! 2. 全身が映った状態で基準スケルトンを取得
//!
//! どちらもカウントダウン付き。時刻は呼び出し側から渡すので、
//! 同じ入力列に対して常に同じ遷移をたどる。

use std::fmt;
use std::time::Instant;

use crate::pose::{FrameStatus, LandmarkIndex, ValidFrame};

// --- カウントダウン ---

/// 1秒刻みで残り秒数を報告するタイマー
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    started: Instant,
    /// 次に報告する経過秒 (1始まり)
    step: u32,
    steps: u32,
}

impl Countdown {
    pub fn start(now: Instant, steps: u32) -> Self {
        Self {
            started: now,
            step: 1,
            steps,
        }
    }

    /// 次の1秒境界を越えていれば残り秒数を返す。1回の呼び出しで進むのは1ステップまで
    pub fn poll(&mut self, now: Instant) -> Option<u32> {
        let elapsed = now.saturating_duration_since(self.started).as_secs_f64();
        if self.step <= self.steps && elapsed >= self.step as f64 {
            let remaining = self.steps + 1 - self.step;
            self.step += 1;
            Some(remaining)
        } else {
            None
        }
    }

    pub fn is_finished(&self) -> bool {
        self.step > self.steps
    }

    pub fn started(&self) -> Instant {
        self.started
    }
}

// --- 状態 ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationPhase {
    AwaitingPictureTimerStart,
    PictureCountdown,
    AwaitingEmptyFrame,
    AwaitingPoseTimerStart,
    PoseCountdown,
    AwaitingValidPose,
    Calibrated,
}

/// シーケンサが排他的に所有するキャリブレーション状態
///
/// 背景・基準スケルトンとも一度取得したら以後は変更されない。
#[derive(Debug, Clone)]
pub struct CalibrationState {
    phase: CalibrationPhase,
    background_captured: bool,
    reference: Option<ValidFrame>,
    picture_timer: Option<Countdown>,
    pose_timer: Option<Countdown>,
}

impl CalibrationState {
    fn new() -> Self {
        Self {
            phase: CalibrationPhase::AwaitingPictureTimerStart,
            background_captured: false,
            reference: None,
            picture_timer: None,
            pose_timer: None,
        }
    }

    pub fn phase(&self) -> CalibrationPhase {
        self.phase
    }

    pub fn background_captured(&self) -> bool {
        self.background_captured
    }

    pub fn reference_captured(&self) -> bool {
        self.reference.is_some()
    }

    /// 基準スケルトン（生座標、x補正前）
    pub fn reference(&self) -> Option<&ValidFrame> {
        self.reference.as_ref()
    }

    pub fn picture_timer(&self) -> Option<&Countdown> {
        self.picture_timer.as_ref()
    }

    pub fn pose_timer(&self) -> Option<&Countdown> {
        self.pose_timer.as_ref()
    }
}

// --- 出力 ---

/// コンソールに出す進捗・状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationNotice {
    EnvironmentCountdownStarted,
    PoseCountdownStarted,
    /// 残り秒数
    Countdown(u32),
    FrameNotEmpty,
    PictureTaken,
    NoDataPoints,
    BodyNotInFrame,
    CalibrationComplete,
}

impl fmt::Display for CalibrationNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EnvironmentCountdownStarted => f.write_str("Initializing actor's environment in..."),
            Self::PoseCountdownStarted => f.write_str("Taking picture of the actor in..."),
            Self::Countdown(remaining) => write!(f, "0:00:{:02}...", remaining),
            Self::FrameNotEmpty => {
                f.write_str("Please make sure nobody is visible in frame! Restarting timer...")
            }
            Self::PictureTaken => f.write_str("Picture taken!"),
            Self::NoDataPoints => f.write_str("No data points found!  Make sure you are in frame!"),
            Self::BodyNotInFrame => f.write_str("Please make sure your entire body is in frame!"),
            Self::CalibrationComplete => f.write_str("Calibration complete!"),
        }
    }
}

/// 呼び出し側が実行する副作用
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationAction {
    /// 今のカメラ画像を背景プレートとして保存し、環境テクスチャを作り直す
    CaptureBackground,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalibrationStep {
    pub notices: Vec<CalibrationNotice>,
    pub action: Option<CalibrationAction>,
}

// --- シーケンサ ---

pub struct CalibrationSequencer {
    countdown_secs: u32,
    state: CalibrationState,
}

impl CalibrationSequencer {
    pub fn new(countdown_secs: u32) -> Self {
        Self {
            countdown_secs,
            state: CalibrationState::new(),
        }
    }

    pub fn state(&self) -> &CalibrationState {
        &self.state
    }

    pub fn is_calibrated(&self) -> bool {
        self.state.phase == CalibrationPhase::Calibrated
    }

    /// 1ティック分進める。
    ///
    /// 同じティック内で続けて判定できる遷移（タイマー開始、カウント終了、
    /// 背景撮影直後のポーズタイマー開始）はまとめて処理する。
    pub fn step(&mut self, status: &FrameStatus, now: Instant) -> CalibrationStep {
        let mut out = CalibrationStep::default();

        loop {
            match self.state.phase {
                CalibrationPhase::AwaitingPictureTimerStart => {
                    self.state.picture_timer = Some(Countdown::start(now, self.countdown_secs));
                    out.notices.push(CalibrationNotice::EnvironmentCountdownStarted);
                    self.state.phase = CalibrationPhase::PictureCountdown;
                }
                CalibrationPhase::PictureCountdown => {
                    if !Self::advance(&mut self.state.picture_timer, now, &mut out) {
                        break;
                    }
                    self.state.phase = CalibrationPhase::AwaitingEmptyFrame;
                }
                CalibrationPhase::AwaitingEmptyFrame => {
                    if !status.is_empty() {
                        // 誰か映っている: 次のティックでタイマーを最初からかけ直す
                        out.notices.push(CalibrationNotice::FrameNotEmpty);
                        self.state.picture_timer = None;
                        self.state.phase = CalibrationPhase::AwaitingPictureTimerStart;
                        break;
                    }
                    out.notices.push(CalibrationNotice::PictureTaken);
                    out.action = Some(CalibrationAction::CaptureBackground);
                    self.state.background_captured = true;
                    log::info!("background plate requested");
                    self.state.phase = CalibrationPhase::AwaitingPoseTimerStart;
                }
                CalibrationPhase::AwaitingPoseTimerStart => {
                    self.state.pose_timer = Some(Countdown::start(now, self.countdown_secs));
                    out.notices.push(CalibrationNotice::PoseCountdownStarted);
                    self.state.phase = CalibrationPhase::PoseCountdown;
                }
                CalibrationPhase::PoseCountdown => {
                    if !Self::advance(&mut self.state.pose_timer, now, &mut out) {
                        break;
                    }
                    self.state.phase = CalibrationPhase::AwaitingValidPose;
                }
                CalibrationPhase::AwaitingValidPose => {
                    let frame = match status {
                        FrameStatus::Valid(frame) => frame,
                        FrameStatus::Empty | FrameStatus::Invalid(_) => {
                            out.notices.push(CalibrationNotice::NoDataPoints);
                            break;
                        }
                    };
                    let left = frame.points_2d()[LandmarkIndex::LeftFootIndex.y2d()];
                    let right = frame.points_2d()[LandmarkIndex::RightFootIndex.y2d()];
                    if left < 0.0 && right < 0.0 {
                        out.notices.push(CalibrationNotice::BodyNotInFrame);
                    } else if left >= 0.0 && right >= 0.0 {
                        self.state.reference = Some(frame.clone());
                        self.state.phase = CalibrationPhase::Calibrated;
                        out.notices.push(CalibrationNotice::CalibrationComplete);
                        log::info!("reference pose captured");
                    } else {
                        log::debug!("one foot outside frame (left y={:.1}, right y={:.1})", left, right);
                    }
                    break;
                }
                CalibrationPhase::Calibrated => break,
            }
        }

        out
    }

    /// カウントダウンを進め、終わっていれば true
    fn advance(timer: &mut Option<Countdown>, now: Instant, out: &mut CalibrationStep) -> bool {
        match timer {
            Some(t) => {
                if let Some(remaining) = t.poll(now) {
                    out.notices.push(CalibrationNotice::Countdown(remaining));
                }
                t.is_finished()
            }
            None => true,
        }
    }
}
