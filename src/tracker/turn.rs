use std::fmt;

use crate::config::TrackerConfig;
use crate::pose::{LandmarkIndex, ValidFrame};

/// 頭・体の左右の向き変化
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnEvent {
    HeadTurnLeft,
    HeadTurnRight,
    BodyTurnLeft,
    BodyTurnRight,
}

impl fmt::Display for TurnEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::HeadTurnLeft => "Turning Head Left!",
            Self::HeadTurnRight => "Turning Head Right!",
            Self::BodyTurnLeft => "Turning Body Left!",
            Self::BodyTurnRight => "Turning Body Right!",
        };
        f.write_str(s)
    }
}

/// 1軸ぶんの前フレームの記憶
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisState {
    /// (右側ランドマーク, 左側ランドマーク) の方向成分
    pub direction: (f32, f32),
    /// 2ランドマーク間の距離
    pub magnitude: f32,
}

/// フレームをまたいで保持する唯一の追跡状態
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TurnState {
    pub head: AxisState,
    pub body: AxisState,
}

impl TurnState {
    /// 最初の有効フレーム前の初期値。方向は画面幅の中点
    pub fn neutral(width: f32) -> Self {
        let axis = AxisState {
            direction: (width / 2.0, width / 2.0),
            magnitude: 0.0,
        };
        Self { head: axis, body: axis }
    }
}

/// キャリブレーション時の左右ランドマーク間のx距離
///
/// 判定には使っていない診断値。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibratedDistances {
    pub head: f32,
    pub body: f32,
}

impl CalibratedDistances {
    pub fn from_reference(reference: &ValidFrame) -> Self {
        let gap = |a: LandmarkIndex, b: LandmarkIndex| {
            reference.points_2d()[b.x2d()] - reference.points_2d()[a.x2d()]
        };
        Self {
            head: gap(LandmarkIndex::MouthLeft, LandmarkIndex::MouthRight),
            body: gap(LandmarkIndex::LeftShoulder, LandmarkIndex::RightShoulder),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutput {
    pub events: Vec<TurnEvent>,
    pub calibrated: CalibratedDistances,
}

pub struct TurnEstimator {
    magnitude_threshold: f32,
    head_margin: f32,
}

impl TurnEstimator {
    pub fn new(magnitude_threshold: f32, head_margin: f32) -> Self {
        Self {
            magnitude_threshold,
            head_margin,
        }
    }

    pub fn from_config(config: &TrackerConfig) -> Self {
        Self::new(config.magnitude_threshold, config.head_direction_margin)
    }

    /// 正規化済みフレームと前フレームの状態から向き変化を推定する。
    /// イベントの有無にかかわらず `state` は現フレームの値で更新される。
    pub fn estimate(
        &self,
        frame: &ValidFrame,
        reference: &ValidFrame,
        state: &mut TurnState,
    ) -> TurnOutput {
        let calibrated = CalibratedDistances::from_reference(reference);
        let mut events = Vec::new();

        // 頭: 口角2点
        let head = AxisState {
            direction: (
                frame.points_2d()[LandmarkIndex::MouthLeft.x2d()],
                frame.points_2d()[LandmarkIndex::MouthRight.x2d()],
            ),
            magnitude: frame.distance_2d(LandmarkIndex::MouthLeft, LandmarkIndex::MouthRight),
        };
        if self.exceeds_gate(&state.head, &head) {
            events.extend(head_turn(&state.head, &head, self.head_margin));
        }

        // 体: 両肩。方向は奥行き (z)
        let body = AxisState {
            direction: (
                frame.point_3d(LandmarkIndex::LeftShoulder)[2],
                frame.point_3d(LandmarkIndex::RightShoulder)[2],
            ),
            magnitude: frame.distance_2d(LandmarkIndex::LeftShoulder, LandmarkIndex::RightShoulder),
        };
        if self.exceeds_gate(&state.body, &body) {
            events.extend(body_turn(&state.body, &body));
        }

        state.head = head;
        state.body = body;

        TurnOutput { events, calibrated }
    }

    fn exceeds_gate(&self, previous: &AxisState, current: &AxisState) -> bool {
        (current.magnitude - previous.magnitude).abs() > self.magnitude_threshold
    }
}

/// 頭の向き判定。前フレームの方向からマージン以上ずれたときだけ
pub fn head_turn(previous: &AxisState, current: &AxisState, margin: f32) -> Option<TurnEvent> {
    let (px, py) = previous.direction;
    let (cx, cy) = current.direction;
    if cx < px - margin && cy > py + margin {
        Some(TurnEvent::HeadTurnRight)
    } else if cx > px + margin && cy < py - margin {
        Some(TurnEvent::HeadTurnLeft)
    } else {
        None
    }
}

/// 体の向き判定。符号だけを見る
pub fn body_turn(previous: &AxisState, current: &AxisState) -> Option<TurnEvent> {
    let dx = current.direction.0 - previous.direction.0;
    let dy = current.direction.1 - previous.direction.1;
    if dx > 0.0 && dy < 0.0 {
        Some(TurnEvent::BodyTurnLeft)
    } else if dx < 0.0 && dy > 0.0 {
        Some(TurnEvent::BodyTurnRight)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::{POINTS_2D_LEN, POINTS_3D_LEN};

    fn axis(direction: (f32, f32), magnitude: f32) -> AxisState {
        AxisState { direction, magnitude }
    }

    /// 口角と肩だけを置いたフレーム
    fn frame(mouth: [(f32, f32); 2], shoulders: [(f32, f32, f32); 2]) -> ValidFrame {
        let mut p2 = [0.0; POINTS_2D_LEN];
        let mut p3 = [0.0; POINTS_3D_LEN];
        let mut put = |idx: LandmarkIndex, x: f32, y: f32, z: f32| {
            p2[idx.x2d()] = x;
            p2[idx.y2d()] = y;
            p3[idx.x3d()] = x;
            p3[idx.y3d()] = y;
            p3[idx.z3d()] = z;
        };
        put(LandmarkIndex::MouthLeft, mouth[0].0, mouth[0].1, 0.0);
        put(LandmarkIndex::MouthRight, mouth[1].0, mouth[1].1, 0.0);
        let [(lx, ly, lz), (rx, ry, rz)] = shoulders;
        put(LandmarkIndex::LeftShoulder, lx, ly, lz);
        put(LandmarkIndex::RightShoulder, rx, ry, rz);
        ValidFrame::new(p2, p3)
    }

    #[test]
    fn test_head_turn_right_example() {
        let previous = axis((100.0, 100.0), 10.0);
        let current = axis((90.0, 110.0), 12.0);
        let estimator = TurnEstimator::new(1.5, 3.0);
        assert!(estimator.exceeds_gate(&previous, &current));
        assert_eq!(head_turn(&previous, &current, 3.0), Some(TurnEvent::HeadTurnRight));
    }

    #[test]
    fn test_head_turn_left() {
        let previous = axis((100.0, 100.0), 10.0);
        let current = axis((104.0, 96.0), 12.0);
        assert_eq!(head_turn(&previous, &current, 3.0), Some(TurnEvent::HeadTurnLeft));
    }

    #[test]
    fn test_head_turn_within_margin() {
        let previous = axis((100.0, 100.0), 10.0);
        // ちょうどマージン分のずれは対象外
        let current = axis((97.0, 103.0), 12.0);
        assert_eq!(head_turn(&previous, &current, 3.0), None);
    }

    #[test]
    fn test_body_turn_rules() {
        let previous = axis((0.0, 0.0), 50.0);
        assert_eq!(body_turn(&previous, &axis((0.1, -0.1), 60.0)), Some(TurnEvent::BodyTurnLeft));
        assert_eq!(body_turn(&previous, &axis((-0.1, 0.1), 60.0)), Some(TurnEvent::BodyTurnRight));
        assert_eq!(body_turn(&previous, &axis((0.1, 0.1), 60.0)), None);
        assert_eq!(body_turn(&previous, &axis((0.0, -0.1), 60.0)), None);
    }

    #[test]
    fn test_gate_boundary() {
        let estimator = TurnEstimator::new(1.5, 3.0);
        let previous = axis((100.0, 100.0), 10.0);
        assert!(!estimator.exceeds_gate(&previous, &axis((90.0, 110.0), 11.5)));
        assert!(!estimator.exceeds_gate(&previous, &axis((90.0, 110.0), 8.5)));
        assert!(estimator.exceeds_gate(&previous, &axis((90.0, 110.0), 11.50001)));
    }

    #[test]
    fn test_no_event_below_gate() {
        let estimator = TurnEstimator::new(1.5, 3.0);
        let reference = frame([(100.0, 300.0), (120.0, 300.0)], [(60.0, 200.0, 0.0), (160.0, 200.0, 0.0)]);
        // 口角間 20、肩間 100
        let mut state = TurnState {
            head: axis((140.0, 100.0), 20.0),
            body: axis((5.0, -5.0), 100.0),
        };
        // 方向は大きく動くが、距離の変化は1.0だけ
        let current = frame([(100.0, 300.0), (121.0, 300.0)], [(60.0, 200.0, -5.0), (161.0, 200.0, 5.0)]);
        let out = estimator.estimate(&current, &reference, &mut state);
        assert!(out.events.is_empty());
    }

    #[test]
    fn test_estimate_emits_and_updates_state() {
        let estimator = TurnEstimator::new(1.5, 3.0);
        let reference = frame([(100.0, 300.0), (120.0, 300.0)], [(60.0, 200.0, 0.0), (160.0, 200.0, 0.0)]);
        let mut state = TurnState {
            head: axis((110.0, 110.0), 10.0),
            body: axis((0.0, 0.0), 100.0),
        };
        // 頭: (100, 120) は x < 110-3、y > 110+3、距離 20 → 右
        // 体: z (2, -2)、距離 104 → 左
        let current = frame([(100.0, 300.0), (120.0, 300.0)], [(58.0, 200.0, 2.0), (162.0, 200.0, -2.0)]);
        let out = estimator.estimate(&current, &reference, &mut state);
        assert_eq!(out.events, vec![TurnEvent::HeadTurnRight, TurnEvent::BodyTurnLeft]);
        assert_eq!(state.head.direction, (100.0, 120.0));
        assert!((state.head.magnitude - 20.0).abs() < 1e-5);
        assert_eq!(state.body.direction, (2.0, -2.0));
        assert!((state.body.magnitude - 104.0).abs() < 1e-4);
    }

    #[test]
    fn test_state_updates_without_event() {
        let estimator = TurnEstimator::new(1.5, 3.0);
        let reference = frame([(0.0, 0.0), (10.0, 0.0)], [(0.0, 0.0, 0.0), (10.0, 0.0, 0.0)]);
        let mut state = TurnState {
            head: axis((0.0, 10.0), 10.0),
            body: axis((0.0, 0.0), 10.0),
        };
        let current = frame([(0.5, 0.0), (10.5, 0.0)], [(0.0, 0.0, 0.0), (10.0, 0.0, 0.0)]);
        let out = estimator.estimate(&current, &reference, &mut state);
        assert!(out.events.is_empty());
        assert_eq!(state.head.direction, (0.5, 10.5));
    }

    #[test]
    fn test_calibrated_distances() {
        let reference = frame([(100.0, 300.0), (130.0, 300.0)], [(60.0, 200.0, 0.0), (170.0, 200.0, 0.0)]);
        let d = CalibratedDistances::from_reference(&reference);
        assert_eq!(d.head, 30.0);
        assert_eq!(d.body, 110.0);
    }

    #[test]
    fn test_neutral_state() {
        let state = TurnState::neutral(480.0);
        assert_eq!(state.head.direction, (240.0, 240.0));
        assert_eq!(state.body.direction, (240.0, 240.0));
        assert_eq!(state.head.magnitude, 0.0);
    }

    #[test]
    fn test_event_messages() {
        assert_eq!(TurnEvent::HeadTurnRight.to_string(), "Turning Head Right!");
        assert_eq!(TurnEvent::BodyTurnLeft.to_string(), "Turning Body Left!");
    }
}
