/// BlazePose の 33 ランドマークインデックス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum LandmarkIndex {
    Nose = 0,
    LeftEyeInner = 1,
    LeftEye = 2,
    LeftEyeOuter = 3,
    RightEyeInner = 4,
    RightEye = 5,
    RightEyeOuter = 6,
    LeftEar = 7,
    RightEar = 8,
    MouthLeft = 9,
    MouthRight = 10,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftPinky = 17,
    RightPinky = 18,
    LeftIndex = 19,
    RightIndex = 20,
    LeftThumb = 21,
    RightThumb = 22,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
    LeftHeel = 29,
    RightHeel = 30,
    LeftFootIndex = 31,
    RightFootIndex = 32,
}

/// 2D配列のスカラー数 (33 × (x, y))
pub const POINTS_2D_LEN: usize = LandmarkIndex::COUNT * 2;
/// 3D配列のスカラー数 (33 × (x, y, z))
pub const POINTS_3D_LEN: usize = LandmarkIndex::COUNT * 3;

impl LandmarkIndex {
    pub const COUNT: usize = 33;

    /// 2D配列中の x のオフセット
    pub const fn x2d(self) -> usize {
        self as usize * 2
    }

    /// 2D配列中の y のオフセット
    pub const fn y2d(self) -> usize {
        self as usize * 2 + 1
    }

    pub const fn x3d(self) -> usize {
        self as usize * 3
    }

    pub const fn y3d(self) -> usize {
        self as usize * 3 + 1
    }

    pub const fn z3d(self) -> usize {
        self as usize * 3 + 2
    }
}

/// 検出器が返す単一ランドマーク（ピクセル座標、yは下向き）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// 1フレーム分のランドマークを平坦化した2系統の座標列
///
/// 検出器の出力をそのまま保持するため長さは保証しない。
/// インデックスアクセスは [`ValidFrame`] を経由すること。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LandmarkFrame {
    pub points_2d: Vec<f32>,
    pub points_3d: Vec<f32>,
}

impl LandmarkFrame {
    /// 人物なし（ランドマーク0個）
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_flat(points_2d: Vec<f32>, points_3d: Vec<f32>) -> Self {
        Self { points_2d, points_3d }
    }

    /// 検出結果から構築。yを画像高さで反転し、上向きを正にする
    pub fn from_landmarks(landmarks: &[Landmark], image_height: f32) -> Self {
        let mut points_2d = Vec::with_capacity(landmarks.len() * 2);
        let mut points_3d = Vec::with_capacity(landmarks.len() * 3);
        for lm in landmarks {
            let y = image_height - lm.y;
            points_2d.extend_from_slice(&[lm.x, y]);
            points_3d.extend_from_slice(&[lm.x, y, lm.z]);
        }
        Self { points_2d, points_3d }
    }
}

/// 全ランドマークが揃ったフレーム。固定長配列なので範囲外アクセスは起こらない
#[derive(Debug, Clone, PartialEq)]
pub struct ValidFrame {
    points_2d: [f32; POINTS_2D_LEN],
    points_3d: [f32; POINTS_3D_LEN],
}

impl ValidFrame {
    pub fn new(points_2d: [f32; POINTS_2D_LEN], points_3d: [f32; POINTS_3D_LEN]) -> Self {
        Self { points_2d, points_3d }
    }

    pub fn points_2d(&self) -> &[f32; POINTS_2D_LEN] {
        &self.points_2d
    }

    pub fn points_3d(&self) -> &[f32; POINTS_3D_LEN] {
        &self.points_3d
    }

    pub fn points_2d_mut(&mut self) -> &mut [f32; POINTS_2D_LEN] {
        &mut self.points_2d
    }

    pub fn points_3d_mut(&mut self) -> &mut [f32; POINTS_3D_LEN] {
        &mut self.points_3d
    }

    pub fn point_2d(&self, index: LandmarkIndex) -> [f32; 2] {
        [self.points_2d[index.x2d()], self.points_2d[index.y2d()]]
    }

    pub fn point_3d(&self, index: LandmarkIndex) -> [f32; 3] {
        [
            self.points_3d[index.x3d()],
            self.points_3d[index.y3d()],
            self.points_3d[index.z3d()],
        ]
    }

    /// 2点間のユークリッド距離（2D）
    pub fn distance_2d(&self, a: LandmarkIndex, b: LandmarkIndex) -> f32 {
        let [ax, ay] = self.point_2d(a);
        let [bx, by] = self.point_2d(b);
        ((bx - ax).powi(2) + (by - ay).powi(2)).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landmark_index_count() {
        assert_eq!(LandmarkIndex::COUNT, 33);
        assert_eq!(POINTS_2D_LEN, 66);
        assert_eq!(POINTS_3D_LEN, 99);
    }

    #[test]
    fn test_landmark_index_discriminants() {
        assert_eq!(LandmarkIndex::Nose as usize, 0);
        assert_eq!(LandmarkIndex::MouthLeft as usize, 9);
        assert_eq!(LandmarkIndex::RightFootIndex as usize + 1, LandmarkIndex::COUNT);
    }

    #[test]
    fn test_flattened_offsets() {
        assert_eq!(LandmarkIndex::MouthLeft.x2d(), 18);
        assert_eq!(LandmarkIndex::MouthRight.x2d(), 20);
        assert_eq!(LandmarkIndex::LeftShoulder.x2d(), 22);
        assert_eq!(LandmarkIndex::RightShoulder.y2d(), 25);
        assert_eq!(LandmarkIndex::LeftShoulder.z3d(), 35);
        assert_eq!(LandmarkIndex::RightShoulder.z3d(), 38);
        assert_eq!(LandmarkIndex::LeftFootIndex.y2d(), 63);
        assert_eq!(LandmarkIndex::RightFootIndex.y2d(), 65);
    }

    #[test]
    fn test_from_landmarks_flips_y() {
        let landmarks = [Landmark::new(10.0, 100.0, -5.0), Landmark::new(20.0, 500.0, 3.0)];
        let frame = LandmarkFrame::from_landmarks(&landmarks, 480.0);
        assert_eq!(frame.points_2d, vec![10.0, 380.0, 20.0, -20.0]);
        assert_eq!(frame.points_3d, vec![10.0, 380.0, -5.0, 20.0, -20.0, 3.0]);
    }

    #[test]
    fn test_empty_frame() {
        let frame = LandmarkFrame::from_landmarks(&[], 480.0);
        assert_eq!(frame, LandmarkFrame::empty());
        assert!(frame.points_3d.is_empty());
    }

    #[test]
    fn test_valid_frame_accessors() {
        let mut p2 = [0.0; POINTS_2D_LEN];
        let mut p3 = [0.0; POINTS_3D_LEN];
        p2[18] = 3.0;
        p2[19] = 0.0;
        p2[20] = 0.0;
        p2[21] = 4.0;
        p3[35] = 7.0;
        let frame = ValidFrame::new(p2, p3);
        assert_eq!(frame.point_2d(LandmarkIndex::MouthLeft), [3.0, 0.0]);
        assert_eq!(frame.point_3d(LandmarkIndex::LeftShoulder)[2], 7.0);
        assert!((frame.distance_2d(LandmarkIndex::MouthLeft, LandmarkIndex::MouthRight) - 5.0).abs() < 1e-6);
    }
}
