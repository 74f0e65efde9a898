use crate::pose::ValidFrame;

/// 背景クロップに合わせて x 座標を左へずらす
///
/// 2D は偶数インデックス、3D は 3 の倍数インデックスが x。
#[derive(Debug, Clone, Copy)]
pub struct CoordinateNormalizer {
    offset: f32,
}

impl CoordinateNormalizer {
    pub fn new(offset: f32) -> Self {
        Self { offset }
    }

    pub fn normalize(&self, frame: &ValidFrame) -> ValidFrame {
        let mut out = frame.clone();
        shift_x(out.points_2d_mut(), 2, self.offset);
        shift_x(out.points_3d_mut(), 3, self.offset);
        out
    }
}

fn shift_x(values: &mut [f32], stride: usize, offset: f32) {
    for x in values.iter_mut().step_by(stride) {
        *x -= offset;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::{POINTS_2D_LEN, POINTS_3D_LEN};

    fn ramp_frame() -> ValidFrame {
        let mut p2 = [0.0; POINTS_2D_LEN];
        for (i, v) in p2.iter_mut().enumerate() {
            // x = 80, 82, 84...、y = 0
            *v = if i % 2 == 0 { 80.0 + i as f32 } else { 0.0 };
        }
        let mut p3 = [0.0; POINTS_3D_LEN];
        for (i, v) in p3.iter_mut().enumerate() {
            *v = 100.0 + i as f32;
        }
        ValidFrame::new(p2, p3)
    }

    #[test]
    fn test_shift_2d_x_only() {
        let out = CoordinateNormalizer::new(80.0).normalize(&ramp_frame());
        assert_eq!(&out.points_2d()[..4], &[0.0, 0.0, 2.0, 0.0]);
        for (i, v) in out.points_2d().iter().enumerate() {
            let expected = if i % 2 == 0 { i as f32 } else { 0.0 };
            assert_eq!(*v, expected);
        }
    }

    #[test]
    fn test_shift_3d_x_only() {
        let input = ramp_frame();
        let out = CoordinateNormalizer::new(80.0).normalize(&input);
        for (i, (a, b)) in input.points_3d().iter().zip(out.points_3d()).enumerate() {
            if i % 3 == 0 {
                assert_eq!(*b, a - 80.0);
            } else {
                assert_eq!(b, a);
            }
        }
    }

    #[test]
    fn test_zero_offset_is_identity() {
        let once = CoordinateNormalizer::new(80.0).normalize(&ramp_frame());
        let again = CoordinateNormalizer::new(0.0).normalize(&once);
        assert_eq!(once, again);
    }

    #[test]
    fn test_input_untouched() {
        let input = ramp_frame();
        let _ = CoordinateNormalizer::new(80.0).normalize(&input);
        assert_eq!(input, ramp_frame());
    }
}
