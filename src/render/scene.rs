use nalgebra::{Matrix4, Point3, Vector3, Vector4};

use crate::config::SceneConfig;

const Z_NEAR: f32 = 0.1;
const Z_FAR: f32 = 1000.0;
/// カメラの奥行き = 画面幅 / この値
const EYE_DISTANCE_DIVISOR: f32 = 4.45;

/// 点群を見るカメラと背景用の行列
#[derive(Debug, Clone, Copy)]
pub struct SceneCamera {
    width: f32,
    height: f32,
    view: Matrix4<f32>,
    projection: Matrix4<f32>,
    skybox_fov_deg: f32,
}

impl SceneCamera {
    pub fn new(width: f32, height: f32, camera_fov_deg: f32, skybox_fov_deg: f32) -> Self {
        let eye = Point3::new(width / 2.0, height / 2.0, width / EYE_DISTANCE_DIVISOR);
        let target = Point3::new(width / 2.0, height / 2.0, 0.0);
        let view = Matrix4::look_at_rh(&eye, &target, &Vector3::y());
        let projection =
            Matrix4::new_perspective(width / height, camera_fov_deg.to_radians(), Z_NEAR, Z_FAR);
        Self {
            width,
            height,
            view,
            projection,
            skybox_fov_deg,
        }
    }

    pub fn from_config(config: &SceneConfig) -> Self {
        Self::new(
            config.width as f32,
            config.height as f32,
            config.camera_fov_deg,
            config.skybox_fov_deg,
        )
    }

    pub fn view(&self) -> &Matrix4<f32> {
        &self.view
    }

    /// 平行移動を除いたビュー行列と広角射影の積の逆行列（背景の視線方向の復元用）
    pub fn skybox_inverse_view_projection(&self) -> Option<Matrix4<f32>> {
        let mut rotation_only = self.view;
        rotation_only[(0, 3)] = 0.0;
        rotation_only[(1, 3)] = 0.0;
        rotation_only[(2, 3)] = 0.0;
        let zoomed = Matrix4::new_perspective(
            self.width / self.height,
            self.skybox_fov_deg.to_radians(),
            Z_NEAR,
            Z_FAR,
        );
        (zoomed * rotation_only).try_inverse()
    }

    /// 各ピクセル中心を通る背景の視線方向（行優先、正規化済み）
    pub fn skybox_rays(&self) -> Option<Vec<Vector3<f32>>> {
        let inverse = self.skybox_inverse_view_projection()?;
        let (w, h) = (self.width as usize, self.height as usize);
        let mut rays = Vec::with_capacity(w * h);
        for py in 0..h {
            for px in 0..w {
                let ndc_x = (px as f32 + 0.5) / self.width * 2.0 - 1.0;
                let ndc_y = 1.0 - (py as f32 + 0.5) / self.height * 2.0;
                let far = inverse * Vector4::new(ndc_x, ndc_y, 1.0, 1.0);
                rays.push((far.xyz() / far.w).normalize());
            }
        }
        Some(rays)
    }

    /// z=0 平面上の点をウィンドウのピクセル座標へ。カメラの後ろなら None
    pub fn project_to_pixel(&self, x: f32, y: f32) -> Option<(i32, i32)> {
        let clip = self.projection * self.view * Vector4::new(x, y, 0.0, 1.0);
        if clip.w <= 0.0 {
            return None;
        }
        let ndc_x = clip.x / clip.w;
        let ndc_y = clip.y / clip.w;
        let px = (ndc_x + 1.0) * 0.5 * self.width;
        let py = (1.0 - ndc_y) * 0.5 * self.height;
        Some((px.round() as i32, py.round() as i32))
    }
}

/// 視線方向からキューブマップの面 (+X, -X, +Y, -Y, +Z, -Z) と面内座標 (u, v) を求める
///
/// 面の向きは OpenGL のキューブマップ規約。u, v は [0, 1]、v は画像の下向き。
pub fn cube_face_uv(dir: &Vector3<f32>) -> (usize, f32, f32) {
    let (ax, ay, az) = (dir.x.abs(), dir.y.abs(), dir.z.abs());
    let (face, sc, tc, ma) = if ax >= ay && ax >= az {
        if dir.x > 0.0 {
            (0, -dir.z, -dir.y, ax)
        } else {
            (1, dir.z, -dir.y, ax)
        }
    } else if ay >= az {
        if dir.y > 0.0 {
            (2, dir.x, dir.z, ay)
        } else {
            (3, dir.x, -dir.z, ay)
        }
    } else if dir.z > 0.0 {
        (4, dir.x, -dir.y, az)
    } else {
        (5, -dir.x, -dir.y, az)
    };
    if ma == 0.0 {
        return (5, 0.5, 0.5);
    }
    (face, (sc / ma + 1.0) * 0.5, (tc / ma + 1.0) * 0.5)
}
