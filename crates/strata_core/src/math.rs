//! Vector and matrix math
//!
//! Column-major matrices, right-handed coordinates, depth range 0..1 (wgpu).

use std::ops::{Add, Mul, Neg, Sub};

// ─────────────────────────────────────────────────────────────────────────────
// Vec3
// ─────────────────────────────────────────────────────────────────────────────

/// 3D vector
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3::new(0.0, 0.0, 0.0);
    pub const ONE: Vec3 = Vec3::new(1.0, 1.0, 1.0);
    pub const UP: Vec3 = Vec3::new(0.0, 1.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub const fn splat(v: f32) -> Self {
        Self::new(v, v, v)
    }

    pub fn dot(self, other: Vec3) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(self, other: Vec3) -> Vec3 {
        Vec3::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Unit vector in the same direction, or zero for a zero-length input
    pub fn normalize(self) -> Vec3 {
        let len = self.length();
        if len > f32::EPSILON {
            self * (1.0 / len)
        } else {
            Vec3::ZERO
        }
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;
    fn mul(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Vec3 {
    type Output = Vec3;
    fn neg(self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Rect
// ─────────────────────────────────────────────────────────────────────────────

/// Axis-aligned rectangle in logical pixels (y grows downward)
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const ZERO: Rect = Rect::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px < self.right() && py >= self.y && py < self.bottom()
    }

    /// Overlapping area of two rectangles, `None` when they do not touch
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right > x && bottom > y {
            Some(Rect::new(x, y, right - x, bottom - y))
        } else {
            None
        }
    }

    /// Grow (positive) or shrink (negative) each edge independently
    pub fn inset_by(&self, top: f32, right: f32, bottom: f32, left: f32) -> Rect {
        Rect::new(
            self.x - left,
            self.y - top,
            self.width + left + right,
            self.height + top + bottom,
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Mat4
// ─────────────────────────────────────────────────────────────────────────────

/// Column-major 4x4 matrix
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Mat4 {
    pub cols: [[f32; 4]; 4],
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mat4 {
    pub const IDENTITY: Mat4 = Mat4 {
        cols: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    pub fn translation(v: Vec3) -> Self {
        let mut m = Self::IDENTITY;
        m.cols[3] = [v.x, v.y, v.z, 1.0];
        m
    }

    pub fn scale(v: Vec3) -> Self {
        let mut m = Self::IDENTITY;
        m.cols[0][0] = v.x;
        m.cols[1][1] = v.y;
        m.cols[2][2] = v.z;
        m
    }

    pub fn rotation_x(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        Mat4 {
            cols: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, c, s, 0.0],
                [0.0, -s, c, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    pub fn rotation_y(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        Mat4 {
            cols: [
                [c, 0.0, -s, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [s, 0.0, c, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    pub fn rotation_z(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        Mat4 {
            cols: [
                [c, s, 0.0, 0.0],
                [-s, c, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Rotation from Euler angles applied in XYZ order (`Rx * Ry * Rz`)
    pub fn from_euler_xyz(euler: Vec3) -> Self {
        Self::rotation_x(euler.x)
            .mul(&Self::rotation_y(euler.y))
            .mul(&Self::rotation_z(euler.z))
    }

    /// Translation * rotation * scale
    pub fn from_trs(translation: Vec3, rotation: Vec3, scale: Vec3) -> Self {
        Self::translation(translation)
            .mul(&Self::from_euler_xyz(rotation))
            .mul(&Self::scale(scale))
    }

    /// Multiply two matrices (`self * other`)
    pub fn mul(&self, other: &Mat4) -> Mat4 {
        let mut result = [[0.0f32; 4]; 4];
        for (i, col) in result.iter_mut().enumerate() {
            for (j, cell) in col.iter_mut().enumerate() {
                for k in 0..4 {
                    *cell += self.cols[k][j] * other.cols[i][k];
                }
            }
        }
        Mat4 { cols: result }
    }

    pub fn transpose(&self) -> Mat4 {
        let mut result = [[0.0f32; 4]; 4];
        for (i, col) in self.cols.iter().enumerate() {
            for (j, value) in col.iter().enumerate() {
                result[j][i] = *value;
            }
        }
        Mat4 { cols: result }
    }

    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        let c = &self.cols;
        let x = c[0][0] * p.x + c[1][0] * p.y + c[2][0] * p.z + c[3][0];
        let y = c[0][1] * p.x + c[1][1] * p.y + c[2][1] * p.z + c[3][1];
        let z = c[0][2] * p.x + c[1][2] * p.y + c[2][2] * p.z + c[3][2];
        let w = c[0][3] * p.x + c[1][3] * p.y + c[2][3] * p.z + c[3][3];
        if w.abs() > f32::EPSILON {
            Vec3::new(x / w, y / w, z / w)
        } else {
            Vec3::new(x, y, z)
        }
    }

    /// Right-handed perspective projection mapping depth to 0..1
    pub fn perspective_rh(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        let h = 1.0 / (fov_y * 0.5).tan();
        let w = h / aspect;
        let r = far / (near - far);
        Mat4 {
            cols: [
                [w, 0.0, 0.0, 0.0],
                [0.0, h, 0.0, 0.0],
                [0.0, 0.0, r, -1.0],
                [0.0, 0.0, near * r, 0.0],
            ],
        }
    }

    /// Inverse of a rigid transform (rotation + translation only)
    pub fn rigid_inverse(rotation: Vec3, translation: Vec3) -> Mat4 {
        let r_t = Self::from_euler_xyz(rotation).transpose();
        r_t.mul(&Self::translation(-translation))
    }

    /// Normal matrix for a TRS transform: `R * S^-1`
    ///
    /// Collapsed axes (scale ~0) map to zero instead of infinity, so a fully
    /// shrunk object shades as black rather than producing NaNs.
    pub fn normal_matrix(rotation: Vec3, scale: Vec3) -> Mat4 {
        let inv = |s: f32| if s.abs() > 1e-6 { 1.0 / s } else { 0.0 };
        Self::from_euler_xyz(rotation).mul(&Self::scale(Vec3::new(
            inv(scale.x),
            inv(scale.y),
            inv(scale.z),
        )))
    }

    pub fn to_cols_array_2d(&self) -> [[f32; 4]; 4] {
        self.cols
    }
}

/// Euler XYZ angles that orient a camera at `eye` toward `target`
///
/// Exact when the target lies in the camera's YZ plane; otherwise pitch is
/// measured before yaw and drifts slightly.
pub fn look_at_euler(eye: Vec3, target: Vec3) -> Vec3 {
    let dir = (target - eye).normalize();
    let pitch = dir.y.asin();
    let yaw = (-dir.x).atan2(-dir.z);
    Vec3::new(pitch, yaw, 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn test_trs_applies_scale_then_rotation_then_translation() {
        let m = Mat4::from_trs(
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, std::f32::consts::FRAC_PI_2, 0.0),
            Vec3::new(2.0, 1.0, 1.0),
        );
        // (1,0,0) -> scale (2,0,0) -> rotate about y (0,0,-2) -> translate (1,0,-2)
        assert!(approx(
            m.transform_point(Vec3::new(1.0, 0.0, 0.0)),
            Vec3::new(1.0, 0.0, -2.0)
        ));
    }

    #[test]
    fn test_rigid_inverse_undoes_transform() {
        let rotation = Vec3::new(-0.4, 0.2, 0.0);
        let translation = Vec3::new(0.0, 4.0, 7.0);
        let forward = Mat4::from_trs(translation, rotation, Vec3::ONE);
        let inverse = Mat4::rigid_inverse(rotation, translation);
        let p = Vec3::new(0.3, -1.2, 2.5);
        assert!(approx(inverse.transform_point(forward.transform_point(p)), p));
    }

    #[test]
    fn test_look_at_euler_points_down_the_view_axis() {
        let eye = Vec3::new(0.0, 4.0, 7.0);
        let euler = look_at_euler(eye, Vec3::ZERO);
        assert!((euler.x + (4.0f32).atan2(7.0)).abs() < 1e-4);
        assert!(euler.y.abs() < 1e-6);

        // The origin must land on the camera's -Z axis in view space
        let view = Mat4::rigid_inverse(euler, eye);
        let p = view.transform_point(Vec3::ZERO);
        assert!(p.x.abs() < 1e-4 && p.y.abs() < 1e-4 && p.z < 0.0);
    }

    #[test]
    fn test_normal_matrix_handles_zero_scale() {
        let m = Mat4::normal_matrix(Vec3::ZERO, Vec3::new(0.0, 1.0, 0.0));
        assert!(m.cols.iter().flatten().all(|v| v.is_finite()));
    }

    #[test]
    fn test_rect_intersection() {
        let a = Rect::new(0.0, 0.0, 100.0, 100.0);
        let b = Rect::new(50.0, 90.0, 100.0, 100.0);
        let i = a.intersect(&b).unwrap();
        assert_eq!(i, Rect::new(50.0, 90.0, 50.0, 10.0));
        assert!(a.intersect(&Rect::new(200.0, 0.0, 1.0, 1.0)).is_none());
    }
}
