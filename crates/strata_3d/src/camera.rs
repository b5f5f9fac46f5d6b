//! Perspective camera

use strata_core::{Mat4, Vec3};

/// Perspective camera positioned by translation and Euler XYZ rotation
#[derive(Clone, Debug, PartialEq)]
pub struct PerspectiveCamera {
    /// Vertical field of view in degrees
    pub fov: f32,
    /// Width / height
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub rotation: Vec3,
}

impl PerspectiveCamera {
    pub fn new(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            fov,
            aspect,
            near,
            far,
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
        }
    }

    /// Aspect from a logical size; a zero height keeps the previous aspect
    pub fn set_viewport(&mut self, width: f32, height: f32) {
        if width > 0.0 && height > 0.0 {
            self.aspect = width / height;
        }
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::rigid_inverse(self.rotation, self.position)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix().mul(&self.view_matrix())
    }
}

/// Slow drift applied to the camera while nothing else moves it
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IdleOscillation {
    /// Rest position the drift is centered on
    pub origin: Vec3,
    pub amplitude: f32,
    /// Radians per millisecond
    pub rate: f32,
}

impl IdleOscillation {
    pub fn new(origin: Vec3) -> Self {
        Self {
            origin,
            amplitude: 0.0005,
            rate: 0.0001,
        }
    }

    /// Camera x and z at `time_ms`
    pub fn offset_at(&self, time_ms: f64) -> (f32, f32) {
        let t = (time_ms * self.rate as f64) as f32;
        (
            self.origin.x + t.sin() * self.amplitude,
            self.origin.z + t.cos() * self.amplitude,
        )
    }

    pub fn apply(&self, camera: &mut PerspectiveCamera, time_ms: f64) {
        let (x, z) = self.offset_at(time_ms);
        camera.position.x = x;
        camera.position.z = z;
    }
}
