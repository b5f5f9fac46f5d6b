//! Rendering
//!
//! The scene is drawn into an offscreen target whose resolution is the
//! logical size times a capped pixel ratio, then composited onto the window
//! surface together with the 2D overlay (progress bar, pointer glows, panels).
//!
//! GPU work lives in [`SceneRenderer`]; everything above it talks to the
//! [`FrameRenderer`] trait so the stage runs headless in tests.

mod overlay;
mod pipelines;
mod renderer;
mod shaders;
mod uniforms;

pub use overlay::{OverlayInstance, OverlayKind, OverlayQuad};
pub use renderer::SceneRenderer;
pub use uniforms::{align_to, FrameUniform, ObjectUniform, ScreenUniform};

use crate::error::RenderError;
use crate::scene::Scene;

/// Window size in logical pixels plus the display scale factor
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceSize {
    pub width: f32,
    pub height: f32,
    pub scale_factor: f32,
}

impl SurfaceSize {
    pub fn new(width: f32, height: f32, scale_factor: f32) -> Self {
        Self {
            width,
            height,
            scale_factor,
        }
    }

    /// Window surface size in physical pixels, at least 1x1
    pub fn physical(&self) -> (u32, u32) {
        scaled_size(self.width, self.height, self.scale_factor)
    }

    pub fn aspect(&self) -> f32 {
        if self.height > 0.0 {
            self.width / self.height
        } else {
            1.0
        }
    }
}

/// Pixel ratio ceiling for the offscreen scene target
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderQuality {
    pub pixel_ratio_cap: f32,
}

impl RenderQuality {
    pub fn desktop() -> Self {
        Self {
            pixel_ratio_cap: 1.75,
        }
    }

    pub fn mobile() -> Self {
        Self {
            pixel_ratio_cap: 1.0,
        }
    }

    /// Effective pixel ratio for a display `scale_factor`
    pub fn pixel_ratio(&self, scale_factor: f32) -> f32 {
        let scale = if scale_factor.is_finite() && scale_factor > 0.0 {
            scale_factor
        } else {
            1.0
        };
        scale.min(self.pixel_ratio_cap.max(0.25))
    }

    /// Offscreen scene target size for `size`
    pub fn target_size(&self, size: &SurfaceSize) -> (u32, u32) {
        scaled_size(size.width, size.height, self.pixel_ratio(size.scale_factor))
    }
}

impl Default for RenderQuality {
    fn default() -> Self {
        Self::desktop()
    }
}

fn scaled_size(width: f32, height: f32, ratio: f32) -> (u32, u32) {
    let px = |v: f32| {
        let v = (v.max(0.0) * ratio).round();
        if v.is_finite() {
            (v as u32).max(1)
        } else {
            1
        }
    };
    (px(width), px(height))
}

/// Consumer of per-frame scene state
pub trait FrameRenderer {
    /// Window size or scale factor changed
    fn resize(&mut self, size: SurfaceSize);

    /// Switch the pixel ratio cap (desktop/mobile profile)
    fn set_quality(&mut self, quality: RenderQuality);

    /// Draw one frame of `scene` with `overlay` on top
    fn render(&mut self, scene: &Scene, overlay: &[OverlayQuad]) -> Result<(), RenderError>;

    /// Release every GPU resource; safe to call repeatedly
    fn dispose(&mut self);

    fn is_disposed(&self) -> bool;
}
