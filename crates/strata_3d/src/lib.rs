//! # Strata 3D
//!
//! Decorative 3D scene for the Strata page.
//!
//! This crate provides:
//! - **Scene graph** of named meshes, lights and one perspective camera
//! - **PBR materials and lights** (metallic-roughness, physical falloff)
//! - **Property sink** so timelines can write `scale`, `emissiveIntensity`,
//!   light intensity and camera transforms by object name
//! - **wgpu renderer** with a capped-resolution offscreen target and a 2D overlay
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use strata_3d::prelude::*;
//!
//! let mut scene = build_chip_scene(16.0 / 9.0)?;
//! scene.tick(now_ms);
//! renderer.render(&scene, &overlay)?;
//! ```

// Camera and idle motion
pub mod camera;

pub mod error;

// Geometry primitives
pub mod geometry;

// Lighting
pub mod lights;

// Material system
pub mod materials;

// GPU rendering
pub mod render;

// Scene graph
pub mod scene;

pub use camera::{IdleOscillation, PerspectiveCamera};
pub use error::{RenderError, Result, SceneError};
pub use geometry::{BoxGeometry, Geometry, Vertex};
pub use lights::{AmbientLight, DirectionalLight, Light, PointLight};
pub use materials::StandardMaterial;
pub use render::{
    FrameRenderer, OverlayKind, OverlayQuad, RenderQuality, SceneRenderer, SurfaceSize,
};
pub use scene::{build_chip_scene, chip, GeometryId, Mesh, Scene, Transform, CAMERA};

/// Prelude module - import everything commonly needed
pub mod prelude {
    pub use crate::camera::{IdleOscillation, PerspectiveCamera};
    pub use crate::error::{RenderError, SceneError};
    pub use crate::lights::Light;
    pub use crate::materials::StandardMaterial;
    pub use crate::render::{FrameRenderer, OverlayQuad, RenderQuality, SurfaceSize};
    pub use crate::scene::{build_chip_scene, chip, Mesh, Scene, Transform};
}
