//! Strata application
//!
//! Ties the motion, platform and 3D crates into one mounted page.
//!
//! # Example (Headless Stage)
//!
//! ```ignore
//! use strata_app::prelude::*;
//!
//! let viewport = Viewport::new(1280.0, 800.0, 2.0);
//! let page = authoring::page(viewport)?;
//! let mut stage = Stage::mount(&StrataConfig::default(), page, viewport, |_, _, _| {
//!     Err(SceneError::MissingSurface("offscreen".into()))
//! })?;
//!
//! stage.dispatch(&Event::Wheel { delta_x: 0.0, delta_y: 120.0, phase: ScrollPhase::Moved });
//! stage.tick(0.016);
//! stage.unmount();
//! ```
//!
//! # Example (Windowed Application)
//!
//! ```ignore
//! fn main() -> strata_app::Result<()> {
//!     strata_app::windowed::run(strata_app::StrataConfig::default())
//! }
//! ```

pub mod authoring;
pub mod config;
pub mod document;
mod error;
pub mod logging;
pub mod stage;

#[cfg(feature = "windowed")]
pub mod windowed;

#[cfg(test)]
mod tests;

pub use authoring::Page;
pub use config::StrataConfig;
pub use document::{
    Document, DocumentError, ElementSpec, ElementStyle, Extent, InputMask, Placement,
};
pub use error::{Result, StrataError};
pub use stage::{PressStats, Stage, StageState};

/// Prelude module - import everything commonly needed
pub mod prelude {
    pub use crate::authoring::{self, Page};
    pub use crate::config::StrataConfig;
    pub use crate::document::{Document, ElementSpec, Extent, Placement};
    pub use crate::error::{Result, StrataError};
    pub use crate::stage::Stage;

    pub use strata_3d::{FrameRenderer, OverlayQuad, RenderQuality, SceneError, SurfaceSize};
    pub use strata_animation::{PropertyPath, Target, TimelineState};
    pub use strata_platform::{Event, ScrollPhase, TouchPhase, Viewport, ViewportClass};
}
