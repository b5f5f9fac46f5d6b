//! Strata motion
//!
//! Everything that turns input into motion:
//!
//! - **Easing**: named curves and cubic beziers, parsed from authoring strings
//! - **Springs**: RK4 damped springs used by the pointer follower
//! - **Timelines**: keyframe tracks grouped under a scroll or visibility trigger
//! - **Timeline engine**: per-frame state machines writing into a [`PropertySink`]
//! - **Scroll progress**: region-to-viewport edge mapping onto `[0, 1]`
//! - **Visibility**: threshold crossings for one-shot triggers
//! - **Smooth scroll**: eased wheel glide with direct touch passthrough
//!
//! # Example
//!
//! ```ignore
//! use strata_animation::*;
//!
//! let span = ScrollSpan::parse("top bottom", "bottom top")?;
//! let fade = TimelineBuilder::new("fade", Trigger::scrubbed("about", span))
//!     .add("opacity", Tween::new(Target::element("about"), PropertyPath::Opacity, 0.0, 1.0), Position::At(0.0))
//!     .build()?;
//!
//! let mut engine = TimelineEngine::new();
//! let id = engine.add(fade);
//! engine.set_progress(id, 0.5);
//! engine.advance(now, &mut sink);
//! ```

pub mod easing;
pub mod engine;
pub mod error;
pub mod keyframe;
pub mod pointer;
pub mod progress;
pub mod property;
pub mod smooth_scroll;
pub mod spring;
pub mod timeline;
pub mod track;
pub mod visibility;

pub use easing::Easing;
pub use engine::{EngineStats, TimelineEngine, TimelineId};
pub use error::{AnimationError, Result};
pub use keyframe::Keyframe;
pub use pointer::{GlowLayer, PointerState, PointerTracker, GLOW_LAYERS};
pub use progress::{
    Anchor, Edge, EndEdge, ProgressId, ProgressSample, RegionGeometry, ScrollProgressSource,
    ScrollSpan,
};
pub use property::{PropertyPath, PropertySink, SinkError, Target};
pub use smooth_scroll::{glide, GlideState, SmoothScroll, SmoothScrollConfig};
pub use spring::{Spring, SpringConfig};
pub use timeline::{
    timeline_events, Arming, Position, Timeline, TimelineBuilder, TimelineState, Trigger, Tween,
};
pub use track::AnimationTrack;
pub use visibility::{visible_ratio, RootMargin, VisibilityChange, VisibilityId, VisibilityObserver};
