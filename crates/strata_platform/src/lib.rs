//! Strata platform layer
//!
//! Everything between the windowing backend and the motion components:
//!
//! - [`Event`]: logical-pixel input events (resize, pointer, wheel, touch)
//! - [`EventBus`]: prioritized listeners with disposer-based unsubscription
//! - [`FrameScheduler`]: one per-frame tick running callbacks in a fixed phase order
//! - [`ViewportClassifier`]: desktop/mobile classification of the window width
//!
//! All state is single-threaded and owned by whoever constructs it; there are
//! no process-wide singletons, so independent stages can coexist (tests do).

pub mod bus;
pub mod error;
pub mod event;
pub mod frame;
pub mod viewport;

pub use bus::{DispatchOutcome, EventBus, ListenerId, Propagation, Subscription};
pub use error::{PlatformError, Result};
pub use event::{Event, EventKind, ScrollPhase, TouchPhase};
pub use frame::{
    FrameCallbackId, FrameContext, FrameHandle, FramePhase, FrameScheduler, FrameStats,
};
pub use viewport::{
    classify, classify_with, Viewport, ViewportClass, ViewportClassifier, ViewportTransition,
    DEFAULT_BREAKPOINT,
};
