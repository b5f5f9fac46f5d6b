//! Viewport classification
//!
//! A coarse device-capability bucket derived from the logical window width.
//! Desktop runs the full effect set; Mobile drops the desktop-only ones.

/// Logical width below which the viewport counts as mobile
pub const DEFAULT_BREAKPOINT: f32 = 768.0;

/// Device class gating which effects run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ViewportClass {
    #[default]
    Desktop,
    Mobile,
}

impl ViewportClass {
    pub fn is_desktop(&self) -> bool {
        matches!(self, ViewportClass::Desktop)
    }

    pub fn is_mobile(&self) -> bool {
        matches!(self, ViewportClass::Mobile)
    }
}

/// Classify a logical width against the default breakpoint
pub fn classify(width: f32) -> ViewportClass {
    classify_with(width, DEFAULT_BREAKPOINT)
}

/// Classify a logical width; unknown or empty widths resolve to Desktop
pub fn classify_with(width: f32, breakpoint: f32) -> ViewportClass {
    if !width.is_finite() || width <= 0.0 {
        return ViewportClass::Desktop;
    }
    if width < breakpoint {
        ViewportClass::Mobile
    } else {
        ViewportClass::Desktop
    }
}

/// Window size in logical pixels
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub scale_factor: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32, scale_factor: f32) -> Self {
        Self {
            width,
            height,
            scale_factor,
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280.0, 800.0, 1.0)
    }
}

/// A class change reported by [`ViewportClassifier::observe`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ViewportTransition {
    pub from: ViewportClass,
    pub to: ViewportClass,
}

/// Tracks the current viewport and its class
#[derive(Clone, Debug)]
pub struct ViewportClassifier {
    breakpoint: f32,
    viewport: Viewport,
    class: ViewportClass,
}

impl ViewportClassifier {
    pub fn new(breakpoint: f32, viewport: Viewport) -> Self {
        Self {
            breakpoint,
            viewport,
            class: classify_with(viewport.width, breakpoint),
        }
    }

    pub fn class(&self) -> ViewportClass {
        self.class
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn breakpoint(&self) -> f32 {
        self.breakpoint
    }

    /// Record a new viewport and report whether the class changed
    pub fn observe(&mut self, viewport: Viewport) -> Option<ViewportTransition> {
        self.viewport = viewport;
        let class = classify_with(viewport.width, self.breakpoint);
        if class == self.class {
            return None;
        }
        let transition = ViewportTransition {
            from: self.class,
            to: class,
        };
        self.class = class;
        tracing::info!(
            "viewport: {:?} -> {:?} at {}px",
            transition.from,
            transition.to,
            viewport.width
        );
        Some(transition)
    }
}
