//! Pointer follow
//!
//! Two springs chase the raw pointer position. Consumers draw their glow
//! layers from the smoothed position instead of integrating their own.

use strata_core::Rect;

use crate::spring::{Spring, SpringConfig};

/// Largest integration step; longer frames are split
const MAX_SUBSTEP: f32 = 1.0 / 120.0;

/// Raw and smoothed pointer position, in logical pixels
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerState {
    pub raw_x: f32,
    pub raw_y: f32,
    pub spring_x: f32,
    pub spring_y: f32,
}

/// Radial glow drawn centered on the smoothed pointer
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlowLayer {
    /// Diameter in logical pixels
    pub size: f32,
    /// Center alpha
    pub alpha: f32,
    /// Fraction of the radius where the gradient reaches zero
    pub falloff: f32,
}

impl GlowLayer {
    /// Square bounds centered on `(x, y)`
    pub fn bounds(&self, x: f32, y: f32) -> Rect {
        let half = self.size * 0.5;
        Rect::new(x - half, y - half, self.size, self.size)
    }
}

/// Wide soft glow, then a tighter one on top
pub const GLOW_LAYERS: [GlowLayer; 2] = [
    GlowLayer {
        size: 400.0,
        alpha: 0.08,
        falloff: 0.7,
    },
    GlowLayer {
        size: 200.0,
        alpha: 0.05,
        falloff: 0.6,
    },
];

pub struct PointerTracker {
    raw: (f32, f32),
    x: Spring,
    y: Spring,
}

impl PointerTracker {
    /// Off-screen start position
    pub const START: (f32, f32) = (-100.0, -100.0);

    pub fn new(config: SpringConfig) -> Self {
        let (x, y) = Self::START;
        Self {
            raw: Self::START,
            x: Spring::new(config, x),
            y: Spring::new(config, y),
        }
    }

    pub fn on_pointer_move(&mut self, x: f32, y: f32) {
        if !x.is_finite() || !y.is_finite() {
            return;
        }
        self.raw = (x, y);
        self.x.set_target(x);
        self.y.set_target(y);
    }

    pub fn advance(&mut self, dt: f32) {
        let mut remaining = dt.max(0.0);
        while remaining > 0.0 {
            let step = remaining.min(MAX_SUBSTEP);
            self.x.step(step);
            self.y.step(step);
            remaining -= step;
        }
    }

    pub fn state(&self) -> PointerState {
        PointerState {
            raw_x: self.raw.0,
            raw_y: self.raw.1,
            spring_x: self.x.value(),
            spring_y: self.y.value(),
        }
    }

    pub fn position(&self) -> (f32, f32) {
        (self.x.value(), self.y.value())
    }

    pub fn is_settled(&self) -> bool {
        self.x.is_settled() && self.y.is_settled()
    }

    /// Every glow layer paired with its current bounds
    pub fn glow_layers(&self) -> impl Iterator<Item = (GlowLayer, Rect)> + '_ {
        let (x, y) = self.position();
        GLOW_LAYERS.iter().map(move |layer| (*layer, layer.bounds(x, y)))
    }
}

impl Default for PointerTracker {
    fn default() -> Self {
        Self::new(SpringConfig::pointer())
    }
}
