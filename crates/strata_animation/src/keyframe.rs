//! Keyframes
//!
//! A keyframe interpolates one property of one target between two values over
//! a window of the parent timeline's normalized span.

use crate::easing::Easing;
use crate::property::{PropertyPath, Target};

/// Normalized starts and ends are quotients of authored times; anything this
/// close to the end edge counts as past it.
const EDGE_EPSILON: f32 = 1e-6;

/// Single interpolation segment
#[derive(Clone, Debug, PartialEq)]
pub struct Keyframe {
    pub target: Target,
    pub property: PropertyPath,
    pub from: f32,
    pub to: f32,
    pub easing: Easing,
    /// Start as a fraction of the timeline span
    pub start: f32,
    /// Duration as a fraction of the timeline span
    pub duration: f32,
}

impl Keyframe {
    pub fn new(target: Target, property: PropertyPath, from: f32, to: f32) -> Self {
        Self {
            target,
            property,
            from,
            to,
            easing: Easing::Linear,
            start: 0.0,
            duration: 1.0,
        }
    }

    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Place the keyframe at `[start, start + duration]`
    pub fn span(mut self, start: f32, duration: f32) -> Self {
        self.start = start;
        self.duration = duration;
        self
    }

    pub fn end(&self) -> f32 {
        self.start + self.duration
    }

    /// `clamp((p - start) / duration, 0, 1)`; zero-length keyframes step at `start`
    ///
    /// The window edges are resolved before dividing so that `p == end()`
    /// lands on exactly 1.
    pub fn local_progress(&self, p: f32) -> f32 {
        if self.duration <= 0.0 {
            return if p >= self.start { 1.0 } else { 0.0 };
        }
        if p >= self.end() - EDGE_EPSILON {
            return 1.0;
        }
        if p <= self.start {
            return 0.0;
        }
        ((p - self.start) / self.duration).clamp(0.0, 1.0)
    }

    /// Value at timeline progress `p`
    ///
    /// Exactly `from` before the window and exactly `to` after it.
    pub fn sample(&self, p: f32) -> f32 {
        let lp = self.local_progress(p);
        if lp <= 0.0 {
            return self.from;
        }
        if lp >= 1.0 {
            return self.to;
        }
        self.from + (self.to - self.from) * self.easing.ease(lp)
    }

    /// Same target and property as `other`
    pub fn same_channel(&self, other: &Keyframe) -> bool {
        self.property == other.property && self.target == other.target
    }

    pub(crate) fn is_valid(&self) -> bool {
        self.from.is_finite()
            && self.to.is_finite()
            && self.start.is_finite()
            && self.duration.is_finite()
            && self.duration >= 0.0
    }
}
