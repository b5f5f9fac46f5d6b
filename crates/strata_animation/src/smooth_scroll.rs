//! Smooth scroll physics
//!
//! Replaces raw wheel input with an eased glide. Every wheel burst moves the
//! target and restarts the glide from wherever the position currently is, so
//! fast consecutive bursts accumulate without jumps. Touch drags follow the
//! finger directly.

/// Glide parameters
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SmoothScrollConfig {
    /// Seconds from burst to rest
    pub duration: f32,
    pub wheel_multiplier: f32,
    pub touch_multiplier: f32,
}

impl Default for SmoothScrollConfig {
    fn default() -> Self {
        Self {
            duration: 1.2,
            wheel_multiplier: 1.0,
            touch_multiplier: 2.0,
        }
    }
}

/// Exponential glide curve, reaching exactly 1 slightly before `t = 1`
pub fn glide(t: f32) -> f32 {
    (1.001 - 2f32.powf(-10.0 * t)).min(1.0)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GlideState {
    #[default]
    Idle,
    Gliding,
}

/// Eased scroll position driven by wheel and touch deltas
#[derive(Clone, Debug)]
pub struct SmoothScroll {
    config: SmoothScrollConfig,
    state: GlideState,
    position: f32,
    target: f32,
    origin: f32,
    elapsed: f32,
    limit: f32,
}

impl SmoothScroll {
    pub fn new(config: SmoothScrollConfig, limit: f32) -> Self {
        Self {
            config,
            state: GlideState::Idle,
            position: 0.0,
            target: 0.0,
            origin: 0.0,
            elapsed: 0.0,
            limit: limit.max(0.0),
        }
    }

    pub fn config(&self) -> SmoothScrollConfig {
        self.config
    }

    pub fn position(&self) -> f32 {
        self.position
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn limit(&self) -> f32 {
        self.limit
    }

    pub fn is_animating(&self) -> bool {
        self.state == GlideState::Gliding
    }

    /// Largest reachable offset; shrinking it clamps position and target
    pub fn set_limit(&mut self, limit: f32) {
        self.limit = limit.max(0.0);
        self.target = self.target.min(self.limit);
        if self.position > self.limit {
            self.position = self.limit;
            self.origin = self.position;
        }
    }

    /// Wheel delta in document direction
    pub fn on_wheel(&mut self, delta_y: f32) {
        if !delta_y.is_finite() {
            return;
        }
        let target = (self.target + delta_y * self.config.wheel_multiplier).clamp(0.0, self.limit);
        self.glide_to(target);
    }

    /// Touch drag delta, applied without smoothing
    pub fn on_touch(&mut self, delta_y: f32) {
        if !delta_y.is_finite() {
            return;
        }
        let position =
            (self.position + delta_y * self.config.touch_multiplier).clamp(0.0, self.limit);
        self.jump_to(position);
    }

    /// Scroll to `offset`, gliding unless `immediate`
    pub fn scroll_to(&mut self, offset: f32, immediate: bool) {
        let offset = offset.clamp(0.0, self.limit);
        if immediate {
            self.jump_to(offset);
        } else {
            self.glide_to(offset);
        }
    }

    /// Advance the glide; returns true while the position is still moving
    pub fn advance(&mut self, dt: f32) -> bool {
        if self.state == GlideState::Idle {
            return false;
        }
        self.elapsed += dt.max(0.0);
        let t = if self.config.duration > 0.0 {
            (self.elapsed / self.config.duration).min(1.0)
        } else {
            1.0
        };
        let eased = glide(t);
        self.position = self.origin + (self.target - self.origin) * eased;
        if eased >= 1.0 {
            self.position = self.target;
            self.state = GlideState::Idle;
            return false;
        }
        true
    }

    fn glide_to(&mut self, target: f32) {
        self.target = target;
        self.origin = self.position;
        self.elapsed = 0.0;
        self.state = if (self.target - self.position).abs() > f32::EPSILON {
            GlideState::Gliding
        } else {
            GlideState::Idle
        };
    }

    fn jump_to(&mut self, offset: f32) {
        self.position = offset;
        self.target = offset;
        self.origin = offset;
        self.elapsed = 0.0;
        self.state = GlideState::Idle;
    }
}
