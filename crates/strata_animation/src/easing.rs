//! Easing curves
//!
//! Every curve maps `0 -> 0` and `1 -> 1`; input outside `[0, 1]` is clamped.
//! Curves parse from the authoring vocabulary used in timeline definitions:
//! `"none"`, `"power2.inOut"`, `"back.out(1.5)"`, `"expo.out"`, `"ease-out"`,
//! `"cubic-bezier(0.22, 1, 0.36, 1)"`.

use std::str::FromStr;

use crate::error::AnimationError;

/// Easing function
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Easing {
    #[default]
    Linear,
    /// CSS `ease-in`
    EaseIn,
    /// CSS `ease-out`
    EaseOut,
    /// CSS `ease-in-out`
    EaseInOut,
    EaseInQuad,
    EaseOutQuad,
    EaseInOutQuad,
    EaseInCubic,
    EaseOutCubic,
    EaseInOutCubic,
    /// Cubic ease-out that overshoots by the given amount before settling
    BackOut(f32),
    /// Exponential glide, `min(1, 1.001 - 2^(-10t))`
    ExpoOut,
    /// CSS `cubic-bezier(x1, y1, x2, y2)`
    CubicBezier(f32, f32, f32, f32),
}

impl Easing {
    /// Apply the curve to `t`
    pub fn ease(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        if t <= 0.0 {
            return 0.0;
        }
        if t >= 1.0 {
            return 1.0;
        }
        match *self {
            Easing::Linear => t,
            Easing::EaseIn => cubic_bezier(0.42, 0.0, 1.0, 1.0, t),
            Easing::EaseOut => cubic_bezier(0.0, 0.0, 0.58, 1.0, t),
            Easing::EaseInOut => cubic_bezier(0.42, 0.0, 0.58, 1.0, t),
            Easing::EaseInQuad => t * t,
            Easing::EaseOutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Easing::EaseInOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Easing::EaseInCubic => t * t * t,
            Easing::EaseOutCubic => 1.0 - (1.0 - t).powi(3),
            Easing::EaseInOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Easing::BackOut(overshoot) => {
                let u = t - 1.0;
                u * u * ((overshoot + 1.0) * u + overshoot) + 1.0
            }
            Easing::ExpoOut => (1.001 - 2f32.powf(-10.0 * t)).min(1.0),
            Easing::CubicBezier(x1, y1, x2, y2) => cubic_bezier(x1, y1, x2, y2, t),
        }
    }
}

/// Solve a CSS cubic bezier for `y` at horizontal position `x`
fn cubic_bezier(x1: f32, y1: f32, x2: f32, y2: f32, x: f32) -> f32 {
    // Polynomial coefficients of B(s) with fixed endpoints (0,0) and (1,1)
    let cx = 3.0 * x1;
    let bx = 3.0 * (x2 - x1) - cx;
    let ax = 1.0 - cx - bx;
    let cy = 3.0 * y1;
    let by = 3.0 * (y2 - y1) - cy;
    let ay = 1.0 - cy - by;

    let sample_x = |s: f32| ((ax * s + bx) * s + cx) * s;
    let sample_y = |s: f32| ((ay * s + by) * s + cy) * s;
    let slope_x = |s: f32| (3.0 * ax * s + 2.0 * bx) * s + cx;

    // Newton-Raphson first, bisection when the slope is too flat
    let mut s = x;
    for _ in 0..8 {
        let err = sample_x(s) - x;
        if err.abs() < 1e-6 {
            return sample_y(s);
        }
        let d = slope_x(s);
        if d.abs() < 1e-6 {
            break;
        }
        s -= err / d;
    }

    let (mut lo, mut hi) = (0.0f32, 1.0f32);
    s = x;
    for _ in 0..32 {
        let v = sample_x(s);
        if (v - x).abs() < 1e-6 {
            break;
        }
        if v < x {
            lo = s;
        } else {
            hi = s;
        }
        s = (lo + hi) * 0.5;
    }
    sample_y(s)
}

impl FromStr for Easing {
    type Err = AnimationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let unknown = || AnimationError::UnknownEasing(text.to_string());

        if let Some(args) = call_args(text, "cubic-bezier") {
            let values = parse_floats(args).ok_or_else(unknown)?;
            return match values.as_slice() {
                [x1, y1, x2, y2] => Ok(Easing::CubicBezier(*x1, *y1, *x2, *y2)),
                _ => Err(unknown()),
            };
        }
        if let Some(args) = call_args(text, "back.out") {
            let amount = args.trim().parse::<f32>().map_err(|_| unknown())?;
            return Ok(Easing::BackOut(amount));
        }

        let easing = match text {
            "none" | "linear" => Easing::Linear,
            "ease-in" => Easing::EaseIn,
            "ease-out" => Easing::EaseOut,
            "ease-in-out" => Easing::EaseInOut,
            "power1.in" => Easing::EaseInQuad,
            "power1.out" | "power1" => Easing::EaseOutQuad,
            "power1.inOut" => Easing::EaseInOutQuad,
            "power2.in" => Easing::EaseInCubic,
            "power2.out" | "power2" => Easing::EaseOutCubic,
            "power2.inOut" => Easing::EaseInOutCubic,
            "back.out" => Easing::BackOut(1.70158),
            "expo.out" => Easing::ExpoOut,
            _ => return Err(unknown()),
        };
        Ok(easing)
    }
}

/// `name(args)` -> `args`
fn call_args<'a>(text: &'a str, name: &str) -> Option<&'a str> {
    text.strip_prefix(name)?
        .trim_start()
        .strip_prefix('(')?
        .strip_suffix(')')
}

fn parse_floats(args: &str) -> Option<Vec<f32>> {
    args.split(',').map(|v| v.trim().parse().ok()).collect()
}
