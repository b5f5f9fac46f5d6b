//! Animation tracks
//!
//! A track is a named, ordered list of keyframes. Starts never decrease in
//! authored order, but keyframes may overlap. When two keyframes in the same
//! track drive the same channel (target + property), the governing one at a
//! progress `p` is the last keyframe that has started, or the first keyframe
//! if none has; this is what makes multi-stop curves such as
//! `opacity: [0, 1, 1, 0]` behave.

use crate::error::{AnimationError, Result};
use crate::keyframe::Keyframe;
use crate::property::{PropertyPath, Target};

/// Named keyframe sequence owned by a timeline
#[derive(Clone, Debug)]
pub struct AnimationTrack {
    name: String,
    keyframes: Vec<Keyframe>,
    /// Previous keyframe on the same channel
    prev_same: Vec<Option<usize>>,
    /// Next keyframe on the same channel
    next_same: Vec<Option<usize>>,
}

impl AnimationTrack {
    /// Validate ordering and build the channel links
    pub fn new(name: impl Into<String>, keyframes: Vec<Keyframe>) -> Result<Self> {
        let name = name.into();
        for (index, kf) in keyframes.iter().enumerate() {
            if !kf.is_valid() {
                return Err(AnimationError::InvalidKeyframe(format!("{name}[{index}]")));
            }
            if index > 0 && kf.start < keyframes[index - 1].start {
                return Err(AnimationError::NonMonotonicTrack { track: name, index });
            }
        }

        let mut prev_same = vec![None; keyframes.len()];
        let mut next_same = vec![None; keyframes.len()];
        for i in 0..keyframes.len() {
            let next = (i + 1..keyframes.len()).find(|&j| keyframes[j].same_channel(&keyframes[i]));
            if let Some(j) = next {
                next_same[i] = Some(j);
                prev_same[j] = Some(i);
            }
        }

        Ok(Self {
            name,
            keyframes,
            prev_same,
            next_same,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    /// Emit every governing keyframe's value at `p`, in authored order
    pub fn evaluate<F>(&self, p: f32, mut write: F)
    where
        F: FnMut(&Target, PropertyPath, f32),
    {
        for (i, kf) in self.keyframes.iter().enumerate() {
            if let Some(next) = self.next_same[i] {
                if self.keyframes[next].start <= p {
                    continue;
                }
            }
            if self.prev_same[i].is_some() && p < kf.start {
                continue;
            }
            write(&kf.target, kf.property, kf.sample(p));
        }
    }

    /// Last keyframe end, as a fraction of the span
    pub fn end(&self) -> f32 {
        self.keyframes
            .iter()
            .map(Keyframe::end)
            .fold(0.0, f32::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fade_in_out() -> AnimationTrack {
        let target = Target::element("section");
        AnimationTrack::new(
            "fade",
            vec![
                Keyframe::new(target.clone(), PropertyPath::Opacity, 0.0, 1.0).span(0.0, 0.2),
                Keyframe::new(target, PropertyPath::Opacity, 1.0, 0.0).span(0.8, 0.2),
            ],
        )
        .unwrap()
    }

    fn sample(track: &AnimationTrack, p: f32) -> Vec<f32> {
        let mut out = Vec::new();
        track.evaluate(p, |_, _, v| out.push(v));
        out
    }

    #[test]
    fn test_multi_stop_channel_has_one_writer() {
        let track = fade_in_out();
        assert_eq!(sample(&track, 0.0), vec![0.0]);
        assert!((sample(&track, 0.1)[0] - 0.5).abs() < 1e-5);
        assert_eq!(sample(&track, 0.5), vec![1.0]);
        assert!((sample(&track, 0.9)[0] - 0.5).abs() < 1e-5);
        assert_eq!(sample(&track, 1.0), vec![0.0]);
    }

    #[test]
    fn test_independent_channels_all_write() {
        let track = AnimationTrack::new(
            "rise",
            vec![
                Keyframe::new(Target::object("a"), PropertyPath::PositionY, -1.0, 0.0),
                Keyframe::new(Target::object("a"), PropertyPath::Opacity, 0.0, 1.0).span(0.5, 0.5),
            ],
        )
        .unwrap();
        assert_eq!(sample(&track, 0.0), vec![-1.0, 0.0]);
        assert_eq!(track.end(), 1.0);
    }

    #[test]
    fn test_rejects_out_of_order_keyframes() {
        let t = Target::object("a");
        let err = AnimationTrack::new(
            "bad",
            vec![
                Keyframe::new(t.clone(), PropertyPath::PositionY, 0.0, 1.0).span(0.5, 0.1),
                Keyframe::new(t, PropertyPath::PositionY, 1.0, 0.0).span(0.2, 0.1),
            ],
        )
        .unwrap_err();
        assert_eq!(
            err,
            AnimationError::NonMonotonicTrack {
                track: "bad".into(),
                index: 1
            }
        );
    }

    #[test]
    fn test_rejects_non_finite_values() {
        let kf = Keyframe::new(Target::object("a"), PropertyPath::Scale, f32::NAN, 1.0);
        assert!(AnimationTrack::new("nan", vec![kf]).is_err());
    }
}
