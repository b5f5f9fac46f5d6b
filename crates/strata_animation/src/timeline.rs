//! Scroll-linked timelines
//!
//! A timeline owns its tracks and the trigger that drives them. Scrubbed
//! timelines map scroll progress straight onto the normalized span; one-shot
//! timelines play once, at wall-clock pace, after their region becomes
//! visible enough.
//!
//! # Example
//!
//! ```ignore
//! let timeline = TimelineBuilder::new("hero", Trigger::scrubbed("hero", span).pinned())
//!     .add("core", Tween::new(core, PropertyPath::Scale, 0.0, 1.0).duration(0.8), "-=0.3".parse()?)
//!     .build()?;
//! ```

use std::str::FromStr;

use crate::easing::Easing;
use crate::error::{AnimationError, Result};
use crate::keyframe::Keyframe;
use crate::progress::{Anchor, Edge, EndEdge, ScrollSpan};
use crate::property::{PropertyPath, Target};
use crate::track::AnimationTrack;
use crate::visibility::RootMargin;

// ============================================================================
// State machine
// ============================================================================

/// Timeline lifecycle
///
/// ```text
/// Idle -> Armed -> Scrubbing            (scrubbed, no terminal state)
///               -> Playing -> Complete  (one-shot)
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TimelineState {
    #[default]
    Idle,
    Armed,
    Scrubbing,
    Playing,
    Complete,
}

/// Event ids understood by [`TimelineState::on_event`]
pub mod timeline_events {
    /// Trigger region crossed its visibility threshold
    pub const ARM: u32 = 1;
    /// First frame after arming a scrubbed timeline
    pub const BEGIN_SCRUB: u32 = 2;
    /// First frame after arming a one-shot timeline
    pub const BEGIN_PLAY: u32 = 3;
    /// One-shot playback reached the end
    pub const FINISH: u32 = 4;
}

impl TimelineState {
    /// Handle an event and return the new state, or None if no transition
    pub fn on_event(&self, event: u32) -> Option<Self> {
        use timeline_events::*;

        match (self, event) {
            (TimelineState::Idle, ARM) => Some(TimelineState::Armed),
            (TimelineState::Armed, BEGIN_SCRUB) => Some(TimelineState::Scrubbing),
            (TimelineState::Armed, BEGIN_PLAY) => Some(TimelineState::Playing),
            (TimelineState::Playing, FINISH) => Some(TimelineState::Complete),
            // Re-arming is never allowed once a timeline has left Idle
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TimelineState::Complete)
    }
}

// ============================================================================
// Trigger
// ============================================================================

/// What arms a timeline
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Arming {
    /// Region visible ratio reaches the trigger threshold
    #[default]
    Visibility,
    /// Scroll passes the start edge of the trigger span
    StartEdge,
}

/// What drives a timeline
#[derive(Clone, Debug, PartialEq)]
pub struct Trigger {
    /// Document region that triggers and measures the timeline
    pub region: String,
    /// Scroll range mapped onto progress
    pub span: ScrollSpan,
    /// Progress-driven (true) or one-shot (false)
    pub scrubbed: bool,
    /// Hold the region on screen for the duration of the span
    pub pinned: bool,
    /// Seconds scrubbed progress takes to catch up with scroll; 0 follows exactly
    pub scrub_lag: f32,
    pub arming: Arming,
    /// Visible ratio that arms the timeline; 0 means any overlap
    pub threshold: f32,
    /// Intersection root adjustment for arming
    pub root_margin: RootMargin,
}

impl Trigger {
    /// Progress-driven trigger over `span`
    pub fn scrubbed(region: impl Into<String>, span: ScrollSpan) -> Self {
        Self {
            region: region.into(),
            span,
            scrubbed: true,
            pinned: false,
            scrub_lag: 0.0,
            arming: Arming::Visibility,
            threshold: 0.0,
            root_margin: RootMargin::NONE,
        }
    }

    /// One-shot trigger armed at `threshold` visibility
    pub fn once(region: impl Into<String>, threshold: f32) -> Self {
        Self {
            region: region.into(),
            // Only used for arming after `arm_at`
            span: ScrollSpan::new(
                Edge::new(Anchor::Start, Anchor::End),
                EndEdge::Edge(Edge::new(Anchor::End, Anchor::Start)),
            ),
            scrubbed: false,
            pinned: false,
            scrub_lag: 0.0,
            arming: Arming::Visibility,
            threshold,
            root_margin: RootMargin::NONE,
        }
    }

    pub fn pinned(mut self) -> Self {
        self.pinned = true;
        self
    }

    /// Ease scrubbed progress toward scroll over roughly `secs`
    pub fn scrub_lag(mut self, secs: f32) -> Self {
        self.scrub_lag = secs.max(0.0);
        self
    }

    /// Arm once scroll passes the start of `span` instead of on visibility
    pub fn arm_at(mut self, span: ScrollSpan) -> Self {
        self.span = span;
        self.arming = Arming::StartEdge;
        self
    }

    pub fn root_margin(mut self, margin: RootMargin) -> Self {
        self.root_margin = margin;
        self
    }
}

// ============================================================================
// Timeline
// ============================================================================

/// Ordered tracks plus their trigger
#[derive(Clone, Debug)]
pub struct Timeline {
    name: String,
    trigger: Trigger,
    tracks: Vec<AnimationTrack>,
    duration_secs: f32,
}

impl Timeline {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn trigger(&self) -> &Trigger {
        &self.trigger
    }

    pub fn tracks(&self) -> &[AnimationTrack] {
        &self.tracks
    }

    pub fn is_scrubbed(&self) -> bool {
        self.trigger.scrubbed
    }

    /// Wall-clock length of one-shot playback
    pub fn duration_secs(&self) -> f32 {
        self.duration_secs
    }

    /// Emit every track's writes at progress `p`, in declaration order
    pub fn evaluate<F>(&self, p: f32, mut write: F)
    where
        F: FnMut(&Target, PropertyPath, f32),
    {
        for track in &self.tracks {
            track.evaluate(p, &mut write);
        }
    }

    /// Every (target, property) the timeline writes
    pub fn channels(&self) -> impl Iterator<Item = (&Target, PropertyPath)> {
        self.tracks
            .iter()
            .flat_map(|t| t.keyframes().iter().map(|k| (&k.target, k.property)))
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Where a tween starts, in authored time units
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Position {
    /// Absolute start
    At(f32),
    /// Offset from the current end of the timeline (`"+=0.2"`, `"-=0.3"`)
    FromEnd(f32),
    /// Same start as the previously added tween (`"<"`)
    WithPrevious,
}

impl Default for Position {
    fn default() -> Self {
        Position::FromEnd(0.0)
    }
}

impl FromStr for Position {
    type Err = AnimationError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let invalid = || AnimationError::InvalidKeyframe(format!("position {s}"));
        if s == "<" {
            return Ok(Position::WithPrevious);
        }
        if let Some(v) = s.strip_prefix("+=") {
            return v.parse().map(Position::FromEnd).map_err(|_| invalid());
        }
        if let Some(v) = s.strip_prefix("-=") {
            return v
                .parse::<f32>()
                .map(|v| Position::FromEnd(-v))
                .map_err(|_| invalid());
        }
        s.parse().map(Position::At).map_err(|_| invalid())
    }
}

/// One authored interpolation before normalization
#[derive(Clone, Debug, PartialEq)]
pub struct Tween {
    pub target: Target,
    pub property: PropertyPath,
    pub from: f32,
    pub to: f32,
    pub easing: Easing,
    pub duration: f32,
}

impl Tween {
    /// Half-second quadratic ease-out unless configured otherwise
    pub fn new(target: Target, property: PropertyPath, from: f32, to: f32) -> Self {
        Self {
            target,
            property,
            from,
            to,
            easing: Easing::EaseOutQuad,
            duration: 0.5,
        }
    }

    pub fn duration(mut self, duration: f32) -> Self {
        self.duration = duration;
        self
    }

    pub fn ease(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }
}

/// Resolves authored positions into a normalized [`Timeline`]
pub struct TimelineBuilder {
    name: String,
    trigger: Trigger,
    entries: Vec<(String, Tween, f32)>,
    end: f32,
    last_start: f32,
    play_duration: Option<f32>,
}

impl TimelineBuilder {
    pub fn new(name: impl Into<String>, trigger: Trigger) -> Self {
        Self {
            name: name.into(),
            trigger,
            entries: Vec::new(),
            end: 0.0,
            last_start: 0.0,
            play_duration: None,
        }
    }

    fn resolve(&self, position: Position) -> f32 {
        match position {
            Position::At(t) => t,
            Position::FromEnd(offset) => self.end + offset,
            Position::WithPrevious => self.last_start,
        }
        .max(0.0)
    }

    /// Append a tween to the named track
    pub fn add(mut self, track: impl Into<String>, tween: Tween, position: Position) -> Self {
        let start = self.resolve(position);
        self.end = self.end.max(start + tween.duration.max(0.0));
        self.last_start = start;
        self.entries.push((track.into(), tween, start));
        self
    }

    /// Append one tween per repeated target, each starting `each` after the
    /// previous one
    ///
    /// Tweens land on tracks `"{track}.0"`, `"{track}.1"`, ... and `"<"`
    /// afterwards refers to the start of the first.
    pub fn stagger<I>(mut self, track: &str, tweens: I, each: f32, position: Position) -> Self
    where
        I: IntoIterator<Item = Tween>,
    {
        let base = self.resolve(position);
        for (i, tween) in tweens.into_iter().enumerate() {
            let start = base + i as f32 * each;
            self = self.add(format!("{track}.{i}"), tween, Position::At(start));
        }
        self.last_start = base;
        self
    }

    /// Override the one-shot wall-clock duration (defaults to the authored length)
    pub fn play_duration(mut self, secs: f32) -> Self {
        self.play_duration = Some(secs);
        self
    }

    /// Authored length so far
    pub fn total(&self) -> f32 {
        self.end
    }

    pub fn build(self) -> Result<Timeline> {
        if self.entries.is_empty() || self.end <= 0.0 {
            return Err(AnimationError::EmptyTimeline(self.name));
        }
        let total = self.end;

        let mut grouped: Vec<(String, Vec<Keyframe>)> = Vec::new();
        for (track, tween, start) in self.entries {
            let keyframe = Keyframe {
                target: tween.target,
                property: tween.property,
                from: tween.from,
                to: tween.to,
                easing: tween.easing,
                start: start / total,
                duration: tween.duration.max(0.0) / total,
            };
            match grouped.iter_mut().find(|(name, _)| *name == track) {
                Some((_, keyframes)) => keyframes.push(keyframe),
                None => grouped.push((track, vec![keyframe])),
            }
        }

        let tracks = grouped
            .into_iter()
            .map(|(name, keyframes)| AnimationTrack::new(name, keyframes))
            .collect::<Result<Vec<_>>>()?;

        Ok(Timeline {
            name: self.name,
            trigger: self.trigger,
            tracks,
            duration_secs: self.play_duration.unwrap_or(total),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use timeline_events::*;

    fn span() -> ScrollSpan {
        ScrollSpan::parse("top top", "+=220%").unwrap()
    }

    #[test]
    fn test_state_transitions() {
        let idle = TimelineState::Idle;
        assert_eq!(idle.on_event(ARM), Some(TimelineState::Armed));
        assert_eq!(idle.on_event(BEGIN_PLAY), None);

        let armed = TimelineState::Armed;
        assert_eq!(armed.on_event(BEGIN_SCRUB), Some(TimelineState::Scrubbing));
        assert_eq!(armed.on_event(BEGIN_PLAY), Some(TimelineState::Playing));
        assert_eq!(armed.on_event(ARM), None);

        assert_eq!(
            TimelineState::Playing.on_event(FINISH),
            Some(TimelineState::Complete)
        );
        assert_eq!(TimelineState::Complete.on_event(ARM), None);
        assert_eq!(TimelineState::Scrubbing.on_event(FINISH), None);
    }

    #[test]
    fn test_positions_resolve_like_a_sequence() {
        let core = Target::object("core");
        let builder = TimelineBuilder::new("t", Trigger::scrubbed("hero", span()))
            .add(
                "a",
                Tween::new(core.clone(), PropertyPath::PositionY, 0.0, 1.0).duration(1.0),
                Position::At(0.0),
            )
            .add(
                "b",
                Tween::new(core.clone(), PropertyPath::Scale, 0.0, 1.0).duration(0.8),
                "-=0.3".parse().unwrap(),
            )
            .add(
                "c",
                Tween::new(core, PropertyPath::EmissiveIntensity, 0.0, 1.0).duration(1.0),
                "<".parse().unwrap(),
            );
        // b: 0.7..1.5, c: 0.7..1.7
        assert!((builder.total() - 1.7).abs() < 1e-6);

        let timeline = builder.build().unwrap();
        let c = &timeline.tracks()[2].keyframes()[0];
        assert!((c.start - 0.7 / 1.7).abs() < 1e-6);
        assert!((c.end() - 1.0).abs() < 1e-6);
        assert!((timeline.duration_secs() - 1.7).abs() < 1e-6);
    }

    #[test]
    fn test_same_track_tweens_share_a_track() {
        let el = Target::element("footer");
        let timeline = TimelineBuilder::new("fade", Trigger::scrubbed("footer", span()))
            .add(
                "opacity",
                Tween::new(el.clone(), PropertyPath::Opacity, 0.0, 1.0).duration(0.2),
                Position::At(0.0),
            )
            .add(
                "opacity",
                Tween::new(el, PropertyPath::Opacity, 1.0, 0.0).duration(0.2),
                Position::At(0.8),
            )
            .build()
            .unwrap();
        assert_eq!(timeline.tracks().len(), 1);
        assert_eq!(timeline.tracks()[0].keyframes().len(), 2);
        assert_eq!(timeline.channels().count(), 2);
    }

    #[test]
    fn test_empty_timeline_is_rejected() {
        let err = TimelineBuilder::new("empty", Trigger::once("x", 0.1))
            .build()
            .unwrap_err();
        assert_eq!(err, AnimationError::EmptyTimeline("empty".into()));
    }

    #[test]
    fn test_out_of_order_track_is_rejected() {
        let el = Target::element("x");
        let result = TimelineBuilder::new("bad", Trigger::once("x", 0.1))
            .add(
                "t",
                Tween::new(el.clone(), PropertyPath::Opacity, 0.0, 1.0).duration(1.0),
                Position::At(1.0),
            )
            .add(
                "t",
                Tween::new(el, PropertyPath::TranslateY, 0.0, 1.0),
                Position::At(0.0),
            )
            .build();
        assert!(matches!(
            result,
            Err(AnimationError::NonMonotonicTrack { .. })
        ));
    }

    #[test]
    fn test_stagger_offsets_repeated_targets() {
        let cards = (0..3).map(|i| {
            Tween::new(Target::element(format!("card.{i}")), PropertyPath::TranslateY, 0.0, -20.0)
                .duration(1.0)
        });
        let timeline = TimelineBuilder::new("cards", Trigger::scrubbed("lab", span()))
            .stagger("lift", cards, 0.5, Position::At(0.0))
            .add(
                "title",
                Tween::new(Target::element("title"), PropertyPath::Opacity, 0.0, 1.0).duration(1.0),
                Position::WithPrevious,
            )
            .build()
            .unwrap();

        // Cards at 0, 0.5 and 1.0 over a 2.0 span; title shares the first start
        let starts: Vec<f32> = timeline
            .tracks()
            .iter()
            .map(|t| t.keyframes()[0].start)
            .collect();
        assert_eq!(timeline.tracks()[2].name(), "lift.2");
        assert_eq!(starts, vec![0.0, 0.25, 0.5, 0.0]);
    }

    #[test]
    fn test_trigger_options() {
        let lagged = Trigger::scrubbed("lab", span()).scrub_lag(1.2);
        assert_eq!(lagged.scrub_lag, 1.2);
        assert_eq!(lagged.arming, Arming::Visibility);
        assert_eq!(Trigger::scrubbed("lab", span()).scrub_lag(-1.0).scrub_lag, 0.0);

        let entering = ScrollSpan::parse("top 75%", "bottom top").unwrap();
        let title = Trigger::once("lab", 0.0).arm_at(entering);
        assert_eq!(title.arming, Arming::StartEdge);
        assert_eq!(title.span, entering);
    }

    #[test]
    fn test_parse_positions() {
        assert_eq!("1.5".parse::<Position>().unwrap(), Position::At(1.5));
        assert_eq!("+=0.2".parse::<Position>().unwrap(), Position::FromEnd(0.2));
        assert_eq!("-=0.3".parse::<Position>().unwrap(), Position::FromEnd(-0.3));
        assert!("soon".parse::<Position>().is_err());
    }
}
