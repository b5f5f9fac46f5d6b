//! Timeline engine
//!
//! Owns every mounted timeline, advances their state machines and pushes the
//! resulting values into a [`PropertySink`] once per frame.
//!
//! Scrubbed timelines are evaluated every frame from their latest progress,
//! so their output is a pure function of scroll position. A scrub lag trades
//! that for an exponential catch-up on wall-clock time. One-shot timelines
//! hold their first frame until armed, play on wall-clock time, write their
//! final frame once and then go quiet.

use rustc_hash::FxHashSet;
use slotmap::{new_key_type, SlotMap};

use crate::property::{PropertyPath, PropertySink, Target};
use crate::timeline::{timeline_events, Arming, Timeline, TimelineState};

/// Lagged progress closes this share of the gap per `scrub_lag` seconds,
/// expressed as an exponential rate (1 - e^-3, about 95%)
const LAG_RATE: f32 = 3.0;

/// Lagged progress snaps to scroll once this close
const LAG_SNAP: f32 = 1e-4;

new_key_type! {
    /// Handle to a mounted timeline
    pub struct TimelineId;
}

struct Entry {
    timeline: Timeline,
    state: TimelineState,
    /// Latest scroll progress (scrubbed timelines)
    progress: f32,
    /// Lagged progress chasing `progress`
    followed: Option<f32>,
    /// Progress used for the last evaluation
    evaluated: f32,
    play_started: Option<f64>,
    /// One-shot wrote its final frame
    settled: bool,
    reported_failure: bool,
}

/// Per-frame counters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub evaluated: usize,
    pub writes: usize,
    pub failed_writes: usize,
}

/// Mounted timelines in declaration order
#[derive(Default)]
pub struct TimelineEngine {
    entries: SlotMap<TimelineId, Entry>,
    order: Vec<TimelineId>,
    last_time: Option<f64>,
}

impl TimelineEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount a timeline; it starts Idle
    pub fn add(&mut self, timeline: Timeline) -> TimelineId {
        tracing::debug!(
            "timeline {}: mounted ({} tracks, {})",
            timeline.name(),
            timeline.tracks().len(),
            if timeline.is_scrubbed() { "scrubbed" } else { "one-shot" }
        );
        let id = self.entries.insert(Entry {
            timeline,
            state: TimelineState::Idle,
            progress: 0.0,
            followed: None,
            evaluated: 0.0,
            play_started: None,
            settled: false,
            reported_failure: false,
        });
        self.order.push(id);
        id
    }

    /// Unmount a timeline, dropping its tracks
    pub fn remove(&mut self, id: TimelineId) -> Option<Timeline> {
        self.order.retain(|&other| other != id);
        self.entries.remove(id).map(|entry| entry.timeline)
    }

    /// Unmount everything
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
        self.last_time = None;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Timeline ids in declaration order
    pub fn ids(&self) -> impl Iterator<Item = TimelineId> + '_ {
        self.order.iter().copied()
    }

    pub fn timeline(&self, id: TimelineId) -> Option<&Timeline> {
        self.entries.get(id).map(|e| &e.timeline)
    }

    pub fn state(&self, id: TimelineId) -> Option<TimelineState> {
        self.entries.get(id).map(|e| e.state)
    }

    /// Progress used by the most recent evaluation
    pub fn evaluated_progress(&self, id: TimelineId) -> Option<f32> {
        self.entries.get(id).map(|e| e.evaluated)
    }

    /// Whether progress has to be resampled every frame
    pub fn needs_continuous_sampling(&self) -> bool {
        self.entries
            .values()
            .any(|e| e.timeline.is_scrubbed() || e.timeline.trigger().pinned)
    }

    /// Feed the trigger region's visible ratio
    ///
    /// Only an Idle timeline can arm; later visibility changes are ignored,
    /// which is what keeps one-shot playback from ever restarting.
    pub fn on_visibility(&mut self, id: TimelineId, ratio: f32) -> Option<TimelineState> {
        let entry = self.entries.get_mut(id)?;
        if entry.timeline.trigger().arming != Arming::Visibility {
            return None;
        }
        let threshold = entry.timeline.trigger().threshold;
        let reached = if threshold <= 0.0 {
            ratio > 0.0
        } else {
            ratio >= threshold
        };
        if !reached {
            return None;
        }
        let next = entry.state.on_event(timeline_events::ARM)?;
        Self::transition(entry, next);
        Some(next)
    }

    /// Feed scroll progress of the trigger span
    ///
    /// Scrubbed timelines evaluate from it; start-edge triggers arm once it
    /// leaves 0.
    pub fn set_progress(&mut self, id: TimelineId, progress: f32) -> Option<TimelineState> {
        let entry = self.entries.get_mut(id)?;
        entry.progress = progress.clamp(0.0, 1.0);
        if entry.timeline.trigger().arming != Arming::StartEdge || entry.progress <= 0.0 {
            return None;
        }
        let next = entry.state.on_event(timeline_events::ARM)?;
        Self::transition(entry, next);
        Some(next)
    }

    /// Advance state machines to `time` (seconds) and write every output
    pub fn advance<S>(&mut self, time: f64, sink: &mut S) -> EngineStats
    where
        S: PropertySink + ?Sized,
    {
        let mut stats = EngineStats::default();
        let dt = self
            .last_time
            .map_or(0.0, |last| (time - last).max(0.0) as f32);
        self.last_time = Some(time);
        for &id in &self.order {
            let Some(entry) = self.entries.get_mut(id) else {
                continue;
            };
            let scrubbed = entry.timeline.is_scrubbed();

            if entry.state == TimelineState::Armed {
                let event = if scrubbed {
                    timeline_events::BEGIN_SCRUB
                } else {
                    timeline_events::BEGIN_PLAY
                };
                if let Some(next) = entry.state.on_event(event) {
                    if next == TimelineState::Playing {
                        entry.play_started = Some(time);
                    }
                    Self::transition(entry, next);
                }
            }

            let p = if scrubbed {
                Self::follow(entry, dt)
            } else {
                match entry.state {
                    TimelineState::Idle | TimelineState::Armed => 0.0,
                    TimelineState::Playing => {
                        let started = entry.play_started.unwrap_or(time);
                        let duration = entry.timeline.duration_secs();
                        if duration <= 0.0 {
                            1.0
                        } else {
                            (((time - started) as f32) / duration).clamp(0.0, 1.0)
                        }
                    }
                    TimelineState::Scrubbing | TimelineState::Complete => 1.0,
                }
            };

            if entry.state == TimelineState::Playing && p >= 1.0 {
                if let Some(next) = entry.state.on_event(timeline_events::FINISH) {
                    Self::transition(entry, next);
                }
            }

            if entry.settled {
                continue;
            }
            if entry.state == TimelineState::Complete {
                entry.settled = true;
            }

            entry.evaluated = p;
            stats.evaluated += 1;
            let mut failure = None;
            entry.timeline.evaluate(p, |target, property, value| {
                match sink.write(target, property, value) {
                    Ok(()) => stats.writes += 1,
                    Err(err) => {
                        stats.failed_writes += 1;
                        failure.get_or_insert(err);
                    }
                }
            });
            if let Some(err) = failure {
                if !entry.reported_failure {
                    entry.reported_failure = true;
                    tracing::warn!("timeline {}: {}", entry.timeline.name(), err);
                }
            }
        }
        stats
    }

    /// Channels whose target or property the sink cannot resolve, once each
    pub fn unresolved<S>(&self, sink: &S) -> Vec<(String, Target, PropertyPath)>
    where
        S: PropertySink + ?Sized,
    {
        let mut missing = Vec::new();
        for &id in &self.order {
            let Some(entry) = self.entries.get(id) else {
                continue;
            };
            let mut seen = FxHashSet::default();
            for (target, property) in entry.timeline.channels() {
                if !seen.insert((target, property)) {
                    continue;
                }
                if sink.read(target, property).is_none() {
                    missing.push((entry.timeline.name().to_string(), target.clone(), property));
                }
            }
        }
        missing
    }

    /// Scrubbed progress after `dt` seconds of lag
    fn follow(entry: &mut Entry, dt: f32) -> f32 {
        let lag = entry.timeline.trigger().scrub_lag;
        let target = entry.progress;
        let next = match entry.followed {
            Some(current) if lag > 0.0 => {
                let step = current + (target - current) * (1.0 - (-LAG_RATE * dt / lag).exp());
                if (target - step).abs() < LAG_SNAP {
                    target
                } else {
                    step
                }
            }
            _ => target,
        };
        entry.followed = Some(next);
        next
    }

    fn transition(entry: &mut Entry, next: TimelineState) {
        tracing::debug!(
            "timeline {}: {:?} -> {:?}",
            entry.timeline.name(),
            entry.state,
            next
        );
        entry.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::easing::Easing;
    use crate::progress::ScrollSpan;
    use crate::property::SinkError;
    use crate::timeline::{Position, TimelineBuilder, Trigger, Tween};
    use rustc_hash::FxHashMap;

    #[derive(Default)]
    struct Recorder {
        values: FxHashMap<(Target, PropertyPath), f32>,
        log: Vec<(String, PropertyPath, f32)>,
    }

    impl PropertySink for Recorder {
        fn write(
            &mut self,
            target: &Target,
            property: PropertyPath,
            value: f32,
        ) -> Result<(), SinkError> {
            if target.name() == "missing" {
                return Err(SinkError::UnknownTarget("missing".into()));
            }
            self.values.insert((target.clone(), property), value);
            self.log.push((target.name().to_string(), property, value));
            Ok(())
        }

        fn read(&self, target: &Target, _property: PropertyPath) -> Option<f32> {
            (target.name() != "missing").then_some(0.0)
        }
    }

    fn chip_timeline() -> Timeline {
        let span = ScrollSpan::parse("top top", "+=220%").unwrap();
        let core = Target::object("core");
        TimelineBuilder::new("chip", Trigger::scrubbed("hero", span).pinned())
            .add(
                "layer",
                Tween::new(Target::object("layer.0"), PropertyPath::PositionY, -0.5, 0.0)
                    .duration(1.0),
                Position::At(0.0),
            )
            .add(
                "core",
                Tween::new(core.clone(), PropertyPath::Scale, 0.0, 1.0)
                    .duration(0.8)
                    .ease(Easing::BackOut(1.5)),
                Position::FromEnd(-0.3),
            )
            .add(
                "glow",
                Tween::new(core, PropertyPath::EmissiveIntensity, 0.0, 1.2)
                    .duration(1.0)
                    .ease(Easing::EaseInOutCubic),
                Position::FromEnd(-0.3),
            )
            .build()
            .unwrap()
    }

    fn reveal_timeline() -> Timeline {
        TimelineBuilder::new("reveal", Trigger::once("section", 0.1))
            .add(
                "fade",
                Tween::new(Target::element("heading"), PropertyPath::Opacity, 0.0, 1.0)
                    .duration(0.8),
                Position::At(0.0),
            )
            .build()
            .unwrap()
    }

    fn snapshot(
        engine: &mut TimelineEngine,
        id: TimelineId,
        p: f32,
    ) -> Vec<(String, PropertyPath, f32)> {
        let mut sink = Recorder::default();
        engine.set_progress(id, p);
        engine.advance(0.0, &mut sink);
        sink.log
    }

    #[test]
    fn test_scrubbing_is_a_pure_function_of_progress() {
        let mut engine = TimelineEngine::new();
        let id = engine.add(chip_timeline());

        let reference = snapshot(&mut engine, id, 0.6);
        for other in [0.0, 1.0, 0.25, 0.99, 0.6001, 0.0] {
            snapshot(&mut engine, id, other);
            assert_eq!(snapshot(&mut engine, id, 0.6), reference);
        }
    }

    #[test]
    fn test_scrubbed_writes_from_and_to_at_the_ends() {
        let mut engine = TimelineEngine::new();
        let id = engine.add(chip_timeline());

        let start = snapshot(&mut engine, id, 0.0);
        assert_eq!(start[0], ("layer.0".into(), PropertyPath::PositionY, -0.5));
        assert_eq!(start[1], ("core".into(), PropertyPath::Scale, 0.0));

        let end = snapshot(&mut engine, id, 1.0);
        assert_eq!(end[0].2, 0.0);
        assert_eq!(end[1].2, 1.0);
        assert_eq!(end[2].2, 1.2);
    }

    #[test]
    fn test_scrubbed_timeline_scrubs_after_arming() {
        let mut engine = TimelineEngine::new();
        let id = engine.add(chip_timeline());
        let mut sink = Recorder::default();

        assert_eq!(engine.on_visibility(id, 0.0), None);
        assert_eq!(engine.on_visibility(id, 0.01), Some(TimelineState::Armed));
        engine.advance(0.0, &mut sink);
        assert_eq!(engine.state(id), Some(TimelineState::Scrubbing));
        assert!(engine.needs_continuous_sampling());
    }

    #[test]
    fn test_one_shot_plays_exactly_once() {
        let mut engine = TimelineEngine::new();
        let id = engine.add(reveal_timeline());
        let mut sink = Recorder::default();

        // Below threshold: stays idle, holds the first frame
        assert_eq!(engine.on_visibility(id, 0.05), None);
        engine.advance(0.0, &mut sink);
        assert_eq!(engine.state(id), Some(TimelineState::Idle));
        assert_eq!(sink.log.last().unwrap().2, 0.0);

        assert_eq!(engine.on_visibility(id, 0.1), Some(TimelineState::Armed));
        engine.advance(1.0, &mut sink);
        assert_eq!(engine.state(id), Some(TimelineState::Playing));

        // Visibility toggling never re-arms or restarts playback
        for ratio in [0.0, 0.5, 0.02, 0.9, 0.0, 0.3] {
            assert_eq!(engine.on_visibility(id, ratio), None);
        }
        engine.advance(1.4, &mut sink);
        assert_eq!(engine.state(id), Some(TimelineState::Playing));
        assert!((engine.evaluated_progress(id).unwrap() - 0.5).abs() < 1e-4);

        engine.advance(2.0, &mut sink);
        assert_eq!(engine.state(id), Some(TimelineState::Complete));
        assert_eq!(sink.log.last().unwrap().2, 1.0);

        // Complete timelines stop writing
        let writes = sink.log.len();
        engine.on_visibility(id, 1.0);
        engine.advance(3.0, &mut sink);
        assert_eq!(sink.log.len(), writes);
        assert_eq!(engine.state(id), Some(TimelineState::Complete));
    }

    #[test]
    fn test_last_write_wins_across_tracks() {
        let el = Target::element("box");
        let trigger = Trigger::scrubbed("r", ScrollSpan::parse("top top", "+=100").unwrap());
        let timeline = TimelineBuilder::new("conflict", trigger)
            .add(
                "first",
                Tween::new(el.clone(), PropertyPath::Opacity, 0.0, 1.0).duration(1.0),
                Position::At(0.0),
            )
            .add(
                "second",
                Tween::new(el.clone(), PropertyPath::Opacity, 0.3, 0.3).duration(1.0),
                Position::At(0.0),
            )
            .build()
            .unwrap();
        let mut engine = TimelineEngine::new();
        let id = engine.add(timeline);
        let mut sink = Recorder::default();
        engine.set_progress(id, 0.5);
        engine.advance(0.0, &mut sink);
        assert_eq!(sink.values[&(el, PropertyPath::Opacity)], 0.3);
    }

    fn drift(trigger: Trigger) -> Timeline {
        TimelineBuilder::new("drift", trigger)
            .add(
                "rise",
                Tween::new(Target::element("card"), PropertyPath::TranslateY, 0.0, 100.0)
                    .duration(1.0)
                    .ease(Easing::Linear),
                Position::At(0.0),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_lagged_scrub_catches_up_over_time() {
        let span = ScrollSpan::parse("top center", "bottom top").unwrap();
        let mut engine = TimelineEngine::new();
        let id = engine.add(drift(Trigger::scrubbed("lab", span).scrub_lag(1.0)));
        let mut sink = Recorder::default();

        // First frame adopts scroll progress directly
        engine.set_progress(id, 0.2);
        engine.advance(0.0, &mut sink);
        assert_eq!(engine.evaluated_progress(id), Some(0.2));

        engine.set_progress(id, 0.8);
        engine.advance(0.1, &mut sink);
        let early = engine.evaluated_progress(id).unwrap();
        assert!(early > 0.2 && early < 0.5, "{early}");

        engine.advance(1.0, &mut sink);
        let later = engine.evaluated_progress(id).unwrap();
        assert!(later > early && later < 0.8);

        engine.advance(5.0, &mut sink);
        assert_eq!(engine.evaluated_progress(id), Some(0.8));
        assert_eq!(sink.values[&(Target::element("card"), PropertyPath::TranslateY)], 80.0);
    }

    #[test]
    fn test_start_edge_arms_one_shot() {
        let entering = ScrollSpan::parse("top 75%", "bottom top").unwrap();
        let mut engine = TimelineEngine::new();
        let id = engine.add(drift(Trigger::once("lab", 0.0).arm_at(entering)));
        let mut sink = Recorder::default();

        // Visibility alone never arms it
        assert_eq!(engine.on_visibility(id, 1.0), None);
        assert_eq!(engine.set_progress(id, 0.0), None);
        engine.advance(0.0, &mut sink);
        assert_eq!(engine.state(id), Some(TimelineState::Idle));

        assert_eq!(engine.set_progress(id, 0.05), Some(TimelineState::Armed));
        engine.advance(1.0, &mut sink);
        assert_eq!(engine.state(id), Some(TimelineState::Playing));

        // Scrolling back above the edge does not rewind playback
        assert_eq!(engine.set_progress(id, 0.0), None);
        engine.advance(2.0, &mut sink);
        assert_eq!(engine.state(id), Some(TimelineState::Complete));
        assert_eq!(engine.set_progress(id, 0.5), None);
    }

    #[test]
    fn test_unresolved_targets_are_reported() {
        let timeline = TimelineBuilder::new("ghost", Trigger::once("r", 0.1))
            .add(
                "t",
                Tween::new(Target::object("missing"), PropertyPath::Scale, 0.0, 1.0),
                Position::At(0.0),
            )
            .build()
            .unwrap();
        let mut engine = TimelineEngine::new();
        let id = engine.add(timeline);
        let mut sink = Recorder::default();

        assert_eq!(engine.unresolved(&sink).len(), 1);
        let stats = engine.advance(0.0, &mut sink);
        assert_eq!(stats.failed_writes, 1);
        assert!(engine.remove(id).is_some());
        assert!(engine.is_empty());
    }
}
