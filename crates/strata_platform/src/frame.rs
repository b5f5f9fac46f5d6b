//! Frame scheduler
//!
//! One tick per rendered frame. Registered callbacks run in a fixed
//! [`FramePhase`] order, and in registration order inside a phase, so every
//! component observes the same committed input state and the renderer always
//! draws after the timeline has written.
//!
//! Callbacks are isolated from each other: an `Err` is logged and the rest of
//! the frame continues; a panic disables only the offending callback.

use std::cell::RefCell;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::{Rc, Weak};

use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;
use strata_core::Disposable;

new_key_type! {
    /// Handle to a registered frame callback
    pub struct FrameCallbackId;
}

/// Fixed execution order within a frame
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FramePhase {
    /// Deferred viewport work
    Viewport,
    /// Smooth scroll integration
    Scroll,
    /// Scroll progress sampling
    Progress,
    /// Timeline evaluation and property writes
    Timeline,
    /// Pointer spring integration
    Pointer,
    /// Drawing
    Render,
}

/// Per-frame timing handed to every callback
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameContext {
    /// Seconds since the scheduler's time origin
    pub time: f64,
    /// Seconds since the previous tick, clamped to `MAX_FRAME_DT`
    pub dt: f32,
    /// Frame counter starting at 0
    pub frame: u64,
}

impl FrameContext {
    /// Time in milliseconds
    pub fn time_ms(&self) -> f64 {
        self.time * 1000.0
    }
}

/// Result of one tick
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub ran: usize,
    pub failed: usize,
    pub active: usize,
}

/// Longest step handed to callbacks; longer gaps (suspended window) are clamped
pub const MAX_FRAME_DT: f32 = 0.1;
const DEFAULT_FRAME_DT: f32 = 1.0 / 60.0;
const FAILURE_LOG_INTERVAL: u32 = 120;

type Callback = Rc<RefCell<dyn FnMut(&FrameContext) -> anyhow::Result<()>>>;

struct Entry {
    name: &'static str,
    phase: FramePhase,
    seq: u64,
    callback: Callback,
    consecutive_failures: u32,
    disabled: bool,
}

#[derive(Default)]
struct SchedulerInner {
    entries: SlotMap<FrameCallbackId, Entry>,
    next_seq: u64,
    frame: u64,
    last_time: Option<f64>,
}

/// Ordered per-frame callback registry
#[derive(Clone, Default)]
pub struct FrameScheduler {
    inner: Rc<RefCell<SchedulerInner>>,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback that runs every tick until its handle is disposed
    pub fn register<F>(&self, name: &'static str, phase: FramePhase, callback: F) -> FrameHandle
    where
        F: FnMut(&FrameContext) -> anyhow::Result<()> + 'static,
    {
        let callback: Callback = Rc::new(RefCell::new(callback));
        let mut inner = self.inner.borrow_mut();
        let seq = inner.next_seq;
        inner.next_seq += 1;
        let id = inner.entries.insert(Entry {
            name,
            phase,
            seq,
            callback,
            consecutive_failures: 0,
            disabled: false,
        });
        tracing::debug!("frames: registered {} in {:?}", name, phase);
        FrameHandle {
            scheduler: Rc::downgrade(&self.inner),
            id: Some(id),
        }
    }

    /// Run one frame at `time` seconds
    pub fn tick(&self, time: f64) -> FrameStats {
        let (ctx, mut order) = {
            let mut inner = self.inner.borrow_mut();
            let dt = match inner.last_time {
                Some(last) => ((time - last) as f32).clamp(0.0, MAX_FRAME_DT),
                None => DEFAULT_FRAME_DT,
            };
            inner.last_time = Some(time);
            let ctx = FrameContext {
                time,
                dt,
                frame: inner.frame,
            };
            inner.frame += 1;

            let order: SmallVec<[(FrameCallbackId, FramePhase, u64, Callback); 8]> = inner
                .entries
                .iter()
                .filter(|(_, e)| !e.disabled)
                .map(|(id, e)| (id, e.phase, e.seq, e.callback.clone()))
                .collect();
            (ctx, order)
        };
        order.sort_by_key(|(_, phase, seq, _)| (*phase, *seq));

        let mut stats = FrameStats::default();
        for (id, _, _, callback) in order {
            if !self.inner.borrow().entries.contains_key(id) {
                continue;
            }
            let Ok(mut cb) = callback.try_borrow_mut() else {
                continue;
            };
            let result = catch_unwind(AssertUnwindSafe(|| (*cb)(&ctx)));
            drop(cb);
            stats.ran += 1;

            let mut inner = self.inner.borrow_mut();
            let Some(entry) = inner.entries.get_mut(id) else {
                continue;
            };
            match result {
                Ok(Ok(())) => entry.consecutive_failures = 0,
                Ok(Err(err)) => {
                    stats.failed += 1;
                    if entry.consecutive_failures % FAILURE_LOG_INTERVAL == 0 {
                        tracing::warn!("frames: {} failed: {:#}", entry.name, err);
                    }
                    entry.consecutive_failures = entry.consecutive_failures.saturating_add(1);
                }
                Err(_) => {
                    stats.failed += 1;
                    entry.disabled = true;
                    tracing::error!("frames: {} panicked, disabling it", entry.name);
                }
            }
        }

        stats.active = self.active_count();
        stats
    }

    /// Registered callbacks, including disabled ones
    pub fn len(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Callbacks that will run on the next tick
    pub fn active_count(&self) -> usize {
        self.inner
            .borrow()
            .entries
            .values()
            .filter(|e| !e.disabled)
            .count()
    }

    /// Frames ticked so far
    pub fn frame_count(&self) -> u64 {
        self.inner.borrow().frame
    }
}

/// Disposer for a frame callback; dropping it cancels the callback
#[must_use = "dropping a FrameHandle cancels the callback immediately"]
pub struct FrameHandle {
    scheduler: Weak<RefCell<SchedulerInner>>,
    id: Option<FrameCallbackId>,
}

impl FrameHandle {
    pub fn id(&self) -> Option<FrameCallbackId> {
        self.id
    }

    /// Stop the callback; returns whether anything was cancelled
    pub fn cancel(&mut self) -> bool {
        let Some(id) = self.id.take() else {
            return false;
        };
        let Some(scheduler) = self.scheduler.upgrade() else {
            return false;
        };
        let removed = scheduler.borrow_mut().entries.remove(id);
        match removed {
            Some(entry) => {
                tracing::debug!("frames: cancelled {}", entry.name);
                true
            }
            None => false,
        }
    }
}

impl Disposable for FrameHandle {
    fn dispose(&mut self) {
        self.cancel();
    }
}

impl Drop for FrameHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phases_run_in_fixed_order() {
        let frames = FrameScheduler::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let mut handles = Vec::new();
        for (name, phase) in [
            ("render", FramePhase::Render),
            ("timeline", FramePhase::Timeline),
            ("scroll", FramePhase::Scroll),
            ("pointer", FramePhase::Pointer),
            ("progress", FramePhase::Progress),
        ] {
            let log = log.clone();
            handles.push(frames.register(name, phase, move |_| {
                log.borrow_mut().push(name);
                Ok(())
            }));
        }

        frames.tick(0.0);
        assert_eq!(
            *log.borrow(),
            vec!["scroll", "progress", "timeline", "pointer", "render"]
        );
    }

    #[test]
    fn test_dt_is_measured_and_clamped() {
        let frames = FrameScheduler::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        let _handle = frames.register("dt", FramePhase::Render, move |ctx| {
            s.borrow_mut().push(ctx.dt);
            Ok(())
        });

        frames.tick(1.0);
        frames.tick(1.02);
        frames.tick(30.0);

        let seen = seen.borrow();
        assert!((seen[0] - DEFAULT_FRAME_DT).abs() < 1e-6);
        assert!((seen[1] - 0.02).abs() < 1e-4);
        assert_eq!(seen[2], MAX_FRAME_DT);
    }

    #[test]
    fn test_failing_callback_is_isolated() {
        let frames = FrameScheduler::new();
        let hits = Rc::new(RefCell::new(0));

        let _bad = frames.register("bad", FramePhase::Scroll, |_| anyhow::bail!("nope"));
        let _panics = frames.register("panics", FramePhase::Progress, |_| panic!("boom"));
        let h = hits.clone();
        let _good = frames.register("good", FramePhase::Render, move |_| {
            *h.borrow_mut() += 1;
            Ok(())
        });

        let first = frames.tick(0.0);
        assert_eq!(first.failed, 2);
        let second = frames.tick(0.016);
        assert_eq!(second.failed, 1);
        assert_eq!(second.active, 2);
        assert_eq!(*hits.borrow(), 2);
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let frames = FrameScheduler::new();
        let mut handle = frames.register("x", FramePhase::Render, |_| Ok(()));
        assert_eq!(frames.len(), 1);
        assert!(handle.cancel());
        assert!(!handle.cancel());
        handle.dispose();
        assert!(frames.is_empty());
    }

    #[test]
    fn test_handle_outlives_scheduler() {
        let mut handle = {
            let frames = FrameScheduler::new();
            frames.register("orphan", FramePhase::Render, |_| Ok(()))
        };
        assert!(!handle.cancel());
    }
}
