//! Event bus
//!
//! Listeners subscribe per [`EventKind`] and receive a [`Subscription`] that
//! removes them again when disposed or dropped. Higher priority listeners run
//! first; equal priorities run in subscription order. A listener returning
//! [`Propagation::Stop`] hides the event from everything after it, which is
//! how smooth scrolling takes wheel input away from the native scroll handler.
//!
//! Dispatch never holds a borrow of the bus while a callback runs, so
//! callbacks may subscribe, unsubscribe or dispatch re-entrantly. A callback
//! that panics is removed and the remaining listeners still receive the event.

use std::cell::RefCell;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::{Rc, Weak};

use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;
use strata_core::Disposable;

use crate::event::{Event, EventKind};

new_key_type! {
    /// Handle to a registered listener
    pub struct ListenerId;
}

/// Whether later listeners should see the event
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Propagation {
    #[default]
    Continue,
    Stop,
}

/// Summary of a single dispatch
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Listeners that were invoked
    pub delivered: usize,
    /// A listener stopped propagation
    pub stopped: bool,
    /// Listeners that panicked and were removed
    pub faulted: usize,
}

type Callback = Rc<RefCell<dyn FnMut(&Event) -> Propagation>>;

struct Listener {
    name: &'static str,
    kind: EventKind,
    priority: i32,
    seq: u64,
    callback: Callback,
}

#[derive(Default)]
struct BusInner {
    listeners: SlotMap<ListenerId, Listener>,
    next_seq: u64,
}

/// Single-threaded listener registry
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Rc<RefCell<BusInner>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe at default priority
    pub fn subscribe<F>(&self, name: &'static str, kind: EventKind, callback: F) -> Subscription
    where
        F: FnMut(&Event) -> Propagation + 'static,
    {
        self.subscribe_with_priority(name, kind, 0, callback)
    }

    /// Subscribe ahead of (positive) or behind (negative) default listeners
    pub fn subscribe_with_priority<F>(
        &self,
        name: &'static str,
        kind: EventKind,
        priority: i32,
        callback: F,
    ) -> Subscription
    where
        F: FnMut(&Event) -> Propagation + 'static,
    {
        let callback: Callback = Rc::new(RefCell::new(callback));
        let mut inner = self.inner.borrow_mut();
        let seq = inner.next_seq;
        inner.next_seq += 1;
        let id = inner.listeners.insert(Listener {
            name,
            kind,
            priority,
            seq,
            callback,
        });
        tracing::debug!("bus: {} subscribed to {:?}", name, kind);
        Subscription {
            bus: Rc::downgrade(&self.inner),
            id: Some(id),
        }
    }

    /// Deliver an event to every listener of its kind
    pub fn dispatch(&self, event: &Event) -> DispatchOutcome {
        let kind = event.kind();
        let mut targets: SmallVec<[(ListenerId, i32, u64, &'static str, Callback); 8]> = self
            .inner
            .borrow()
            .listeners
            .iter()
            .filter(|(_, l)| l.kind == kind)
            .map(|(id, l)| (id, l.priority, l.seq, l.name, l.callback.clone()))
            .collect();
        targets.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

        let mut outcome = DispatchOutcome::default();
        for (id, _, _, name, callback) in targets {
            // Removed by an earlier listener during this dispatch
            if !self.inner.borrow().listeners.contains_key(id) {
                continue;
            }
            // Already running further up the stack
            let Ok(mut cb) = callback.try_borrow_mut() else {
                continue;
            };
            let result = catch_unwind(AssertUnwindSafe(|| (*cb)(event)));
            drop(cb);
            outcome.delivered += 1;

            match result {
                Ok(Propagation::Continue) => {}
                Ok(Propagation::Stop) => {
                    outcome.stopped = true;
                    break;
                }
                Err(_) => {
                    tracing::error!("bus: listener {} panicked on {:?}, removing it", name, kind);
                    let removed = self.inner.borrow_mut().listeners.remove(id);
                    drop(removed);
                    outcome.faulted += 1;
                }
            }
        }
        outcome
    }

    /// Total registered listeners
    pub fn listener_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }

    /// Registered listeners for one event kind
    pub fn listener_count_for(&self, kind: EventKind) -> usize {
        self.inner
            .borrow()
            .listeners
            .values()
            .filter(|l| l.kind == kind)
            .count()
    }
}

/// Disposer for a registered listener
///
/// Dropping the subscription unsubscribes. Unsubscribing twice, or after the
/// bus itself is gone, is a no-op.
#[must_use = "dropping a Subscription removes the listener immediately"]
pub struct Subscription {
    bus: Weak<RefCell<BusInner>>,
    id: Option<ListenerId>,
}

impl Subscription {
    pub fn id(&self) -> Option<ListenerId> {
        self.id
    }

    /// Whether the listener is still registered
    pub fn is_active(&self) -> bool {
        match (self.id, self.bus.upgrade()) {
            (Some(id), Some(bus)) => bus.borrow().listeners.contains_key(id),
            _ => false,
        }
    }

    /// Remove the listener; returns whether anything was removed
    pub fn unsubscribe(&mut self) -> bool {
        let Some(id) = self.id.take() else {
            return false;
        };
        let Some(bus) = self.bus.upgrade() else {
            return false;
        };
        let removed = bus.borrow_mut().listeners.remove(id);
        match removed {
            Some(listener) => {
                tracing::debug!("bus: {} unsubscribed from {:?}", listener.name, listener.kind);
                true
            }
            None => false,
        }
    }
}

impl Disposable for Subscription {
    fn dispose(&mut self) {
        self.unsubscribe();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
