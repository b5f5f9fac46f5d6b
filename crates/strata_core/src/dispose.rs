//! Scoped teardown
//!
//! Every listener registration, frame callback and GPU allocation in Strata
//! hands back something `Disposable`. Components collect those in a
//! [`DisposeBag`] and release them all from a single idempotent teardown.
//!
//! ```ignore
//! let mut bag = DisposeBag::new("pointer");
//! bag.add(bus.subscribe(EventKind::PointerMove, handler));
//! bag.add(frames.register("pointer", FramePhase::Pointer, step));
//!
//! bag.dispose();
//! bag.dispose(); // no-op
//! ```

use smallvec::SmallVec;

/// A resource that can be released
///
/// Implementations must tolerate repeated calls: the second and later calls
/// are no-ops.
pub trait Disposable {
    fn dispose(&mut self);
}

/// Disposer built from a closure, run at most once
pub struct OnDispose {
    callback: Option<Box<dyn FnOnce()>>,
}

impl OnDispose {
    pub fn new<F>(callback: F) -> Self
    where
        F: FnOnce() + 'static,
    {
        Self {
            callback: Some(Box::new(callback)),
        }
    }
}

impl Disposable for OnDispose {
    fn dispose(&mut self) {
        if let Some(callback) = self.callback.take() {
            callback();
        }
    }
}

impl Drop for OnDispose {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Ordered list of disposers released in reverse acquisition order
pub struct DisposeBag {
    name: &'static str,
    items: SmallVec<[Box<dyn Disposable>; 4]>,
    released: usize,
}

impl DisposeBag {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            items: SmallVec::new(),
            released: 0,
        }
    }

    /// Take ownership of a disposer
    pub fn add<D>(&mut self, item: D)
    where
        D: Disposable + 'static,
    {
        self.items.push(Box::new(item));
    }

    /// Number of disposers still held
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Release everything held so far; safe to call any number of times
    pub fn dispose(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let count = self.items.len();
        while let Some(mut item) = self.items.pop() {
            item.dispose();
        }
        self.released += count;
        tracing::debug!("{}: released {} disposers", self.name, count);
    }

    /// Total disposers released over the bag's lifetime
    pub fn released(&self) -> usize {
        self.released
    }
}

impl Disposable for DisposeBag {
    fn dispose(&mut self) {
        DisposeBag::dispose(self);
    }
}

impl Drop for DisposeBag {
    fn drop(&mut self) {
        DisposeBag::dispose(self);
    }
}
