//! Input events
//!
//! Positions and deltas are in logical pixels. Wheel and touch deltas are
//! already converted to document scroll direction: positive `delta_y` moves
//! the page content up (scrolls down).

/// Scroll gesture phase (for trackpad/touchpad scrolling)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ScrollPhase {
    /// Scroll gesture starting (finger touched trackpad)
    Started,
    /// Scroll is in progress
    #[default]
    Moved,
    /// Scroll gesture ended
    Ended,
}

/// Touch contact phase
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TouchPhase {
    Started,
    Moved,
    Ended,
    Cancelled,
}

/// Events dispatched through the [`EventBus`](crate::EventBus)
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Window resized
    Resized {
        width: f32,
        height: f32,
        scale_factor: f32,
    },
    /// Pointer moved to position
    PointerMoved { x: f32, y: f32 },
    /// Primary pointer button pressed
    PointerPressed { x: f32, y: f32 },
    /// Pointer left the window
    PointerLeft,
    /// Wheel or trackpad scroll
    Wheel {
        delta_x: f32,
        delta_y: f32,
        phase: ScrollPhase,
    },
    /// Touch drag, `delta_y` is the scroll delta since the previous contact point
    Touch {
        id: u64,
        phase: TouchPhase,
        x: f32,
        y: f32,
        delta_y: f32,
    },
}

/// Listener routing key
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Resize,
    PointerMove,
    PointerPress,
    PointerLeave,
    Wheel,
    Touch,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Resized { .. } => EventKind::Resize,
            Event::PointerMoved { .. } => EventKind::PointerMove,
            Event::PointerPressed { .. } => EventKind::PointerPress,
            Event::PointerLeft => EventKind::PointerLeave,
            Event::Wheel { .. } => EventKind::Wheel,
            Event::Touch { .. } => EventKind::Touch,
        }
    }
}
