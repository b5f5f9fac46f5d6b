//! Animation error types

use thiserror::Error;

/// Errors raised while building or parsing animation definitions
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnimationError {
    /// Easing name not recognized
    #[error("Unknown easing: {0}")]
    UnknownEasing(String),

    /// Scroll edge syntax not recognized
    #[error("Invalid scroll edge: {0}")]
    InvalidEdge(String),

    /// Property path not recognized
    #[error("Unknown property: {0}")]
    UnknownProperty(String),

    /// A keyframe starts before the one authored ahead of it
    #[error("Track {track}: keyframe {index} starts before its predecessor")]
    NonMonotonicTrack { track: String, index: usize },

    /// Non-finite values or negative duration
    #[error("Invalid keyframe in {0}")]
    InvalidKeyframe(String),

    /// Timeline has no tracks or a zero span
    #[error("Empty timeline: {0}")]
    EmptyTimeline(String),
}

/// Result type for animation operations
pub type Result<T> = std::result::Result<T, AnimationError>;
