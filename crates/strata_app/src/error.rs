//! Error types for strata_app

use strata_3d::SceneError;
use strata_animation::AnimationError;
use strata_platform::PlatformError;
use thiserror::Error;

/// Errors that can occur while mounting or running the stage
#[derive(Error, Debug)]
pub enum StrataError {
    /// Configuration file missing fields or malformed
    #[error("Configuration error: {0}")]
    Config(String),

    /// Authored timelines failed to build
    #[error("Animation error: {0}")]
    Animation(#[from] AnimationError),

    /// Scene construction or renderer mount failed
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    /// Windowing, input or event loop failure
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for StrataError {
    fn from(err: anyhow::Error) -> Self {
        StrataError::Other(format!("{err:#}"))
    }
}

/// Result type for strata_app operations
pub type Result<T> = std::result::Result<T, StrataError>;
