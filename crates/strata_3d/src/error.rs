//! Scene and renderer errors

use thiserror::Error;

/// Scene construction and mount errors
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("drawing surface `{0}` not found")]
    MissingSurface(String),

    #[error("duplicate object name: {0}")]
    DuplicateName(String),

    #[error(transparent)]
    Render(#[from] RenderError),
}

/// GPU setup and frame errors
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("no suitable GPU adapter found")]
    AdapterNotFound,

    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("failed to request GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("surface has no supported formats")]
    NoSurfaceFormat,

    #[error("out of GPU memory")]
    OutOfMemory,

    #[error("renderer already disposed")]
    Disposed,
}

pub type Result<T> = std::result::Result<T, SceneError>;
