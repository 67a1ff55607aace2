//! Error types

use thiserror::Error;

use crate::sim::BodyId;

/// Errors raised by the simulation core and its physics backend
#[derive(Debug, Error, PartialEq)]
pub enum SimError {
    /// The body id was never handed out by this world
    #[error("unknown body {0:?}")]
    UnknownBody(BodyId),

    /// The body is already part of the world and cannot be inserted again
    #[error("body {0:?} is already in the world")]
    AlreadyInWorld(BodyId),

    /// The body exists but has not been inserted yet
    #[error("body {0:?} is not in the world")]
    NotInWorld(BodyId),

    /// Rejected configuration value
    #[error("invalid settings: {0}")]
    InvalidSettings(String),
}

impl SimError {
    pub fn invalid_settings(reason: impl Into<String>) -> Self {
        Self::InvalidSettings(reason.into())
    }
}

/// Errors raised while bringing up the GPU renderer
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    #[error("no suitable GPU adapter: {0}")]
    RequestAdapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to create device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    #[error("surface reports no supported formats")]
    NoSurfaceFormat,
}

pub type Result<T, E = SimError> = std::result::Result<T, E>;
