//! Rendering error types.

use pickbuffer_core::{PixelDatatype, PixelFormat};
use thiserror::Error;

/// Errors that can occur in the wgpu pick backend.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Failed to create wgpu adapter.
    #[error("failed to create graphics adapter")]
    AdapterCreationFailed,

    /// Failed to create wgpu device.
    #[error("failed to create graphics device: {0}")]
    DeviceCreationFailed(#[from] wgpu::RequestDeviceError),

    /// Out of memory.
    #[error("out of memory")]
    OutOfMemory,

    /// wgpu rejected a command.
    #[error("validation error: {0}")]
    Validation(String),

    /// No wgpu texture format matches the requested layout.
    #[error("unsupported pixel layout: {format:?} / {datatype:?}")]
    UnsupportedFormat {
        format: PixelFormat,
        datatype: PixelDatatype,
    },

    /// Mapping the read-back buffer failed.
    #[error("GPU buffer mapping failed")]
    BufferMapFailed,
}

/// A specialized Result type for rendering operations.
pub type RenderResult<T> = std::result::Result<T, RenderError>;
