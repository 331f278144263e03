//! Error types for pickbuffer.

use thiserror::Error;

/// Errors returned by [`PickTarget`](crate::PickTarget) operations.
///
/// `E` is the error type of the [`PickDevice`](crate::PickDevice) backing the
/// target. Device failures (allocation, out-of-memory, device loss) are passed
/// through untouched in [`PickError::Device`].
#[derive(Error, Debug)]
pub enum PickError<E: std::error::Error + 'static> {
    /// The target has been destroyed and cannot be used again.
    #[error("pick target has been destroyed")]
    Destroyed,

    /// Depth was requested before `begin()` provisioned the target.
    #[error("pick target not provisioned - call begin() first")]
    NotProvisioned,

    /// The read-back returned fewer bytes than one RGBA pixel.
    #[error("pick read-back returned {len} bytes, expected at least 4")]
    ShortReadback { len: usize },

    /// The resource layer failed.
    #[error(transparent)]
    Device(#[from] E),
}

/// A specialized Result type for pick target operations.
pub type PickResult<T, E> = std::result::Result<T, PickError<E>>;
