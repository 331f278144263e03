//! Core abstractions for pickbuffer.
//!
//! This crate provides the backend-independent half of the pick framebuffer:
//! - [`PickTarget`], the lazily provisioned 1x1 offscreen target
//! - [`PickDevice`], the resource-layer contract a GPU backend implements
//! - Packed depth encoding and decoding ([`PackedDepth`], [`decode_depth`])
//! - [`PickOptions`] for clear values and path selection
//! - [`mock::MockPickDevice`], a GPU-free device for tests

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]

pub mod depth;
pub mod device;
pub mod error;
pub mod mock;
pub mod options;
pub mod pass_state;
pub mod resource;
pub mod target;

pub use depth::{decode_depth, pack_depth, PackedDepth, PACKED_DEPTH_SCALE};
pub use device::PickDevice;
pub use error::{PickError, PickResult};
pub use options::PickOptions;
pub use pass_state::PassState;
pub use resource::{
    ClearCommand, DepthStencilAttachment, DepthStencilKind, Extent, FramebufferDescriptor,
    PixelDatatype, PixelFormat, RenderbufferDescriptor, RenderbufferFormat, SamplerDescriptor,
    TextureDescriptor, TextureFilter, TextureWrap, Viewport,
};
pub use target::PickTarget;

// Re-export glam types for convenience
pub use glam::Vec4;
