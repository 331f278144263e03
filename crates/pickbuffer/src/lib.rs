//! pickbuffer: a 1x1 offscreen pick framebuffer with packed depth read-back.
//!
//! A pick renders a single pixel under the cursor into a dedicated target and
//! optionally reads back the depth of the closest surface there. The target
//! allocates its attachments on first use and picks a sampleable depth
//! texture when the device supports one, falling back to a depth-stencil
//! renderbuffer otherwise.
//!
//! # Quick Start
//!
//! ```no_run
//! use pickbuffer::*;
//!
//! fn main() -> Result<()> {
//!     init_logging();
//!
//!     let mut device = create_headless_device()?;
//!     let mut target = WgpuPickTarget::new();
//!
//!     // Record the pick draw; the pipeline must use `pick_color_target()`
//!     // and `pick_depth_stencil_state()`.
//!     let depth = pick_depth(&mut target, &mut device, |_pass| {})?;
//!     println!("depth under the cursor: {depth}");
//!
//!     target.destroy(&mut device);
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - `pickbuffer-core` holds [`PickTarget`], the [`PickDevice`] contract and
//!   the packed depth codec. It has no GPU dependency.
//! - `pickbuffer-render` implements [`PickDevice`] with wgpu.
//! - This crate ties them together with headless device creation and the
//!   [`pick_depth`] helper.

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_errors_doc)]

mod headless;
mod pick;

pub use headless::create_headless_device;
pub use pick::pick_depth;

// Re-export core types
pub use pickbuffer_core::{
    decode_depth, mock, pack_depth, ClearCommand, DepthStencilAttachment, DepthStencilKind,
    Extent, FramebufferDescriptor, PackedDepth, PassState, PickDevice, PickError, PickOptions,
    PickTarget, RenderbufferDescriptor, TextureDescriptor, Vec4, Viewport, PACKED_DEPTH_SCALE,
};

// Re-export render types
pub use pickbuffer_render::{
    begin_pick_pass, pick_color_target, pick_depth_stencil_state, RenderError, WgpuFramebuffer,
    WgpuPickDevice, WgpuRenderbuffer, WgpuTexture, PACK_DEPTH_WGSL, PICK_COLOR_FORMAT,
    PICK_DEPTH_STENCIL_FORMAT,
};

/// A pick target backed by wgpu.
pub type WgpuPickTarget = PickTarget<WgpuPickDevice>;

/// Result type of wgpu pick operations.
pub type Result<T> = std::result::Result<T, PickError<RenderError>>;

/// Installs the `env_logger` logger, configured through `RUST_LOG`.
///
/// Does nothing if a logger is already installed.
pub fn init_logging() {
    let _ = env_logger::try_init();
}
