//! wgpu backend for pickbuffer.
//!
//! This crate implements [`pickbuffer_core::PickDevice`] on top of wgpu:
//! - Pick color and depth-stencil attachments ([`WgpuTexture`], [`WgpuRenderbuffer`])
//! - The depth copy pass that packs a depth texture into RGBA8
//! - Blocking 1x1 pixel read-back
//! - [`begin_pick_pass`] for recording the caller's pick draw

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

pub mod depth_copy;
pub mod device;
pub mod error;
pub mod formats;
pub mod pass;
mod readback;
pub mod resources;

pub use depth_copy::{depth_copy_shader_source, DepthCopyPass, WgpuDepthCopy, PACK_DEPTH_WGSL};
pub use device::WgpuPickDevice;
pub use error::{RenderError, RenderResult};
pub use formats::{
    depth_texture_supported, pick_color_target, pick_depth_stencil_state, PICK_COLOR_FORMAT,
    PICK_DEPTH_STENCIL_FORMAT,
};
pub use pass::begin_pick_pass;
pub use resources::{WgpuFramebuffer, WgpuRenderbuffer, WgpuTexture};
