//! Headless device creation.

use pollster::FutureExt;

use crate::{Result, WgpuPickDevice};

/// Creates a wgpu pick device without a window.
///
/// Fails with [`RenderError::AdapterCreationFailed`](crate::RenderError) when
/// no adapter is available, which is common on CI machines without a GPU.
pub fn create_headless_device() -> Result<WgpuPickDevice> {
    let device = WgpuPickDevice::new_headless().block_on()?;
    log::info!(
        "headless pick device ready (depth textures: {})",
        pickbuffer_core::PickDevice::supports_depth_texture(&device)
    );
    Ok(device)
}
