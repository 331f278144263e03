//! One-shot pick queries.

use crate::{begin_pick_pass, Result, WgpuPickDevice, WgpuPickTarget};

/// Runs a complete pick and returns the depth under it.
///
/// Clears the target, records `draw` into a pass over the pick pixel,
/// submits it and reads the depth back. `draw` issues exactly one draw with
/// a pipeline built from [`pick_color_target`](crate::pick_color_target) and
/// [`pick_depth_stencil_state`](crate::pick_depth_stencil_state). On devices
/// without depth textures its fragment shader must also write
/// `pack_depth(position.z)` (see [`PACK_DEPTH_WGSL`](crate::PACK_DEPTH_WGSL))
/// to color.
///
/// Returns 0.0 when nothing was drawn over the cleared target.
pub fn pick_depth<F>(
    target: &mut WgpuPickTarget,
    device: &mut WgpuPickDevice,
    draw: F,
) -> Result<f32>
where
    F: FnOnce(&mut wgpu::RenderPass<'_>),
{
    let pass_state = target.begin(device)?;

    let mut encoder = device
        .device()
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Pick Draw Encoder"),
        });
    {
        let mut render_pass = begin_pick_pass(pass_state, &mut encoder);
        draw(&mut render_pass);
    }
    device.queue().submit(std::iter::once(encoder.finish()));

    target.get_depth(device)
}
