//! Render passes over pick framebuffers.

use pickbuffer_core::{ClearCommand, PassState, Viewport};

use crate::resources::WgpuFramebuffer;

/// Begins the pick render pass for the caller's single draw.
///
/// Attachments are loaded, not cleared; `PickTarget::begin` has already
/// cleared them. The viewport is taken from the pass state.
pub fn begin_pick_pass<'e>(
    pass_state: &PassState<WgpuFramebuffer>,
    encoder: &'e mut wgpu::CommandEncoder,
) -> wgpu::RenderPass<'e> {
    encode_pass(
        encoder,
        "Pick Render Pass",
        pass_state.framebuffer(),
        pass_state.viewport(),
        None,
    )
}

/// Opens a render pass on `framebuffer`, clearing with `clear` when given.
pub(crate) fn encode_pass<'e>(
    encoder: &'e mut wgpu::CommandEncoder,
    label: &str,
    framebuffer: &WgpuFramebuffer,
    viewport: Viewport,
    clear: Option<&ClearCommand>,
) -> wgpu::RenderPass<'e> {
    let color_load = clear.map_or(wgpu::LoadOp::Load, |c| {
        wgpu::LoadOp::Clear(wgpu::Color {
            r: f64::from(c.color.x),
            g: f64::from(c.color.y),
            b: f64::from(c.color.z),
            a: f64::from(c.color.w),
        })
    });
    let depth_load = clear.map_or(wgpu::LoadOp::Load, |c| wgpu::LoadOp::Clear(c.depth));
    let stencil_load = clear.map_or(wgpu::LoadOp::Load, |c| wgpu::LoadOp::Clear(c.stencil));

    let color_attachments: Vec<Option<wgpu::RenderPassColorAttachment>> = framebuffer
        .color_attachments
        .iter()
        .map(|attachment| {
            Some(wgpu::RenderPassColorAttachment {
                view: &attachment.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: color_load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })
        })
        .collect();

    let depth_stencil_attachment =
        framebuffer
            .depth_stencil
            .as_ref()
            .map(|attachment| wgpu::RenderPassDepthStencilAttachment {
                view: &attachment.view,
                depth_ops: Some(wgpu::Operations {
                    load: depth_load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: Some(wgpu::Operations {
                    load: stencil_load,
                    store: wgpu::StoreOp::Store,
                }),
            });

    let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &color_attachments,
        depth_stencil_attachment,
        ..Default::default()
    });
    set_viewport(&mut render_pass, viewport);
    render_pass
}

#[allow(clippy::cast_precision_loss)]
fn set_viewport(render_pass: &mut wgpu::RenderPass<'_>, viewport: Viewport) {
    render_pass.set_viewport(
        viewport.x as f32,
        viewport.y as f32,
        viewport.width as f32,
        viewport.height as f32,
        0.0,
        1.0,
    );
}
