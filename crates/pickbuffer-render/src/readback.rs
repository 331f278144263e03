//! Blocking pixel read-back.

use pickbuffer_core::Viewport;

use crate::error::{RenderError, RenderResult};

/// Row pitch of an RGBA8 copy of `width` pixels, padded to wgpu's copy alignment.
pub(crate) fn padded_bytes_per_row(width: u32) -> u32 {
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    (width * 4).div_ceil(align) * align
}

/// Copies the rows of a padded buffer into a tightly packed RGBA8 vector.
pub(crate) fn strip_row_padding(data: &[u8], width: u32, height: u32, padded: u32) -> Vec<u8> {
    let row_bytes = (width * 4) as usize;
    let mut result = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height {
        let start = (row * padded) as usize;
        result.extend_from_slice(&data[start..start + row_bytes]);
    }
    result
}

/// Reads an RGBA8 rectangle of `texture` through `staging`.
///
/// `staging` must be `MAP_READ | COPY_DST` and at least
/// `padded_bytes_per_row(rect.width) * rect.height` bytes. Blocks until the
/// copy has completed.
pub(crate) fn read_rgba8(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    staging: &wgpu::Buffer,
    texture: &wgpu::Texture,
    rect: Viewport,
) -> RenderResult<Vec<u8>> {
    let padded = padded_bytes_per_row(rect.width);
    let size = u64::from(padded) * u64::from(rect.height);

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Pick Readback Encoder"),
    });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d {
                x: rect.x,
                y: rect.y,
                z: 0,
            },
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: staging,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded),
                rows_per_image: Some(rect.height),
            },
        },
        wgpu::Extent3d {
            width: rect.width,
            height: rect.height,
            depth_or_array_layers: 1,
        },
    );
    queue.submit(std::iter::once(encoder.finish()));

    let buffer_slice = staging.slice(..size);
    let (tx, rx) = std::sync::mpsc::channel();
    buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    let _ = device.poll(wgpu::PollType::wait_indefinitely());
    rx.recv()
        .map_err(|_| RenderError::BufferMapFailed)?
        .map_err(|_| RenderError::BufferMapFailed)?;

    let data = buffer_slice.get_mapped_range();
    let pixels = strip_row_padding(&data, rect.width, rect.height, padded);
    drop(data);
    staging.unmap();

    log::trace!("read back {}x{} pick pixels", rect.width, rect.height);
    Ok(pixels)
}
