//! Mapping from pick resource descriptors to wgpu types.

use pickbuffer_core::{
    PixelDatatype, PixelFormat, RenderbufferFormat, SamplerDescriptor, TextureFilter, TextureWrap,
};

use crate::error::{RenderError, RenderResult};

/// Format of the pick color attachment and of the depth copy target.
pub const PICK_COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Format of the pick depth-stencil attachment, texture or renderbuffer.
pub const PICK_DEPTH_STENCIL_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24PlusStencil8;

/// Resolves a pixel layout to a wgpu texture format.
pub fn texture_format(format: PixelFormat, datatype: PixelDatatype) -> RenderResult<wgpu::TextureFormat> {
    match (format, datatype) {
        (PixelFormat::Rgba, PixelDatatype::UnsignedByte) => Ok(PICK_COLOR_FORMAT),
        (PixelFormat::DepthStencil, PixelDatatype::UnsignedInt24_8) => Ok(PICK_DEPTH_STENCIL_FORMAT),
        (format, datatype) => Err(RenderError::UnsupportedFormat { format, datatype }),
    }
}

pub fn renderbuffer_format(format: RenderbufferFormat) -> wgpu::TextureFormat {
    match format {
        RenderbufferFormat::DepthStencil => PICK_DEPTH_STENCIL_FORMAT,
    }
}

fn address_mode(wrap: TextureWrap) -> wgpu::AddressMode {
    match wrap {
        TextureWrap::ClampToEdge => wgpu::AddressMode::ClampToEdge,
        TextureWrap::Repeat => wgpu::AddressMode::Repeat,
        TextureWrap::MirroredRepeat => wgpu::AddressMode::MirrorRepeat,
    }
}

fn filter_mode(filter: TextureFilter) -> wgpu::FilterMode {
    match filter {
        TextureFilter::Nearest => wgpu::FilterMode::Nearest,
        TextureFilter::Linear => wgpu::FilterMode::Linear,
    }
}

/// Builds a wgpu sampler descriptor.
pub fn sampler_descriptor<'a>(
    label: Option<&'a str>,
    sampler: &SamplerDescriptor,
) -> wgpu::SamplerDescriptor<'a> {
    wgpu::SamplerDescriptor {
        label,
        address_mode_u: address_mode(sampler.wrap_s),
        address_mode_v: address_mode(sampler.wrap_t),
        mag_filter: filter_mode(sampler.mag_filter),
        min_filter: filter_mode(sampler.min_filter),
        ..Default::default()
    }
}

/// Usage flags for a texture of the given format.
///
/// Color textures are read back; depth textures are sampled by the depth copy.
pub fn texture_usages(format: wgpu::TextureFormat) -> wgpu::TextureUsages {
    if format.has_depth_aspect() {
        wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING
    } else {
        wgpu::TextureUsages::RENDER_ATTACHMENT
            | wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::COPY_SRC
    }
}

/// Whether the adapter can both render to and sample the pick depth format.
pub fn depth_texture_supported(adapter: &wgpu::Adapter) -> bool {
    let features = adapter.get_texture_format_features(PICK_DEPTH_STENCIL_FORMAT);
    features
        .allowed_usages
        .contains(wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING)
}

/// Color target state for pipelines drawing into a pick target.
///
/// Blending is off so packed depth bytes are written unmodified.
pub fn pick_color_target() -> wgpu::ColorTargetState {
    wgpu::ColorTargetState {
        format: PICK_COLOR_FORMAT,
        blend: None,
        write_mask: wgpu::ColorWrites::ALL,
    }
}

/// Depth-stencil state for pipelines drawing into a pick target.
pub fn pick_depth_stencil_state() -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: PICK_DEPTH_STENCIL_FORMAT,
        depth_write_enabled: true,
        depth_compare: wgpu::CompareFunction::Less,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}
