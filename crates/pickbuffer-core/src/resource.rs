//! Resource descriptors understood by a [`PickDevice`](crate::PickDevice).
//!
//! These mirror the small slice of a texture/renderbuffer/framebuffer layer the
//! pick target needs. Backends map them onto their native formats.

use glam::Vec4;
use serde::{Deserialize, Serialize};

/// Width and height of a 2D resource in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Extent {
    pub width: u32,
    pub height: u32,
}

impl Extent {
    /// A single pixel. The only size a pick target ever uses.
    pub const UNIT: Self = Self::new(1, 1);

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// A viewport rectangle in framebuffer pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Viewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Viewport covering an extent from the origin.
    pub const fn from_extent(extent: Extent) -> Self {
        Self::new(0, 0, extent.width, extent.height)
    }

    pub const fn extent(&self) -> Extent {
        Extent::new(self.width, self.height)
    }
}

/// Pixel layout of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelFormat {
    /// Four color channels.
    Rgba,
    /// Combined depth and stencil.
    DepthStencil,
}

/// Storage type of each pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelDatatype {
    /// 8 bits per channel.
    UnsignedByte,
    /// 24-bit depth packed with 8-bit stencil.
    UnsignedInt24_8,
}

/// Storage format of a renderbuffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RenderbufferFormat {
    DepthStencil,
}

/// Texture addressing outside [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TextureWrap {
    #[default]
    ClampToEdge,
    Repeat,
    MirroredRepeat,
}

/// Texture filtering for minification and magnification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TextureFilter {
    #[default]
    Nearest,
    Linear,
}

/// Sampling state attached to a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SamplerDescriptor {
    pub wrap_s: TextureWrap,
    pub wrap_t: TextureWrap,
    pub min_filter: TextureFilter,
    pub mag_filter: TextureFilter,
}

impl SamplerDescriptor {
    /// Nearest filtering with edge clamping on both axes. Picking must never
    /// blend or wrap across its single texel.
    pub const NEAREST_CLAMP: Self = Self {
        wrap_s: TextureWrap::ClampToEdge,
        wrap_t: TextureWrap::ClampToEdge,
        min_filter: TextureFilter::Nearest,
        mag_filter: TextureFilter::Nearest,
    };
}

/// Parameters for creating a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextureDescriptor {
    pub extent: Extent,
    pub pixel_format: PixelFormat,
    pub pixel_datatype: PixelDatatype,
    pub sampler: SamplerDescriptor,
}

impl TextureDescriptor {
    /// 1x1 RGBA8 color attachment.
    pub const PICK_COLOR: Self = Self {
        extent: Extent::UNIT,
        pixel_format: PixelFormat::Rgba,
        pixel_datatype: PixelDatatype::UnsignedByte,
        sampler: SamplerDescriptor::NEAREST_CLAMP,
    };

    /// 1x1 sampleable depth-stencil attachment.
    pub const PICK_DEPTH_STENCIL: Self = Self {
        extent: Extent::UNIT,
        pixel_format: PixelFormat::DepthStencil,
        pixel_datatype: PixelDatatype::UnsignedInt24_8,
        sampler: SamplerDescriptor::NEAREST_CLAMP,
    };
}

/// Parameters for creating a renderbuffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RenderbufferDescriptor {
    pub extent: Extent,
    pub format: RenderbufferFormat,
}

impl RenderbufferDescriptor {
    /// 1x1 depth-stencil renderbuffer.
    pub const PICK_DEPTH_STENCIL: Self = Self {
        extent: Extent::UNIT,
        format: RenderbufferFormat::DepthStencil,
    };
}

/// Which kind of depth-stencil resource backs a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DepthStencilKind {
    Texture,
    Renderbuffer,
}

/// A depth-stencil attachment: either a sampleable texture or a renderbuffer.
///
/// Owned (`DepthStencilAttachment<D::Texture, D::Renderbuffer>`) by the pick
/// target, borrowed (`DepthStencilAttachment<&T, &R>`) in framebuffer
/// descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthStencilAttachment<T, R> {
    Texture(T),
    Renderbuffer(R),
}

impl<T, R> DepthStencilAttachment<T, R> {
    pub fn kind(&self) -> DepthStencilKind {
        match self {
            Self::Texture(_) => DepthStencilKind::Texture,
            Self::Renderbuffer(_) => DepthStencilKind::Renderbuffer,
        }
    }

    pub fn as_ref(&self) -> DepthStencilAttachment<&T, &R> {
        match self {
            Self::Texture(texture) => DepthStencilAttachment::Texture(texture),
            Self::Renderbuffer(renderbuffer) => DepthStencilAttachment::Renderbuffer(renderbuffer),
        }
    }

    /// Returns the texture, if this attachment is one.
    pub fn texture(&self) -> Option<&T> {
        match self {
            Self::Texture(texture) => Some(texture),
            Self::Renderbuffer(_) => None,
        }
    }

    /// Returns the renderbuffer, if this attachment is one.
    pub fn renderbuffer(&self) -> Option<&R> {
        match self {
            Self::Texture(_) => None,
            Self::Renderbuffer(renderbuffer) => Some(renderbuffer),
        }
    }
}

/// Parameters for creating a framebuffer.
pub struct FramebufferDescriptor<'a, T, R> {
    pub color_attachments: &'a [&'a T],
    pub depth_stencil: Option<DepthStencilAttachment<&'a T, &'a R>>,
    /// When false the framebuffer must leave its attachments alive when it is
    /// destroyed; their owner releases them.
    pub destroy_attachments: bool,
}

/// Values written by a clear.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClearCommand {
    pub depth: f32,
    pub color: Vec4,
    pub stencil: u32,
}

impl Default for ClearCommand {
    /// Far-plane depth and transparent black.
    fn default() -> Self {
        Self {
            depth: 1.0,
            color: Vec4::ZERO,
            stencil: 0,
        }
    }
}
