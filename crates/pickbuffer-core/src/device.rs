//! The resource layer a pick target is built on.

use crate::pass_state::PassState;
use crate::resource::{
    ClearCommand, FramebufferDescriptor, RenderbufferDescriptor, TextureDescriptor, Viewport,
};

/// A graphics device able to host a [`PickTarget`](crate::PickTarget).
///
/// All calls are issued on the thread that owns the rendering context and
/// execute in submission order on the device's command stream. `read_pixels`
/// blocks until previously submitted work has completed.
///
/// Handles are released by value through the `destroy_*` methods, so a handle
/// can only ever be released once.
pub trait PickDevice {
    /// A texture handle.
    type Texture;
    /// A non-sampleable render attachment handle.
    type Renderbuffer;
    /// A framebuffer binding color and depth-stencil attachments.
    type Framebuffer;
    /// Resources used to resolve a depth texture into readable packed color.
    type DepthCopy;
    /// Failures reported by the device.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Whether depth-stencil textures can be both rendered to and sampled.
    fn supports_depth_texture(&self) -> bool;

    /// Creates a texture.
    fn create_texture(&mut self, desc: &TextureDescriptor) -> Result<Self::Texture, Self::Error>;

    /// Creates a renderbuffer.
    fn create_renderbuffer(
        &mut self,
        desc: &RenderbufferDescriptor,
    ) -> Result<Self::Renderbuffer, Self::Error>;

    /// Creates a framebuffer over existing attachments.
    fn create_framebuffer(
        &mut self,
        desc: &FramebufferDescriptor<'_, Self::Texture, Self::Renderbuffer>,
    ) -> Result<Self::Framebuffer, Self::Error>;

    /// Clears the pass state's framebuffer within its viewport.
    fn clear(
        &mut self,
        clear: &ClearCommand,
        pass_state: &PassState<Self::Framebuffer>,
    ) -> Result<(), Self::Error>;

    /// Creates the depth-copy helper.
    fn create_depth_copy(&mut self) -> Result<Self::DepthCopy, Self::Error>;

    /// Resolves `depth_stencil` into the helper's packed RGBA target.
    fn copy_depth(
        &mut self,
        depth_copy: &mut Self::DepthCopy,
        depth_stencil: &Self::Texture,
    ) -> Result<(), Self::Error>;

    /// The framebuffer holding the helper's packed RGBA target.
    fn depth_copy_framebuffer<'a>(&self, depth_copy: &'a Self::DepthCopy) -> &'a Self::Framebuffer;

    /// Reads RGBA8 pixels from the first color attachment of `framebuffer`.
    fn read_pixels(
        &mut self,
        rect: Viewport,
        framebuffer: &Self::Framebuffer,
    ) -> Result<Vec<u8>, Self::Error>;

    fn destroy_texture(&mut self, texture: Self::Texture);

    fn destroy_renderbuffer(&mut self, renderbuffer: Self::Renderbuffer);

    /// Releases a framebuffer. Attachments created with
    /// `destroy_attachments: false` stay alive.
    fn destroy_framebuffer(&mut self, framebuffer: Self::Framebuffer);

    fn destroy_depth_copy(&mut self, depth_copy: Self::DepthCopy);
}
