//! wgpu handles for pick attachments.

use pickbuffer_core::TextureDescriptor;

/// A texture together with its attachment view, sampling view and sampler.
#[derive(Debug)]
pub struct WgpuTexture {
    pub(crate) texture: wgpu::Texture,
    /// Full view, used as a render attachment.
    pub(crate) view: wgpu::TextureView,
    /// Depth-only view for depth formats, otherwise the full view.
    pub(crate) sample_view: wgpu::TextureView,
    pub(crate) sampler: wgpu::Sampler,
    pub(crate) desc: TextureDescriptor,
}

impl WgpuTexture {
    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn sample_view(&self) -> &wgpu::TextureView {
        &self.sample_view
    }

    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }

    pub fn descriptor(&self) -> &TextureDescriptor {
        &self.desc
    }
}

/// An attachment-only depth-stencil texture. Cannot be bound for sampling.
#[derive(Debug)]
pub struct WgpuRenderbuffer {
    pub(crate) texture: wgpu::Texture,
    pub(crate) view: wgpu::TextureView,
}

impl WgpuRenderbuffer {
    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }
}

/// A texture attached to a framebuffer, held through cloned handles.
#[derive(Debug, Clone)]
pub(crate) struct Attachment {
    pub(crate) texture: wgpu::Texture,
    pub(crate) view: wgpu::TextureView,
}

/// Color and depth-stencil attachments bound for rendering and read-back.
#[derive(Debug)]
pub struct WgpuFramebuffer {
    pub(crate) color_attachments: Vec<Attachment>,
    pub(crate) depth_stencil: Option<Attachment>,
    pub(crate) owns_attachments: bool,
}

impl WgpuFramebuffer {
    /// View of the color attachment at `index`.
    pub fn color_view(&self, index: usize) -> Option<&wgpu::TextureView> {
        self.color_attachments.get(index).map(|a| &a.view)
    }

    pub fn depth_stencil_view(&self) -> Option<&wgpu::TextureView> {
        self.depth_stencil.as_ref().map(|a| &a.view)
    }

    pub(crate) fn read_texture(&self) -> Option<&wgpu::Texture> {
        self.color_attachments.first().map(|a| &a.texture)
    }

    /// Releases GPU memory of owned attachments; borrowed ones are only
    /// dropped.
    pub(crate) fn release(self) {
        if self.owns_attachments {
            for attachment in self.color_attachments.iter().chain(self.depth_stencil.iter()) {
                attachment.texture.destroy();
            }
        }
    }
}
