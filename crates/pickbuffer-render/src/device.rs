//! wgpu implementation of the pick resource layer.

use pickbuffer_core::{
    ClearCommand, DepthStencilAttachment, FramebufferDescriptor, PassState, PickDevice,
    RenderbufferDescriptor, TextureDescriptor, Viewport,
};

use crate::depth_copy::{DepthCopyPass, WgpuDepthCopy};
use crate::error::{RenderError, RenderResult};
use crate::formats::{
    depth_texture_supported, renderbuffer_format, sampler_descriptor, texture_format,
    texture_usages, PICK_DEPTH_STENCIL_FORMAT,
};
use crate::pass::encode_pass;
use crate::readback::{padded_bytes_per_row, read_rgba8};
use crate::resources::{Attachment, WgpuFramebuffer, WgpuRenderbuffer, WgpuTexture};

/// A wgpu device and queue hosting pick targets.
pub struct WgpuPickDevice {
    device: wgpu::Device,
    queue: wgpu::Queue,
    depth_texture_supported: bool,
    /// Built with the first depth copy.
    depth_copy_pass: Option<DepthCopyPass>,
    /// Reused for read-backs that fit.
    staging_buffer: Option<wgpu::Buffer>,
}

impl WgpuPickDevice {
    /// Wraps an existing device, querying depth-texture support from `adapter`.
    pub fn new(adapter: &wgpu::Adapter, device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self::with_depth_texture_support(device, queue, depth_texture_supported(adapter))
    }

    /// Wraps an existing device with an explicit depth-texture capability.
    pub fn with_depth_texture_support(
        device: wgpu::Device,
        queue: wgpu::Queue,
        depth_texture_supported: bool,
    ) -> Self {
        log::debug!("pick device created (depth textures supported: {depth_texture_supported})");
        Self {
            device,
            queue,
            depth_texture_supported,
            depth_copy_pass: None,
            staging_buffer: None,
        }
    }

    /// Creates a device without a window or surface.
    pub async fn new_headless() -> RenderResult<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..wgpu::InstanceDescriptor::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|_| RenderError::AdapterCreationFailed)?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("pickbuffer device (headless)"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults(),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::default(),
                experimental_features: wgpu::ExperimentalFeatures::default(),
            })
            .await?;

        Ok(Self::new(&adapter, device, queue))
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Runs `f` inside out-of-memory and validation error scopes.
    ///
    /// Command submission goes through here too, so a rejected pass surfaces
    /// as [`RenderError::Validation`] instead of reaching the uncaptured-error
    /// handler.
    fn scoped<T>(&self, f: impl FnOnce(&wgpu::Device) -> T) -> RenderResult<T> {
        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let value = f(&self.device);
        let validation = pollster::block_on(self.device.pop_error_scope());
        let out_of_memory = pollster::block_on(self.device.pop_error_scope());

        if out_of_memory.is_some() {
            return Err(RenderError::OutOfMemory);
        }
        if let Some(err) = validation {
            return Err(RenderError::Validation(err.to_string()));
        }
        Ok(value)
    }

    fn create_texture_with_usages(
        &self,
        desc: &TextureDescriptor,
        label: &str,
        usage: wgpu::TextureUsages,
    ) -> RenderResult<WgpuTexture> {
        let format = texture_format(desc.pixel_format, desc.pixel_datatype)?;
        self.scoped(|device| {
            let texture = device.create_texture(&wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width: desc.extent.width,
                    height: desc.extent.height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage,
                view_formats: &[],
            });
            let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
            // Depth is sampled without the stencil aspect
            let sample_view = if format.has_depth_aspect() {
                texture.create_view(&wgpu::TextureViewDescriptor {
                    label: Some("pick depth only view"),
                    aspect: wgpu::TextureAspect::DepthOnly,
                    ..Default::default()
                })
            } else {
                view.clone()
            };
            let sampler = device.create_sampler(&sampler_descriptor(Some(label), &desc.sampler));
            WgpuTexture {
                texture,
                view,
                sample_view,
                sampler,
                desc: *desc,
            }
        })
    }

    fn staging_buffer(&mut self, size: u64) -> RenderResult<wgpu::Buffer> {
        if let Some(buffer) = &self.staging_buffer {
            if buffer.size() >= size {
                return Ok(buffer.clone());
            }
        }
        let buffer = self.scoped(|device| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("Pick Staging Buffer"),
                size,
                usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
                mapped_at_creation: false,
            })
        })?;
        if let Some(old) = self.staging_buffer.replace(buffer.clone()) {
            old.destroy();
        }
        Ok(buffer)
    }
}

impl PickDevice for WgpuPickDevice {
    type Texture = WgpuTexture;
    type Renderbuffer = WgpuRenderbuffer;
    type Framebuffer = WgpuFramebuffer;
    type DepthCopy = WgpuDepthCopy;
    type Error = RenderError;

    fn supports_depth_texture(&self) -> bool {
        self.depth_texture_supported
    }

    fn create_texture(&mut self, desc: &TextureDescriptor) -> RenderResult<WgpuTexture> {
        let format = texture_format(desc.pixel_format, desc.pixel_datatype)?;
        let label = if format.has_depth_aspect() {
            "Pick Depth Stencil Texture"
        } else {
            "Pick Color Texture"
        };
        self.create_texture_with_usages(desc, label, texture_usages(format))
    }

    fn create_renderbuffer(
        &mut self,
        desc: &RenderbufferDescriptor,
    ) -> RenderResult<WgpuRenderbuffer> {
        let format = renderbuffer_format(desc.format);
        self.scoped(|device| {
            let texture = device.create_texture(&wgpu::TextureDescriptor {
                label: Some("Pick Depth Stencil Renderbuffer"),
                size: wgpu::Extent3d {
                    width: desc.extent.width,
                    height: desc.extent.height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                view_formats: &[],
            });
            let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
            WgpuRenderbuffer { texture, view }
        })
    }

    fn create_framebuffer(
        &mut self,
        desc: &FramebufferDescriptor<'_, WgpuTexture, WgpuRenderbuffer>,
    ) -> RenderResult<WgpuFramebuffer> {
        let color_attachments = desc
            .color_attachments
            .iter()
            .map(|texture| Attachment {
                texture: texture.texture.clone(),
                view: texture.view.clone(),
            })
            .collect();
        let depth_stencil = desc.depth_stencil.map(|attachment| match attachment {
            DepthStencilAttachment::Texture(texture) => Attachment {
                texture: texture.texture.clone(),
                view: texture.view.clone(),
            },
            DepthStencilAttachment::Renderbuffer(renderbuffer) => Attachment {
                texture: renderbuffer.texture.clone(),
                view: renderbuffer.view.clone(),
            },
        });
        Ok(WgpuFramebuffer {
            color_attachments,
            depth_stencil,
            owns_attachments: desc.destroy_attachments,
        })
    }

    fn clear(
        &mut self,
        clear: &ClearCommand,
        pass_state: &PassState<WgpuFramebuffer>,
    ) -> RenderResult<()> {
        self.scoped(|device| {
            let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Pick Clear Encoder"),
            });
            // An empty pass performs the clear through its load ops
            drop(encode_pass(
                &mut encoder,
                "Pick Clear Pass",
                pass_state.framebuffer(),
                pass_state.viewport(),
                Some(clear),
            ));
            self.queue.submit(std::iter::once(encoder.finish()));
        })
    }

    fn create_depth_copy(&mut self) -> RenderResult<WgpuDepthCopy> {
        if self.depth_copy_pass.is_none() {
            let pass = self.scoped(DepthCopyPass::new)?;
            self.depth_copy_pass = Some(pass);
        }
        let target = self.create_texture_with_usages(
            &TextureDescriptor::PICK_COLOR,
            "Pick Depth Copy Texture",
            texture_usages(crate::formats::PICK_COLOR_FORMAT),
        )?;
        let framebuffer = self.create_framebuffer(&FramebufferDescriptor {
            color_attachments: &[&target],
            depth_stencil: None,
            destroy_attachments: false,
        })?;
        Ok(WgpuDepthCopy {
            target,
            framebuffer,
        })
    }

    fn copy_depth(
        &mut self,
        depth_copy: &mut WgpuDepthCopy,
        depth_stencil: &WgpuTexture,
    ) -> RenderResult<()> {
        if depth_stencil.texture.format() != PICK_DEPTH_STENCIL_FORMAT {
            return Err(RenderError::Validation(format!(
                "depth copy source has format {:?}",
                depth_stencil.texture.format()
            )));
        }
        let pass = match self.depth_copy_pass.take() {
            Some(pass) => pass,
            None => self.scoped(DepthCopyPass::new)?,
        };
        let result = self.scoped(|device| {
            pass.execute(device, &self.queue, depth_stencil, &depth_copy.framebuffer);
        });
        self.depth_copy_pass = Some(pass);
        result
    }

    fn depth_copy_framebuffer<'a>(&self, depth_copy: &'a WgpuDepthCopy) -> &'a WgpuFramebuffer {
        &depth_copy.framebuffer
    }

    fn read_pixels(
        &mut self,
        rect: Viewport,
        framebuffer: &WgpuFramebuffer,
    ) -> RenderResult<Vec<u8>> {
        let texture = framebuffer.read_texture().ok_or_else(|| {
            RenderError::Validation("framebuffer has no color attachment to read".to_string())
        })?;
        let size = u64::from(padded_bytes_per_row(rect.width)) * u64::from(rect.height);
        let staging = self.staging_buffer(size)?;
        self.scoped(|device| read_rgba8(device, &self.queue, &staging, texture, rect))?
    }

    fn destroy_texture(&mut self, texture: WgpuTexture) {
        texture.texture.destroy();
    }

    fn destroy_renderbuffer(&mut self, renderbuffer: WgpuRenderbuffer) {
        renderbuffer.texture.destroy();
    }

    fn destroy_framebuffer(&mut self, framebuffer: WgpuFramebuffer) {
        framebuffer.release();
    }

    fn destroy_depth_copy(&mut self, depth_copy: WgpuDepthCopy) {
        depth_copy.framebuffer.release();
        depth_copy.target.texture.destroy();
    }
}
