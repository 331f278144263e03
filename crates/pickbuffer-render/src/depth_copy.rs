//! Depth copy pass.
//!
//! Depth attachments cannot be read back as color, so the pick depth texture is
//! resolved by a fullscreen triangle that loads the depth texel and writes
//! `pack_depth(depth)` into a 1x1 RGBA8 target, which is then read back like
//! any color attachment.

use pickbuffer_core::{ClearCommand, Extent, Viewport};

use crate::formats::pick_color_target;
use crate::pass::encode_pass;
use crate::resources::{WgpuFramebuffer, WgpuTexture};

/// WGSL source of `fn pack_depth(depth: f32) -> vec4<f32>`.
///
/// Pick shaders that draw into a renderbuffer-backed target must write
/// `pack_depth(position.z)` to color so the read-back decodes to depth.
pub const PACK_DEPTH_WGSL: &str = include_str!("shaders/pack_depth.wgsl");

/// Full source of the depth copy shader.
pub fn depth_copy_shader_source() -> String {
    format!(
        "{PACK_DEPTH_WGSL}\n{}",
        include_str!("shaders/depth_copy.wgsl")
    )
}

/// Pipeline shared by every depth copy on a device.
pub struct DepthCopyPass {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
}

impl DepthCopyPass {
    /// Creates the depth copy pipeline.
    pub fn new(device: &wgpu::Device) -> Self {
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Depth Copy Bind Group Layout"),
            entries: &[
                // Source depth texture
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Depth,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
            ],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Depth Copy Shader"),
            source: wgpu::ShaderSource::Wgsl(depth_copy_shader_source().into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Depth Copy Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Depth Copy Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(pick_color_target())],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..wgpu::PrimitiveState::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            bind_group_layout,
        }
    }

    /// Resolves `depth` into `target`.
    pub(crate) fn execute(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        depth: &WgpuTexture,
        target: &WgpuFramebuffer,
    ) {
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Depth Copy Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(depth.sample_view()),
            }],
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Depth Copy Encoder"),
        });
        {
            let mut render_pass = encode_pass(
                &mut encoder,
                "Depth Copy Pass",
                target,
                Viewport::from_extent(Extent::UNIT),
                Some(&ClearCommand::default()),
            );
            render_pass.set_pipeline(&self.pipeline);
            render_pass.set_bind_group(0, &bind_group, &[]);
            render_pass.draw(0..3, 0..1); // Fullscreen triangle
        }
        queue.submit(std::iter::once(encoder.finish()));
    }
}

/// The packed RGBA8 target of a depth copy and the framebuffer that reads it.
#[derive(Debug)]
pub struct WgpuDepthCopy {
    pub(crate) target: WgpuTexture,
    pub(crate) framebuffer: WgpuFramebuffer,
}

impl WgpuDepthCopy {
    pub fn target(&self) -> &WgpuTexture {
        &self.target
    }

    pub fn framebuffer(&self) -> &WgpuFramebuffer {
        &self.framebuffer
    }
}
