//! Headless GPU pick tests.
//!
//! These tests need a GPU adapter (real or software fallback). Without one
//! device creation fails and the test returns early.

use pickbuffer::*;

const PICK_DEPTH: f32 = 0.75;

/// A fullscreen triangle at a fixed depth that writes its packed depth to color.
fn pick_shader_source() -> String {
    format!(
        "{PACK_DEPTH_WGSL}
@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32) -> @builtin(position) vec4<f32> {{
    let uv = vec2<f32>(f32((vertex_index << 1u) & 2u), f32(vertex_index & 2u));
    return vec4<f32>(uv * 2.0 - 1.0, {PICK_DEPTH:?}, 1.0);
}}

@fragment
fn fs_main(@builtin(position) position: vec4<f32>) -> @location(0) vec4<f32> {{
    return pack_depth(position.z);
}}
"
    )
}

fn create_pick_pipeline(device: &wgpu::Device) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Test Pick Shader"),
        source: wgpu::ShaderSource::Wgsl(pick_shader_source().into()),
    });
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Test Pick Pipeline"),
        layout: None,
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
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: Some(pick_depth_stencil_state()),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

fn run_pick(device: &mut WgpuPickDevice, options: PickOptions) -> (f32, f32, DepthStencilKind) {
    let pipeline = create_pick_pipeline(device.device());
    let mut target = WgpuPickTarget::with_options(options);

    let empty = pick_depth(&mut target, device, |_pass| {}).expect("empty pick failed");
    let depth = pick_depth(&mut target, device, |pass| {
        pass.set_pipeline(&pipeline);
        pass.draw(0..3, 0..1);
    })
    .expect("pick failed");
    let kind = target.depth_stencil_kind().expect("target not provisioned");

    target.destroy(device);
    (empty, depth, kind)
}

#[test]
fn headless_pick_tests() {
    init_logging();

    let mut device = match create_headless_device() {
        Ok(device) => device,
        Err(e) => {
            eprintln!("Skipping headless pick tests: no GPU adapter available ({e})");
            return;
        }
    };

    // --- Default path: depth texture where supported ---
    {
        let (empty, depth, kind) = run_pick(&mut device, PickOptions::default());
        assert_eq!(empty, 0.0, "cleared target should read 0");
        assert!(
            (depth - PICK_DEPTH).abs() < 1e-3,
            "{kind:?} path read {depth}"
        );
        if device.supports_depth_texture() {
            assert_eq!(kind, DepthStencilKind::Texture);
        }
    }

    // --- Forced renderbuffer path ---
    {
        let options = PickOptions {
            force_renderbuffer: true,
            ..PickOptions::default()
        };
        let (empty, depth, kind) = run_pick(&mut device, options);
        assert_eq!(kind, DepthStencilKind::Renderbuffer);
        assert_eq!(empty, 0.0, "cleared target should read 0");
        assert!(
            (depth - PICK_DEPTH).abs() < 1e-3,
            "renderbuffer path read {depth}"
        );
    }

    // --- A rejected clear is reported, not raised through the device ---
    {
        let color = device
            .create_texture(&TextureDescriptor::PICK_COLOR)
            .expect("color texture");
        let framebuffer = device
            .create_framebuffer(&FramebufferDescriptor {
                color_attachments: &[&color],
                depth_stencil: None,
                destroy_attachments: true,
            })
            .expect("framebuffer");
        // The viewport is larger than the 1x1 attachment.
        let pass_state = PassState::new(framebuffer, Viewport::new(0, 0, 4, 4));

        let result = device.clear(&ClearCommand::default(), &pass_state);
        assert!(
            matches!(result, Err(RenderError::Validation(_))),
            "oversized viewport should fail validation, got {result:?}"
        );
        device.destroy_framebuffer(pass_state.into_framebuffer());
    }
}
