//! Pick depth demonstration.
//!
//! This demo shows:
//! - Creating a headless pick device and target
//! - Picking through several overlapping layers in a single draw
//! - Turning the picked depth back into a view-space distance
//! - Forcing the renderbuffer path
//!
//! Run with: cargo run --example `pick_depth_demo`

use glam::{Mat4, Vec4};
use pickbuffer::*;

/// Depths of the layers stacked under the cursor, drawn back to front.
const LAYER_DEPTHS: [f32; LAYER_COUNT as usize] = [0.8, 0.35, 0.6];
const LAYER_COUNT: u32 = 3;

const NEAR: f32 = 0.1;
const FAR: f32 = 100.0;

fn layer_shader_source() -> String {
    let depths = LAYER_DEPTHS
        .iter()
        .map(|d| format!("{d:?}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "{PACK_DEPTH_WGSL}
struct VertexOutput {{
    @builtin(position) position: vec4<f32>,
}}

@vertex
fn vs_main(
    @builtin(vertex_index) vertex_index: u32,
    @builtin(instance_index) instance_index: u32,
) -> VertexOutput {{
    var depths = array<f32, {count}>({depths});
    let uv = vec2<f32>(f32((vertex_index << 1u) & 2u), f32(vertex_index & 2u));
    var out: VertexOutput;
    out.position = vec4<f32>(uv * 2.0 - 1.0, depths[instance_index], 1.0);
    return out;
}}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {{
    return pack_depth(input.position.z);
}}
",
        count = LAYER_COUNT,
    )
}

fn create_layer_pipeline(device: &wgpu::Device) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Layer Shader"),
        source: wgpu::ShaderSource::Wgsl(layer_shader_source().into()),
    });
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Layer Pipeline"),
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

/// Unprojects a [0, 1] depth to the distance in front of the camera.
fn view_distance(projection: Mat4, depth: f32) -> f32 {
    let view = projection.inverse() * Vec4::new(0.0, 0.0, depth, 1.0);
    -view.z / view.w
}

fn pick(device: &mut WgpuPickDevice, pipeline: &wgpu::RenderPipeline, options: PickOptions) {
    let mut target = WgpuPickTarget::with_options(options);

    match pick_depth(&mut target, device, |pass| {
        pass.set_pipeline(pipeline);
        pass.draw(0..3, 0..LAYER_COUNT);
    }) {
        Ok(depth) => {
            let projection = Mat4::perspective_rh(std::f32::consts::FRAC_PI_4, 1.0, NEAR, FAR);
            println!(
                "  {:?} path: depth {depth:.5}, {:.3} units from the camera",
                target.depth_stencil_kind(),
                view_distance(projection, depth)
            );
        }
        Err(e) => println!("  pick failed: {e}"),
    }

    target.destroy(device);
}

fn main() {
    init_logging();

    let mut device = match create_headless_device() {
        Ok(device) => device,
        Err(e) => {
            eprintln!("No GPU adapter available: {e}");
            return;
        }
    };
    let pipeline = create_layer_pipeline(device.device());

    println!("Layers at depths {LAYER_DEPTHS:?}; the nearest one is picked.");
    pick(&mut device, &pipeline, PickOptions::default());
    pick(
        &mut device,
        &pipeline,
        PickOptions {
            force_renderbuffer: true,
            ..PickOptions::default()
        },
    );
}
