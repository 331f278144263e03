//! Pick target integration tests against the mock device.

use pickbuffer::mock::{MockCall, MockPickDevice};
use pickbuffer::*;
use proptest::prelude::*;

fn draw_and_read(
    target: &mut PickTarget<MockPickDevice>,
    device: &mut MockPickDevice,
    depth: f32,
    color: [u8; 4],
) -> f32 {
    let framebuffer = target.begin(device).unwrap().framebuffer();
    device.draw(framebuffer, depth, color).unwrap();
    target.get_depth(device).unwrap()
}

#[test]
fn test_pick_reads_drawn_depth() {
    let mut device = MockPickDevice::new();
    let mut target = PickTarget::new();

    let depth = draw_and_read(&mut target, &mut device, 0.75, [255, 0, 0, 255]);
    assert!((depth - 0.75).abs() < 1e-5, "got {depth}");
    assert_eq!(target.depth_stencil_kind(), Some(DepthStencilKind::Texture));

    target.destroy(&mut device);
}

#[test]
fn test_closest_draw_wins() {
    let mut device = MockPickDevice::new();
    let mut target = PickTarget::new();

    let framebuffer = target.begin(&mut device).unwrap().framebuffer();
    device.draw(framebuffer, 0.6, [1, 2, 3, 4]).unwrap();
    device.draw(framebuffer, 0.3, [5, 6, 7, 8]).unwrap();
    device.draw(framebuffer, 0.9, [9, 9, 9, 9]).unwrap();
    let depth = target.get_depth(&mut device).unwrap();

    assert!((depth - 0.3).abs() < 1e-5, "got {depth}");
    target.destroy(&mut device);
}

#[test]
fn test_each_pick_starts_from_cleared_target() {
    let mut device = MockPickDevice::new();
    let mut target = PickTarget::new();

    let near = draw_and_read(&mut target, &mut device, 0.25, [0; 4]);
    let far = draw_and_read(&mut target, &mut device, 0.5, [0; 4]);

    assert!((near - 0.25).abs() < 1e-5);
    // Without the clear the earlier, nearer draw would still win.
    assert!((far - 0.5).abs() < 1e-5);
    target.destroy(&mut device);
}

#[test]
fn test_pick_without_draw_reads_zero() {
    for mut device in [MockPickDevice::new(), MockPickDevice::without_depth_texture()] {
        let mut target = PickTarget::new();
        target.begin(&mut device).unwrap();
        assert_eq!(target.get_depth(&mut device).unwrap(), 0.0);
        target.destroy(&mut device);
    }
}

#[test]
fn test_repeated_picks_reuse_resources() {
    let mut device = MockPickDevice::new();
    let mut target = PickTarget::new();

    for _ in 0..5 {
        draw_and_read(&mut target, &mut device, 0.5, [0; 4]);
    }

    let allocations = device
        .calls()
        .iter()
        .filter(|call| {
            matches!(
                call,
                MockCall::CreateTexture { .. }
                    | MockCall::CreateRenderbuffer { .. }
                    | MockCall::CreateFramebuffer { .. }
                    | MockCall::CreateDepthCopy { .. }
            )
        })
        .count();
    // Three pick handles, then the depth copy with its own target and framebuffer.
    assert_eq!(allocations, 6);
    assert_eq!(device.clear_count(), 5);
    assert_eq!(device.depth_copy_count(), 5);

    target.destroy(&mut device);
}

#[test]
fn test_depth_stencil_is_texture_xor_renderbuffer() {
    for (mut device, expected) in [
        (MockPickDevice::new(), DepthStencilKind::Texture),
        (
            MockPickDevice::without_depth_texture(),
            DepthStencilKind::Renderbuffer,
        ),
    ] {
        let mut target = PickTarget::new();
        target.begin(&mut device).unwrap();

        let attachment = target.depth_stencil_attachment().unwrap();
        assert_eq!(attachment.kind(), expected);
        assert_ne!(attachment.texture().is_some(), attachment.renderbuffer().is_some());
        match expected {
            DepthStencilKind::Texture => {
                assert_eq!(device.live_texture_count(), 2);
                assert_eq!(device.live_renderbuffer_count(), 0);
            }
            DepthStencilKind::Renderbuffer => {
                assert_eq!(device.live_texture_count(), 1);
                assert_eq!(device.live_renderbuffer_count(), 1);
            }
        }

        target.destroy(&mut device);
    }
}

#[test]
fn test_renderbuffer_path_decodes_packed_color() {
    let mut device = MockPickDevice::without_depth_texture();
    let mut target = PickTarget::new();

    // The pick shader writes pack_depth(z) to color on this path.
    let packed = pack_depth(0.75).bytes();
    let depth = draw_and_read(&mut target, &mut device, 0.75, packed);

    assert!((depth - 0.75).abs() < 1e-5, "got {depth}");
    assert_eq!(device.depth_copy_count(), 0);
    target.destroy(&mut device);
}

#[test]
fn test_destroy_releases_everything_once() {
    let mut device = MockPickDevice::new();
    let mut target = PickTarget::new();
    draw_and_read(&mut target, &mut device, 0.5, [0; 4]);

    target.destroy(&mut device);
    target.destroy(&mut device);

    assert!(target.is_destroyed());
    assert_eq!(device.live_texture_count(), 0);
    assert_eq!(device.live_renderbuffer_count(), 0);
    assert_eq!(device.live_framebuffer_count(), 0);
    assert_eq!(device.live_depth_copy_count(), 0);
    assert_eq!(device.invalid_release_count(), 0);
    assert!(matches!(
        target.get_depth(&mut device),
        Err(PickError::Destroyed)
    ));
    assert!(matches!(target.begin(&mut device), Err(PickError::Destroyed)));
}

#[test]
fn test_options_from_json() {
    let options: PickOptions =
        serde_json::from_str(r#"{ "force_renderbuffer": true }"#).unwrap();
    let mut device = MockPickDevice::new();
    let mut target = PickTarget::with_options(options);

    target.begin(&mut device).unwrap();
    assert_eq!(
        target.depth_stencil_kind(),
        Some(DepthStencilKind::Renderbuffer)
    );
    assert_eq!(target.clear_command().depth, 1.0);
    target.destroy(&mut device);
}

#[test]
fn test_uniformly_encoded_three_quarters() {
    let mut device = MockPickDevice::without_depth_texture();
    let mut target = PickTarget::new();

    let depth = draw_and_read(&mut target, &mut device, 0.75, [191, 191, 191, 191]);
    assert!((depth - 0.75).abs() < 5e-3, "got {depth}");
    target.destroy(&mut device);
}

#[test]
fn test_truncated_read_back_is_reported() {
    let mut device = MockPickDevice::new();
    let mut target = PickTarget::new();
    let framebuffer = target.begin(&mut device).unwrap().framebuffer();
    device.draw(framebuffer, 0.4, [0; 4]).unwrap();
    device.truncate_reads(3);

    let err = target.get_depth(&mut device).unwrap_err();
    assert!(matches!(err, PickError::ShortReadback { len: 3 }), "got {err}");
    target.destroy(&mut device);
}

proptest! {
    #[test]
    fn prop_pick_reads_nearest_draw(depths in prop::collection::vec(0.0f32..0.999, 1..8)) {
        let mut device = MockPickDevice::new();
        let mut target = PickTarget::new();

        let framebuffer = target.begin(&mut device).unwrap().framebuffer();
        for &depth in &depths {
            device.draw(framebuffer, depth, [0; 4]).unwrap();
        }
        let picked = target.get_depth(&mut device).unwrap();
        target.destroy(&mut device);

        let nearest = depths.iter().copied().fold(f32::INFINITY, f32::min);
        prop_assert!((picked - nearest).abs() < 1e-5, "picked {} nearest {}", picked, nearest);
    }
}
