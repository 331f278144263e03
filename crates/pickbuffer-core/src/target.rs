//! The 1x1 offscreen pick target.
//!
//! A [`PickTarget`] owns a color texture, a depth-stencil attachment and the
//! framebuffer binding them. Nothing is allocated until the first
//! [`PickTarget::begin`], because whether the device can sample depth textures
//! is only known once a device is at hand.
//!
//! A pick query is:
//! 1. `begin()` - provision if needed, clear, get the pass state
//! 2. issue exactly one draw into the pass state
//! 3. `get_depth()` - optionally read back the depth under the pick

use crate::depth::PackedDepth;
use crate::device::PickDevice;
use crate::error::{PickError, PickResult};
use crate::options::PickOptions;
use crate::pass_state::PassState;
use crate::resource::{
    ClearCommand, DepthStencilAttachment, DepthStencilKind, Extent, FramebufferDescriptor,
    RenderbufferDescriptor, TextureDescriptor, Viewport,
};

/// GPU resources of a provisioned target. Dropped only through `release`.
struct PickResources<D: PickDevice> {
    color: D::Texture,
    depth_stencil: DepthStencilAttachment<D::Texture, D::Renderbuffer>,
    pass_state: PassState<D::Framebuffer>,
    /// Created on the first texture-path depth read.
    depth_copy: Option<D::DepthCopy>,
}

impl<D: PickDevice> PickResources<D> {
    /// Allocates every resource or none of them.
    fn provision(device: &mut D, options: &PickOptions) -> Result<Self, D::Error> {
        let use_texture = device.supports_depth_texture() && !options.force_renderbuffer;

        let color = device.create_texture(&TextureDescriptor::PICK_COLOR)?;

        let depth_stencil = if use_texture {
            device
                .create_texture(&TextureDescriptor::PICK_DEPTH_STENCIL)
                .map(DepthStencilAttachment::Texture)
        } else {
            device
                .create_renderbuffer(&RenderbufferDescriptor::PICK_DEPTH_STENCIL)
                .map(DepthStencilAttachment::Renderbuffer)
        };
        let depth_stencil = match depth_stencil {
            Ok(depth_stencil) => depth_stencil,
            Err(err) => {
                device.destroy_texture(color);
                return Err(err);
            }
        };

        let framebuffer = device.create_framebuffer(&FramebufferDescriptor {
            color_attachments: &[&color],
            depth_stencil: Some(depth_stencil.as_ref()),
            destroy_attachments: false,
        });
        let framebuffer = match framebuffer {
            Ok(framebuffer) => framebuffer,
            Err(err) => {
                destroy_depth_stencil(device, depth_stencil);
                device.destroy_texture(color);
                return Err(err);
            }
        };

        log::debug!(
            "provisioned pick target with depth-stencil {:?}",
            depth_stencil.kind()
        );

        Ok(Self {
            color,
            depth_stencil,
            pass_state: PassState::new(framebuffer, Viewport::from_extent(Extent::UNIT)),
            depth_copy: None,
        })
    }

    /// Releases each resource exactly once, framebuffer first.
    fn release(self, device: &mut D) {
        device.destroy_framebuffer(self.pass_state.into_framebuffer());
        device.destroy_texture(self.color);
        destroy_depth_stencil(device, self.depth_stencil);
        if let Some(depth_copy) = self.depth_copy {
            device.destroy_depth_copy(depth_copy);
        }
    }
}

fn destroy_depth_stencil<D: PickDevice>(
    device: &mut D,
    depth_stencil: DepthStencilAttachment<D::Texture, D::Renderbuffer>,
) {
    match depth_stencil {
        DepthStencilAttachment::Texture(texture) => device.destroy_texture(texture),
        DepthStencilAttachment::Renderbuffer(renderbuffer) => {
            device.destroy_renderbuffer(renderbuffer);
        }
    }
}

enum State<D: PickDevice> {
    Unprovisioned,
    Provisioned(PickResources<D>),
    /// Terminal.
    Destroyed,
}

/// Offscreen 1x1 render target for picking.
pub struct PickTarget<D: PickDevice> {
    state: State<D>,
    options: PickOptions,
    clear_command: ClearCommand,
}

impl<D: PickDevice> Default for PickTarget<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: PickDevice> PickTarget<D> {
    /// Creates an unprovisioned target with default options.
    pub fn new() -> Self {
        Self::with_options(PickOptions::default())
    }

    /// Creates an unprovisioned target.
    pub fn with_options(options: PickOptions) -> Self {
        let clear_command = options.clear_command();
        Self {
            state: State::Unprovisioned,
            options,
            clear_command,
        }
    }

    /// Prepares the target for a pick draw.
    ///
    /// Provisions resources on first use, then clears color and depth. The
    /// returned pass state covers the single pixel at (0, 0, 1, 1); the caller
    /// issues exactly one draw into it. Repeated calls reuse the same
    /// attachments.
    ///
    /// Device failures are returned unchanged in [`PickError::Device`].
    pub fn begin(&mut self, device: &mut D) -> PickResult<&PassState<D::Framebuffer>, D::Error> {
        match self.state {
            State::Destroyed => {
                log::warn!("begin() called on a destroyed pick target");
                return Err(PickError::Destroyed);
            }
            State::Unprovisioned => {
                let resources = PickResources::provision(device, &self.options)?;
                self.state = State::Provisioned(resources);
            }
            State::Provisioned(_) => {}
        }

        let State::Provisioned(resources) = &self.state else {
            return Err(PickError::NotProvisioned);
        };

        log::trace!("clearing pick target");
        device.clear(&self.clear_command, &resources.pass_state)?;
        Ok(&resources.pass_state)
    }

    /// Reads back the depth under the pick.
    ///
    /// Must follow `begin()` and a draw into its pass state; otherwise the
    /// value is whatever the attachment last held. On the texture path the
    /// depth attachment is first resolved to packed color by the device's
    /// depth-copy helper; on the renderbuffer path the pick framebuffer is read
    /// directly and the pick shader is expected to have written packed depth to
    /// color. Both decode the same way.
    ///
    /// A read-back shorter than one pixel fails with
    /// [`PickError::ShortReadback`].
    pub fn get_depth(&mut self, device: &mut D) -> PickResult<f32, D::Error> {
        let resources = match &mut self.state {
            State::Provisioned(resources) => resources,
            State::Unprovisioned => return Err(PickError::NotProvisioned),
            State::Destroyed => {
                log::warn!("get_depth() called on a destroyed pick target");
                return Err(PickError::Destroyed);
            }
        };

        let rect = resources.pass_state.viewport();
        let pixels = match &resources.depth_stencil {
            DepthStencilAttachment::Texture(depth_texture) => {
                let depth_copy = match resources.depth_copy.take() {
                    Some(depth_copy) => depth_copy,
                    None => device.create_depth_copy()?,
                };
                let depth_copy = resources.depth_copy.insert(depth_copy);
                device.copy_depth(depth_copy, depth_texture)?;
                let framebuffer = device.depth_copy_framebuffer(depth_copy);
                device.read_pixels(rect, framebuffer)?
            }
            DepthStencilAttachment::Renderbuffer(_) => {
                device.read_pixels(rect, resources.pass_state.framebuffer())?
            }
        };

        let packed = PackedDepth::from_pixels(&pixels)
            .ok_or(PickError::ShortReadback { len: pixels.len() })?;
        log::trace!("pick depth bytes {:?}", packed.bytes());
        Ok(packed.decode())
    }

    /// Releases all resources and marks the target destroyed.
    ///
    /// Calling this again is a no-op.
    pub fn destroy(&mut self, device: &mut D) {
        match std::mem::replace(&mut self.state, State::Destroyed) {
            State::Provisioned(resources) => {
                resources.release(device);
                log::debug!("destroyed pick target");
            }
            State::Unprovisioned | State::Destroyed => {}
        }
    }

    /// Whether `destroy()` has been called.
    pub fn is_destroyed(&self) -> bool {
        matches!(self.state, State::Destroyed)
    }

    /// Whether resources are currently allocated.
    pub fn is_provisioned(&self) -> bool {
        matches!(self.state, State::Provisioned(_))
    }

    /// Which depth-stencil resource was chosen, once provisioned.
    pub fn depth_stencil_kind(&self) -> Option<DepthStencilKind> {
        self.resources().map(|r| r.depth_stencil.kind())
    }

    pub fn depth_stencil_attachment(
        &self,
    ) -> Option<DepthStencilAttachment<&D::Texture, &D::Renderbuffer>> {
        self.resources().map(|r| r.depth_stencil.as_ref())
    }

    pub fn color_attachment(&self) -> Option<&D::Texture> {
        self.resources().map(|r| &r.color)
    }

    pub fn pass_state(&self) -> Option<&PassState<D::Framebuffer>> {
        self.resources().map(|r| &r.pass_state)
    }

    pub fn clear_command(&self) -> &ClearCommand {
        &self.clear_command
    }

    pub fn options(&self) -> &PickOptions {
        &self.options
    }

    fn resources(&self) -> Option<&PickResources<D>> {
        match &self.state {
            State::Provisioned(resources) => Some(resources),
            State::Unprovisioned | State::Destroyed => None,
        }
    }
}

impl<D: PickDevice> Drop for PickTarget<D> {
    fn drop(&mut self) {
        if self.is_provisioned() {
            log::warn!("pick target dropped without destroy(); GPU resources were not released");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockCall, MockPickDevice};

    #[test]
    fn test_new_target_is_unprovisioned() {
        let target: PickTarget<MockPickDevice> = PickTarget::new();
        assert!(!target.is_provisioned());
        assert!(!target.is_destroyed());
        assert!(target.pass_state().is_none());
        assert!(target.depth_stencil_kind().is_none());
    }

    #[test]
    fn test_begin_provisions_unit_viewport() {
        let mut device = MockPickDevice::new();
        let mut target = PickTarget::new();

        let viewport = target.begin(&mut device).expect("begin").viewport();
        assert_eq!(viewport, Viewport::new(0, 0, 1, 1));
        assert!(target.is_provisioned());

        target.destroy(&mut device);
    }

    #[test]
    fn test_begin_is_idempotent() {
        let mut device = MockPickDevice::new();
        let mut target = PickTarget::new();

        let first = target.begin(&mut device).expect("begin").framebuffer().id;
        let color = target.color_attachment().expect("color").id;
        let second = target.begin(&mut device).expect("begin").framebuffer().id;

        assert_eq!(first, second);
        assert_eq!(color, target.color_attachment().expect("color").id);
        assert_eq!(device.live_texture_count(), 2);
        assert_eq!(device.clear_count(), 2);

        target.destroy(&mut device);
    }

    #[test]
    fn test_capable_device_uses_texture() {
        let mut device = MockPickDevice::new();
        let mut target = PickTarget::new();
        target.begin(&mut device).expect("begin");

        assert_eq!(target.depth_stencil_kind(), Some(DepthStencilKind::Texture));
        assert_eq!(device.live_renderbuffer_count(), 0);
        target.destroy(&mut device);
    }

    #[test]
    fn test_incapable_device_uses_renderbuffer() {
        let mut device = MockPickDevice::without_depth_texture();
        let mut target = PickTarget::new();
        target.begin(&mut device).expect("begin");

        assert_eq!(
            target.depth_stencil_kind(),
            Some(DepthStencilKind::Renderbuffer)
        );
        // Only the color attachment is a texture.
        assert_eq!(device.live_texture_count(), 1);
        assert_eq!(device.live_renderbuffer_count(), 1);
        target.destroy(&mut device);
    }

    #[test]
    fn test_force_renderbuffer_option() {
        let mut device = MockPickDevice::new();
        let mut target = PickTarget::with_options(PickOptions {
            force_renderbuffer: true,
            ..PickOptions::default()
        });
        target.begin(&mut device).expect("begin");
        assert_eq!(
            target.depth_stencil_kind(),
            Some(DepthStencilKind::Renderbuffer)
        );
        target.destroy(&mut device);
    }

    #[test]
    fn test_begin_clears_with_far_depth_and_transparent_color() {
        let mut device = MockPickDevice::new();
        let mut target = PickTarget::new();
        target.begin(&mut device).expect("begin");

        let clear = device
            .calls()
            .iter()
            .find_map(|call| match call {
                MockCall::Clear { clear, .. } => Some(*clear),
                _ => None,
            })
            .expect("clear recorded");
        assert_eq!(clear.depth, 1.0);
        assert_eq!(clear.color, glam::Vec4::ZERO);
        target.destroy(&mut device);
    }

    #[test]
    fn test_framebuffer_does_not_own_attachments() {
        let mut device = MockPickDevice::new();
        let mut target = PickTarget::new();
        target.begin(&mut device).expect("begin");

        let created = device
            .calls()
            .iter()
            .find_map(|call| match call {
                MockCall::CreateFramebuffer {
                    destroy_attachments,
                    ..
                } => Some(*destroy_attachments),
                _ => None,
            })
            .expect("framebuffer created");
        assert!(!created);
        target.destroy(&mut device);
    }

    #[test]
    fn test_destroy_releases_everything_once() {
        let mut device = MockPickDevice::new();
        let mut target = PickTarget::new();
        target.begin(&mut device).expect("begin");
        target.get_depth(&mut device).expect("depth");

        target.destroy(&mut device);
        assert!(target.is_destroyed());
        assert_eq!(device.live_texture_count(), 0);
        assert_eq!(device.live_framebuffer_count(), 0);
        assert_eq!(device.live_depth_copy_count(), 0);

        let releases = device.release_count();
        target.destroy(&mut device);
        assert!(target.is_destroyed());
        assert_eq!(device.release_count(), releases);
    }

    #[test]
    fn test_destroy_before_begin() {
        let mut device = MockPickDevice::new();
        let mut target: PickTarget<MockPickDevice> = PickTarget::new();
        target.destroy(&mut device);
        assert!(target.is_destroyed());
        assert_eq!(device.release_count(), 0);
    }

    #[test]
    fn test_destroyed_target_rejects_use() {
        let mut device = MockPickDevice::new();
        let mut target = PickTarget::new();
        target.begin(&mut device).expect("begin");
        target.destroy(&mut device);

        assert!(matches!(target.begin(&mut device), Err(PickError::Destroyed)));
        assert!(matches!(
            target.get_depth(&mut device),
            Err(PickError::Destroyed)
        ));
        assert_eq!(device.live_texture_count(), 0);
    }

    #[test]
    fn test_get_depth_before_begin() {
        let mut device = MockPickDevice::new();
        let mut target: PickTarget<MockPickDevice> = PickTarget::new();
        assert!(matches!(
            target.get_depth(&mut device),
            Err(PickError::NotProvisioned)
        ));
    }

    #[test]
    fn test_failed_provisioning_leaves_nothing_allocated() {
        let mut device = MockPickDevice::new();
        // Color texture succeeds, depth-stencil texture fails.
        device.fail_allocation_after(1);
        let mut target = PickTarget::new();

        assert!(matches!(target.begin(&mut device), Err(PickError::Device(_))));
        assert!(!target.is_provisioned());
        assert_eq!(device.live_texture_count(), 0);

        // The next attempt provisions normally.
        target.begin(&mut device).expect("begin");
        assert!(target.is_provisioned());
        target.destroy(&mut device);
    }

    #[test]
    fn test_failed_framebuffer_releases_attachments() {
        let mut device = MockPickDevice::without_depth_texture();
        device.fail_allocation_after(2);
        let mut target = PickTarget::new();

        assert!(target.begin(&mut device).is_err());
        assert_eq!(device.live_texture_count(), 0);
        assert_eq!(device.live_renderbuffer_count(), 0);
    }

    #[test]
    fn test_texture_path_reads_depth_copy() {
        let mut device = MockPickDevice::new();
        let mut target = PickTarget::new();
        let framebuffer = target.begin(&mut device).expect("begin").framebuffer();
        // Color holds an object id, which must not leak into depth.
        device.draw(framebuffer, 0.5, [9, 9, 9, 9]).expect("draw");

        let depth = target.get_depth(&mut device).expect("depth");
        assert!((depth - 0.5).abs() < 1e-5, "got {depth}");
        assert_eq!(device.depth_copy_count(), 1);
        target.destroy(&mut device);
    }

    #[test]
    fn test_depth_copy_is_reused() {
        let mut device = MockPickDevice::new();
        let mut target = PickTarget::new();
        for _ in 0..3 {
            target.begin(&mut device).expect("begin");
            target.get_depth(&mut device).expect("depth");
        }
        assert_eq!(device.live_depth_copy_count(), 1);
        assert_eq!(device.depth_copy_count(), 3);
        target.destroy(&mut device);
    }

    #[test]
    fn test_renderbuffer_path_reads_pick_framebuffer() {
        let mut device = MockPickDevice::without_depth_texture();
        let mut target = PickTarget::new();
        let framebuffer = target.begin(&mut device).expect("begin").framebuffer();
        device
            .draw(framebuffer, 0.2, [255, 255, 255, 255])
            .expect("draw");

        let depth = target.get_depth(&mut device).expect("depth");
        assert_eq!(depth, 1.0);
        assert_eq!(device.depth_copy_count(), 0);
        assert_eq!(device.live_depth_copy_count(), 0);
        target.destroy(&mut device);
    }

    #[test]
    fn test_cleared_target_reads_zero_depth() {
        let mut device = MockPickDevice::new();
        let mut target = PickTarget::new();
        target.begin(&mut device).expect("begin");

        // Far plane packs to zero.
        assert_eq!(target.get_depth(&mut device).expect("depth"), 0.0);
        target.destroy(&mut device);
    }

    #[test]
    fn test_short_read_back_is_an_error() {
        for mut device in [MockPickDevice::new(), MockPickDevice::without_depth_texture()] {
            let mut target = PickTarget::new();
            target.begin(&mut device).expect("begin");
            device.truncate_reads(2);

            assert!(matches!(
                target.get_depth(&mut device),
                Err(PickError::ShortReadback { len: 2 })
            ));
            assert_eq!(device.read_count(), 1);
            target.destroy(&mut device);
        }
    }
}
