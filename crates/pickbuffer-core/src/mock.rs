//! Mock pick device for tests (no GPU required).
//!
//! [`MockPickDevice`] implements [`PickDevice`] against a simulated single-pixel
//! surface. It records every call, tracks which handles are alive, and can be
//! told to fail an upcoming allocation.
//!
//! The surface models one depth value and one RGBA8 color shared by every
//! framebuffer created with color attachments; [`MockPickDevice::draw`] writes
//! to it with a `Less` depth test. Depth copies pack the current depth with
//! [`pack_depth`].

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::depth::pack_depth;
use crate::device::PickDevice;
use crate::pass_state::PassState;
use crate::resource::{
    ClearCommand, DepthStencilAttachment, FramebufferDescriptor, RenderbufferDescriptor,
    TextureDescriptor, Viewport,
};

/// Errors raised by the mock device.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MockError {
    /// Simulated allocation failure.
    #[error("out of memory")]
    OutOfMemory,

    /// A framebuffer was used after it was destroyed.
    #[error("framebuffer {0} is not alive")]
    StaleFramebuffer(u32),
}

#[derive(Debug, PartialEq, Eq)]
pub struct MockTexture {
    pub id: u32,
    pub desc: TextureDescriptor,
}

#[derive(Debug, PartialEq, Eq)]
pub struct MockRenderbuffer {
    pub id: u32,
    pub desc: RenderbufferDescriptor,
}

#[derive(Debug, PartialEq, Eq)]
pub struct MockFramebuffer {
    pub id: u32,
    pub color_attachments: Vec<u32>,
    pub depth_stencil: Option<DepthStencilAttachment<u32, u32>>,
    pub destroy_attachments: bool,
}

#[derive(Debug, PartialEq, Eq)]
pub struct MockDepthCopy {
    pub id: u32,
    pub target: MockTexture,
    pub framebuffer: MockFramebuffer,
}

/// A recorded device call.
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    CreateTexture {
        id: u32,
        desc: TextureDescriptor,
    },
    CreateRenderbuffer {
        id: u32,
        desc: RenderbufferDescriptor,
    },
    CreateFramebuffer {
        id: u32,
        color_attachments: Vec<u32>,
        depth_stencil: Option<DepthStencilAttachment<u32, u32>>,
        destroy_attachments: bool,
    },
    CreateDepthCopy {
        id: u32,
    },
    Clear {
        framebuffer: u32,
        viewport: Viewport,
        clear: ClearCommand,
    },
    Draw {
        framebuffer: u32,
        depth: f32,
        color: [u8; 4],
    },
    CopyDepth {
        depth_copy: u32,
        depth_stencil: u32,
    },
    ReadPixels {
        framebuffer: u32,
        rect: Viewport,
    },
    DestroyTexture(u32),
    DestroyRenderbuffer(u32),
    DestroyFramebuffer(u32),
    DestroyDepthCopy(u32),
}

/// GPU-free [`PickDevice`].
#[derive(Debug)]
pub struct MockPickDevice {
    depth_texture_supported: bool,
    next_id: u32,
    /// Successful allocations left before the next one fails.
    fail_after: Option<usize>,

    live_textures: HashSet<u32>,
    live_renderbuffers: HashSet<u32>,
    live_framebuffers: HashSet<u32>,
    live_depth_copies: HashSet<u32>,
    /// Releases of handles that were not alive.
    invalid_releases: usize,

    surface_depth: f32,
    surface_color: [u8; 4],
    /// Byte limit applied to every read-back.
    read_len: Option<usize>,
    /// Packed pixel held by each depth-copy framebuffer.
    depth_copy_pixels: HashMap<u32, [u8; 4]>,

    calls: Vec<MockCall>,
}

impl Default for MockPickDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPickDevice {
    /// A device that supports depth textures.
    pub fn new() -> Self {
        Self {
            depth_texture_supported: true,
            next_id: 1,
            fail_after: None,
            live_textures: HashSet::new(),
            live_renderbuffers: HashSet::new(),
            live_framebuffers: HashSet::new(),
            live_depth_copies: HashSet::new(),
            invalid_releases: 0,
            surface_depth: 1.0,
            surface_color: [0; 4],
            read_len: None,
            depth_copy_pixels: HashMap::new(),
            calls: Vec::new(),
        }
    }

    /// A device that only offers depth-stencil renderbuffers.
    pub fn without_depth_texture() -> Self {
        Self {
            depth_texture_supported: false,
            ..Self::new()
        }
    }

    /// Makes the allocation after the next `successes` allocations fail once.
    pub fn fail_allocation_after(&mut self, successes: usize) {
        self.fail_after = Some(successes);
    }

    /// Truncates every following read-back to at most `len` bytes.
    pub fn truncate_reads(&mut self, len: usize) {
        self.read_len = Some(len);
    }

    /// Simulates a draw covering the pick pixel with a `Less` depth test.
    pub fn draw(
        &mut self,
        framebuffer: &MockFramebuffer,
        depth: f32,
        color: [u8; 4],
    ) -> Result<(), MockError> {
        self.check_framebuffer(framebuffer.id)?;
        self.calls.push(MockCall::Draw {
            framebuffer: framebuffer.id,
            depth,
            color,
        });
        if depth < self.surface_depth {
            self.surface_depth = depth;
            self.surface_color = color;
        }
        Ok(())
    }

    /// Depth currently stored in the pick surface.
    pub fn surface_depth(&self) -> f32 {
        self.surface_depth
    }

    /// Color currently stored in the pick surface.
    pub fn surface_color(&self) -> [u8; 4] {
        self.surface_color
    }

    pub fn calls(&self) -> &[MockCall] {
        &self.calls
    }

    pub fn live_texture_count(&self) -> usize {
        self.live_textures.len()
    }

    pub fn live_renderbuffer_count(&self) -> usize {
        self.live_renderbuffers.len()
    }

    pub fn live_framebuffer_count(&self) -> usize {
        self.live_framebuffers.len()
    }

    pub fn live_depth_copy_count(&self) -> usize {
        self.live_depth_copies.len()
    }

    /// Number of `destroy_*` calls received.
    pub fn release_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| {
                matches!(
                    call,
                    MockCall::DestroyTexture(_)
                        | MockCall::DestroyRenderbuffer(_)
                        | MockCall::DestroyFramebuffer(_)
                        | MockCall::DestroyDepthCopy(_)
                )
            })
            .count()
    }

    /// Releases of handles that were already released or never created.
    pub fn invalid_release_count(&self) -> usize {
        self.invalid_releases
    }

    pub fn clear_count(&self) -> usize {
        self.count(|call| matches!(call, MockCall::Clear { .. }))
    }

    pub fn depth_copy_count(&self) -> usize {
        self.count(|call| matches!(call, MockCall::CopyDepth { .. }))
    }

    pub fn read_count(&self) -> usize {
        self.count(|call| matches!(call, MockCall::ReadPixels { .. }))
    }

    fn count(&self, pred: impl Fn(&MockCall) -> bool) -> usize {
        self.calls.iter().filter(|call| pred(call)).count()
    }

    fn allocate_id(&mut self) -> Result<u32, MockError> {
        match self.fail_after {
            Some(0) => {
                self.fail_after = None;
                return Err(MockError::OutOfMemory);
            }
            Some(n) => self.fail_after = Some(n - 1),
            None => {}
        }
        let id = self.next_id;
        self.next_id += 1;
        Ok(id)
    }

    fn check_framebuffer(&self, id: u32) -> Result<(), MockError> {
        if self.live_framebuffers.contains(&id) {
            Ok(())
        } else {
            Err(MockError::StaleFramebuffer(id))
        }
    }

    fn release(live: &mut HashSet<u32>, invalid: &mut usize, id: u32) {
        if !live.remove(&id) {
            log::error!("mock handle {id} released twice");
            *invalid += 1;
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn quantize(color: glam::Vec4) -> [u8; 4] {
    let c = (color.clamp(glam::Vec4::ZERO, glam::Vec4::ONE) * 255.0).round();
    [c.x as u8, c.y as u8, c.z as u8, c.w as u8]
}

impl PickDevice for MockPickDevice {
    type Texture = MockTexture;
    type Renderbuffer = MockRenderbuffer;
    type Framebuffer = MockFramebuffer;
    type DepthCopy = MockDepthCopy;
    type Error = MockError;

    fn supports_depth_texture(&self) -> bool {
        self.depth_texture_supported
    }

    fn create_texture(&mut self, desc: &TextureDescriptor) -> Result<MockTexture, MockError> {
        let id = self.allocate_id()?;
        self.live_textures.insert(id);
        self.calls.push(MockCall::CreateTexture { id, desc: *desc });
        Ok(MockTexture { id, desc: *desc })
    }

    fn create_renderbuffer(
        &mut self,
        desc: &RenderbufferDescriptor,
    ) -> Result<MockRenderbuffer, MockError> {
        let id = self.allocate_id()?;
        self.live_renderbuffers.insert(id);
        self.calls.push(MockCall::CreateRenderbuffer { id, desc: *desc });
        Ok(MockRenderbuffer { id, desc: *desc })
    }

    fn create_framebuffer(
        &mut self,
        desc: &FramebufferDescriptor<'_, MockTexture, MockRenderbuffer>,
    ) -> Result<MockFramebuffer, MockError> {
        let id = self.allocate_id()?;
        let color_attachments: Vec<u32> = desc.color_attachments.iter().map(|t| t.id).collect();
        let depth_stencil = desc.depth_stencil.map(|attachment| match attachment {
            DepthStencilAttachment::Texture(texture) => DepthStencilAttachment::Texture(texture.id),
            DepthStencilAttachment::Renderbuffer(renderbuffer) => {
                DepthStencilAttachment::Renderbuffer(renderbuffer.id)
            }
        });
        self.live_framebuffers.insert(id);
        self.calls.push(MockCall::CreateFramebuffer {
            id,
            color_attachments: color_attachments.clone(),
            depth_stencil,
            destroy_attachments: desc.destroy_attachments,
        });
        Ok(MockFramebuffer {
            id,
            color_attachments,
            depth_stencil,
            destroy_attachments: desc.destroy_attachments,
        })
    }

    fn clear(
        &mut self,
        clear: &ClearCommand,
        pass_state: &PassState<MockFramebuffer>,
    ) -> Result<(), MockError> {
        let framebuffer = pass_state.framebuffer().id;
        self.check_framebuffer(framebuffer)?;
        self.calls.push(MockCall::Clear {
            framebuffer,
            viewport: pass_state.viewport(),
            clear: *clear,
        });
        self.surface_depth = clear.depth;
        self.surface_color = quantize(clear.color);
        Ok(())
    }

    fn create_depth_copy(&mut self) -> Result<MockDepthCopy, MockError> {
        let target = self.create_texture(&TextureDescriptor::PICK_COLOR)?;
        let framebuffer = match self.create_framebuffer(&FramebufferDescriptor {
            color_attachments: &[&target],
            depth_stencil: None,
            destroy_attachments: false,
        }) {
            Ok(framebuffer) => framebuffer,
            Err(err) => {
                self.destroy_texture(target);
                return Err(err);
            }
        };
        let id = match self.allocate_id() {
            Ok(id) => id,
            Err(err) => {
                self.destroy_framebuffer(framebuffer);
                self.destroy_texture(target);
                return Err(err);
            }
        };
        self.live_depth_copies.insert(id);
        self.calls.push(MockCall::CreateDepthCopy { id });
        Ok(MockDepthCopy {
            id,
            target,
            framebuffer,
        })
    }

    fn copy_depth(
        &mut self,
        depth_copy: &mut MockDepthCopy,
        depth_stencil: &MockTexture,
    ) -> Result<(), MockError> {
        self.calls.push(MockCall::CopyDepth {
            depth_copy: depth_copy.id,
            depth_stencil: depth_stencil.id,
        });
        let packed = pack_depth(self.surface_depth);
        self.depth_copy_pixels
            .insert(depth_copy.framebuffer.id, packed.bytes());
        Ok(())
    }

    fn depth_copy_framebuffer<'a>(&self, depth_copy: &'a MockDepthCopy) -> &'a MockFramebuffer {
        &depth_copy.framebuffer
    }

    fn read_pixels(
        &mut self,
        rect: Viewport,
        framebuffer: &MockFramebuffer,
    ) -> Result<Vec<u8>, MockError> {
        self.check_framebuffer(framebuffer.id)?;
        self.calls.push(MockCall::ReadPixels {
            framebuffer: framebuffer.id,
            rect,
        });
        let pixel = self
            .depth_copy_pixels
            .get(&framebuffer.id)
            .copied()
            .unwrap_or(self.surface_color);
        let count = (rect.width * rect.height) as usize;
        let mut pixels = pixel.repeat(count);
        if let Some(len) = self.read_len {
            pixels.truncate(len);
        }
        Ok(pixels)
    }

    fn destroy_texture(&mut self, texture: MockTexture) {
        self.calls.push(MockCall::DestroyTexture(texture.id));
        Self::release(&mut self.live_textures, &mut self.invalid_releases, texture.id);
    }

    fn destroy_renderbuffer(&mut self, renderbuffer: MockRenderbuffer) {
        self.calls.push(MockCall::DestroyRenderbuffer(renderbuffer.id));
        Self::release(
            &mut self.live_renderbuffers,
            &mut self.invalid_releases,
            renderbuffer.id,
        );
    }

    fn destroy_framebuffer(&mut self, framebuffer: MockFramebuffer) {
        self.calls.push(MockCall::DestroyFramebuffer(framebuffer.id));
        self.depth_copy_pixels.remove(&framebuffer.id);
        Self::release(
            &mut self.live_framebuffers,
            &mut self.invalid_releases,
            framebuffer.id,
        );
        if framebuffer.destroy_attachments {
            for id in framebuffer.color_attachments {
                Self::release(&mut self.live_textures, &mut self.invalid_releases, id);
            }
            match framebuffer.depth_stencil {
                Some(DepthStencilAttachment::Texture(id)) => {
                    Self::release(&mut self.live_textures, &mut self.invalid_releases, id);
                }
                Some(DepthStencilAttachment::Renderbuffer(id)) => {
                    Self::release(&mut self.live_renderbuffers, &mut self.invalid_releases, id);
                }
                None => {}
            }
        }
    }

    fn destroy_depth_copy(&mut self, depth_copy: MockDepthCopy) {
        self.calls.push(MockCall::DestroyDepthCopy(depth_copy.id));
        Self::release(
            &mut self.live_depth_copies,
            &mut self.invalid_releases,
            depth_copy.id,
        );
        self.destroy_framebuffer(depth_copy.framebuffer);
        self.destroy_texture(depth_copy.target);
    }
}
