//! Render pass state.

use crate::resource::Viewport;

/// The framebuffer and viewport a single render pass draws into.
#[derive(Debug)]
pub struct PassState<F> {
    framebuffer: F,
    viewport: Viewport,
}

impl<F> PassState<F> {
    pub fn new(framebuffer: F, viewport: Viewport) -> Self {
        Self {
            framebuffer,
            viewport,
        }
    }

    pub fn framebuffer(&self) -> &F {
        &self.framebuffer
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Consumes the pass state, returning its framebuffer for release.
    pub fn into_framebuffer(self) -> F {
        self.framebuffer
    }
}
