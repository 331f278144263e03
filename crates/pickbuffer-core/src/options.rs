//! Configuration options for pick targets.

use glam::Vec4;
use serde::{Deserialize, Serialize};

use crate::resource::ClearCommand;

/// Options controlling how a [`PickTarget`](crate::PickTarget) is provisioned
/// and cleared.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PickOptions {
    /// Depth written by the clear in `begin()`.
    pub clear_depth: f32,

    /// Color written by the clear in `begin()`.
    pub clear_color: Vec4,

    /// Always use a depth-stencil renderbuffer, even when the device supports
    /// depth textures.
    pub force_renderbuffer: bool,
}

impl Default for PickOptions {
    fn default() -> Self {
        Self {
            clear_depth: 1.0,
            clear_color: Vec4::ZERO,
            force_renderbuffer: false,
        }
    }
}

impl PickOptions {
    /// Builds the clear command issued at the start of every pick.
    pub fn clear_command(&self) -> ClearCommand {
        ClearCommand {
            depth: self.clear_depth,
            color: self.clear_color,
            ..ClearCommand::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_clears_to_far_plane_and_transparent() {
        let clear = PickOptions::default().clear_command();
        assert_eq!(clear.depth, 1.0);
        assert_eq!(clear.color, Vec4::ZERO);
        assert_eq!(clear.stencil, 0);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let options: PickOptions =
            serde_json::from_str(r#"{ "force_renderbuffer": true }"#).expect("valid json");
        assert!(options.force_renderbuffer);
        assert_eq!(options.clear_depth, 1.0);
        assert_eq!(options.clear_color, Vec4::ZERO);
    }
}
