//! Packed depth encoding.
//!
//! When a backend cannot read floating-point depth back directly, depth is
//! written into an RGBA8 surface as a base-256 positional fraction: channel 0
//! carries the coarsest 8 bits and channel 3 the finest. Decoding normalizes
//! each byte by 255 and dots the result with [`PACKED_DEPTH_SCALE`].
//!
//! [`pack_depth`] is the CPU mirror of the WGSL `pack_depth` function shipped by
//! the render backend; the two halves must agree exactly.

use glam::{Vec4, Vec4Swizzles};

/// Positional weights applied to the normalized channels when decoding.
pub const PACKED_DEPTH_SCALE: Vec4 =
    Vec4::new(1.0, 1.0 / 255.0, 1.0 / 65025.0, 1.0 / 16_581_375.0);

/// Per-channel multipliers applied to depth when encoding.
const PACK_SHIFT: Vec4 = Vec4::new(1.0, 255.0, 65025.0, 16_581_375.0);

/// Carry removed from each channel so it only holds its own 8 bits.
const PACK_CARRY: Vec4 = Vec4::new(1.0 / 255.0, 1.0 / 255.0, 1.0 / 255.0, 0.0);

/// A depth value packed into four 8-bit channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PackedDepth(pub [u8; 4]);

impl PackedDepth {
    /// Wraps raw RGBA bytes.
    pub const fn from_bytes(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    /// Takes the first RGBA pixel of a read-back buffer.
    ///
    /// Returns `None` if fewer than four bytes are available.
    pub fn from_pixels(pixels: &[u8]) -> Option<Self> {
        let bytes: [u8; 4] = pixels.get(..4)?.try_into().ok()?;
        Some(Self(bytes))
    }

    /// Returns the raw channel bytes.
    pub const fn bytes(self) -> [u8; 4] {
        self.0
    }

    /// Returns the channels normalized to [0, 1].
    pub fn normalized(self) -> Vec4 {
        let [r, g, b, a] = self.0;
        Vec4::new(f32::from(r), f32::from(g), f32::from(b), f32::from(a)) / 255.0
    }

    /// Decodes the packed value into a depth in [0, 1].
    pub fn decode(self) -> f32 {
        decode_depth(self.0)
    }
}

impl From<[u8; 4]> for PackedDepth {
    fn from(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }
}

/// Decodes four packed channel bytes into a depth in [0, 1].
///
/// The raw positional sum of `(255, 255, 255, 255)` slightly exceeds one, so the
/// result is clamped to the unit interval.
pub fn decode_depth(bytes: [u8; 4]) -> f32 {
    PackedDepth(bytes)
        .normalized()
        .dot(PACKED_DEPTH_SCALE)
        .clamp(0.0, 1.0)
}

/// Packs a depth in [0, 1] into four 8-bit channels.
///
/// Depth 1.0 (and 0.0) pack to all-zero channels, so a cleared far plane reads
/// back as depth 0.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn pack_depth(depth: f32) -> PackedDepth {
    let scaled = PACK_SHIFT * depth;
    let mut enc = scaled - scaled.floor();
    enc -= enc.yzww() * PACK_CARRY;

    let quantized = (enc.clamp(Vec4::ZERO, Vec4::ONE) * 255.0).round();
    PackedDepth([
        quantized.x as u8,
        quantized.y as u8,
        quantized.z as u8,
        quantized.w as u8,
    ])
}
