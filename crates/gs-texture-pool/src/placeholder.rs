//! The shared placeholder texture.
//!
//! Exactly one placeholder exists per pool. Every distinct texture with no
//! loaded copy, and every slot bound before its data arrived, resolves to
//! this one device handle, so the not-yet-loaded case costs a single small
//! allocation no matter how many textures are pending.

use crate::DeviceHandle;

pub const PLACEHOLDER_WIDTH: u32 = 16;
pub const PLACEHOLDER_HEIGHT: u32 = 16;

/// Device texture creation seam.
///
/// The pool itself never talks to the GPU API; the embedding renderer
/// implements this for its device and the pool calls it exactly once, at
/// construction, to create the placeholder. Tests use a trivial counter
/// implementation.
pub trait TextureUploader {
    /// Creates an RGBA8 texture and returns its handle.
    fn create_texture(&mut self, width: u32, height: u32, rgba: &[u8]) -> DeviceHandle;
}

/// Deterministic RGBA8 placeholder contents: a magenta/black checkerboard,
/// loud enough to spot in-game when real data never arrives.
pub fn placeholder_pixels() -> Vec<u8> {
    let mut pixels = Vec::with_capacity((PLACEHOLDER_WIDTH * PLACEHOLDER_HEIGHT * 4) as usize);
    for y in 0..PLACEHOLDER_HEIGHT {
        for x in 0..PLACEHOLDER_WIDTH {
            if (x / 4 + y / 4) % 2 == 0 {
                pixels.extend_from_slice(&[0xff, 0x00, 0xff, 0xff]);
            } else {
                pixels.extend_from_slice(&[0x00, 0x00, 0x00, 0xff]);
            }
        }
    }
    pixels
}
