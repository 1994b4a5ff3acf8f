//! Fixed-layout decoding of in-game texture and texture-page descriptors.
//!
//! The game addresses textures through descriptor blocks living in the
//! emulated guest heap. Their layout is a versioned binary contract with the
//! original engine, so everything here decodes field-by-field at documented
//! byte offsets from a little-endian byte buffer. Nothing in this crate relies
//! on Rust struct layout, and nothing here owns state: callers hand in the
//! guest memory image and get plain decoded values back.

#[cfg(any(test, feature = "test-utils"))]
pub mod encode;
mod page;
mod strings;
mod texture;

use thiserror::Error;

pub use page::{PageSegment, TexturePage, TEXTURE_PAGE_HEADER_SIZE};
pub use strings::read_goal_string;
pub use texture::{psm, TextureDescriptor, TEXTURE_DESCRIPTOR_SIZE};

/// Decoding failure against the fixed binary contract.
///
/// Any of these indicates the upstream memory image violated the descriptor
/// layout; callers treat them as fatal rather than recoverable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("descriptor buffer too small: need {need} bytes, have {have}")]
    BufferTooSmall { need: usize, have: usize },
    #[error("descriptor pointer out of range: ptr=0x{ptr:x}, need {need} bytes, memory is {have} bytes")]
    PointerOutOfRange { ptr: u32, need: usize, have: usize },
    #[error("unterminated string at 0x{ptr:x}")]
    UnterminatedString { ptr: u32 },
    #[error("texture page declares negative texture count {0}")]
    NegativeTextureCount(i32),
}

pub(crate) fn read_u16_le(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

pub(crate) fn read_i16_le(bytes: &[u8], offset: usize) -> i16 {
    i16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

pub(crate) fn read_u32_le(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

pub(crate) fn read_i32_le(bytes: &[u8], offset: usize) -> i32 {
    read_u32_le(bytes, offset) as i32
}

pub(crate) fn read_f32_le(bytes: &[u8], offset: usize) -> f32 {
    f32::from_bits(read_u32_le(bytes, offset))
}

/// Bounds-checked view of `len` bytes at absolute offset `ptr` in the guest
/// memory image.
pub(crate) fn guest_slice(memory: &[u8], ptr: u32, len: usize) -> Result<&[u8], LayoutError> {
    let start = ptr as usize;
    let end = start.checked_add(len).ok_or(LayoutError::PointerOutOfRange {
        ptr,
        need: len,
        have: memory.len(),
    })?;
    memory.get(start..end).ok_or(LayoutError::PointerOutOfRange {
        ptr,
        need: len,
        have: memory.len(),
    })
}
