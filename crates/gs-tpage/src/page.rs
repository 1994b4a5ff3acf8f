//! The texture-page descriptor: a fixed 124-byte header immediately followed
//! by a pointer table with one 4-byte guest pointer per declared texture.

use crate::{guest_slice, read_i32_le, read_u32_le, LayoutError, TextureDescriptor};
use crate::texture::TEXTURE_DESCRIPTOR_SIZE;

/// Encoded size of the page header. The pointer table starts here.
pub const TEXTURE_PAGE_HEADER_SIZE: usize = 124;

const OFF_FILE_INFO_PTR: usize = 0;
const OFF_NAME_PTR: usize = 4;
const OFF_ID: usize = 8;
const OFF_LENGTH: usize = 12;
const OFF_MIP0_SIZE: usize = 16;
const OFF_SIZE: usize = 20;
const OFF_SEGMENTS: usize = 24;
const SEGMENT_SIZE: usize = 12;
const OFF_PAD: usize = OFF_SEGMENTS + 3 * SEGMENT_SIZE;

const _: () = assert!(OFF_PAD + 16 * 4 == TEXTURE_PAGE_HEADER_SIZE);

/// One of the page's three upload segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageSegment {
    pub block_data_ptr: u32,
    pub size: u32,
    pub dest: u32,
}

/// Decoded texture-page header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TexturePage {
    pub file_info_ptr: u32,
    pub name_ptr: u32,
    pub id: u32,
    /// Declared texture count. Signed in the original layout.
    pub length: i32,
    pub mip0_size: u32,
    pub size: u32,
    pub segments: [PageSegment; 3],
}

impl TexturePage {
    /// Decodes the page header from the start of `bytes`.
    pub fn decode(bytes: &[u8]) -> Result<Self, LayoutError> {
        if bytes.len() < TEXTURE_PAGE_HEADER_SIZE {
            return Err(LayoutError::BufferTooSmall {
                need: TEXTURE_PAGE_HEADER_SIZE,
                have: bytes.len(),
            });
        }
        let mut segments = [PageSegment::default(); 3];
        for (i, seg) in segments.iter_mut().enumerate() {
            let base = OFF_SEGMENTS + i * SEGMENT_SIZE;
            *seg = PageSegment {
                block_data_ptr: read_u32_le(bytes, base),
                size: read_u32_le(bytes, base + 4),
                dest: read_u32_le(bytes, base + 8),
            };
        }
        Ok(Self {
            file_info_ptr: read_u32_le(bytes, OFF_FILE_INFO_PTR),
            name_ptr: read_u32_le(bytes, OFF_NAME_PTR),
            id: read_u32_le(bytes, OFF_ID),
            length: read_i32_le(bytes, OFF_LENGTH),
            mip0_size: read_u32_le(bytes, OFF_MIP0_SIZE),
            size: read_u32_le(bytes, OFF_SIZE),
            segments,
        })
    }

    /// Declared texture count, validated to be non-negative.
    pub fn texture_count(&self) -> Result<usize, LayoutError> {
        usize::try_from(self.length).map_err(|_| LayoutError::NegativeTextureCount(self.length))
    }

    /// Reads pointer-table entry `index` from `page_bytes` and decodes the
    /// texture descriptor it points at in `memory`.
    ///
    /// Returns `Ok(None)` when the entry equals `nil`: that texture slot is
    /// absent in this page revision, which is expected and not an error. A
    /// pointer table shorter than the declared count is a contract violation
    /// and fails.
    pub fn texture_descriptor_at(
        &self,
        page_bytes: &[u8],
        index: usize,
        memory: &[u8],
        nil: u32,
    ) -> Result<Option<TextureDescriptor>, LayoutError> {
        let entry = TEXTURE_PAGE_HEADER_SIZE + 4 * index;
        if page_bytes.len() < entry + 4 {
            return Err(LayoutError::BufferTooSmall {
                need: entry + 4,
                have: page_bytes.len(),
            });
        }
        let ptr = read_u32_le(page_bytes, entry);
        if ptr == nil {
            return Ok(None);
        }
        let bytes = guest_slice(memory, ptr, TEXTURE_DESCRIPTOR_SIZE)?;
        TextureDescriptor::decode(bytes).map(Some)
    }
}
