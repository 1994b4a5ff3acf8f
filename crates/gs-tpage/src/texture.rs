//! The 60-byte per-texture descriptor.

use crate::{read_f32_le, read_i16_le, read_u16_le, read_u32_le, LayoutError};

/// Total encoded size of a texture descriptor.
pub const TEXTURE_DESCRIPTOR_SIZE: usize = 60;

// Field offsets in the encoded descriptor. The trailing pad after the row
// widths exists in the original layout (u32 alignment of the name pointer).
const OFF_W: usize = 0;
const OFF_H: usize = 2;
const OFF_NUM_MIPS: usize = 4;
const OFF_TEX1_CONTROL: usize = 5;
const OFF_PSM: usize = 6;
const OFF_MIP_SHIFT: usize = 7;
const OFF_CLUT_PSM: usize = 8;
const OFF_DEST: usize = 10;
const OFF_CLUT_DEST: usize = 24;
const OFF_WIDTH: usize = 26;
const OFF_NAME_PTR: usize = 36;
const OFF_SIZE: usize = 40;
const OFF_UV_DIST: usize = 44;
const OFF_MASKS: usize = 48;

const _: () = assert!(OFF_MASKS + 3 * 4 == TEXTURE_DESCRIPTOR_SIZE);

/// Pixel storage mode codes used in the `psm` / `clut_psm` fields.
pub mod psm {
    pub const CT32: u8 = 0;
    pub const CT16: u8 = 2;
    pub const T8: u8 = 19;
    pub const T4: u8 = 20;
    pub const T8H: u8 = 27;
    pub const T4HL: u8 = 36;
    /// The packed 4-bit-in-high-nibble format. Two textures in this format
    /// alias the address range of a full-depth texture, so destinations with
    /// this mode live in a separate lookup table.
    pub const T4HH: u8 = 44;
}

/// One texture's metadata as stored in the guest heap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureDescriptor {
    pub w: i16,
    pub h: i16,
    pub num_mips: u8,
    pub tex1_control: u8,
    pub psm: u8,
    pub mip_shift: u8,
    pub clut_psm: u16,
    /// Per-mip VRAM destination addresses, in 256-byte blocks.
    pub dest: [u16; 7],
    /// VRAM destination of the palette, if any.
    pub clut_dest: u16,
    /// Per-mip row widths.
    pub width: [u8; 7],
    /// Guest pointer to the texture's name string.
    pub name_ptr: u32,
    pub size: u32,
    pub uv_dist: f32,
    pub masks: [u32; 3],
}

impl TextureDescriptor {
    /// Decodes a descriptor from the start of `bytes`.
    pub fn decode(bytes: &[u8]) -> Result<Self, LayoutError> {
        if bytes.len() < TEXTURE_DESCRIPTOR_SIZE {
            return Err(LayoutError::BufferTooSmall {
                need: TEXTURE_DESCRIPTOR_SIZE,
                have: bytes.len(),
            });
        }
        let mut dest = [0u16; 7];
        for (i, d) in dest.iter_mut().enumerate() {
            *d = read_u16_le(bytes, OFF_DEST + 2 * i);
        }
        let mut width = [0u8; 7];
        width.copy_from_slice(&bytes[OFF_WIDTH..OFF_WIDTH + 7]);
        let mut masks = [0u32; 3];
        for (i, m) in masks.iter_mut().enumerate() {
            *m = read_u32_le(bytes, OFF_MASKS + 4 * i);
        }
        Ok(Self {
            w: read_i16_le(bytes, OFF_W),
            h: read_i16_le(bytes, OFF_H),
            num_mips: bytes[OFF_NUM_MIPS],
            tex1_control: bytes[OFF_TEX1_CONTROL],
            psm: bytes[OFF_PSM],
            mip_shift: bytes[OFF_MIP_SHIFT],
            clut_psm: read_u16_le(bytes, OFF_CLUT_PSM),
            dest,
            clut_dest: read_u16_le(bytes, OFF_CLUT_DEST),
            width,
            name_ptr: read_u32_le(bytes, OFF_NAME_PTR),
            size: read_u32_le(bytes, OFF_SIZE),
            uv_dist: read_f32_le(bytes, OFF_UV_DIST),
            masks,
        })
    }

    /// Which upload segment a given mip level belongs to. Mip 0 of a
    /// multi-mip texture is segment 2, the next is segment 1, everything
    /// smaller shares segment 0.
    pub fn segment_of_mip(&self, mip: u32) -> usize {
        debug_assert!(mip < u32::from(self.num_mips));
        if self.num_mips <= 2 {
            (i32::from(self.num_mips) - mip as i32 - 1).max(0) as usize
        } else {
            2u32.saturating_sub(mip) as usize
        }
    }
}
