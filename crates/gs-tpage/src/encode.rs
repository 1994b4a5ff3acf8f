//! Fixture builders for descriptor layouts.
//!
//! Only available to tests (and dependents via the `test-utils` feature).
//! Encoding is written against the documented byte offsets independently of
//! the decoder, so round-trip tests actually exercise the contract.

use crate::page::{PageSegment, TexturePage, TEXTURE_PAGE_HEADER_SIZE};
use crate::texture::{psm, TextureDescriptor, TEXTURE_DESCRIPTOR_SIZE};

/// Encodes a texture descriptor at the contract's fixed offsets.
pub fn encode_texture(desc: &TextureDescriptor) -> [u8; TEXTURE_DESCRIPTOR_SIZE] {
    let mut out = [0u8; TEXTURE_DESCRIPTOR_SIZE];
    out[0..2].copy_from_slice(&desc.w.to_le_bytes());
    out[2..4].copy_from_slice(&desc.h.to_le_bytes());
    out[4] = desc.num_mips;
    out[5] = desc.tex1_control;
    out[6] = desc.psm;
    out[7] = desc.mip_shift;
    out[8..10].copy_from_slice(&desc.clut_psm.to_le_bytes());
    for (i, d) in desc.dest.iter().enumerate() {
        out[10 + 2 * i..12 + 2 * i].copy_from_slice(&d.to_le_bytes());
    }
    out[24..26].copy_from_slice(&desc.clut_dest.to_le_bytes());
    out[26..33].copy_from_slice(&desc.width);
    out[36..40].copy_from_slice(&desc.name_ptr.to_le_bytes());
    out[40..44].copy_from_slice(&desc.size.to_le_bytes());
    out[44..48].copy_from_slice(&desc.uv_dist.to_le_bytes());
    for (i, m) in desc.masks.iter().enumerate() {
        out[48 + 4 * i..52 + 4 * i].copy_from_slice(&m.to_le_bytes());
    }
    out
}

/// Encodes a page header (without the trailing pointer table).
pub fn encode_page_header(page: &TexturePage) -> [u8; TEXTURE_PAGE_HEADER_SIZE] {
    let mut out = [0u8; TEXTURE_PAGE_HEADER_SIZE];
    out[0..4].copy_from_slice(&page.file_info_ptr.to_le_bytes());
    out[4..8].copy_from_slice(&page.name_ptr.to_le_bytes());
    out[8..12].copy_from_slice(&page.id.to_le_bytes());
    out[12..16].copy_from_slice(&page.length.to_le_bytes());
    out[16..20].copy_from_slice(&page.mip0_size.to_le_bytes());
    out[20..24].copy_from_slice(&page.size.to_le_bytes());
    for (i, seg) in page.segments.iter().enumerate() {
        let base = 24 + 12 * i;
        out[base..base + 4].copy_from_slice(&seg.block_data_ptr.to_le_bytes());
        out[base + 4..base + 8].copy_from_slice(&seg.size.to_le_bytes());
        out[base + 8..base + 12].copy_from_slice(&seg.dest.to_le_bytes());
    }
    out
}

/// A synthetic guest memory image holding one texture page plus everything it
/// points at (name strings and texture descriptors).
pub struct PageImage {
    pub memory: Vec<u8>,
    /// Byte offset of the page header inside `memory`.
    pub page_offset: usize,
    /// The nil sentinel used for absent pointer-table entries.
    pub nil: u32,
}

impl PageImage {
    pub fn page_bytes(&self) -> &[u8] {
        &self.memory[self.page_offset..]
    }
}

enum Entry {
    Texture { name: String, desc: TextureDescriptor },
    Sentinel,
}

/// Assembles a [`PageImage`] the way the game heap lays one out.
pub struct PageImageBuilder {
    page_name: String,
    id: u32,
    entries: Vec<Entry>,
}

impl PageImageBuilder {
    pub fn new(page_name: &str) -> Self {
        Self {
            page_name: page_name.to_string(),
            id: 1,
            entries: Vec::new(),
        }
    }

    pub fn id(mut self, id: u32) -> Self {
        self.id = id;
        self
    }

    /// Adds a texture with defaults (16x16, single mip, 32-bit) and lets the
    /// caller adjust the descriptor.
    pub fn texture(mut self, name: &str, configure: impl FnOnce(&mut TextureDescriptor)) -> Self {
        let mut desc = TextureDescriptor {
            w: 16,
            h: 16,
            num_mips: 1,
            tex1_control: 0,
            psm: psm::CT32,
            mip_shift: 0,
            clut_psm: 0,
            dest: [0; 7],
            clut_dest: 0,
            width: [16, 0, 0, 0, 0, 0, 0],
            name_ptr: 0,
            size: 0,
            uv_dist: 0.0,
            masks: [0; 3],
        };
        configure(&mut desc);
        self.entries.push(Entry::Texture {
            name: name.to_string(),
            desc,
        });
        self
    }

    /// Adds an absent pointer-table entry (set to the nil sentinel).
    pub fn sentinel(mut self) -> Self {
        self.entries.push(Entry::Sentinel);
        self
    }

    pub fn build(self) -> PageImage {
        // A value no appended pointer can collide with.
        let nil = 0x7fff_fff0;
        let mut memory = vec![0u8; 16];

        let page_name_ptr = append_string(&mut memory, &self.page_name);
        let mut table = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            match entry {
                Entry::Texture { name, desc } => {
                    let name_ptr = append_string(&mut memory, name);
                    let mut desc = *desc;
                    desc.name_ptr = name_ptr;
                    let desc_ptr = memory.len() as u32;
                    memory.extend_from_slice(&encode_texture(&desc));
                    table.push(desc_ptr);
                }
                Entry::Sentinel => table.push(nil),
            }
        }

        let page_offset = memory.len();
        let header = encode_page_header(&TexturePage {
            file_info_ptr: 0,
            name_ptr: page_name_ptr,
            id: self.id,
            length: self.entries.len() as i32,
            mip0_size: 0,
            size: 0,
            segments: [PageSegment::default(); 3],
        });
        memory.extend_from_slice(&header);
        for ptr in table {
            memory.extend_from_slice(&ptr.to_le_bytes());
        }

        PageImage {
            memory,
            page_offset,
            nil,
        }
    }
}

fn append_string(memory: &mut Vec<u8>, s: &str) -> u32 {
    let ptr = memory.len() as u32;
    memory.extend_from_slice(&[0, 0, 0, 0]);
    memory.extend_from_slice(s.as_bytes());
    memory.push(0);
    ptr
}
