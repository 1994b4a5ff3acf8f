//! The game-side upload/relocate protocol.
//!
//! The emulated game hands over the raw texture-page descriptor it just
//! "uploaded to VRAM" plus its heap image; we decode it with `gs-tpage` and
//! publish the destination addresses into the slot tables. Textures the
//! loader has not delivered yet are bound to the placeholder handle and
//! refreshed later by `register_instance`.

use thiserror::Error;
use tracing::{debug, trace};

use gs_tpage::{psm, read_goal_string, LayoutError, TexturePage};

use crate::pool::{combined_name, TexturePool};
use crate::VRAM_SLOT_COUNT;

/// Which part of a page an upload covers.
///
/// The game streams pages in up to three segments grouped by mip level (see
/// `TextureDescriptor::segment_of_mip`); a partial upload only publishes the
/// mips landing in the named segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadMode {
    /// Process every mip of every contained texture.
    Full,
    /// Process only mips whose segment is enabled in the mask.
    Segments([bool; 3]),
}

impl UploadMode {
    fn includes_segment(self, segment: usize) -> bool {
        match self {
            UploadMode::Full => true,
            UploadMode::Segments(mask) => mask[segment],
        }
    }
}

/// Upload protocol failure.
///
/// All of these mean the upstream memory image broke the descriptor
/// contract; callers treat them as fatal rather than recoverable. The slot
/// tables are never corrupted: no address is bound from a descriptor that
/// failed to decode.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UploadError {
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error("VRAM destination out of range: 0x{0:x}")]
    AddressOutOfRange(u32),
    #[error("descriptor declares {0} mips; the layout allows at most 7")]
    MipCountOutOfRange(u8),
}

fn check_addr(addr: u32) -> Result<(), UploadError> {
    if (addr as usize) < VRAM_SLOT_COUNT {
        Ok(())
    } else {
        Err(UploadError::AddressOutOfRange(addr))
    }
}

impl TexturePool {
    /// Processes a texture-page upload addressed at VRAM.
    ///
    /// `page_bytes` is the page descriptor as copied out of game memory
    /// (header plus trailing pointer table); `memory` is the full heap image
    /// the descriptor's pointers index into; `nil` is the game's empty-object
    /// pointer value, marking absent pointer-table entries. Absent entries
    /// are skipped and leave any previous binding at their address untouched.
    pub fn handle_upload(
        &self,
        page_bytes: &[u8],
        mode: UploadMode,
        memory: &[u8],
        nil: u32,
    ) -> Result<(), UploadError> {
        let page = TexturePage::decode(page_bytes)?;
        let page_name = read_goal_string(memory, page.name_ptr)?;
        let count = page.texture_count()?;
        debug!(page = page_name.as_str(), count, ?mode, "texture page upload");

        let mut registry = self.registry.lock().unwrap();
        for index in 0..count {
            let Some(tex) = page.texture_descriptor_at(page_bytes, index, memory, nil)? else {
                trace!(page = page_name.as_str(), index, "absent page entry skipped");
                continue;
            };
            if usize::from(tex.num_mips) > tex.dest.len() {
                return Err(UploadError::MipCountOutOfRange(tex.num_mips));
            }
            let name = read_goal_string(memory, tex.name_ptr)?;
            let combined = combined_name(&page_name, &name);
            let combo_id = page.id << 16 | index as u32;
            let key = registry.find_or_create(
                &combined,
                &page_name,
                &name,
                combo_id,
                tex.w.max(0) as u16,
                tex.h.max(0) as u16,
            );
            let paired = tex.psm == psm::T4HH;
            for mip in 0..u32::from(tex.num_mips) {
                if !mode.includes_segment(tex.segment_of_mip(mip)) {
                    continue;
                }
                let dest = u32::from(tex.dest[mip as usize]);
                check_addr(dest)?;
                let entry = registry.get_mut(key);
                entry.record_slot(dest, paired);
                let handle = entry.resident_handle().unwrap_or(self.placeholder_handle());
                if paired {
                    self.paired.bind(dest, key, handle);
                } else {
                    self.primary.bind(dest, key, handle);
                }
                trace!(
                    name = combined.as_str(),
                    dest,
                    mip,
                    paired,
                    placeholder = entry.is_placeholder,
                    "bound VRAM slot"
                );
            }
        }
        Ok(())
    }

    /// VRAM-to-VRAM copy: binds whatever is at `src` at `dest` as well.
    ///
    /// This is copy-by-reference: the destination points at the same
    /// distinct texture and device copy, never a duplicate. An unbound source
    /// is a no-op (the game copied from an address it never uploaded to;
    /// there is nothing to publish). `format` is the pixel storage mode of
    /// the copy and selects the primary or paired destination table.
    pub fn relocate(&self, dest: u32, src: u32, format: u32) {
        let mut registry = self.registry.lock().unwrap();
        let Some((key, _)) = self.primary.get(src) else {
            debug!(src, dest, "relocate from unbound address ignored");
            return;
        };
        let paired = format == u32::from(psm::T4HH);
        let placeholder = self.placeholder_handle();
        let entry = registry.get_mut(key);
        entry.record_slot(dest, paired);
        let handle = entry.resident_handle().unwrap_or(placeholder);
        if paired {
            self.paired.bind(dest, key, handle);
        } else {
            self.primary.bind(dest, key, handle);
        }
        debug!(
            src,
            dest,
            paired,
            name = entry.name.as_str(),
            "relocated VRAM binding"
        );
    }
}
