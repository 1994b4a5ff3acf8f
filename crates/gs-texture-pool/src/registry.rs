//! The distinct-texture registry.
//!
//! One entry per unique combined `page-texture` name. Entries live in an
//! arena and are addressed by stable index, so slot-table words can carry a
//! plain [`TextureKey`] instead of a pointer. Entries are never removed: a
//! texture whose level unloads keeps its entry (in placeholder state) so that
//! every VRAM address still mapping to it stays resolvable, and so a later
//! reload of the same name lands back on the same key.

use std::collections::HashMap;
use std::sync::Arc;

use crate::DeviceHandle;

/// Stable identifier of a distinct texture within one pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureKey(u32);

impl TextureKey {
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// One loaded device copy of a texture.
pub(crate) struct ResidentCopy {
    pub handle: DeviceHandle,
    /// Decoded pixel data, shared with the loader.
    pub data: Arc<[u8]>,
}

/// A unique in-game texture and everything currently loaded for it.
pub(crate) struct DistinctTexture {
    pub page_name: String,
    pub name: String,
    pub combo_id: u32,
    pub width: u16,
    pub height: u16,
    /// Currently loaded device copies, possibly none.
    pub copies: Vec<ResidentCopy>,
    /// VRAM addresses bound to this texture in the primary table.
    pub slots: Vec<u32>,
    /// VRAM addresses bound in the paired (T4HH) table.
    pub paired_slots: Vec<u32>,
    /// Part of the always-loaded common set; never becomes a placeholder.
    pub is_common: bool,
    /// No copies loaded; bound slots carry the shared placeholder handle.
    pub is_placeholder: bool,
}

impl DistinctTexture {
    /// The handle renderers should currently see, if any copy is loaded.
    pub fn resident_handle(&self) -> Option<DeviceHandle> {
        self.copies.first().map(|c| c.handle)
    }

    pub fn record_slot(&mut self, addr: u32, paired: bool) {
        let list = if paired { &mut self.paired_slots } else { &mut self.slots };
        if !list.contains(&addr) {
            list.push(addr);
        }
    }
}

pub(crate) struct Registry {
    by_name: HashMap<String, TextureKey>,
    entries: Vec<DistinctTexture>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            by_name: HashMap::new(),
            entries: Vec::new(),
        }
    }

    pub fn find(&self, combined_name: &str) -> Option<TextureKey> {
        self.by_name.get(combined_name).copied()
    }

    pub fn get(&self, key: TextureKey) -> &DistinctTexture {
        &self.entries[key.index()]
    }

    pub fn get_mut(&mut self, key: TextureKey) -> &mut DistinctTexture {
        &mut self.entries[key.index()]
    }

    /// Finds the entry for `combined_name`, creating it in placeholder state
    /// if this is the first reference from either the loader or an upload.
    pub fn find_or_create(
        &mut self,
        combined_name: &str,
        page_name: &str,
        name: &str,
        combo_id: u32,
        width: u16,
        height: u16,
    ) -> TextureKey {
        if let Some(key) = self.find(combined_name) {
            return key;
        }
        let key = TextureKey::from_index(self.entries.len());
        self.entries.push(DistinctTexture {
            page_name: page_name.to_string(),
            name: name.to_string(),
            combo_id,
            width,
            height,
            copies: Vec::new(),
            slots: Vec::new(),
            paired_slots: Vec::new(),
            is_common: false,
            is_placeholder: true,
        });
        self.by_name.insert(combined_name.to_string(), key);
        key
    }

    pub fn entries(&self) -> &[DistinctTexture] {
        &self.entries
    }
}
