//! The fixed-size VRAM slot table.
//!
//! One `AtomicU64` per slot packs the owning registry key and the device
//! handle into a single word, so a bind is one release store and a lookup one
//! acquire load. A reader can therefore never pair a fresh handle with a stale
//! owner. Word 0 means "nothing has ever been uploaded here"; once a slot
//! leaves that state it never returns to it.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::registry::TextureKey;
use crate::{DeviceHandle, VRAM_SLOT_COUNT};

const EMPTY: u64 = 0;

fn pack(key: TextureKey, handle: DeviceHandle) -> u64 {
    (u64::from(key.index() as u32) + 1) << 32 | u64::from(handle.0)
}

fn unpack(word: u64) -> Option<(TextureKey, DeviceHandle)> {
    if word == EMPTY {
        return None;
    }
    let key = TextureKey::from_index(((word >> 32) - 1) as usize);
    Some((key, DeviceHandle(word as u32)))
}

pub(crate) struct SlotTable {
    slots: Box<[AtomicU64]>,
}

impl SlotTable {
    pub fn new() -> Self {
        let slots = (0..VRAM_SLOT_COUNT).map(|_| AtomicU64::new(EMPTY)).collect();
        Self { slots }
    }

    /// Lock-free lookup. `None` only for addresses never bound (or out of
    /// range, which renderers are allowed to probe).
    pub fn get(&self, addr: u32) -> Option<(TextureKey, DeviceHandle)> {
        let slot = self.slots.get(addr as usize)?;
        unpack(slot.load(Ordering::Acquire))
    }

    /// Sets or redirects a slot. Never writes the empty word.
    pub fn bind(&self, addr: u32, key: TextureKey, handle: DeviceHandle) {
        assert!(
            (addr as usize) < VRAM_SLOT_COUNT,
            "VRAM address out of range: 0x{addr:x}"
        );
        self.slots[addr as usize].store(pack(key, handle), Ordering::Release);
    }

    /// Number of slots that have ever been bound.
    pub fn bound_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| s.load(Ordering::Relaxed) != EMPTY)
            .count()
    }

    /// Visits every bound slot.
    pub fn for_each_bound(&self, mut f: impl FnMut(u32, TextureKey, DeviceHandle)) {
        for (addr, slot) in self.slots.iter().enumerate() {
            if let Some((key, handle)) = unpack(slot.load(Ordering::Acquire)) {
                f(addr as u32, key, handle);
            }
        }
    }
}
