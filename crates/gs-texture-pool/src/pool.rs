//! The texture pool: registry plus slot tables plus placeholder.

use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::placeholder::{placeholder_pixels, TextureUploader, PLACEHOLDER_HEIGHT, PLACEHOLDER_WIDTH};
use crate::registry::{DistinctTexture, Registry, ResidentCopy, TextureKey};
use crate::slots::SlotTable;
use crate::stats::PoolStats;
use crate::DeviceHandle;

/// A decoded texture instance handed over by the loader.
pub struct TextureInput {
    pub page_name: String,
    pub name: String,
    /// Loader-side numeric id (page id + texture index).
    pub combo_id: u32,
    pub width: u16,
    pub height: u16,
    /// Device texture holding this copy's pixel data.
    pub handle: DeviceHandle,
    /// Always-loaded common set; never placeholdered.
    pub common: bool,
    /// Decoded pixel data, kept for renderers that read texels on the CPU.
    pub data: Arc<[u8]>,
}

impl TextureInput {
    /// The stable identity key: identical combined names always denote
    /// byte-identical content (verified offline by the asset pipeline).
    pub fn combined_name(&self) -> String {
        combined_name(&self.page_name, &self.name)
    }
}

pub(crate) fn combined_name(page_name: &str, name: &str) -> String {
    format!("{page_name}-{name}")
}

/// CPU-side metadata snapshot for one distinct texture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureMeta {
    pub page_name: String,
    pub name: String,
    pub combo_id: u32,
    pub width: u16,
    pub height: u16,
    pub is_placeholder: bool,
    pub is_common: bool,
    pub resident_copies: usize,
}

/// The pool. Mutations (loader registration, game uploads) serialize on an
/// internal lock; renderer lookups are lock-free and may race them safely.
pub struct TexturePool {
    pub(crate) primary: SlotTable,
    pub(crate) paired: SlotTable,
    pub(crate) registry: Mutex<Registry>,
    placeholder: DeviceHandle,
}

impl TexturePool {
    /// Creates the pool and its placeholder texture. Runs before any uploads
    /// are processed; `device` is only used for this one allocation.
    pub fn new(device: &mut impl TextureUploader) -> Self {
        let placeholder =
            device.create_texture(PLACEHOLDER_WIDTH, PLACEHOLDER_HEIGHT, &placeholder_pixels());
        assert!(placeholder.is_valid(), "placeholder handle is the sentinel");
        Self {
            primary: SlotTable::new(),
            paired: SlotTable::new(),
            registry: Mutex::new(Registry::new()),
            placeholder,
        }
    }

    /// Registers a loaded texture instance.
    ///
    /// Finds or creates the registry entry, appends the new device copy, and
    /// refreshes every VRAM slot already pointing at this texture. Slots
    /// bound before the data existed were carrying the placeholder handle and
    /// now redirect to the real one.
    pub fn register_instance(&self, input: &TextureInput) -> TextureKey {
        assert!(
            !input.page_name.is_empty() && !input.name.is_empty(),
            "texture identity must be non-empty"
        );
        assert!(
            input.width > 0 && input.height > 0,
            "texture dimensions must be non-zero"
        );
        assert!(input.handle.is_valid(), "device handle is the sentinel");

        let mut registry = self.registry.lock().unwrap();
        let combined = input.combined_name();
        let key = registry.find_or_create(
            &combined,
            &input.page_name,
            &input.name,
            input.combo_id,
            input.width,
            input.height,
        );
        let entry = registry.get_mut(key);
        entry.combo_id = input.combo_id;
        entry.width = input.width;
        entry.height = input.height;
        entry.is_common |= input.common;
        entry.copies.push(ResidentCopy {
            handle: input.handle,
            data: Arc::clone(&input.data),
        });
        entry.is_placeholder = false;
        debug!(
            name = combined.as_str(),
            handle = input.handle.0,
            copies = entry.copies.len(),
            "registered texture instance"
        );
        self.refresh_links(entry, key);
        key
    }

    /// Registers an instance and immediately binds it at `addr`, for callers
    /// that know the upload for this texture already happened.
    pub fn register_instance_at(&self, input: &TextureInput, addr: u32) -> TextureKey {
        let key = self.register_instance(input);
        self.move_existing_to_vram(key, addr);
        key
    }

    /// Withdraws the device copy `handle` of the texture named
    /// `combined_name`.
    ///
    /// Unknown names or handles are no-ops: level-transition races can
    /// deliver duplicate or late unload messages, and tolerating them here is
    /// cheaper than ordering them upstream. When the last copy of a
    /// non-common texture goes away the entry flips to placeholder state and
    /// all its slots are redirected to the placeholder handle; the entry
    /// itself stays, keeping every bound address resolvable.
    pub fn deregister_instance(&self, combined_name: &str, handle: DeviceHandle) {
        let mut registry = self.registry.lock().unwrap();
        let Some(key) = registry.find(combined_name) else {
            debug!(name = combined_name, "deregister of unknown texture ignored");
            return;
        };
        let entry = registry.get_mut(key);
        let before = entry.copies.len();
        entry.copies.retain(|c| c.handle != handle);
        if entry.copies.len() == before {
            debug!(
                name = combined_name,
                handle = handle.0,
                "deregister of unknown device copy ignored"
            );
            return;
        }
        if entry.copies.is_empty() && !entry.is_common {
            entry.is_placeholder = true;
            debug!(name = combined_name, "texture fell back to placeholder");
        }
        self.refresh_links(entry, key);
    }

    /// Exact identity lookup.
    pub fn find(&self, combined_name: &str) -> Option<TextureKey> {
        self.registry.lock().unwrap().find(combined_name)
    }

    /// Looks up the device handle bound at a VRAM address. Lock-free; `None`
    /// means the game never uploaded here.
    pub fn lookup(&self, addr: u32) -> Option<DeviceHandle> {
        self.primary.get(addr).map(|(_, handle)| handle)
    }

    /// Looks up the paired-format (T4HH) table.
    pub fn lookup_paired(&self, addr: u32) -> Option<DeviceHandle> {
        self.paired.get(addr).map(|(_, handle)| handle)
    }

    /// The distinct texture bound at a VRAM address, for callers that need
    /// CPU-side metadata rather than a handle.
    pub fn lookup_source(&self, addr: u32) -> Option<TextureKey> {
        self.primary.get(addr).map(|(key, _)| key)
    }

    /// Paired-table variant of [`Self::lookup_source`].
    pub fn lookup_paired_source(&self, addr: u32) -> Option<TextureKey> {
        self.paired.get(addr).map(|(key, _)| key)
    }

    /// The always-valid fallback handle.
    pub fn placeholder_handle(&self) -> DeviceHandle {
        self.placeholder
    }

    /// Metadata snapshot for a distinct texture.
    pub fn texture_meta(&self, key: TextureKey) -> TextureMeta {
        let registry = self.registry.lock().unwrap();
        let entry = registry.get(key);
        TextureMeta {
            page_name: entry.page_name.clone(),
            name: entry.name.clone(),
            combo_id: entry.combo_id,
            width: entry.width,
            height: entry.height,
            is_placeholder: entry.is_placeholder,
            is_common: entry.is_common,
            resident_copies: entry.copies.len(),
        }
    }

    /// Pixel data of the first loaded copy, or `None` in placeholder state.
    pub fn cpu_data(&self, key: TextureKey) -> Option<Arc<[u8]>> {
        let registry = self.registry.lock().unwrap();
        registry.get(key).copies.first().map(|c| Arc::clone(&c.data))
    }

    /// Directly binds an already-resolved texture at `addr` (primary table).
    pub fn move_existing_to_vram(&self, key: TextureKey, addr: u32) {
        let mut registry = self.registry.lock().unwrap();
        let placeholder = self.placeholder;
        let entry = registry.get_mut(key);
        entry.record_slot(addr, false);
        let handle = entry.resident_handle().unwrap_or(placeholder);
        self.primary.bind(addr, key, handle);
    }

    /// Counter snapshot for diagnostics overlays and tests.
    pub fn stats(&self) -> PoolStats {
        let registry = self.registry.lock().unwrap();
        let entries = registry.entries();
        PoolStats {
            distinct_textures: entries.len(),
            resident_copies: entries.iter().map(|e| e.copies.len()).sum(),
            placeholder_textures: entries.iter().filter(|e| e.is_placeholder).count(),
            common_textures: entries.iter().filter(|e| e.is_common).count(),
            bound_slots: self.primary.bound_count(),
            bound_paired_slots: self.paired.bound_count(),
        }
    }

    /// Full cross-check of slot tables against the registry. Panics on any
    /// violation. Slow; meant for tests and debug builds, not the frame loop.
    pub fn verify(&self) {
        let registry = self.registry.lock().unwrap();
        for (table, paired) in [(&self.primary, false), (&self.paired, true)] {
            table.for_each_bound(|addr, key, handle| {
                assert!(
                    key.index() < registry.entries().len(),
                    "slot 0x{addr:x} points at unknown texture {key:?}"
                );
                let entry = registry.get(key);
                let recorded = if paired { &entry.paired_slots } else { &entry.slots };
                assert!(
                    recorded.contains(&addr),
                    "slot 0x{addr:x} not recorded on {}-{}",
                    entry.page_name,
                    entry.name
                );
                let expected = entry.resident_handle().unwrap_or(self.placeholder);
                assert!(
                    handle == expected,
                    "slot 0x{addr:x} carries handle {} but {}-{} resolves to {}",
                    handle.0,
                    entry.page_name,
                    entry.name,
                    expected.0
                );
            });
        }
    }

    /// Rebinds every slot recorded on `entry` to its current handle (the
    /// first loaded copy, or the placeholder).
    pub(crate) fn refresh_links(&self, entry: &DistinctTexture, key: TextureKey) {
        let handle = entry.resident_handle().unwrap_or(self.placeholder);
        for &addr in &entry.slots {
            self.primary.bind(addr, key, handle);
        }
        for &addr in &entry.paired_slots {
            self.paired.bind(addr, key, handle);
        }
    }
}
