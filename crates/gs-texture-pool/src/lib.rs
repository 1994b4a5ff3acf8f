//! VRAM-indexed texture residency for the PC port renderer.
//!
//! The game addresses textures by VRAM location (texture base pointer), so the
//! pool's job is to keep an O(1), lock-free mapping from VRAM address to a
//! usable device texture handle at all times. The structure has three layers:
//!
//! - a VRAM slot table: one atomic word per 256-byte block, read directly by
//!   renderers every frame without locking;
//! - a registry of distinct textures: one entry per unique combined
//!   `page-texture` name, tracking every currently loaded device copy and
//!   every VRAM address pointing at it;
//! - the device copies themselves, registered and withdrawn by the loader.
//!
//! Two producers race against each other: the game-side emulation uploads and
//! relocates by VRAM address while the loader registers and deregisters
//! decoded texture instances by name, in no guaranteed order. The pool
//! tolerates both orders: an upload that references a texture the loader has
//! not delivered yet binds the shared placeholder handle, and a later
//! registration refreshes every slot already pointing at that texture. Slots
//! are never un-bound once bound, only redirected, and registry entries are
//! never destroyed, which is what makes the unlocked renderer reads safe: a
//! racing read sees a stale-but-valid handle, never a dangling one.
//!
//! Descriptor decoding for the upload protocol lives in the `gs-tpage` crate;
//! actual device allocation stays behind the [`TextureUploader`] seam.

mod placeholder;
mod pool;
mod registry;
mod slots;
mod stats;
mod upload;

pub use placeholder::{placeholder_pixels, TextureUploader, PLACEHOLDER_HEIGHT, PLACEHOLDER_WIDTH};
pub use pool::{TextureInput, TextureMeta, TexturePool};
pub use registry::TextureKey;
pub use stats::PoolStats;
pub use upload::{UploadError, UploadMode};

/// Size of the emulated VRAM space.
pub const VRAM_BYTES: usize = 4 * 1024 * 1024;

/// Addressing granularity: VRAM addresses count 256-byte blocks.
pub const VRAM_BLOCK_BYTES: usize = 256;

/// Number of addressable VRAM slots.
pub const VRAM_SLOT_COUNT: usize = VRAM_BYTES / VRAM_BLOCK_BYTES;

/// An opaque device texture id, in the renderer's texture-name space.
///
/// The pool never dereferences these; it only stores and hands them back.
/// `u32::MAX` is reserved as the loader-side "no texture" sentinel and is
/// never a valid handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceHandle(pub u32);

impl DeviceHandle {
    pub const INVALID: DeviceHandle = DeviceHandle(u32::MAX);

    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}
