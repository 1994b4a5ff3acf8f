/// Snapshot of pool counters, suitable for diagnostics overlays and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Registry entries (immortal; counts placeholdered textures too).
    pub distinct_textures: usize,
    /// Loaded device copies across all entries.
    pub resident_copies: usize,
    /// Entries currently resolving to the placeholder handle.
    pub placeholder_textures: usize,
    /// Entries in the always-loaded common set.
    pub common_textures: usize,
    /// Primary VRAM slots that have ever been bound.
    pub bound_slots: usize,
    /// Paired-format slots that have ever been bound.
    pub bound_paired_slots: usize,
}
