// Hardware bounds of the digitizer crate. Tables are sized from the configured layout,
// which may never exceed these.
pub const MAX_BOARDS: usize = 8;
pub const MAX_CHANNELS: usize = 64;

// Per-channel fragment queues
pub const DEFAULT_QUEUE_SIZE: usize = 1024;

// Coarse trigger time tags are 31 bits wide on most DPP firmwares
pub const DEFAULT_TAG_BITS: u32 = 31;

pub const DEFAULT_COINCIDENCE_WINDOW: u64 = 100;

// Pulse-shape charges that flag a saturated integral
pub const SATURATED_CHARGE_LONG: u16 = 0xFFFF;
pub const SATURATED_CHARGE_SHORT: u16 = 0x7FFF;

/// Default almost-full threshold for a queue of the given size (7/8 full).
///
/// Always below `queue_size`, so a full queue is also almost full.
pub const fn default_almost_full_level(queue_size: usize) -> usize {
    let margin = if queue_size / 8 > 1 { queue_size / 8 } else { 1 };
    queue_size.saturating_sub(margin)
}
