// Register map of the doorbell interrupt-queue controller. All registers are
// 32 bits wide and word-aligned; offsets are relative to the device base.

/// Maximum number of interrupt lines a single controller instance can carry.
/// Bounded by the width of the STATUS register (one pending bit per line).
pub const IRQC_MAX_LINES: usize = 32;

// --- Control registers ---

/// Offset of the RESET register (write-only).
/// Writing any value arms a one-cycle software reset pulse.
pub const IRQC_RESET_OFFSET: usize = 0x0;

/// Offset of the STATUS register (read-only).
/// Bit N is set while line N has at least one queued message.
pub const IRQC_STATUS_OFFSET: usize = 0x4;

/// Offset of the POP register (write-only).
/// Bit N requests a pop of line N's head message. The written mask is
/// consumed the same cycle and is never latched.
pub const IRQC_POP_OFFSET: usize = 0x8;

// --- Per-line queue pages ---

/// Offset of the first queue page.
/// The page for line N starts at: IRQC_PAGE_BASE + N * IRQC_PAGE_STRIDE
pub const IRQC_PAGE_BASE: usize = 0x10;

/// Stride between queue pages (in bytes).
/// Each page holds three 32-bit read-only registers, one per message field.
pub const IRQC_PAGE_STRIDE: usize = 0x10;

/// Offset within a queue page to the head message's data field.
pub const IRQC_PAGE_DATA_OFFSET: usize = 0x0;

/// Offset within a queue page to the head message's address field.
pub const IRQC_PAGE_ADDRESS_OFFSET: usize = 0x4;

/// Offset within a queue page to the head message's byte-select field.
pub const IRQC_PAGE_SELECT_OFFSET: usize = 0x8;
