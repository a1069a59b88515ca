#![cfg_attr(not(test), no_std)]

extern crate alloc;

mod consts;
mod line;
mod queue;
mod regs;

pub use consts::*;
pub use line::{InterruptLine, InterruptMessage, LineArray, PostStatus};
pub use queue::BoundedQueue;
pub use regs::{BusRequest, BusResponse, ControlRegisterFile, ResetController, ResetState};

use bitmaps::Bitmap;

use line::PostStatus::{Accepted, Rejected};

/// Construction-time parameters of one controller instance. None of these
/// are runtime-mutable.
#[derive(Debug, Clone, Copy)]
pub struct IrqcConfig {
    /// Number of doorbell interrupt lines, 1..=[`IRQC_MAX_LINES`].
    pub queue_count: usize,
    /// Per-line message FIFO depth, at least 1.
    pub queue_depth: usize,
    /// Significant bits of the message data field, 1..=32.
    pub data_bits: u32,
    /// Significant bits of the message address field, 1..=32.
    pub addr_bits: u32,
    /// Significant bits of the message byte-select field, 1..=32.
    pub sel_bits: u32,
}

impl Default for IrqcConfig {
    fn default() -> Self {
        Self {
            queue_count: 8,
            queue_depth: 4,
            data_bits: 32,
            addr_bits: 32,
            sel_bits: 4,
        }
    }
}

/// Producer-side outcome of one doorbell post. `stall` is the inverse of
/// ready-to-accept; a stalled producer keeps its message and retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostResponse {
    pub accepted: bool,
    pub stall: bool,
}

/// The doorbell interrupt-queue controller.
///
/// Producers post messages on per-line ingress ports; the processor polls
/// STATUS, reads head messages through the queue pages and acknowledges them
/// through POP, all over the control port ([`transact`](Self::transact)).
///
/// The instance starts with the external reset held: call
/// [`release_reset`](Self::release_reset) and then [`tick`](Self::tick) once
/// before it accepts posts or pops.
pub struct DoorbellIrqc {
    regs: ControlRegisterFile,
    data_mask: u32,
    addr_mask: u32,
    sel_mask: u32,
}

fn field_mask(bits: u32) -> u32 {
    assert!(bits >= 1 && bits <= 32, "field width {} outside 1..=32", bits);
    if bits == 32 {
        u32::MAX
    } else {
        (1 << bits) - 1
    }
}

impl DoorbellIrqc {
    pub fn new(config: IrqcConfig) -> Self {
        assert!(config.queue_depth >= 1, "queue depth must be at least 1");
        Self {
            regs: ControlRegisterFile::new(LineArray::new(
                config.queue_count,
                config.queue_depth,
            )),
            data_mask: field_mask(config.data_bits),
            addr_mask: field_mask(config.addr_bits),
            sel_mask: field_mask(config.sel_bits),
        }
    }

    pub fn line_count(&self) -> usize {
        self.regs.lines().line_count()
    }

    /// Posts one doorbell message on line `line`. Fields are truncated to
    /// the configured widths. Rejected while the line's FIFO is full or the
    /// controller is in reset; the producer observes the stall and retries.
    pub fn post(&self, line: usize, data: u32, address: u32, select: u32) -> PostResponse {
        if !self.regs.is_active() {
            return PostResponse {
                accepted: false,
                stall: true,
            };
        }
        let msg = InterruptMessage {
            data: data & self.data_mask,
            address: address & self.addr_mask,
            select: select & self.sel_mask,
        };
        match self.regs.lines().post(line, msg) {
            Accepted => PostResponse {
                accepted: true,
                stall: false,
            },
            Rejected => PostResponse {
                accepted: false,
                stall: true,
            },
        }
    }

    /// Current stall indication for line `line`, polled by the producer
    /// before each post attempt.
    pub fn stalled(&self, line: usize) -> bool {
        !self.regs.is_active() || self.regs.lines().line(line).is_full()
    }

    /// Services one control-port transaction; `None` while the bus enable
    /// condition does not hold.
    pub fn transact(&self, req: &BusRequest) -> Option<BusResponse> {
        self.regs.transact(req)
    }

    /// Outward interrupt-pending vector, one flag per line, continuously
    /// derived from queue occupancy.
    pub fn pending_vector(&self) -> Bitmap<IRQC_MAX_LINES> {
        self.regs.lines().status_bitmap()
    }

    /// The pending vector as a zero-extended word, as read from STATUS.
    pub fn status_word(&self) -> u32 {
        self.regs.lines().status_word()
    }

    pub fn reset_state(&self) -> ResetState {
        self.regs.reset_state()
    }

    /// Asserts the external reset: the bus goes idle and posts stall.
    pub fn hold_reset(&self) {
        self.regs.hold_reset();
    }

    /// Deasserts the external reset, entering the one-cycle flush pulse.
    pub fn release_reset(&self) {
        self.regs.release_reset();
    }

    /// Advances one logical clock tick. Posts and transactions between two
    /// ticks are applied in call order; the reset pulse self-clears here.
    pub fn tick(&self) {
        self.regs.tick();
    }

    /// Occupancy of line `line`, exposed for embedders and tests.
    pub fn occupancy(&self, line: usize) -> usize {
        self.regs.lines().line(line).occupancy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active_irqc(config: IrqcConfig) -> DoorbellIrqc {
        let irqc = DoorbellIrqc::new(config);
        irqc.release_reset();
        irqc.tick();
        irqc
    }

    #[test]
    fn starts_held_until_reset_release_and_tick() {
        let irqc = DoorbellIrqc::new(IrqcConfig::default());
        assert_eq!(irqc.reset_state(), ResetState::Held);
        assert!(!irqc.post(0, 1, 2, 3).accepted);
        irqc.release_reset();
        assert_eq!(irqc.reset_state(), ResetState::Releasing);
        irqc.tick();
        assert_eq!(irqc.reset_state(), ResetState::Active);
        assert!(irqc.post(0, 1, 2, 3).accepted);
    }

    #[test]
    fn message_fields_are_truncated_to_configured_widths() {
        let irqc = active_irqc(IrqcConfig {
            queue_count: 1,
            queue_depth: 1,
            data_bits: 8,
            addr_bits: 12,
            sel_bits: 2,
        });
        assert!(irqc.post(0, 0xabcd, 0xfffff, 0xf).accepted);
        let data = irqc
            .transact(&BusRequest::read(IRQC_PAGE_BASE + IRQC_PAGE_DATA_OFFSET))
            .unwrap();
        assert_eq!(data.read_data, 0xcd);
        let addr = irqc
            .transact(&BusRequest::read(IRQC_PAGE_BASE + IRQC_PAGE_ADDRESS_OFFSET))
            .unwrap();
        assert_eq!(addr.read_data, 0xfff);
        let sel = irqc
            .transact(&BusRequest::read(IRQC_PAGE_BASE + IRQC_PAGE_SELECT_OFFSET))
            .unwrap();
        assert_eq!(sel.read_data, 0x3);
    }

    #[test]
    fn stall_is_polled_per_line() {
        let irqc = active_irqc(IrqcConfig {
            queue_count: 2,
            queue_depth: 1,
            ..IrqcConfig::default()
        });
        assert!(!irqc.stalled(0));
        irqc.post(0, 1, 0, 0);
        assert!(irqc.stalled(0));
        assert!(!irqc.stalled(1));
    }

    #[test]
    fn pending_vector_mirrors_status_word() {
        let irqc = active_irqc(IrqcConfig::default());
        irqc.post(2, 1, 0, 0);
        irqc.post(5, 2, 0, 0);
        assert_eq!(irqc.status_word(), (1 << 2) | (1 << 5));
        let vector = irqc.pending_vector();
        assert!(vector.get(2) && vector.get(5));
        assert!(!vector.get(0));
    }

    #[test]
    #[should_panic(expected = "outside 1..=32")]
    fn zero_line_count_is_rejected_at_construction() {
        let _ = DoorbellIrqc::new(IrqcConfig {
            queue_count: 0,
            ..IrqcConfig::default()
        });
    }

    #[test]
    #[should_panic(expected = "field width")]
    fn oversized_field_width_is_rejected_at_construction() {
        let _ = DoorbellIrqc::new(IrqcConfig {
            data_bits: 33,
            ..IrqcConfig::default()
        });
    }
}
