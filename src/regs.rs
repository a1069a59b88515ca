use axerrno::{ax_err, AxResult};
use log::{debug, warn};
use spin::Mutex;

use crate::consts::*;
use crate::line::LineArray;

/// Reset state machine gating both sides of the controller.
///
/// Power-on starts in `Held` (external reset asserted). Releasing the
/// external reset, or a software RESET write while `Active`, enters the
/// one-cycle `Releasing` pulse; the next tick self-clears to `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetState {
    /// External reset pin asserted; the bus is not serviced.
    Held,
    /// One-cycle reset pulse: lines flushed, pop masks discarded.
    Releasing,
    Active,
}

pub struct ResetController {
    state: ResetState,
}

impl ResetController {
    pub fn new() -> Self {
        Self {
            state: ResetState::Held,
        }
    }

    pub fn state(&self) -> ResetState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == ResetState::Active
    }

    /// The bus is serviced in every state except `Held`.
    pub fn bus_enabled(&self) -> bool {
        self.state != ResetState::Held
    }

    pub fn hold(&mut self) {
        self.state = ResetState::Held;
    }

    /// Deasserts the external reset. Returns true when this entered the
    /// `Releasing` pulse, in which case the caller must flush the lines.
    pub fn release(&mut self) -> bool {
        if self.state == ResetState::Held {
            self.state = ResetState::Releasing;
            true
        } else {
            false
        }
    }

    /// Arms the software reset pulse. A RESET write while `Held` is never
    /// seen here (the bus is disabled); while `Releasing` it re-arms the
    /// same pulse. Returns true when the pulse (re-)starts.
    pub fn soft_reset(&mut self) -> bool {
        match self.state {
            ResetState::Held => false,
            ResetState::Releasing | ResetState::Active => {
                self.state = ResetState::Releasing;
                true
            }
        }
    }

    /// Advances one cycle: the `Releasing` pulse self-clears.
    pub fn tick(&mut self) {
        if self.state == ResetState::Releasing {
            self.state = ResetState::Active;
        }
    }
}

impl Default for ResetController {
    fn default() -> Self {
        Self::new()
    }
}

/// One control-port bus transaction, as issued by the processor. `addr` is
/// the word-aligned register offset from the device base.
#[derive(Debug, Clone, Copy)]
pub struct BusRequest {
    pub addr: usize,
    pub write_enable: bool,
    pub write_data: u32,
}

impl BusRequest {
    pub fn read(addr: usize) -> Self {
        Self {
            addr,
            write_enable: false,
            write_data: 0,
        }
    }

    pub fn write(addr: usize, write_data: u32) -> Self {
        Self {
            addr,
            write_enable: true,
            write_data,
        }
    }
}

/// Control-port response. Exactly one of `ack` and `err` is set; write-only
/// registers ack with zero on the read data path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusResponse {
    pub ack: bool,
    pub err: bool,
    pub read_data: u32,
}

impl BusResponse {
    fn ack(read_data: u32) -> Self {
        Self {
            ack: true,
            err: false,
            read_data,
        }
    }

    fn err() -> Self {
        Self {
            ack: false,
            err: true,
            read_data: 0,
        }
    }
}

/// The processor-facing register window: RESET/STATUS/POP plus one read-only
/// queue page per line. Owns the line array and the reset state machine and
/// translates decoded register accesses into line operations.
pub struct ControlRegisterFile {
    lines: LineArray,
    reset: Mutex<ResetController>,
}

impl ControlRegisterFile {
    pub fn new(lines: LineArray) -> Self {
        Self {
            lines,
            reset: Mutex::new(ResetController::new()),
        }
    }

    pub fn lines(&self) -> &LineArray {
        &self.lines
    }

    pub fn reset_state(&self) -> ResetState {
        self.reset.lock().state()
    }

    pub fn is_active(&self) -> bool {
        self.reset.lock().is_active()
    }

    pub fn hold_reset(&self) {
        self.reset.lock().hold();
    }

    pub fn release_reset(&self) {
        if self.reset.lock().release() {
            self.lines.flush_all();
        }
    }

    /// Advances one cycle of the reset state machine.
    pub fn tick(&self) {
        self.reset.lock().tick();
    }

    /// Services one control-port transaction. Returns `None` while the bus
    /// enable condition does not hold (external reset asserted); the caller
    /// must retry on a later tick.
    pub fn transact(&self, req: &BusRequest) -> Option<BusResponse> {
        if !self.reset.lock().bus_enabled() {
            return None;
        }
        let result = if req.write_enable {
            self.handle_write(req.addr, req.write_data).map(|()| 0)
        } else {
            self.handle_read(req.addr)
        };
        Some(match result {
            Ok(read_data) => BusResponse::ack(read_data),
            Err(_) => BusResponse::err(),
        })
    }

    pub fn handle_read(&self, offset: usize) -> AxResult<u32> {
        if offset % 4 != 0 {
            return ax_err!(InvalidInput, "unaligned register read");
        }
        match offset {
            // Write-only registers drive zero on the read data path.
            IRQC_RESET_OFFSET | IRQC_POP_OFFSET => Ok(0),
            IRQC_STATUS_OFFSET => Ok(self.lines.status_word()),
            offset if offset >= IRQC_PAGE_BASE => {
                let page = (offset - IRQC_PAGE_BASE) / IRQC_PAGE_STRIDE;
                let field = (offset - IRQC_PAGE_BASE) % IRQC_PAGE_STRIDE;
                self.lines.read_page(page, field)
            }
            _ => {
                warn!("read of unmapped control register {:#x}", offset);
                ax_err!(InvalidInput, "unmapped control register")
            }
        }
    }

    pub fn handle_write(&self, offset: usize, val: u32) -> AxResult<()> {
        if offset % 4 != 0 {
            return ax_err!(InvalidInput, "unaligned register write");
        }
        match offset {
            IRQC_RESET_OFFSET => {
                debug!("software reset pulse armed");
                if self.reset.lock().soft_reset() {
                    self.lines.flush_all();
                }
                Ok(())
            }
            IRQC_STATUS_OFFSET => ax_err!(InvalidInput, "STATUS is read-only"),
            IRQC_POP_OFFSET => {
                // The mask is one-shot: applied now against the current
                // status snapshot, never latched. During the reset pulse it
                // is forced to zero so no pop races the flush.
                if self.reset.lock().is_active() {
                    self.lines.apply_pop_mask(val);
                } else {
                    debug!("pop mask {:#010x} discarded during reset", val);
                }
                Ok(())
            }
            offset if offset >= IRQC_PAGE_BASE => {
                ax_err!(InvalidInput, "queue pages are read-only")
            }
            _ => {
                warn!("write to unmapped control register {:#x}", offset);
                ax_err!(InvalidInput, "unmapped control register")
            }
        }
    }
}
