use alloc::vec::Vec;

use axerrno::{ax_err, AxResult};
use bitmaps::Bitmap;
use log::{debug, trace};
use spin::Mutex;

use crate::consts::*;
use crate::queue::BoundedQueue;

/// One queued doorbell message: the data word, target address and byte
/// select captured from the producer-side bus write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterruptMessage {
    pub data: u32,
    pub address: u32,
    pub select: u32,
}

/// Outcome of a post attempt on one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostStatus {
    Accepted,
    /// The line's queue is full; the producer keeps the message and must
    /// retry once the stall clears.
    Rejected,
}

/// One doorbell interrupt line: a bounded message FIFO plus the derived
/// pending flag surfaced in the status bitmap.
pub struct InterruptLine {
    queue: Mutex<BoundedQueue<InterruptMessage>>,
}

impl InterruptLine {
    fn new(depth: usize) -> Self {
        Self {
            queue: Mutex::new(BoundedQueue::new(depth)),
        }
    }

    pub fn try_post(&self, msg: InterruptMessage) -> PostStatus {
        let mut queue = self.queue.lock();
        if queue.push(msg) {
            trace!("doorbell accepted, occupancy {}", queue.occupancy());
            PostStatus::Accepted
        } else {
            PostStatus::Rejected
        }
    }

    /// True while at least one message is queued. This is the line's bit in
    /// the status bitmap and the outward pending indicator; it is derived
    /// from occupancy on every call, never cached.
    pub fn status(&self) -> bool {
        !self.queue.lock().is_empty()
    }

    /// Pops the head message iff `requested` and the line is pending.
    /// Popping an idle line is legal and does nothing.
    pub fn try_pop(&self, requested: bool) -> bool {
        if !requested {
            return false;
        }
        self.queue.lock().pop()
    }

    /// Current head message, only meaningful while [`status`](Self::status)
    /// is true. Callers must gate on status before trusting the value.
    pub fn peek_head(&self) -> Option<InterruptMessage> {
        self.queue.lock().peek().copied()
    }

    pub fn occupancy(&self) -> usize {
        self.queue.lock().occupancy()
    }

    pub fn is_full(&self) -> bool {
        self.queue.lock().is_full()
    }

    fn clear(&self) {
        self.queue.lock().clear();
    }
}

/// The controller's set of interrupt lines and the aggregation logic over
/// them: status bitmap, pop-mask application and queue-page reads.
pub struct LineArray {
    lines: Vec<InterruptLine>,
}

impl LineArray {
    pub fn new(line_count: usize, depth: usize) -> Self {
        assert!(
            line_count >= 1 && line_count <= IRQC_MAX_LINES,
            "line count {} outside 1..={}",
            line_count,
            IRQC_MAX_LINES,
        );
        Self {
            lines: (0..line_count).map(|_| InterruptLine::new(depth)).collect(),
        }
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Posts `msg` on line `i`. The index comes from internal wiring, not
    /// from the bus; an out-of-range index is a caller bug.
    pub fn post(&self, i: usize, msg: InterruptMessage) -> PostStatus {
        assert!(i < self.lines.len(), "interrupt line {} does not exist", i);
        self.lines[i].try_post(msg)
    }

    pub fn line(&self, i: usize) -> &InterruptLine {
        assert!(i < self.lines.len(), "interrupt line {} does not exist", i);
        &self.lines[i]
    }

    /// Per-line pending flags as a word, bit i for line i. Bits at or above
    /// the configured line count are always zero.
    pub fn status_word(&self) -> u32 {
        let mut word = 0u32;
        for (i, line) in self.lines.iter().enumerate() {
            if line.status() {
                word |= 1 << i;
            }
        }
        word
    }

    pub fn status_bitmap(&self) -> Bitmap<IRQC_MAX_LINES> {
        Bitmap::from_value(self.status_word())
    }

    /// Applies a one-shot pop mask: line i is popped iff bit i is set in
    /// `mask` and the line is pending in the same status snapshot. Mask bits
    /// at or above the line count are ignored.
    pub fn apply_pop_mask(&self, mask: u32) {
        let effective = mask & self.status_word();
        if effective != 0 {
            debug!("applying pop mask {:#010x}", effective);
        }
        for (i, line) in self.lines.iter().enumerate() {
            line.try_pop(effective & (1 << i) != 0);
        }
    }

    /// Reads one field of line `i`'s head message for a queue-page register.
    /// Unknown field offsets and out-of-range indices are bus decode errors.
    /// Reading a page whose line is idle is a caller bug: the processor must
    /// check STATUS first, the page contents are unspecified otherwise.
    pub fn read_page(&self, i: usize, field_offset: usize) -> AxResult<u32> {
        if i >= self.lines.len() {
            return ax_err!(InvalidInput, "queue page index out of range");
        }
        let head = match field_offset {
            IRQC_PAGE_DATA_OFFSET | IRQC_PAGE_ADDRESS_OFFSET | IRQC_PAGE_SELECT_OFFSET => self
                .lines[i]
                .peek_head()
                .expect("queue page read on an idle line"),
            _ => return ax_err!(InvalidInput, "unknown queue page field"),
        };
        Ok(match field_offset {
            IRQC_PAGE_DATA_OFFSET => head.data,
            IRQC_PAGE_ADDRESS_OFFSET => head.address,
            _ => head.select,
        })
    }

    /// Flushes every line. Runs during the reset pulse.
    pub fn flush_all(&self) {
        for line in &self.lines {
            line.clear();
        }
    }
}
