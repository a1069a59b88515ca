use alloc::vec::Vec;

/// Fixed-capacity show-ahead FIFO.
///
/// The head element is always visible through [`peek`](Self::peek) before it
/// is removed. Capacity is fixed at construction; the queue never grows.
pub struct BoundedQueue<T> {
    slots: Vec<Option<T>>,
    head: usize,
    len: usize,
}

impl<T> BoundedQueue<T> {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "queue capacity must be at least 1");
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            head: 0,
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn occupancy(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.slots.len()
    }

    /// Enqueues `item`, returning `false` without side effects if the queue
    /// is currently full.
    pub fn push(&mut self, item: T) -> bool {
        if self.is_full() {
            return false;
        }
        let tail = (self.head + self.len) % self.slots.len();
        self.slots[tail] = Some(item);
        self.len += 1;
        true
    }

    /// Current head element, left in place.
    pub fn peek(&self) -> Option<&T> {
        self.slots[self.head].as_ref()
    }

    /// Removes the current head. A pop on an empty queue is a no-op and
    /// returns `false`.
    pub fn pop(&mut self) -> bool {
        if self.is_empty() {
            return false;
        }
        self.slots[self.head] = None;
        self.head = (self.head + 1) % self.slots.len();
        self.len -= 1;
        true
    }

    /// Drops every queued element.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
        self.head = 0;
        self.len = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_pop_preserves_fifo_order() {
        let mut q = BoundedQueue::new(4);
        for v in 10..14 {
            assert!(q.push(v));
        }
        for v in 10..14 {
            assert_eq!(q.peek(), Some(&v));
            assert!(q.pop());
        }
        assert!(q.is_empty());
    }

    #[test]
    fn push_on_full_is_rejected_without_change() {
        let mut q = BoundedQueue::new(2);
        assert!(q.push(1));
        assert!(q.push(2));
        assert!(q.is_full());
        assert!(!q.push(3));
        assert_eq!(q.occupancy(), 2);
        assert_eq!(q.peek(), Some(&1));
    }

    #[test]
    fn pop_on_empty_is_a_noop() {
        let mut q: BoundedQueue<u32> = BoundedQueue::new(3);
        assert!(!q.pop());
        assert_eq!(q.occupancy(), 0);
    }

    #[test]
    fn peek_does_not_consume() {
        let mut q = BoundedQueue::new(2);
        q.push(7);
        assert_eq!(q.peek(), Some(&7));
        assert_eq!(q.peek(), Some(&7));
        assert_eq!(q.occupancy(), 1);
    }

    #[test]
    fn wraparound_keeps_order() {
        let mut q = BoundedQueue::new(2);
        q.push(1);
        q.push(2);
        q.pop();
        assert!(q.push(3));
        assert_eq!(q.peek(), Some(&2));
        q.pop();
        assert_eq!(q.peek(), Some(&3));
    }

    #[test]
    fn clear_empties_the_queue() {
        let mut q = BoundedQueue::new(3);
        q.push(1);
        q.push(2);
        q.clear();
        assert!(q.is_empty());
        assert_eq!(q.peek(), None);
        assert!(q.push(9));
        assert_eq!(q.peek(), Some(&9));
    }
}
