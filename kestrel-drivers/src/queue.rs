//! Bounded byte FIFO backing one serial direction
//!
//! Capacity is fixed at compile time per direction. The queue itself is
//! not synchronized; `SerialLink` only touches it inside a critical
//! section shared with the interrupt handler.

/// Smallest queue capacity a link will accept
pub const MIN_QUEUE_CAPACITY: usize = 8;

/// Bounded FIFO of bytes
#[derive(Debug)]
pub struct ByteQueue<const N: usize> {
    buf: heapless::Deque<u8, N>,
}

impl<const N: usize> ByteQueue<N> {
    pub const fn new() -> Self {
        Self {
            buf: heapless::Deque::new(),
        }
    }

    /// Append a byte; returns it back if the queue is full
    pub fn push(&mut self, byte: u8) -> Result<(), u8> {
        self.buf.push_back(byte)
    }

    /// Remove the oldest byte
    pub fn pop(&mut self) -> Option<u8> {
        self.buf.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.buf.is_full()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub const fn capacity(&self) -> usize {
        N
    }
}

impl<const N: usize> Default for ByteQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}
