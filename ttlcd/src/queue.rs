//! Fixed-capacity FIFO of bytes over caller-supplied storage.

use crate::{LcdError, LcdResult};
use std::fmt::{Debug, Formatter};

/// Ring buffer of bytes backed by a borrowed slice.
///
/// The capacity is the length of the slice and never changes. A full queue rejects new bytes
/// instead of overwriting old ones, since overwriting would scramble addresses and text already
/// waiting for the display.
pub struct ByteQueue<'a> {
    buffer: &'a mut [u8],
    head: usize,
    len: usize,
}

impl<'a> ByteQueue<'a> {
    /// Creates an empty queue using all of `buffer` as its storage.
    pub fn new(buffer: &'a mut [u8]) -> Self {
        ByteQueue {
            buffer,
            head: 0,
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    /// Number of bytes that can still be enqueued.
    pub fn free(&self) -> usize {
        self.capacity() - self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    /// Appends a byte at the back.
    ///
    /// # Errors
    /// - [LcdError::QueueFull] if there's no space left. The queue is left untouched.
    pub fn enqueue(&mut self, byte: u8) -> LcdResult<()> {
        if self.is_full() {
            return Err(LcdError::QueueFull);
        }
        let tail = (self.head + self.len) % self.capacity();
        self.buffer[tail] = byte;
        self.len += 1;
        Ok(())
    }

    /// Appends two bytes, or neither of them.
    ///
    /// # Errors
    /// - [LcdError::QueueFull] if fewer than two slots are free.
    pub fn enqueue_pair(&mut self, first: u8, second: u8) -> LcdResult<()> {
        if self.free() < 2 {
            return Err(LcdError::QueueFull);
        }
        self.enqueue(first)?;
        self.enqueue(second)
    }

    /// Removes and returns the oldest byte.
    pub fn dequeue(&mut self) -> Option<u8> {
        if self.is_empty() {
            return None;
        }
        let byte = self.buffer[self.head];
        self.head = (self.head + 1) % self.capacity();
        self.len -= 1;
        Some(byte)
    }

    /// Returns the oldest byte without removing it.
    pub fn peek(&self) -> Option<u8> {
        self.get(0)
    }

    /// Returns the byte `offset` positions behind the front, without removing anything.
    pub fn get(&self, offset: usize) -> Option<u8> {
        if offset >= self.len {
            return None;
        }
        Some(self.buffer[(self.head + offset) % self.capacity()])
    }
}

impl Debug for ByteQueue<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "ByteQueue({}/{})", self.len, self.capacity())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_fifo_order_across_wraparound() {
        let mut storage = [0u8; 4];
        let mut queue = ByteQueue::new(&mut storage);

        for byte in 1..=3 {
            queue.enqueue(byte).unwrap();
        }
        assert_eq!(queue.dequeue(), Some(1));
        assert_eq!(queue.dequeue(), Some(2));

        // Tail wraps past the end of the storage here.
        for byte in 4..=6 {
            queue.enqueue(byte).unwrap();
        }
        assert!(queue.is_full());

        let drained: Vec<u8> = std::iter::from_fn(|| queue.dequeue()).collect();
        assert_eq!(drained, vec![3, 4, 5, 6]);
        assert!(queue.is_empty());
    }

    #[test]
    fn rejects_bytes_when_full_without_touching_contents() {
        let mut storage = [0u8; 2];
        let mut queue = ByteQueue::new(&mut storage);
        queue.enqueue(b'a').unwrap();
        queue.enqueue(b'b').unwrap();

        assert_eq!(queue.enqueue(b'c'), Err(LcdError::QueueFull));
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.dequeue(), Some(b'a'));
        assert_eq!(queue.dequeue(), Some(b'b'));
        assert_eq!(queue.dequeue(), None);
    }

    #[test]
    fn pair_is_all_or_nothing() {
        let mut storage = [0u8; 3];
        let mut queue = ByteQueue::new(&mut storage);
        queue.enqueue(1).unwrap();
        queue.enqueue(2).unwrap();

        assert_eq!(queue.enqueue_pair(3, 4), Err(LcdError::QueueFull));
        assert_eq!(queue.len(), 2);

        assert_eq!(queue.dequeue(), Some(1));
        queue.enqueue_pair(3, 4).unwrap();
        assert_eq!(queue.peek(), Some(2));
        assert_eq!(queue.get(2), Some(4));
        assert_eq!(queue.get(3), None);
        assert_eq!(queue.free(), 0);
    }

    #[test]
    fn zero_capacity_queue_is_always_full() {
        let mut storage = [0u8; 0];
        let mut queue = ByteQueue::new(&mut storage);
        assert!(queue.is_full());
        assert!(queue.is_empty());
        assert_eq!(queue.enqueue(1), Err(LcdError::QueueFull));
        assert_eq!(queue.dequeue(), None);
    }
}
