//! Escape-byte encoding of commands and characters inside a [ByteQueue].
//!
//! Characters are stored verbatim, one byte each. A command is stored as [ESCAPE] followed by the
//! command code. A character that happens to equal [ESCAPE] is stored as two escapes, so the full
//! 8-bit character range stays usable (CGRAM character 0 included).
//!
//! `0x00` is not an HD44780 instruction, so `ESCAPE, ESCAPE` is never ambiguous.

use crate::queue::ByteQueue;
use crate::{LcdError, LcdResult};

/// Marker preceding every command in the queue.
pub const ESCAPE: u8 = 0x00;

/// A unit of work for the display: one byte for the instruction or the data register.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Unit {
    /// Goes to the instruction register (RS low).
    Command(u8),
    /// Goes to the data register (RS high).
    Character(u8),
}

impl Unit {
    pub fn is_command(&self) -> bool {
        matches!(self, Unit::Command(_))
    }

    /// The byte that ends up on the bus.
    pub fn code(&self) -> u8 {
        match *self {
            Unit::Command(code) | Unit::Character(code) => code,
        }
    }
}

/// Encodes `unit` at the back of the queue. Either the whole unit is queued or nothing is.
///
/// # Errors
/// - [LcdError::InvalidCommand] for a `0x00` command.
/// - [LcdError::QueueFull] if the encoded unit doesn't fit.
pub fn push_unit(queue: &mut ByteQueue, unit: Unit) -> LcdResult<()> {
    match unit {
        Unit::Command(ESCAPE) => Err(LcdError::InvalidCommand(ESCAPE)),
        Unit::Command(code) => queue.enqueue_pair(ESCAPE, code),
        Unit::Character(ESCAPE) => queue.enqueue_pair(ESCAPE, ESCAPE),
        Unit::Character(code) => queue.enqueue(code),
    }
}

/// Decodes the unit at the front of the queue.
///
/// # Errors
/// - [LcdError::QueueEmpty] if there's nothing queued.
/// - [LcdError::MalformedControlSequence] if a marker was popped but nothing follows it. The
///   marker is consumed, so the queue doesn't get stuck on it.
pub fn pop_unit(queue: &mut ByteQueue) -> LcdResult<Unit> {
    match queue.dequeue() {
        None => Err(LcdError::QueueEmpty),
        Some(ESCAPE) => match queue.dequeue() {
            None => Err(LcdError::MalformedControlSequence),
            Some(ESCAPE) => Ok(Unit::Character(ESCAPE)),
            Some(code) => Ok(Unit::Command(code)),
        },
        Some(code) => Ok(Unit::Character(code)),
    }
}

/// Decodes the unit at the front of the queue without removing it. Returns `None` for an empty
/// queue or a marker with nothing behind it yet.
pub fn peek_unit(queue: &ByteQueue) -> Option<Unit> {
    match queue.get(0)? {
        ESCAPE => match queue.get(1)? {
            ESCAPE => Some(Unit::Character(ESCAPE)),
            code => Some(Unit::Command(code)),
        },
        code => Some(Unit::Character(code)),
    }
}
