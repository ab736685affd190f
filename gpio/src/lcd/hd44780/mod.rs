//! HD44780 over a 4-bit parallel interface.
//!
//! [GpioHD44780Transmitter] is the bus end of the [ttlcd] pipeline: the dispatcher decides what
//! to send and when, this module only knows how to put one byte on the wires.
//!
//! # Bus cycle
//!
//! For every byte, RS is set (low for instructions, high for character data), then the high
//! nibble and the low nibble are each placed on D4..D7 and latched by a pulse on E. The
//! controller needs about 37 µs per instruction and 1.52 ms for clear/home. The transmitter only
//! waits [TransmitTiming::nibble_hold] after each latch; the longer instructions are covered by
//! the tick period of the dispatcher, so the tick must not be shorter than 2 ms.

mod transmitter;

pub use transmitter::*;
