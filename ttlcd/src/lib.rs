//! Time-triggered driver core for HD44780-family character LCDs.
//!
//! Producers ([DisplayController::set_data], [DisplayController::set_command],
//! [DisplayController::set_cursor], [DisplayController::clear]) only queue work. The periodic
//! [DisplayController::update] call drains at most one unit per display and hands it to a
//! [ByteTransmitter], which does the actual bus work. Nothing in here blocks or waits for the
//! hardware.
//!
//! See [controller] for the dispatch rules and [codec] for how commands and characters share one
//! byte queue.

pub mod codec;
pub mod command;
pub mod config;
pub mod controller;
pub mod cursor;
mod error;
pub mod queue;
pub mod transmitter;

pub use config::{DisplayConfig, PinAssignment};
pub use controller::{DisplayController, Fault};
pub use cursor::Cursor;
pub use error::*;
pub use transmitter::ByteTransmitter;

/// Handle of a configured display, an index into the configuration slice.
pub type DisplayId = usize;

/// Queue capacity per display used when the caller has no better idea.
pub const DEFAULT_QUEUE_CAPACITY: usize = 40;
