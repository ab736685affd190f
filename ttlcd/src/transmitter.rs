//! The seam between the dispatcher and whatever drives the display bus.

use crate::{DisplayId, LcdResult};
use log::info;
use std::fmt::Debug;

/// Sends one byte to one display.
///
/// Implementations do the electrical part (register select, data lines, enable strobe) and own
/// all bus timing. The dispatcher calls [ByteTransmitter::transmit] exactly once per dispatched
/// unit and expects it to return promptly.
pub trait ByteTransmitter: Debug {
    /// Sends `byte` to `display`. `is_command` selects the instruction register (RS low) instead
    /// of the data register (RS high).
    fn transmit(&mut self, display: DisplayId, byte: u8, is_command: bool) -> LcdResult<()>;
}

impl<T: ByteTransmitter + ?Sized> ByteTransmitter for Box<T> {
    fn transmit(&mut self, display: DisplayId, byte: u8, is_command: bool) -> LcdResult<()> {
        (**self).transmit(display, byte, is_command)
    }
}

/// One call to [ByteTransmitter::transmit].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Transmission {
    pub display: DisplayId,
    pub byte: u8,
    pub is_command: bool,
}

/// Keeps every transmitted byte in memory.
#[derive(Debug, Default)]
pub struct RecordingTransmitter {
    pub transmissions: Vec<Transmission>,
}

impl RecordingTransmitter {
    /// Returns everything recorded so far and starts over.
    pub fn take(&mut self) -> Vec<Transmission> {
        std::mem::take(&mut self.transmissions)
    }
}

impl ByteTransmitter for RecordingTransmitter {
    fn transmit(&mut self, display: DisplayId, byte: u8, is_command: bool) -> LcdResult<()> {
        self.transmissions.push(Transmission {
            display,
            byte,
            is_command,
        });
        Ok(())
    }
}

/// Logs every byte instead of sending it anywhere. Useful without display hardware.
#[derive(Debug, Default)]
pub struct LogTransmitter;

impl ByteTransmitter for LogTransmitter {
    fn transmit(&mut self, display: DisplayId, byte: u8, is_command: bool) -> LcdResult<()> {
        if is_command {
            info!("LCD {}: command {:08b}", display, byte);
        } else if byte.is_ascii_graphic() || byte == b' ' {
            info!("LCD {}: data {:08b} '{}'", display, byte, byte as char);
        } else {
            info!("LCD {}: data {:08b}", display, byte);
        }
        Ok(())
    }
}
