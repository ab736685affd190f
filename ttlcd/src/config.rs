//! Static description of each display.
//!
//! The core only reads the geometry. Pin numbers are carried along for the transmitter, which is
//! the one that actually drives them.

use crate::{LcdError, LcdResult};
use serde::{Deserialize, Serialize};

/// Longest supported row, in characters. One HD44780 line holds 40 DDRAM cells.
pub const MAX_WIDTH: u8 = 40;

/// Rows 2 and 3 share the DDRAM lines of rows 0 and 1, offset by the width.
pub const MAX_HEIGHT: u8 = 4;

/// GPIO lines of one display on the 4-bit interface. R/W is expected to be tied to ground.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Eq, PartialEq)]
pub struct PinAssignment {
    /// Register select.
    pub rs: usize,
    /// Enable (latch strobe).
    pub e: usize,
    /// D4, D5, D6, D7.
    pub data: [usize; 4],
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Eq, PartialEq)]
pub struct DisplayConfig {
    /// Characters per row.
    pub width: u8,
    /// Number of rows.
    pub height: u8,
    pub pins: PinAssignment,
}

impl DisplayConfig {
    /// Checks the geometry can be addressed with the row base table.
    ///
    /// # Errors
    /// - [LcdError::UnsupportedGeometry] for zero-sized displays, more than 4 rows, rows longer
    ///   than 40 characters, or 3/4-row displays wider than 20 characters.
    pub fn validate(&self) -> LcdResult<()> {
        let unsupported = LcdError::UnsupportedGeometry {
            width: self.width,
            height: self.height,
        };

        if self.width == 0 || self.height == 0 {
            return Err(unsupported);
        }
        if self.height > MAX_HEIGHT || self.width > MAX_WIDTH {
            return Err(unsupported);
        }
        if self.height > 2 && self.width > MAX_WIDTH / 2 {
            return Err(unsupported);
        }
        Ok(())
    }
}
