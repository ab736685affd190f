//! Cursor and line tracking.
//!
//! The HD44780 doesn't move from the end of one row to the start of the next on its own: row 1
//! starts at DDRAM `0x40`, not right after row 0. The tracker follows what has been dispatched to
//! the display and, once a row is full, produces the "set DDRAM address" command that moves the
//! cursor to the next row. The tracker itself only moves once that command has been sent.
//!
//! After a "set CGRAM address" the data bytes go to character generator RAM, so tracking pauses
//! until the next DDRAM address, clear or home command.

use crate::command::{self, CLEAR_DISPLAY, RETURN_HOME, SET_CGRAM_ADDRESS, SET_DDRAM_ADDRESS};
use crate::config::DisplayConfig;
use crate::{LcdError, LcdResult};
use log::{debug, trace};

/// Position of the next character written to the display.
///
/// `column` may equal the width, which means the row is full and the next character needs a wrap.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct Cursor {
    pub row: u8,
    pub column: u8,
}

/// DDRAM address of the first cell of `row`.
///
/// Rows 0 and 1 start at `0x00` and `0x40`. Rows 2 and 3 continue those same lines right after
/// the visible `width` characters.
///
/// # Errors
/// - [LcdError::UnsupportedGeometry] for rows past the fourth.
pub fn row_base(width: u8, row: u8) -> LcdResult<u8> {
    match row {
        0 => Ok(0x00),
        1 => Ok(0x40),
        2 => Ok(width),
        3 => Ok(0x40 + width),
        _ => Err(LcdError::UnsupportedGeometry {
            width,
            height: row.saturating_add(1),
        }),
    }
}

/// DDRAM address of the cell at `row`, `col` on the given display.
///
/// # Errors
/// - [LcdError::InvalidCursorTarget] if the cell is outside the display.
pub fn ddram_address(config: &DisplayConfig, row: u8, col: u8) -> LcdResult<u8> {
    if row >= config.height || col >= config.width {
        return Err(LcdError::InvalidCursorTarget { row, col });
    }
    Ok(row_base(config.width, row)? + col)
}

#[derive(Debug, Clone)]
pub struct CursorTracker {
    cursor: Cursor,
    width: u8,
    height: u8,
    in_cgram: bool,
}

impl CursorTracker {
    pub fn new(config: &DisplayConfig) -> Self {
        CursorTracker {
            cursor: Cursor::default(),
            width: config.width,
            height: config.height,
            in_cgram: false,
        }
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn reset(&mut self) {
        self.cursor = Cursor::default();
    }

    /// Whether data bytes currently go to CGRAM instead of the display.
    pub fn in_cgram(&self) -> bool {
        self.in_cgram
    }

    /// Records that a character was written at the cursor.
    pub fn advance(&mut self) {
        if !self.in_cgram && self.cursor.column < self.width {
            self.cursor.column += 1;
        }
    }

    /// Whether the current row is full, so the next character has to go to the next row.
    pub fn wrap_pending(&self) -> bool {
        !self.in_cgram && self.cursor.column >= self.width
    }

    /// If the row is full, returns the command moving the cursor to the start of the next row
    /// (row 0 after the last one). The position doesn't change until that command is passed to
    /// [Self::observe_command], so a command that never reached the display is asked for again.
    pub fn pending_wrap(&self) -> LcdResult<Option<u8>> {
        if !self.wrap_pending() {
            return Ok(None);
        }
        let row = (self.cursor.row + 1) % self.height;
        debug!("Row {} full, wrapping to row {}", self.cursor.row, row);
        command::set_ddram_address(row_base(self.width, row)?).map(Some)
    }

    /// Finds the visible cell a DDRAM address belongs to.
    pub fn locate(&self, address: u8) -> Option<Cursor> {
        (0..self.height).find_map(|row| {
            let base = row_base(self.width, row).ok()?;
            let column = address.checked_sub(base)?;
            (column < self.width).then_some(Cursor { row, column })
        })
    }

    /// Updates the position after a command has been sent to the display.
    pub fn observe_command(&mut self, code: u8) {
        if code == CLEAR_DISPLAY || code & 0b11111110 == RETURN_HOME {
            self.in_cgram = false;
            self.reset();
        } else if code & SET_DDRAM_ADDRESS != 0 {
            self.in_cgram = false;
            let address = code & !SET_DDRAM_ADDRESS;
            match self.locate(address) {
                Some(cursor) => self.cursor = cursor,
                None => trace!("DDRAM address {:#04x} is off-screen", address),
            }
        } else if code & SET_CGRAM_ADDRESS != 0 {
            self.in_cgram = true;
        } else if !self.in_cgram && code & 0b11111000 == 0b00010000 {
            // Cursor move; display shifts (0b00011xxx) leave the address counter alone.
            if code & 0b00000100 != 0 {
                self.advance();
            } else {
                self.cursor.column = self.cursor.column.saturating_sub(1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PinAssignment;

    fn config(width: u8, height: u8) -> DisplayConfig {
        DisplayConfig {
            width,
            height,
            pins: PinAssignment {
                rs: 0,
                e: 1,
                data: [2, 3, 4, 5],
            },
        }
    }

    #[test]
    fn row_bases_follow_two_line_layout() {
        assert_eq!(row_base(20, 0), Ok(0x00));
        assert_eq!(row_base(20, 1), Ok(0x40));
        assert_eq!(row_base(20, 2), Ok(0x14));
        assert_eq!(row_base(20, 3), Ok(0x54));
        assert_eq!(
            row_base(20, 4),
            Err(LcdError::UnsupportedGeometry { width: 20, height: 5 })
        );
    }

    #[test]
    fn address_checks_bounds() {
        let config = config(20, 2);
        assert_eq!(ddram_address(&config, 1, 5), Ok(0x45));
        assert_eq!(
            ddram_address(&config, 2, 0),
            Err(LcdError::InvalidCursorTarget { row: 2, col: 0 })
        );
        assert_eq!(
            ddram_address(&config, 0, 20),
            Err(LcdError::InvalidCursorTarget { row: 0, col: 20 })
        );
    }

    #[test]
    fn wraps_after_full_row_and_back_to_top() {
        let mut tracker = CursorTracker::new(&config(4, 2));

        for _ in 0..4 {
            assert_eq!(tracker.pending_wrap(), Ok(None));
            tracker.advance();
        }
        assert!(tracker.wrap_pending());
        assert_eq!(tracker.pending_wrap(), Ok(Some(0xC0)));
        tracker.observe_command(0xC0);
        assert_eq!(tracker.cursor(), Cursor { row: 1, column: 0 });

        for _ in 0..4 {
            tracker.advance();
        }
        assert_eq!(tracker.pending_wrap(), Ok(Some(0x80)));
        tracker.observe_command(0x80);
        assert_eq!(tracker.cursor(), Cursor { row: 0, column: 0 });
    }

    #[test]
    fn wrap_is_asked_for_until_it_was_sent() {
        let mut tracker = CursorTracker::new(&config(4, 4));
        for _ in 0..4 {
            tracker.advance();
        }

        assert_eq!(tracker.pending_wrap(), Ok(Some(0xC0)));
        assert_eq!(tracker.cursor(), Cursor { row: 0, column: 4 });
        assert_eq!(tracker.pending_wrap(), Ok(Some(0xC0)));
    }

    #[test]
    fn cgram_writes_pause_tracking() {
        let mut tracker = CursorTracker::new(&config(4, 2));
        tracker.advance();

        tracker.observe_command(SET_CGRAM_ADDRESS | 0x08);
        assert!(tracker.in_cgram());
        for _ in 0..8 {
            tracker.advance();
        }
        tracker.observe_command(0x14);
        assert_eq!(tracker.cursor(), Cursor { row: 0, column: 1 });
        assert_eq!(tracker.pending_wrap(), Ok(None));

        tracker.observe_command(0x80 | 0x42);
        assert!(!tracker.in_cgram());
        assert_eq!(tracker.cursor(), Cursor { row: 1, column: 2 });

        tracker.observe_command(SET_CGRAM_ADDRESS);
        tracker.observe_command(CLEAR_DISPLAY);
        assert!(!tracker.in_cgram());
        tracker.advance();
        assert_eq!(tracker.cursor(), Cursor { row: 0, column: 1 });
    }

    #[test]
    fn column_never_exceeds_width() {
        let mut tracker = CursorTracker::new(&config(2, 1));
        for _ in 0..5 {
            tracker.advance();
        }
        assert_eq!(tracker.cursor().column, 2);
    }

    #[test]
    fn follows_dispatched_commands() {
        let mut tracker = CursorTracker::new(&config(20, 4));

        tracker.observe_command(0x80 | 0x54 | 3);
        assert_eq!(tracker.cursor(), Cursor { row: 3, column: 3 });

        tracker.observe_command(0x14); // cursor right
        assert_eq!(tracker.cursor().column, 4);
        tracker.observe_command(0x10); // cursor left
        assert_eq!(tracker.cursor().column, 3);
        tracker.observe_command(0x18); // display shift
        assert_eq!(tracker.cursor().column, 3);

        tracker.observe_command(0x80 | 0x30); // past the visible part of row 2
        assert_eq!(tracker.cursor(), Cursor { row: 3, column: 3 });

        tracker.observe_command(RETURN_HOME);
        assert_eq!(tracker.cursor(), Cursor::default());
    }

    #[test]
    fn locates_every_row_of_a_four_line_module() {
        let tracker = CursorTracker::new(&config(20, 4));
        assert_eq!(tracker.locate(0x00), Some(Cursor { row: 0, column: 0 }));
        assert_eq!(tracker.locate(0x14), Some(Cursor { row: 2, column: 0 }));
        assert_eq!(tracker.locate(0x53), Some(Cursor { row: 1, column: 19 }));
        assert_eq!(tracker.locate(0x67), Some(Cursor { row: 3, column: 19 }));
        assert_eq!(tracker.locate(0x68), None);
    }
}
