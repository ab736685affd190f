//! HD44780 instruction codes.
//!
//! The builders mirror the instruction table of the controller: each one starts from the
//! instruction's marker bit and ORs in the option flags. None of them talk to the display, they
//! only compute the byte to queue with [DisplayController::set_command](crate::DisplayController::set_command).

use crate::{LcdError, LcdResult};

/// Clears the display and sets DDRAM address 0 in the address counter.
pub const CLEAR_DISPLAY: u8 = 0b00000001;

/// Sets DDRAM address 0 and undoes any display shift.
pub const RETURN_HOME: u8 = 0b00000010;

/// Marker bit of the "set CGRAM address" instruction.
pub const SET_CGRAM_ADDRESS: u8 = 0b01000000;

/// Marker bit of the "set DDRAM address" instruction.
pub const SET_DDRAM_ADDRESS: u8 = 0b10000000;

/// Wake-up sequence switching a controller in any state to 4-bit mode.
///
/// Each byte is sent as two nibbles, so this is the classic `3, 3, 3, 2` nibble sequence.
pub const WAKE_UP_4BIT: [u8; 2] = [0b00110011, 0b00110010];

pub const CGRAM_CHAR_0: u8 = 0x00;
pub const CGRAM_CHAR_1: u8 = 0x01;
pub const CGRAM_CHAR_2: u8 = 0x02;
pub const CGRAM_CHAR_3: u8 = 0x03;
pub const CGRAM_CHAR_4: u8 = 0x04;
pub const CGRAM_CHAR_5: u8 = 0x05;
pub const CGRAM_CHAR_6: u8 = 0x06;
pub const CGRAM_CHAR_7: u8 = 0x07;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CursorDirection {
    /// Moves the cursor to the left after writing data.
    Left,
    /// Moves the cursor to the right after writing data.
    Right,
}

/// Entry mode: cursor direction after each write, and whether the display shifts with it.
pub fn entry_mode(cursor_direction: CursorDirection, shift: bool) -> u8 {
    let mut command = 0b00000100;
    if cursor_direction == CursorDirection::Right {
        command |= 0b00000010;
    }
    if shift {
        command |= 0b00000001;
    }
    command
}

/// Display on/off, cursor on/off, and cursor blinking on/off.
pub fn display_control(display_on: bool, cursor_on: bool, blink_on: bool) -> u8 {
    let mut command = 0b00001000;
    if display_on {
        command |= 0b00000100;
    }
    if cursor_on {
        command |= 0b00000010;
    }
    if blink_on {
        command |= 0b00000001;
    }
    command
}

/// Moves the cursor or shifts the whole display by one position.
pub fn cursor_shift(display_shift: bool, direction: CursorDirection) -> u8 {
    let mut command = 0b00010000;
    if display_shift {
        command |= 0b00001000;
    }
    if direction == CursorDirection::Right {
        command |= 0b00000100;
    }
    command
}

/// Function set for the 4-bit interface. `two_lines` selects the 2-line addressing mode, which
/// 4-line modules use as well.
pub fn function_set(two_lines: bool, alt_font: bool) -> u8 {
    let mut command = 0b00100000;
    if two_lines {
        command |= 0b00001000;
    }
    if alt_font {
        command |= 0b00000100;
    }
    command
}

/// Sets the DDRAM address.
///
/// # Errors
/// - [LcdError::InvalidCommand] if the address doesn't fit in 7 bits.
pub fn set_ddram_address(address: u8) -> LcdResult<u8> {
    if address > 0b01111111 {
        return Err(LcdError::InvalidCommand(address));
    }
    Ok(SET_DDRAM_ADDRESS | address)
}

/// Commands queued for every display right after initialization.
///
/// Clearing goes last so the cursor starts at the home position.
pub fn init_sequence(height: u8) -> [u8; 6] {
    [
        WAKE_UP_4BIT[0],
        WAKE_UP_4BIT[1],
        function_set(height > 1, false),
        display_control(true, false, false),
        entry_mode(CursorDirection::Right, false),
        CLEAR_DISPLAY,
    ]
}
