//! GPIO output backends and the HD44780 4-bit transmitter built on top of them.
//!
//! The display interface is write-only (R/W tied to ground), so this crate only deals with output
//! lines: single pins for RS and E, and 4-line buses for D4..D7.

pub mod gpiod;
pub mod lcd;
pub mod raw;

use std::fmt::Debug;
use thiserror::Error;
use ttlcd::LcdError;

#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum GpioError {
    #[error("pin already in use")]
    AlreadyInUse,
    #[error("invalid argument")]
    InvalidArgument,
    #[error("the feature is not supported on this backend")]
    NotSupported,
    #[error("IO error: {0}")]
    Io(std::io::ErrorKind),
    #[error("error: {0}")]
    Other(String),
}

impl From<std::io::Error> for GpioError {
    fn from(err: std::io::Error) -> Self {
        GpioError::Io(err.kind())
    }
}

impl From<GpioError> for LcdError {
    fn from(err: GpioError) -> Self {
        LcdError::Transmit(err.to_string())
    }
}

pub type GpioResult<T> = Result<T, GpioError>;

pub trait GpioDriver: Debug {
    /// Gets the amount of GPIO pins available.
    fn count(&self) -> GpioResult<usize>;

    /// Claims the pin at the given index and configures it as an output.
    ///
    /// The pin is released when the returned output is dropped.
    ///
    /// # Errors
    /// - `GpioError::InvalidArgument` if the index is out of range.
    /// - `GpioError::AlreadyInUse` if the pin is already claimed.
    fn get_output(&self, index: usize) -> GpioResult<Box<dyn GpioOutput + '_>>;

    /// Claims the pins at the given indices as one output bus, first index being the least
    /// significant bit.
    fn get_output_bus<const N: usize>(
        &self,
        indices: [usize; N],
    ) -> GpioResult<Box<dyn GpioBusOutput<N> + '_>>;
}

pub trait GpioOutput: Debug {
    /// Writes the state of the GPIO pin.
    fn write(&self, value: bool) -> GpioResult<()>;
}

pub trait GpioBusOutput<const N: usize>: Debug {
    fn write(&self, values: &[bool; N]) -> GpioResult<()>;
}

impl dyn GpioBusOutput<4> + '_ {
    /// Writes the values to the GPIO pins in the bus.
    /// The values are written as a nibble, LSb first.
    pub fn write_nibble(&self, value: u8) -> GpioResult<()> {
        if value > 0b1111 {
            return Err(GpioError::InvalidArgument);
        }

        let mut values = [false; 4];
        for (i, bit) in values.iter_mut().enumerate() {
            *bit = (value & (1 << i)) != 0;
        }
        self.write(&values)
    }
}

/// Checks a set of pin indices can be claimed: all in range, none taken, no duplicates.
pub(crate) fn check_claim(
    indices: &[usize],
    count: usize,
    is_used: impl Fn(usize) -> bool,
) -> GpioResult<()> {
    if indices.iter().any(|&index| index >= count) {
        return Err(GpioError::InvalidArgument);
    }
    if indices.iter().any(|&index| is_used(index)) {
        return Err(GpioError::AlreadyInUse);
    }
    for (i, index) in indices.iter().enumerate() {
        if indices[..i].contains(index) {
            return Err(GpioError::AlreadyInUse);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Debug, Default)]
    struct LatchBus {
        last: RefCell<Option<[bool; 4]>>,
    }

    impl GpioBusOutput<4> for LatchBus {
        fn write(&self, values: &[bool; 4]) -> GpioResult<()> {
            *self.last.borrow_mut() = Some(*values);
            Ok(())
        }
    }

    #[test]
    fn nibble_is_written_lsb_first() {
        let bus = LatchBus::default();
        let dyn_bus: &dyn GpioBusOutput<4> = &bus;

        dyn_bus.write_nibble(0b0011).unwrap();
        assert_eq!(*bus.last.borrow(), Some([true, true, false, false]));

        assert_eq!(dyn_bus.write_nibble(0b10000), Err(GpioError::InvalidArgument));
    }

    #[test]
    fn claim_checks_range_usage_and_duplicates() {
        assert_eq!(check_claim(&[1, 2], 4, |_| false), Ok(()));
        assert_eq!(check_claim(&[1, 4], 4, |_| false), Err(GpioError::InvalidArgument));
        assert_eq!(check_claim(&[1, 2], 4, |i| i == 2), Err(GpioError::AlreadyInUse));
        assert_eq!(check_claim(&[3, 3], 4, |_| false), Err(GpioError::AlreadyInUse));
    }

    #[test]
    fn gpio_errors_become_transmit_errors() {
        let err: LcdError = GpioError::AlreadyInUse.into();
        assert_eq!(err, LcdError::Transmit("pin already in use".to_string()));
    }
}
