use crate::{GpioBusOutput, GpioDriver, GpioOutput, GpioResult};
use log::{debug, trace};
use std::thread::sleep;
use std::time::Duration;
use ttlcd::{ByteTransmitter, DisplayConfig, DisplayId, LcdError, LcdResult, PinAssignment};

/// Delays of one nibble cycle.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct TransmitTiming {
    /// How long E is held high. The controller needs at least 450 ns.
    pub enable_pulse: Duration,
    /// How long to wait after E falls before the next nibble.
    pub nibble_hold: Duration,
}

impl Default for TransmitTiming {
    fn default() -> Self {
        TransmitTiming {
            enable_pulse: Duration::from_micros(1),
            nibble_hold: Duration::from_micros(50),
        }
    }
}

/// The output lines of one display.
#[derive(Debug)]
pub struct HD44780Lines<'a> {
    pin_rs: Box<dyn GpioOutput + 'a>,
    pin_e: Box<dyn GpioOutput + 'a>,
    data_bus: Box<dyn GpioBusOutput<4> + 'a>,
}

impl<'a> HD44780Lines<'a> {
    /// # Parameters
    ///
    /// - `pin_rs`: Register select output pin.
    /// - `pin_e`: Enable output pin.
    /// - `data_bus`: D4..D7, D4 being the least significant line.
    pub fn new(
        pin_rs: Box<dyn GpioOutput + 'a>,
        pin_e: Box<dyn GpioOutput + 'a>,
        data_bus: Box<dyn GpioBusOutput<4> + 'a>,
    ) -> Self {
        HD44780Lines {
            pin_rs,
            pin_e,
            data_bus,
        }
    }

    /// Claims the pins of `pins` from the driver.
    pub fn claim<D: GpioDriver>(driver: &'a D, pins: &PinAssignment) -> GpioResult<Self> {
        let pin_rs = driver.get_output(pins.rs)?;
        let pin_e = driver.get_output(pins.e)?;
        let data_bus = driver.get_output_bus(pins.data)?;
        pin_e.write(false)?;
        Ok(Self::new(pin_rs, pin_e, data_bus))
    }
}

/// [ByteTransmitter] for HD44780 displays wired to GPIO pins in 4-bit mode, one set of lines per
/// display handle.
#[derive(Debug)]
pub struct GpioHD44780Transmitter<'a> {
    displays: Vec<HD44780Lines<'a>>,
    timing: TransmitTiming,
}

impl<'a> GpioHD44780Transmitter<'a> {
    /// Creates a transmitter, the display handle being the index in `displays`.
    pub fn new(displays: Vec<HD44780Lines<'a>>) -> Self {
        GpioHD44780Transmitter {
            displays,
            timing: TransmitTiming::default(),
        }
    }

    /// Claims the pins of every configured display, in configuration order.
    pub fn from_configs<D: GpioDriver>(driver: &'a D, configs: &[DisplayConfig]) -> GpioResult<Self> {
        let displays = configs
            .iter()
            .map(|config| HD44780Lines::claim(driver, &config.pins))
            .collect::<GpioResult<Vec<_>>>()?;
        debug!("Claimed GPIO lines for {} display(s)", displays.len());
        Ok(Self::new(displays))
    }

    pub fn with_timing(mut self, timing: TransmitTiming) -> Self {
        self.timing = timing;
        self
    }

    fn pulse_e(&self, pin: &dyn GpioOutput) -> GpioResult<()> {
        pin.write(true)?;
        sleep(self.timing.enable_pulse);
        pin.write(false)?;
        sleep(self.timing.nibble_hold);
        Ok(())
    }

    fn send(&self, lines: &HD44780Lines, data: u8, rs: bool) -> GpioResult<()> {
        trace!("Sending data: {:08b}, RS: {}", data, rs);

        lines.pin_rs.write(rs)?;

        let high_nibble = (data >> 4) & 0x0F;
        let low_nibble = data & 0x0F;

        trace!("Writing HN: {:04b}", high_nibble);
        lines.data_bus.write_nibble(high_nibble)?;
        self.pulse_e(&*lines.pin_e)?;

        trace!("Writing LN: {:04b}", low_nibble);
        lines.data_bus.write_nibble(low_nibble)?;
        self.pulse_e(&*lines.pin_e)?;

        Ok(())
    }
}

impl ByteTransmitter for GpioHD44780Transmitter<'_> {
    fn transmit(&mut self, display: DisplayId, byte: u8, is_command: bool) -> LcdResult<()> {
        let lines = self
            .displays
            .get(display)
            .ok_or(LcdError::InvalidDisplayHandle(display))?;
        self.send(lines, byte, !is_command)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GpioError;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Copy, Clone, Eq, PartialEq)]
    enum Event {
        Rs(bool),
        E(bool),
        Data([bool; 4]),
    }

    type Log = Rc<RefCell<Vec<Event>>>;

    #[derive(Debug)]
    struct Pin {
        log: Log,
        event: fn(bool) -> Event,
    }

    impl GpioOutput for Pin {
        fn write(&self, value: bool) -> GpioResult<()> {
            self.log.borrow_mut().push((self.event)(value));
            Ok(())
        }
    }

    #[derive(Debug)]
    struct Bus {
        log: Log,
    }

    impl GpioBusOutput<4> for Bus {
        fn write(&self, values: &[bool; 4]) -> GpioResult<()> {
            self.log.borrow_mut().push(Event::Data(*values));
            Ok(())
        }
    }

    #[derive(Debug)]
    struct DeadPin;

    impl GpioOutput for DeadPin {
        fn write(&self, _value: bool) -> GpioResult<()> {
            Err(GpioError::Other("line released".to_string()))
        }
    }

    fn lines(log: &Log) -> HD44780Lines<'static> {
        HD44780Lines::new(
            Box::new(Pin {
                log: log.clone(),
                event: Event::Rs,
            }),
            Box::new(Pin {
                log: log.clone(),
                event: Event::E,
            }),
            Box::new(Bus { log: log.clone() }),
        )
    }

    fn instant() -> TransmitTiming {
        TransmitTiming {
            enable_pulse: Duration::ZERO,
            nibble_hold: Duration::ZERO,
        }
    }

    fn nibble(value: u8) -> Event {
        Event::Data([value & 1 != 0, value & 2 != 0, value & 4 != 0, value & 8 != 0])
    }

    #[test]
    fn character_goes_high_nibble_first_with_rs_high() {
        let log = Log::default();
        let mut transmitter = GpioHD44780Transmitter::new(vec![lines(&log)]).with_timing(instant());

        transmitter.transmit(0, b'A', false).unwrap();

        assert_eq!(
            *log.borrow(),
            [
                Event::Rs(true),
                nibble(0x4),
                Event::E(true),
                Event::E(false),
                nibble(0x1),
                Event::E(true),
                Event::E(false),
            ]
        );
    }

    #[test]
    fn command_selects_instruction_register() {
        let log = Log::default();
        let mut transmitter = GpioHD44780Transmitter::new(vec![lines(&log)]).with_timing(instant());

        transmitter.transmit(0, 0xC5, true).unwrap();

        let log = log.borrow();
        assert_eq!(log[0], Event::Rs(false));
        assert_eq!(log[1], nibble(0xC));
        assert_eq!(log[4], nibble(0x5));
    }

    #[test]
    fn routes_by_display_handle() {
        let first = Log::default();
        let second = Log::default();
        let mut transmitter =
            GpioHD44780Transmitter::new(vec![lines(&first), lines(&second)]).with_timing(instant());

        transmitter.transmit(1, b'x', false).unwrap();

        assert!(first.borrow().is_empty());
        assert_eq!(second.borrow().len(), 7);
        assert_eq!(
            transmitter.transmit(2, b'x', false),
            Err(LcdError::InvalidDisplayHandle(2))
        );
    }

    #[test]
    fn gpio_failure_is_reported_as_transmit_error() {
        let log = Log::default();
        let broken = HD44780Lines::new(
            Box::new(DeadPin),
            Box::new(Pin {
                log: log.clone(),
                event: Event::E,
            }),
            Box::new(Bus { log: log.clone() }),
        );
        let mut transmitter = GpioHD44780Transmitter::new(vec![broken]).with_timing(instant());

        assert_eq!(
            transmitter.transmit(0, b'x', false),
            Err(LcdError::Transmit("error: line released".to_string()))
        );
        assert!(log.borrow().is_empty());
    }
}
