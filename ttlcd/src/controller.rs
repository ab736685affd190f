//! The per-display pipelines and the periodic dispatcher.
//!
//! Every display owns a [ByteQueue] and a [CursorTracker]. Producer calls encode units into the
//! queue and return right away, possibly with a short count when the queue fills up. Each
//! [DisplayController::update] then services the displays in ascending handle order, one unit per
//! display:
//!
//! 1. If the display's current row is full and the next queued unit is a character, the row wrap
//!    is resolved first and its "set DDRAM address" command is the unit sent this tick. The queued
//!    character stays where it is, so a wrap that fails to transmit is tried again next tick.
//! 2. Otherwise the front unit is popped. An empty queue skips the display.
//! 3. The unit goes to the [ByteTransmitter], and the tracker is updated from what was sent.
//!
//! Problems found while dispatching are logged and returned as [Fault]s. They never stop the
//! other displays from being serviced.

use crate::codec::{self, Unit};
use crate::command::{self, CLEAR_DISPLAY};
use crate::config::DisplayConfig;
use crate::cursor::{self, Cursor, CursorTracker};
use crate::queue::ByteQueue;
use crate::transmitter::ByteTransmitter;
use crate::{DisplayId, LcdError, LcdResult};
use log::{debug, error, info, warn};

/// Queue bytes needed to hold the initialization commands of one display.
pub const MIN_QUEUE_CAPACITY: usize = 12;

/// A dispatch problem on one display.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Fault {
    pub display: DisplayId,
    pub error: LcdError,
}

#[derive(Debug)]
struct Display<'a> {
    config: &'a DisplayConfig,
    queue: ByteQueue<'a>,
    tracker: CursorTracker,
}

impl<'a> Display<'a> {
    fn new(config: &'a DisplayConfig, buffer: &'a mut [u8]) -> Self {
        Display {
            config,
            queue: ByteQueue::new(buffer),
            tracker: CursorTracker::new(config),
        }
    }

    fn push(&mut self, unit: Unit) -> LcdResult<()> {
        codec::push_unit(&mut self.queue, unit)
    }

    /// Queues units until one doesn't fit. Returns how many were queued.
    fn push_all(&mut self, units: impl IntoIterator<Item = Unit>) -> usize {
        let mut accepted = 0;
        for unit in units {
            if self.push(unit).is_err() {
                break;
            }
            accepted += 1;
        }
        accepted
    }

    fn next_unit(&mut self) -> LcdResult<Unit> {
        // Only a character needs the wrap. A queued command may move the cursor on its own.
        if let Some(Unit::Character(_)) = codec::peek_unit(&self.queue) {
            if let Some(command) = self.tracker.pending_wrap()? {
                return Ok(Unit::Command(command));
            }
        }
        codec::pop_unit(&mut self.queue)
    }

    fn service<T: ByteTransmitter>(&mut self, id: DisplayId, transmitter: &mut T) -> LcdResult<()> {
        let unit = self.next_unit()?;
        transmitter.transmit(id, unit.code(), unit.is_command())?;
        match unit {
            Unit::Command(code) => self.tracker.observe_command(code),
            Unit::Character(_) => self.tracker.advance(),
        }
        Ok(())
    }
}

/// Owns the pipelines of all configured displays and the transmitter they feed.
///
/// Configuration and queue storage are borrowed from the caller for the controller's lifetime.
#[derive(Debug)]
pub struct DisplayController<'a, T: ByteTransmitter> {
    displays: Vec<Display<'a>>,
    transmitter: T,
}

impl<'a, T: ByteTransmitter> DisplayController<'a, T> {
    /// Sets up one pipeline per entry of `configs` and queues each display's initialization
    /// commands. `storage` is split evenly between the displays' queues.
    ///
    /// # Errors
    /// - [LcdError::NoDisplays] if `configs` is empty.
    /// - [LcdError::UnsupportedGeometry] if any display fails [DisplayConfig::validate].
    /// - [LcdError::InsufficientStorage] if a display would get fewer than
    ///   [MIN_QUEUE_CAPACITY] bytes.
    pub fn new(
        configs: &'a [DisplayConfig],
        storage: &'a mut [u8],
        transmitter: T,
    ) -> LcdResult<Self> {
        if configs.is_empty() {
            return Err(LcdError::NoDisplays);
        }
        for config in configs {
            config.validate()?;
        }

        let capacity = storage.len() / configs.len();
        if capacity < MIN_QUEUE_CAPACITY {
            return Err(LcdError::InsufficientStorage {
                required: MIN_QUEUE_CAPACITY,
                available: capacity,
            });
        }

        let mut displays: Vec<Display<'a>> = configs
            .iter()
            .zip(storage.chunks_exact_mut(capacity))
            .map(|(config, buffer)| Display::new(config, buffer))
            .collect();

        for display in &mut displays {
            for code in command::init_sequence(display.config.height) {
                display.push(Unit::Command(code))?;
            }
        }

        info!(
            "Initialized {} display(s) with {} queue bytes each",
            displays.len(),
            capacity
        );

        Ok(DisplayController {
            displays,
            transmitter,
        })
    }

    fn display(&self, display: DisplayId) -> LcdResult<&Display<'a>> {
        self.displays
            .get(display)
            .ok_or(LcdError::InvalidDisplayHandle(display))
    }

    fn display_mut(&mut self, display: DisplayId) -> LcdResult<&mut Display<'a>> {
        self.displays
            .get_mut(display)
            .ok_or(LcdError::InvalidDisplayHandle(display))
    }

    pub fn display_count(&self) -> usize {
        self.displays.len()
    }

    pub fn config(&self, display: DisplayId) -> LcdResult<&'a DisplayConfig> {
        Ok(self.display(display)?.config)
    }

    /// Where the next character will land, as far as dispatched units go.
    pub fn cursor(&self, display: DisplayId) -> LcdResult<Cursor> {
        Ok(self.display(display)?.tracker.cursor())
    }

    /// Number of queue bytes still waiting for dispatch.
    pub fn pending(&self, display: DisplayId) -> LcdResult<usize> {
        Ok(self.display(display)?.queue.len())
    }

    /// Number of queue bytes still free.
    pub fn free(&self, display: DisplayId) -> LcdResult<usize> {
        Ok(self.display(display)?.queue.free())
    }

    /// Whether every queue has been drained.
    pub fn is_idle(&self) -> bool {
        self.displays.iter().all(|display| display.queue.is_empty())
    }

    pub fn transmitter(&self) -> &T {
        &self.transmitter
    }

    pub fn transmitter_mut(&mut self) -> &mut T {
        &mut self.transmitter
    }

    /// Clears the display. The cursor is back at (0, 0) as soon as this returns, the controller
    /// clears the physical display once the command is dispatched.
    ///
    /// # Errors
    /// - [LcdError::InvalidDisplayHandle]
    /// - [LcdError::QueueFull] if the clear command couldn't be queued. The cursor is reset
    ///   anyway, so calling this again later is safe.
    pub fn clear(&mut self, display: DisplayId) -> LcdResult<()> {
        let state = self.display_mut(display)?;
        state.tracker.reset();
        state.push(Unit::Command(CLEAR_DISPLAY))
    }

    /// Queues characters for display and returns how many were accepted.
    ///
    /// A count lower than `data.len()` means the queue filled up. The rest should be offered
    /// again after a few [Self::update] calls, starting from the first byte not accepted.
    ///
    /// # Errors
    /// - [LcdError::InvalidDisplayHandle]
    pub fn set_data(&mut self, display: DisplayId, data: &[u8]) -> LcdResult<usize> {
        let state = self.display_mut(display)?;
        let accepted = state.push_all(data.iter().map(|&byte| Unit::Character(byte)));
        if accepted < data.len() {
            debug!(
                "LCD {}: queue full, accepted {} of {} bytes",
                display,
                accepted,
                data.len()
            );
        }
        Ok(accepted)
    }

    /// Like [Self::set_data], for text. Characters outside ASCII are shown as `?`.
    ///
    /// Returns how many characters (not bytes of `text`) were accepted.
    pub fn write_str(&mut self, display: DisplayId, text: &str) -> LcdResult<usize> {
        let state = self.display_mut(display)?;
        let accepted = state.push_all(text.chars().map(|c| {
            if c.is_ascii() {
                Unit::Character(c as u8)
            } else {
                warn!("Non-ASCII character: {}", c);
                Unit::Character(b'?')
            }
        }));
        Ok(accepted)
    }

    /// Queues a raw instruction for the display.
    ///
    /// After a "set CGRAM address" the data bytes program custom characters: the cursor isn't
    /// tracked and rows don't wrap until a DDRAM address, clear or home command is dispatched.
    ///
    /// # Errors
    /// - [LcdError::InvalidDisplayHandle]
    /// - [LcdError::InvalidCommand] for `0x00`, which isn't an instruction.
    /// - [LcdError::QueueFull]
    pub fn set_command(&mut self, display: DisplayId, code: u8) -> LcdResult<()> {
        self.display_mut(display)?.push(Unit::Command(code))
    }

    /// Queues a cursor move to `row`, `col`. The tracked cursor follows once the command is
    /// dispatched.
    ///
    /// # Errors
    /// - [LcdError::InvalidDisplayHandle]
    /// - [LcdError::InvalidCursorTarget] if the position is outside the display. Nothing is
    ///   queued then.
    /// - [LcdError::QueueFull]
    pub fn set_cursor(&mut self, display: DisplayId, row: u8, col: u8) -> LcdResult<()> {
        let state = self.display_mut(display)?;
        let address = cursor::ddram_address(state.config, row, col)?;
        state.push(Unit::Command(command::set_ddram_address(address)?))
    }

    /// Queues a display on/off, cursor on/off, and cursor blinking on/off instruction.
    pub fn set_display_control(
        &mut self,
        display: DisplayId,
        display_on: bool,
        cursor_on: bool,
        blink_on: bool,
    ) -> LcdResult<()> {
        self.set_command(
            display,
            command::display_control(display_on, cursor_on, blink_on),
        )
    }

    /// Runs one dispatch cycle: at most one unit per display.
    ///
    /// Meant to be called from a periodic tick. Returns the faults of this cycle, which are also
    /// logged.
    pub fn update(&mut self) -> Vec<Fault> {
        let mut faults = Vec::new();
        for (id, display) in self.displays.iter_mut().enumerate() {
            match display.service(id, &mut self.transmitter) {
                Ok(()) | Err(LcdError::QueueEmpty) => {}
                Err(error) => {
                    error!("LCD {}: {}", id, error);
                    faults.push(Fault { display: id, error });
                }
            }
        }
        faults
    }
}
