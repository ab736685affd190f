//! Whole-row text output on top of the queued driver.
//!
//! The display queue is usually smaller than a full screen, so rows are fed in as space frees up:
//! whatever a write doesn't accept stays here and is offered again on the next tick.

use std::collections::VecDeque;
use ttlcd::{ByteTransmitter, DisplayController, DisplayId, LcdError, LcdResult};

#[derive(Debug)]
struct PendingRow {
    row: u8,
    text: String,
    cursor_sent: bool,
}

/// The rows of one display and what still has to be sent for them.
#[derive(Debug)]
pub struct Screen {
    display: DisplayId,
    width: usize,
    height: usize,
    shown: Vec<Option<String>>,
    pending: VecDeque<PendingRow>,
}

impl Screen {
    pub fn new<T: ByteTransmitter>(
        lcd: &DisplayController<'_, T>,
        display: DisplayId,
    ) -> LcdResult<Self> {
        let config = lcd.config(display)?;
        Ok(Screen {
            display,
            width: config.width as usize,
            height: config.height as usize,
            shown: vec![None; config.height as usize],
            pending: VecDeque::new(),
        })
    }

    /// Sets the text of the rows, starting from the top. Rows that didn't change aren't resent,
    /// extra lines are ignored.
    pub fn show(&mut self, lines: &[String]) {
        for (row, line) in lines.iter().take(self.height).enumerate() {
            let text = format!("{:<width$.width$}", line, width = self.width);
            if self.shown[row].as_ref() == Some(&text) {
                continue;
            }
            self.pending.retain(|pending| pending.row as usize != row);
            self.pending.push_back(PendingRow {
                row: row as u8,
                text: text.clone(),
                cursor_sent: false,
            });
            self.shown[row] = Some(text);
        }
    }

    /// Forgets what's on the display, so the next [Self::show] redraws every row.
    pub fn invalidate(&mut self) {
        self.shown.fill(None);
    }

    /// Whether everything shown has been handed to the driver.
    pub fn is_settled(&self) -> bool {
        self.pending.is_empty()
    }

    /// Queues as much of the pending text as the display queue takes.
    pub fn poll<T: ByteTransmitter>(&mut self, lcd: &mut DisplayController<'_, T>) -> LcdResult<()> {
        while let Some(pending) = self.pending.front_mut() {
            if !pending.cursor_sent {
                match lcd.set_cursor(self.display, pending.row, 0) {
                    Ok(()) => pending.cursor_sent = true,
                    Err(LcdError::QueueFull) => return Ok(()),
                    Err(err) => return Err(err),
                }
            }

            let accepted = lcd.write_str(self.display, &pending.text)?;
            pending.text = pending.text.chars().skip(accepted).collect();
            if !pending.text.is_empty() {
                return Ok(());
            }
            self.pending.pop_front();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ttlcd::transmitter::RecordingTransmitter;
    use ttlcd::{DisplayConfig, PinAssignment};

    fn configs() -> [DisplayConfig; 1] {
        [DisplayConfig {
            width: 16,
            height: 2,
            pins: PinAssignment {
                rs: 0,
                e: 1,
                data: [2, 3, 4, 5],
            },
        }]
    }

    fn run<T: ByteTransmitter>(screen: &mut Screen, lcd: &mut DisplayController<'_, T>) {
        while !screen.is_settled() || !lcd.is_idle() {
            screen.poll(lcd).unwrap();
            assert_eq!(lcd.update(), vec![]);
        }
    }

    #[test]
    fn rows_larger_than_the_queue_arrive_complete() {
        let configs = configs();
        let mut storage = [0u8; 12];
        let mut lcd =
            DisplayController::new(&configs, &mut storage, RecordingTransmitter::default()).unwrap();
        let mut screen = Screen::new(&lcd, 0).unwrap();

        screen.show(&["host".to_string(), "12:34:56".to_string()]);
        run(&mut screen, &mut lcd);

        let sent: Vec<u8> = lcd
            .transmitter_mut()
            .take()
            .iter()
            .skip(6)
            .map(|t| t.byte)
            .collect();
        let mut expected = vec![0x80];
        expected.extend_from_slice(b"host            ");
        expected.push(0xC0);
        expected.extend_from_slice(b"12:34:56        ");
        assert_eq!(sent, expected);
    }

    #[test]
    fn unchanged_rows_are_not_resent() {
        let configs = configs();
        let mut storage = [0u8; 40];
        let mut lcd =
            DisplayController::new(&configs, &mut storage, RecordingTransmitter::default()).unwrap();
        let mut screen = Screen::new(&lcd, 0).unwrap();

        screen.show(&["host".to_string(), "12:34:56".to_string()]);
        run(&mut screen, &mut lcd);
        lcd.transmitter_mut().take();

        screen.show(&["host".to_string(), "12:34:57".to_string()]);
        run(&mut screen, &mut lcd);
        let sent = lcd.transmitter_mut().take();
        assert_eq!(sent.len(), 17);
        assert_eq!(sent[0].byte, 0xC0);

        screen.invalidate();
        screen.show(&["host".to_string(), "12:34:57".to_string()]);
        run(&mut screen, &mut lcd);
        assert_eq!(lcd.transmitter_mut().take().len(), 34);
    }

    #[test]
    fn long_lines_are_cut_at_the_display_width() {
        let configs = configs();
        let mut storage = [0u8; 40];
        let mut lcd =
            DisplayController::new(&configs, &mut storage, RecordingTransmitter::default()).unwrap();
        let mut screen = Screen::new(&lcd, 0).unwrap();

        screen.show(&["a much longer host name".to_string()]);
        run(&mut screen, &mut lcd);

        let text: Vec<u8> = lcd
            .transmitter_mut()
            .take()
            .iter()
            .skip(7)
            .map(|t| t.byte)
            .collect();
        assert_eq!(text, b"a much longer ho");
    }
}
