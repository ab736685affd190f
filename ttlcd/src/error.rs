use crate::DisplayId;
use thiserror::Error;

#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum LcdError {
    #[error("no display with handle {0}")]
    InvalidDisplayHandle(DisplayId),
    #[error("display queue is full")]
    QueueFull,
    /// Used by the dispatcher to skip idle displays; never returned by producer operations.
    #[error("display queue is empty")]
    QueueEmpty,
    #[error("cursor target (row {row}, column {col}) is outside the display")]
    InvalidCursorTarget { row: u8, col: u8 },
    #[error("command marker without a command byte following it")]
    MalformedControlSequence,
    #[error("unsupported display geometry {width}x{height}")]
    UnsupportedGeometry { width: u8, height: u8 },
    #[error("invalid command code {0:#04x}")]
    InvalidCommand(u8),
    #[error("queue storage too small: {available} bytes per display, at least {required} needed")]
    InsufficientStorage { required: usize, available: usize },
    #[error("no displays configured")]
    NoDisplays,
    #[error("transmitter error: {0}")]
    Transmit(String),
}

pub type LcdResult<T> = Result<T, LcdError>;
