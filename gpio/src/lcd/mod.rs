//! Display controllers driven over GPIO.

pub mod hd44780;
