//! Driver for HD44780 character LCDs behind a PCF8574-style I2C backpack,
//! with per-line scroll animation and katakana text support.
//!
//! The crate is split along the seams of the hardware: [`I2cTransport`] is the
//! raw byte-write capability of the bus, [`driver`] speaks the 4-bit HD44780
//! protocol on top of it, [`kana`] maps text into the controller's ROM code
//! space, and [`display::Lcd`] ties them together into a configured session.

pub mod config;
pub mod display;
pub mod driver;
pub mod i2c;
pub mod kana;

use std::fmt::Debug;
use thiserror::Error;

#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum LcdError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("line {line} out of range (display has {lines} lines)")]
    LineOutOfRange { line: usize, lines: usize },
    #[error("character {0:?} cannot be displayed without kana mode")]
    UnsupportedChar(char),
    #[error("IO error: {0}")]
    Io(std::io::ErrorKind),
}

impl From<std::io::Error> for LcdError {
    fn from(err: std::io::Error) -> Self {
        LcdError::Io(err.kind())
    }
}

pub type LcdResult<T> = Result<T, LcdError>;

/// Capability to write a single byte to a device on an I2C bus.
///
/// The driver issues one call per bus transfer and never retries: a failed
/// write mid-byte leaves the controller in an ambiguous state, so the error
/// is propagated to the caller immediately. Implementations shared between
/// multiple displays must serialize concurrent writers themselves.
pub trait I2cTransport: Debug {
    /// Writes one byte to the device at the given bus address.
    fn write(&mut self, address: u16, byte: u8) -> LcdResult<()>;
}
