//! HD44780 controller drivers.
//!
//! The [`Hd44780Driver`] trait is the low-level command/data interface; the
//! high-level commands are built on top of it as provided methods. The only
//! implementation here is [`I2cHd44780Driver`], which speaks the 4-bit bus
//! protocol through a PCF8574-style I2C backpack, but the trait keeps the
//! display session testable without hardware.

mod i2c;

pub use i2c::*;

use crate::{LcdError, LcdResult};
use std::fmt::Debug;

/// DDRAM base address of each display line, topmost first.
pub const LINE_ADDRESSES: [u8; 4] = [0x80, 0xC0, 0x94, 0xD4];

/// Whether a byte selects the instruction register or the data register.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Mode {
    Command,
    Data,
}

pub trait Hd44780Driver: Debug {
    /// Brings the controller from its unknown power-on state into 4-bit,
    /// 2-line, display-on/cursor-off mode and clears the display.
    fn init(&mut self) -> LcdResult<()>;

    /// Sends a command byte (RS low).
    fn send_command(&mut self, command: u8) -> LcdResult<()>;

    /// Sends a data byte (RS high).
    fn send_data(&mut self, data: u8) -> LcdResult<()>;

    /// Sets the backlight flag carried by every subsequent transfer.
    ///
    /// This only updates the flag; the new state reaches the hardware with the
    /// next byte sent. See [`crate::display::Lcd::set_backlight`] for the
    /// immediate variant.
    fn set_backlight(&mut self, on: bool);

    /// Current backlight flag.
    fn backlight(&self) -> bool;

    /// Clears the display and returns the cursor to the home position.
    fn clear_display(&mut self) -> LcdResult<()> {
        self.send_command(0b0000_0001)
    }

    /// Shifts the whole display one cell to the left.
    fn shift_left(&mut self) -> LcdResult<()> {
        self.send_command(0b0001_1000)
    }

    /// Shifts the whole display one cell to the right.
    fn shift_right(&mut self) -> LcdResult<()> {
        self.send_command(0b0001_1100)
    }

    /// Moves the cursor to the start of the given line (1-based).
    fn set_line(&mut self, line: usize) -> LcdResult<()> {
        let address = *LINE_ADDRESSES
            .get(line.wrapping_sub(1))
            .ok_or(LcdError::LineOutOfRange {
                line,
                lines: LINE_ADDRESSES.len(),
            })?;
        self.send_command(address)
    }
}
