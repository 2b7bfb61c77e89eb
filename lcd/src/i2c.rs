//! Raspberry Pi I2C transport, backed by `rppal`.

use crate::{I2cTransport, LcdError, LcdResult};
use rppal::i2c::I2c;

impl From<rppal::i2c::Error> for LcdError {
    fn from(err: rppal::i2c::Error) -> Self {
        LcdError::Transport(err.to_string())
    }
}

/// A hardware I2C bus. One bus can carry several displays at distinct
/// addresses, but writes must be serialized by the caller: two interleaved
/// nibble pairs would garble both displays.
#[derive(Debug)]
pub struct I2cBus {
    i2c: I2c,
    current_address: Option<u16>,
}

impl I2cBus {
    /// Opens the default I2C bus (`/dev/i2c-1` on current Pi models).
    pub fn new() -> LcdResult<Self> {
        Ok(I2cBus {
            i2c: I2c::new()?,
            current_address: None,
        })
    }

    /// Opens a specific `/dev/i2c-N` bus.
    pub fn with_bus(bus: u8) -> LcdResult<Self> {
        Ok(I2cBus {
            i2c: I2c::with_bus(bus)?,
            current_address: None,
        })
    }
}

impl I2cTransport for I2cBus {
    fn write(&mut self, address: u16, byte: u8) -> LcdResult<()> {
        if self.current_address != Some(address) {
            self.i2c.set_slave_address(address)?;
            self.current_address = Some(address);
        }
        self.i2c.write(&[byte])?;
        Ok(())
    }
}
