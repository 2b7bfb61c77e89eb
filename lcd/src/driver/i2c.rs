use crate::driver::{Hd44780Driver, Mode};
use crate::{I2cTransport, LcdResult};
use log::trace;
use std::thread::sleep;
use std::time::Duration;

// Backpack bit layout: P0 = RS, P1 = RW (wired low, write-only), P2 = E,
// P3 = backlight, P4-P7 = data nibble.
const REGISTER_SELECT: u8 = 0b0000_0001;
const ENABLE: u8 = 0b0000_0100;
const BACKLIGHT: u8 = 0b0000_1000;

/// Enable pulse width and settle time. The controller needs at least 0.45ms
/// around each enable edge; these delays are mandatory, not tunable.
const E_PULSE: Duration = Duration::from_micros(500);
const E_DELAY: Duration = Duration::from_micros(500);

/// 4-bit HD44780 driver over an I2C backpack expander.
///
/// Each logical byte becomes two nibble transfers, high nibble first. A nibble
/// is latched by pulsing the enable line: the nibble is written with E set,
/// then with E cleared, the controller reading it on the falling edge. That
/// makes exactly four bus writes per logical byte, and their order is
/// load-bearing: swapping nibbles or skipping a delay garbles the character.
#[derive(Debug)]
pub struct I2cHd44780Driver<T: I2cTransport> {
    transport: T,
    address: u16,
    backlight: bool,
}

impl<T: I2cTransport> I2cHd44780Driver<T> {
    pub fn new(transport: T, address: u16, backlight: bool) -> Self {
        I2cHd44780Driver {
            transport,
            address,
            backlight,
        }
    }

    /// Bus address the driver was built for.
    pub fn address(&self) -> u16 {
        self.address
    }

    fn send(&mut self, byte: u8, mode: Mode) -> LcdResult<()> {
        trace!("Sending byte: {:08b}, mode: {:?}", byte, mode);

        let mut flags = match mode {
            Mode::Command => 0,
            Mode::Data => REGISTER_SELECT,
        };
        if self.backlight {
            flags |= BACKLIGHT;
        }

        let high = flags | (byte & 0xF0);
        let low = flags | (byte << 4 & 0xF0);

        self.write_nibble(high)?;
        self.write_nibble(low)
    }

    /// Latches one nibble transfer with an enable pulse.
    fn write_nibble(&mut self, bits: u8) -> LcdResult<()> {
        self.transport.write(self.address, bits | ENABLE)?;
        sleep(E_PULSE);
        self.transport.write(self.address, bits & !ENABLE)?;
        sleep(E_DELAY);
        Ok(())
    }
}

impl<T: I2cTransport> Hd44780Driver for I2cHd44780Driver<T> {
    fn init(&mut self) -> LcdResult<()> {
        // Synchronize into 4-bit mode, then configure and clear.
        self.send_command(0b0011_0011)?;
        self.send_command(0b0011_0010)?;
        // Cursor moves right, no display shift on write
        self.send_command(0b0000_0110)?;
        // Display on, cursor off, blink off
        self.send_command(0b0000_1100)?;
        // 4-bit bus, two lines, 5x8 font
        self.send_command(0b0010_1000)?;
        self.clear_display()?;
        sleep(E_DELAY);
        Ok(())
    }

    fn send_command(&mut self, command: u8) -> LcdResult<()> {
        self.send(command, Mode::Command)
    }

    fn send_data(&mut self, data: u8) -> LcdResult<()> {
        self.send(data, Mode::Data)
    }

    fn set_backlight(&mut self, on: bool) {
        self.backlight = on;
    }

    fn backlight(&self) -> bool {
        self.backlight
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LcdError;

    #[derive(Debug, Default)]
    struct MockBus {
        writes: Vec<(u16, u8)>,
        fail_after: Option<usize>,
    }

    impl I2cTransport for MockBus {
        fn write(&mut self, address: u16, byte: u8) -> LcdResult<()> {
            if self.fail_after == Some(self.writes.len()) {
                return Err(LcdError::Transport("nack".into()));
            }
            self.writes.push((address, byte));
            Ok(())
        }
    }

    fn driver(backlight: bool) -> I2cHd44780Driver<MockBus> {
        I2cHd44780Driver::new(MockBus::default(), 0x27, backlight)
    }

    #[test]
    fn byte_becomes_four_writes_high_nibble_first() {
        let mut drv = driver(false);
        drv.send_data(0xA5).unwrap();

        let bytes: Vec<u8> = drv.transport.writes.iter().map(|&(_, b)| b).collect();
        assert_eq!(
            bytes,
            vec![
                0xA0 | REGISTER_SELECT | ENABLE,
                0xA0 | REGISTER_SELECT,
                0x50 | REGISTER_SELECT | ENABLE,
                0x50 | REGISTER_SELECT,
            ]
        );
        assert!(drv.transport.writes.iter().all(|&(addr, _)| addr == 0x27));
    }

    #[test]
    fn command_clears_register_select() {
        let mut drv = driver(false);
        drv.send_command(0x18).unwrap();

        for &(_, byte) in &drv.transport.writes {
            assert_eq!(byte & REGISTER_SELECT, 0);
        }
        assert_eq!(drv.transport.writes[0].1 & 0xF0, 0x10);
        assert_eq!(drv.transport.writes[2].1 & 0xF0, 0x80);
    }

    #[test]
    fn backlight_bit_rides_on_every_transfer() {
        let mut drv = driver(true);
        drv.send_data(b'A').unwrap();
        assert!(
            drv.transport
                .writes
                .iter()
                .all(|&(_, byte)| byte & BACKLIGHT != 0)
        );

        drv.set_backlight(false);
        drv.transport.writes.clear();
        drv.send_data(b'A').unwrap();
        assert!(
            drv.transport
                .writes
                .iter()
                .all(|&(_, byte)| byte & BACKLIGHT == 0)
        );
    }

    #[test]
    fn init_sends_fixed_command_sequence() {
        let mut drv = driver(false);
        drv.init().unwrap();

        // Reassemble each logical byte from its two enable-set nibble writes.
        let writes = &drv.transport.writes;
        assert_eq!(writes.len(), 6 * 4);
        let sent: Vec<u8> = writes
            .chunks(4)
            .map(|chunk| (chunk[0].1 & 0xF0) | (chunk[2].1 >> 4))
            .collect();
        assert_eq!(sent, vec![0x33, 0x32, 0x06, 0x0C, 0x28, 0x01]);
    }

    #[test]
    fn transport_error_aborts_mid_byte() {
        let mut drv = driver(false);
        drv.transport.fail_after = Some(2);
        assert!(matches!(drv.send_data(0xFF), Err(LcdError::Transport(_))));
        assert_eq!(drv.transport.writes.len(), 2);
    }

    #[test]
    fn set_line_maps_to_ddram_addresses() {
        let mut drv = driver(false);
        for (line, expected) in [(1, 0x80u8), (2, 0xC0), (3, 0x94), (4, 0xD4)] {
            drv.transport.writes.clear();
            drv.set_line(line).unwrap();
            let byte = (drv.transport.writes[0].1 & 0xF0) | (drv.transport.writes[2].1 >> 4);
            assert_eq!(byte, expected);
        }
        assert!(drv.set_line(5).is_err());
        assert!(drv.set_line(0).is_err());
    }
}
