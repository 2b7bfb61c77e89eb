//! Display configuration, loaded from a TOML file with an `[lcd]` table.
//!
//! ```toml
//! [lcd]
//! i2c_address = "0x27"
//! width = 16
//! lines = 2
//! backlight = true
//! shiftmode = 3
//! kanamode = false
//! ```
//!
//! Every field is required. A missing file, a missing or malformed field, or an
//! out-of-range value is a fatal [`LcdError::Config`]: a session never paints
//! with a partially loaded configuration.

use crate::{LcdError, LcdResult};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::fs;
use std::path::Path;

/// How the display content is shifted on each scroll step.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Deserialize)]
#[serde(try_from = "i64")]
pub enum ShiftMode {
    /// No scrolling.
    None,
    /// Shift left by one cell on every step.
    Left,
    /// Shift right by one cell on every step.
    Right,
    /// Crawl left until the tail of the longest line is exposed, then reverse.
    Bounce,
}

impl TryFrom<i64> for ShiftMode {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ShiftMode::None),
            1 => Ok(ShiftMode::Left),
            2 => Ok(ShiftMode::Right),
            3 => Ok(ShiftMode::Bounce),
            _ => Err(format!("shiftmode must be 0-3, got {value}")),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    lcd: DisplayConfig,
}

/// Per-device configuration.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize)]
pub struct DisplayConfig {
    /// I2C bus address of the backpack expander.
    #[serde(deserialize_with = "de_address")]
    pub i2c_address: u16,
    /// Width of the display in character cells.
    pub width: usize,
    /// Number of physical lines (1 to 4).
    pub lines: usize,
    /// Backlight on/off.
    pub backlight: bool,
    /// Scroll mode for overflowing lines.
    #[serde(rename = "shiftmode")]
    pub shift_mode: ShiftMode,
    /// Translate katakana text into the controller's ROM code table.
    #[serde(rename = "kanamode")]
    pub kana_mode: bool,
}

impl DisplayConfig {
    /// Loads and validates a configuration file.
    pub fn load(path: impl AsRef<Path>) -> LcdResult<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|err| {
            LcdError::Config(format!("cannot read {}: {}", path.display(), err))
        })?;
        let file: ConfigFile =
            toml::from_str(&raw).map_err(|err| LcdError::Config(err.to_string()))?;
        file.lcd.validate()?;
        Ok(file.lcd)
    }

    pub(crate) fn validate(&self) -> LcdResult<()> {
        if self.width == 0 {
            return Err(LcdError::Config("width must be at least 1".into()));
        }
        if !(1..=4).contains(&self.lines) {
            return Err(LcdError::Config(format!(
                "lines must be 1-4, got {}",
                self.lines
            )));
        }
        Ok(())
    }
}

/// Parses an integer in any standard base notation (`0x27`, `0o47`, `0b100111`
/// or plain decimal).
fn parse_int_any_base(s: &str) -> Option<u16> {
    let s = s.trim();
    let (digits, radix) = match s.get(..2) {
        Some("0x") | Some("0X") => (&s[2..], 16),
        Some("0o") | Some("0O") => (&s[2..], 8),
        Some("0b") | Some("0B") => (&s[2..], 2),
        _ => (s, 10),
    };
    u16::from_str_radix(digits, radix).ok()
}

/// Accepts the bus address either as a TOML integer or as a string in any
/// standard base notation.
fn de_address<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    struct AddressVisitor;

    impl serde::de::Visitor<'_> for AddressVisitor {
        type Value = u16;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("an I2C address as an integer or a base-prefixed string")
        }

        fn visit_i64<E: serde::de::Error>(self, value: i64) -> Result<u16, E> {
            u16::try_from(value)
                .map_err(|_| E::custom(format!("i2c_address {value} out of range")))
        }

        fn visit_str<E: serde::de::Error>(self, value: &str) -> Result<u16, E> {
            parse_int_any_base(value)
                .ok_or_else(|| E::custom(format!("invalid i2c_address {value:?}")))
        }
    }

    deserializer.deserialize_any(AddressVisitor)
}
