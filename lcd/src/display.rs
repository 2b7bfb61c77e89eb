//! Display session: configuration, line painting and scroll animation.

use crate::config::{DisplayConfig, ShiftMode};
use crate::driver::{Hd44780Driver, I2cHd44780Driver};
use crate::i2c::I2cBus;
use crate::kana;
use crate::{LcdError, LcdResult};
use log::{debug, info};
use std::path::{Path, PathBuf};

/// Direction of the next bounce-mode shift.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ShiftDirection {
    Left,
    Right,
}

/// Bookkeeping for bounce-mode scrolling.
///
/// `offset` counts shifts issued since the last direction flip and stays
/// within `[0, excess]`, where `excess` is how far the longest line overhangs
/// the display width.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ScrollState {
    pub direction: ShiftDirection,
    pub offset: usize,
}

impl Default for ScrollState {
    fn default() -> Self {
        ScrollState {
            direction: ShiftDirection::Left,
            offset: 0,
        }
    }
}

/// A configured session against one display.
///
/// The session owns the driver and with it the bus address; nothing here
/// locks, so concurrent callers targeting one device must serialize
/// externally. All operations block on the controller's timing delays.
#[derive(Debug)]
pub struct Lcd<D: Hd44780Driver> {
    driver: D,
    config: DisplayConfig,
    config_path: Option<PathBuf>,
    /// Rendered length of the last message painted to each line, in cells.
    line_lengths: [usize; 4],
    scroll: ScrollState,
}

impl Lcd<I2cHd44780Driver<I2cBus>> {
    /// Opens a session on the Raspberry Pi I2C bus, configured from `path`.
    pub fn open(path: impl AsRef<Path>) -> LcdResult<Self> {
        let path = path.as_ref();
        let config = DisplayConfig::load(path)?;
        info!(
            "Opening {}x{} display at 0x{:02X}",
            config.width, config.lines, config.i2c_address
        );
        let bus = I2cBus::new()?;
        let driver = I2cHd44780Driver::new(bus, config.i2c_address, config.backlight);
        Ok(Lcd {
            driver,
            config,
            config_path: Some(path.to_path_buf()),
            line_lengths: [0; 4],
            scroll: ScrollState::default(),
        })
    }
}

impl<D: Hd44780Driver> Lcd<D> {
    /// Creates a session with a fixed configuration; `message` never reloads.
    pub fn new(mut driver: D, config: DisplayConfig) -> LcdResult<Self> {
        config.validate()?;
        driver.set_backlight(config.backlight);
        Ok(Lcd {
            driver,
            config,
            config_path: None,
            line_lengths: [0; 4],
            scroll: ScrollState::default(),
        })
    }

    /// Creates a session that re-reads its configuration file on every paint,
    /// so backlight and mode edits take effect without a restart.
    pub fn with_config_file(mut driver: D, path: impl AsRef<Path>) -> LcdResult<Self> {
        let path = path.as_ref();
        let config = DisplayConfig::load(path)?;
        driver.set_backlight(config.backlight);
        Ok(Lcd {
            driver,
            config,
            config_path: Some(path.to_path_buf()),
            line_lengths: [0; 4],
            scroll: ScrollState::default(),
        })
    }

    /// Runs the controller initialization sequence.
    pub fn init(&mut self) -> LcdResult<()> {
        debug!("Initializing display");
        self.driver.init()
    }

    /// Display width in cells.
    pub fn width(&self) -> usize {
        self.config.width
    }

    /// Number of configured lines.
    pub fn lines(&self) -> usize {
        self.config.lines
    }

    pub fn scroll_state(&self) -> ScrollState {
        self.scroll
    }

    /// Re-reads the configuration file, if the session has one.
    ///
    /// Width, line count, shift mode, kana mode and the backlight flag take
    /// effect immediately (the backlight reaches the bus with the next
    /// transfer). The bus address is fixed when the transport is built;
    /// pointing the session at another device requires a new session.
    pub fn reload_config(&mut self) -> LcdResult<()> {
        if let Some(path) = &self.config_path {
            let config = DisplayConfig::load(path)?;
            self.driver.set_backlight(config.backlight);
            self.config = config;
        }
        Ok(())
    }

    /// Paints one line of text and advances the scroll animation when the
    /// painted line is the longest overflowing one.
    ///
    /// `line` is 1-based. With `reload_config` set the configuration file is
    /// re-read first, the way the original expects backlight toggles to be
    /// picked up between paints.
    pub fn message(&mut self, text: &str, line: usize, reload_config: bool) -> LcdResult<()> {
        if reload_config {
            self.reload_config()?;
        }
        if !(1..=self.config.lines).contains(&line) {
            return Err(LcdError::LineOutOfRange {
                line,
                lines: self.config.lines,
            });
        }

        let (length, codes) = if self.config.kana_mode {
            // Length is counted on the half-width form, one char per cell;
            // the lookup tables want the kana back in full-width.
            let half = kana::to_halfwidth(text);
            let length = half.chars().count();
            (length, kana::encode(&kana::to_fullwidth_kana(&half)))
        } else {
            (text.chars().count(), kana::encode_ascii(text)?)
        };
        self.line_lengths[line - 1] = length;

        self.driver.set_line(line)?;
        for code in codes {
            self.driver.send_data(code)?;
        }

        // The scroll animation follows whichever line holds the longest
        // content, recomputed on every paint; on a tie the lowest line index
        // wins, so only that line's paint advances the animation.
        if self.config.shift_mode != ShiftMode::None {
            let max = self.line_lengths.iter().copied().max().unwrap_or(0);
            if max > self.config.width
                && self.line_lengths.iter().position(|&len| len == max) == Some(line - 1)
            {
                self.shift_step(max)?;
            }
        }
        Ok(())
    }

    /// Issues one scroll shift according to the configured mode.
    ///
    /// Exactly one shift per call, whatever time has elapsed; the paint cadence
    /// (or an external timer) drives the animation speed.
    pub fn shift_step(&mut self, max_length: usize) -> LcdResult<()> {
        match self.config.shift_mode {
            ShiftMode::None => Ok(()),
            ShiftMode::Left => self.driver.shift_left(),
            ShiftMode::Right => self.driver.shift_right(),
            ShiftMode::Bounce => {
                let excess = max_length.saturating_sub(self.config.width);
                if excess == 0 {
                    // Content fits, nothing to expose.
                    return Ok(());
                }
                if self.scroll.direction == ShiftDirection::Left && self.scroll.offset < excess {
                    self.driver.shift_left()?;
                    self.scroll.offset += 1;
                    if self.scroll.offset >= excess {
                        self.scroll = ScrollState {
                            direction: ShiftDirection::Right,
                            offset: 0,
                        };
                    }
                } else {
                    self.driver.shift_right()?;
                    self.scroll.offset += 1;
                    if self.scroll.offset >= excess {
                        self.scroll = ScrollState {
                            direction: ShiftDirection::Left,
                            offset: 0,
                        };
                    }
                }
                Ok(())
            }
        }
    }

    /// Sets the backlight and flushes the new state onto the bus immediately
    /// with a no-op command, rather than waiting for the next paint.
    pub fn set_backlight(&mut self, on: bool) -> LcdResult<()> {
        debug!("Backlight {}", if on { "on" } else { "off" });
        self.config.backlight = on;
        self.driver.set_backlight(on);
        self.driver.send_command(0x00)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::LINE_ADDRESSES;
    use std::io::Write;

    const SHIFT_LEFT: u8 = 0x18;
    const SHIFT_RIGHT: u8 = 0x1C;

    #[derive(Debug, Eq, PartialEq, Copy, Clone)]
    enum Event {
        Command(u8),
        Data(u8),
    }

    #[derive(Debug, Default)]
    struct MockDriver {
        backlight: bool,
        events: Vec<Event>,
    }

    impl MockDriver {
        fn shift_count(&self) -> usize {
            self.events
                .iter()
                .filter(|e| matches!(e, Event::Command(SHIFT_LEFT | SHIFT_RIGHT)))
                .count()
        }
    }

    impl Hd44780Driver for MockDriver {
        fn init(&mut self) -> LcdResult<()> {
            for command in [0x33, 0x32, 0x06, 0x0C, 0x28, 0x01] {
                self.send_command(command)?;
            }
            Ok(())
        }

        fn send_command(&mut self, command: u8) -> LcdResult<()> {
            self.events.push(Event::Command(command));
            Ok(())
        }

        fn send_data(&mut self, data: u8) -> LcdResult<()> {
            self.events.push(Event::Data(data));
            Ok(())
        }

        fn set_backlight(&mut self, on: bool) {
            self.backlight = on;
        }

        fn backlight(&self) -> bool {
            self.backlight
        }
    }

    fn config(width: usize, lines: usize, shift_mode: ShiftMode) -> DisplayConfig {
        DisplayConfig {
            i2c_address: 0x27,
            width,
            lines,
            backlight: true,
            shift_mode,
            kana_mode: false,
        }
    }

    fn session(width: usize, lines: usize, shift_mode: ShiftMode) -> Lcd<MockDriver> {
        Lcd::new(MockDriver::default(), config(width, lines, shift_mode)).unwrap()
    }

    #[test]
    fn two_line_url_paints_without_scrolling() {
        let mut lcd = session(16, 2, ShiftMode::None);
        lcd.message("https://raspberr", 1, false).unwrap();
        lcd.message("ypi.mongonta.com", 2, false).unwrap();

        let events = &lcd.driver.events;
        assert_eq!(events[0], Event::Command(LINE_ADDRESSES[0]));
        assert_eq!(events[17], Event::Command(LINE_ADDRESSES[1]));
        let line1: Vec<u8> = events[1..17]
            .iter()
            .map(|e| match e {
                Event::Data(b) => *b,
                Event::Command(c) => panic!("unexpected command {c:#04x}"),
            })
            .collect();
        assert_eq!(line1, b"https://raspberr".to_vec());
        assert_eq!(events.len(), 34);
        assert_eq!(lcd.driver.shift_count(), 0);
    }

    #[test]
    fn exact_fit_never_scrolls() {
        // Even in bounce mode, a line that exactly fills the width has no
        // hidden tail to expose.
        let mut lcd = session(16, 2, ShiftMode::Bounce);
        lcd.message("0123456789abcdef", 1, false).unwrap();
        lcd.message("0123456789abcdef", 1, false).unwrap();
        assert_eq!(lcd.driver.shift_count(), 0);
        assert_eq!(lcd.scroll_state(), ScrollState::default());
    }

    #[test]
    fn left_mode_shifts_on_every_overflowing_paint() {
        let mut lcd = session(16, 1, ShiftMode::Left);
        let long = "https://raspberrypi.mongonta.com";
        for _ in 0..3 {
            lcd.message(long, 1, false).unwrap();
        }
        let shifts: Vec<_> = lcd
            .driver
            .events
            .iter()
            .filter(|e| matches!(e, Event::Command(SHIFT_LEFT | SHIFT_RIGHT)))
            .collect();
        assert_eq!(shifts, vec![&Event::Command(SHIFT_LEFT); 3]);
    }

    #[test]
    fn bounce_walks_out_and_back() {
        // width 16, length 40: excess 24. 24 left shifts, then 24 right
        // shifts, ending back at the initial state with the offset never
        // leaving [0, 24].
        let mut lcd = session(16, 1, ShiftMode::Bounce);
        lcd.line_lengths[0] = 40;

        let mut home_visits = 0;
        for step in 0..48 {
            lcd.shift_step(40).unwrap();
            let state = lcd.scroll_state();
            assert!(state.offset <= 24, "offset {} at step {}", state.offset, step);
            if state == ScrollState::default() {
                home_visits += 1;
            }
        }
        assert_eq!(home_visits, 1);
        assert_eq!(lcd.scroll_state(), ScrollState::default());

        let shifts: Vec<u8> = lcd
            .driver
            .events
            .iter()
            .filter_map(|e| match e {
                Event::Command(c @ (SHIFT_LEFT | SHIFT_RIGHT)) => Some(*c),
                _ => None,
            })
            .collect();
        assert_eq!(shifts.len(), 48);
        assert!(shifts[..24].iter().all(|&c| c == SHIFT_LEFT));
        assert!(shifts[24..].iter().all(|&c| c == SHIFT_RIGHT));
    }

    #[test]
    fn tie_break_goes_to_the_lower_line() {
        let mut lcd = session(16, 2, ShiftMode::Bounce);
        let long = "01234567890123456789";
        lcd.message(long, 1, false).unwrap();
        assert_eq!(lcd.driver.shift_count(), 1);
        // Line 2 ties for the maximum; its paint must not advance the
        // animation a second time in the same frame.
        lcd.message(long, 2, false).unwrap();
        assert_eq!(lcd.driver.shift_count(), 1);
        // Line 1 still holds the first occurrence of the max.
        lcd.message(long, 1, false).unwrap();
        assert_eq!(lcd.driver.shift_count(), 2);
    }

    #[test]
    fn backlight_set_is_idempotent_and_flushes() {
        let mut lcd = session(16, 2, ShiftMode::None);
        lcd.set_backlight(true).unwrap();
        lcd.set_backlight(true).unwrap();
        assert!(lcd.driver.backlight());
        // Each call flushes with the benign 0x00 command and nothing else.
        assert_eq!(
            lcd.driver.events,
            vec![Event::Command(0x00), Event::Command(0x00)]
        );
        lcd.set_backlight(false).unwrap();
        assert!(!lcd.driver.backlight());
    }

    #[test]
    fn line_out_of_range_is_an_error() {
        let mut lcd = session(16, 2, ShiftMode::None);
        assert_eq!(
            lcd.message("hi", 3, false),
            Err(LcdError::LineOutOfRange { line: 3, lines: 2 })
        );
        assert!(lcd.driver.events.is_empty());
    }

    #[test]
    fn kana_mode_counts_cells_not_chars() {
        let mut lcd = session(16, 2, ShiftMode::None);
        lcd.config.kana_mode = true;
        lcd.message("ガンダム", 1, false).unwrap();
        // 4 input chars, 6 cells (two voiced kana decompose).
        assert_eq!(lcd.line_lengths[0], 6);
        let data: Vec<u8> = lcd
            .driver
            .events
            .iter()
            .filter_map(|e| match e {
                Event::Data(b) => Some(*b),
                _ => None,
            })
            .collect();
        assert_eq!(data, vec![0xB6, 0xDE, 0xDD, 0xC0, 0xDE, 0xD1]);
    }

    #[test]
    fn invalid_config_is_rejected_at_construction() {
        let bad = DisplayConfig {
            width: 0,
            ..config(16, 2, ShiftMode::None)
        };
        assert!(matches!(
            Lcd::new(MockDriver::default(), bad),
            Err(LcdError::Config(_))
        ));
    }

    #[test]
    fn reload_picks_up_backlight_edits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lcd.toml");
        let write = |backlight: bool| {
            let mut file = std::fs::File::create(&path).unwrap();
            write!(
                file,
                "[lcd]\ni2c_address = \"0x27\"\nwidth = 16\nlines = 2\n\
                 backlight = {backlight}\nshiftmode = 0\nkanamode = false\n"
            )
            .unwrap();
        };

        write(true);
        let mut lcd = Lcd::with_config_file(MockDriver::default(), &path).unwrap();
        assert!(lcd.driver.backlight());

        write(false);
        lcd.message("hello", 1, true).unwrap();
        assert!(!lcd.driver.backlight());
    }
}
