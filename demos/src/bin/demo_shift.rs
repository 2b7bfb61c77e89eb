//! Endless scroll demo: two overflowing lines, one shift step per second.
//!
//! The session advances the animation one step per paint of the longest line,
//! so the sleep below sets the scroll cadence.

use dotenv::dotenv;
use kanalcd_lcd::display::Lcd;
use log::info;
use std::env::var;
use std::thread::sleep;
use std::time::Duration;

fn main() -> eyre::Result<()> {
    dotenv().ok();
    pretty_env_logger::init();

    let config_path = var("KANALCD_CONFIG").unwrap_or_else(|_| "lcd.toml".to_string());
    info!("Using config {config_path}");

    let mut lcd = Lcd::open(&config_path)?;
    lcd.init()?;

    loop {
        //           0123456789012345678901234567890123456789
        lcd.message("https://raspberrypi.mongonta.com", 1, true)?;
        lcd.message("Shift Demo012345678901234567890123456789", 2, true)?;
        sleep(Duration::from_secs(1));
    }
}
