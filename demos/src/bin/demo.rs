//! Paints a two-line URL on a 16x2 display.

use dotenv::dotenv;
use kanalcd_lcd::display::Lcd;
use log::info;
use std::env::var;

fn main() -> eyre::Result<()> {
    dotenv().ok();
    pretty_env_logger::init();

    let config_path = var("KANALCD_CONFIG").unwrap_or_else(|_| "lcd.toml".to_string());
    info!("Using config {config_path}");

    let mut lcd = Lcd::open(&config_path)?;
    lcd.init()?;

    //           0123456789012345
    lcd.message("https://raspberr", 1, true)?;
    lcd.message("ypi.mongonta.com", 2, true)?;

    Ok(())
}
