//! GPIO reset handler

use crate::command::App;
use crate::error::Result;
use mihome_shared::PinMode;

/// Pin functions that route SPI0 to the radio: CE1 and CE0 as outputs,
/// MISO, MOSI and SCLK on ALT0
pub const SPI0_PINS: [(u32, PinMode); 5] = [
    (7, PinMode::Output),
    (8, PinMode::Output),
    (9, PinMode::Alt0),
    (10, PinMode::Alt0),
    (11, PinMode::Alt0),
];

/// Put the SPI0 pins back into the state the radio expects
pub async fn reset_gpio(app: &mut App) -> Result<()> {
    for (pin, mode) in SPI0_PINS {
        app.gpio().set_pin_mode(pin, mode).await?;
    }
    Ok(())
}
