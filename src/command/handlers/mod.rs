//! Command handlers, one per command family

mod gpio;
mod radio;
mod receive;
mod transmit;

pub use gpio::{reset_gpio, SPI0_PINS};
pub use radio::{measure_temp, reset_radio};
pub use receive::receive;
pub use transmit::{transmit_off, transmit_on};
