//! MiHome gateway client
//!
//! Discovers the radio gateway, issues device commands (sockets on/off, radio
//! reset, temperature, receive modes) and consumes the stream of decoded
//! sensor messages it pushes.

pub mod capability;
pub mod client;
pub mod command;
pub mod config;
pub mod discovery;
pub mod error;
pub mod message;
pub mod stream;

pub use capability::{Gpio, MessageSource, RadioControl};
pub use client::GatewayClient;
pub use command::{App, Command};
pub use config::GatewayConfig;
pub use discovery::{GatewayLocator, TcpServicePool};
pub use error::{Error, Result};
pub use message::Message;
