//! Capability traits the command layer and the receive coordinator call through

use crate::error::Result;
use crate::message::Message;
use async_trait::async_trait;
use mihome_shared::{PinMode, ReceiveMode};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Control of the ENER314-RT style radio: sockets, temperature and receive modes
#[async_trait]
pub trait RadioControl: Send + Sync {
    async fn reset_radio(&self) -> Result<()>;

    /// Measure the radio chip temperature in degrees Celsius
    async fn measure_temperature(&self) -> Result<f32>;

    /// Switch sockets on; an empty list means every socket
    async fn on(&self, sockets: &[u32]) -> Result<()>;

    /// Switch sockets off; an empty list means every socket
    async fn off(&self, sockets: &[u32]) -> Result<()>;

    /// Listen in `mode` until `ctx` is cancelled
    async fn receive(&self, ctx: CancellationToken, mode: ReceiveMode) -> Result<()>;
}

/// GPIO pin programming
#[async_trait]
pub trait Gpio: Send + Sync {
    async fn set_pin_mode(&self, pin: u32, mode: PinMode) -> Result<()>;
}

/// A live gateway session that can stream decoded messages
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Round-trip liveness check
    async fn ping(&self) -> Result<()>;

    /// Push messages and keepalives into `messages` until `stop` is cancelled
    ///
    /// `messages` is dropped before returning, which closes the channel for the
    /// consumer. Returns an error if the underlying stream fails.
    async fn receive(
        &self,
        mode: ReceiveMode,
        stop: CancellationToken,
        messages: mpsc::Sender<Message>,
    ) -> Result<()>;
}
