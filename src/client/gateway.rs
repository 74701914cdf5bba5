//! Typed gateway client
//!
//! Implements every capability over one [`GatewayConnection`], so the same
//! cached client serves the receive coordinator and the command handlers.

use super::connection::GatewayConnection;
use crate::capability::{Gpio, MessageSource, RadioControl};
use crate::config::GatewayConfig;
use crate::error::{Error, Result};
use crate::message::Message;
use crate::stream;
use async_trait::async_trait;
use mihome_shared::{Command, Empty, PinMode, ReceiveMode, SetPinMode, Sockets, StartReceive};
use std::net::SocketAddr;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub struct GatewayClient {
    connection: GatewayConnection,
    channel_capacity: usize,
}

impl GatewayClient {
    pub fn new(connection: GatewayConnection, config: &GatewayConfig) -> Self {
        Self {
            connection,
            channel_capacity: config.channel_capacity,
        }
    }

    /// Remote address of the gateway
    pub fn peer(&self) -> SocketAddr {
        self.connection.peer()
    }

    async fn send(&self, command: Command) -> Result<()> {
        self.connection.call(command).await.map(drop)
    }
}

#[async_trait]
impl MessageSource for GatewayClient {
    async fn ping(&self) -> Result<()> {
        self.send(Command::Ping(Empty {})).await
    }

    async fn receive(
        &self,
        mode: ReceiveMode,
        stop: CancellationToken,
        messages: mpsc::Sender<Message>,
    ) -> Result<()> {
        self.connection.subscribe(messages).await;

        let start = Command::Receive(StartReceive { mode: mode.into() });
        if let Err(e) = self.send(start).await {
            self.connection.unsubscribe().await;
            return Err(e);
        }
        info!("Receiving from {} (mode {})", self.peer(), mode);

        let result = tokio::select! {
            () = stop.cancelled() => {
                debug!("Receive stopped, ending subscription");
                self.send(Command::StopReceive(Empty {})).await
            }
            () = self.connection.closed() => {
                Err(Error::StreamClosed(format!("session to {} ended", self.peer())))
            }
        };

        self.connection.unsubscribe().await;
        result
    }
}

#[async_trait]
impl RadioControl for GatewayClient {
    async fn reset_radio(&self) -> Result<()> {
        self.send(Command::ResetRadio(Empty {})).await
    }

    async fn measure_temperature(&self) -> Result<f32> {
        let response = self
            .connection
            .call(Command::MeasureTemperature(Empty {}))
            .await?;
        response
            .celsius
            .ok_or_else(|| Error::Domain("Gateway returned no temperature".into()))
    }

    async fn on(&self, sockets: &[u32]) -> Result<()> {
        self.send(Command::On(Sockets {
            sockets: sockets.to_vec(),
        }))
        .await
    }

    async fn off(&self, sockets: &[u32]) -> Result<()> {
        self.send(Command::Off(Sockets {
            sockets: sockets.to_vec(),
        }))
        .await
    }

    async fn receive(&self, ctx: CancellationToken, mode: ReceiveMode) -> Result<()> {
        let (tx, rx) = mpsc::channel(self.channel_capacity);
        let consumer = tokio::spawn(stream::consume(rx, stream::log_message));

        let result = MessageSource::receive(self, mode, ctx, tx).await;
        stream::join_consumer(consumer).await;
        result
    }
}

#[async_trait]
impl Gpio for GatewayClient {
    async fn set_pin_mode(&self, pin: u32, mode: PinMode) -> Result<()> {
        self.send(Command::SetPinMode(SetPinMode {
            pin,
            mode: mode.into(),
        }))
        .await
    }
}
