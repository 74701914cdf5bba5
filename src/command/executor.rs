//! Command executor - dispatches parsed commands to their handlers

use super::context::ContextManager;
use super::handlers;
use super::Command;
use crate::capability::{Gpio, RadioControl};
use crate::error::Result;
use mihome_shared::ReceiveMode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Per-process application state shared by the command handlers
pub struct App {
    radio: Arc<dyn RadioControl>,
    gpio: Arc<dyn Gpio>,
    contexts: ContextManager,
}

impl App {
    /// Create a new application over the radio and GPIO capabilities
    pub fn new(radio: Arc<dyn RadioControl>, gpio: Arc<dyn Gpio>) -> Self {
        Self {
            radio,
            gpio,
            contexts: ContextManager::new(),
        }
    }

    /// End receive commands when `shutdown` is cancelled
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.contexts = ContextManager::with_parent(shutdown);
        self
    }

    pub fn radio(&self) -> &dyn RadioControl {
        self.radio.as_ref()
    }

    pub fn gpio(&self) -> &dyn Gpio {
        self.gpio.as_ref()
    }

    /// Cancel any running receive and hand out a fresh context
    pub fn new_context(&mut self) -> CancellationToken {
        self.contexts.new_context()
    }

    /// Cancel the running receive, if any
    pub fn cancel(&mut self) {
        self.contexts.cancel();
    }

    /// Execute a command; handler errors are returned unchanged
    pub async fn execute(&mut self, command: Command) -> Result<()> {
        info!("{}", command.name());

        match command {
            Command::ResetGpio => handlers::reset_gpio(self).await,
            Command::ResetRadio => handlers::reset_radio(self).await,
            Command::MeasureTemp => {
                let celsius = handlers::measure_temp(self).await?;
                println!("Temperature={}\u{00B0}C", celsius);
                Ok(())
            }
            Command::On(sockets) => handlers::transmit_on(self, &sockets).await,
            Command::Off(sockets) => handlers::transmit_off(self, &sockets).await,
            Command::ReceiveOok => handlers::receive(self, ReceiveMode::Control).await,
            Command::ReceiveFsk => handlers::receive(self, ReceiveMode::Monitor).await,
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.contexts.cancel();
    }
}
