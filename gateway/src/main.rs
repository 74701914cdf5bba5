mod radio;
mod session;

use mihome_shared::limits;
use radio::SimulatedRadio;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable holding the listen address
const LISTEN_ENV: &str = "MIHOME_GATEWAY_LISTEN";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let listen = std::env::var(LISTEN_ENV)
        .unwrap_or_else(|_| format!("0.0.0.0:{}", limits::DEFAULT_PORT));
    let listener = TcpListener::bind(&listen).await?;
    info!("Gateway serving {} on {}", limits::SERVICE_NAME, listen);

    let radio = Arc::new(SimulatedRadio::new());

    loop {
        let (socket, addr) = listener.accept().await?;
        info!("Connection from: {}", addr);

        let radio = radio.clone();
        tokio::spawn(async move {
            match session::serve(socket, radio).await {
                Ok(()) => info!("Client disconnected: {}", addr),
                Err(e) => error!("Session with {} failed: {}", addr, e),
            }
        });
    }
}
