use mihome::{stream, GatewayConfig, GatewayLocator, TcpServicePool};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let (config, args) = GatewayConfig::from_env_and_args(std::env::args().skip(1));
    if !args.is_empty() {
        eprintln!(
            "Usage: mihome-client [--addr <host:port>]\n\
             Streams gateway messages until CTRL+C. The address can also be set with {}.",
            mihome::config::ADDR_ENV
        );
        return ExitCode::SUCCESS;
    }

    info!("Gateway address: {}", config.address);
    let locator = Arc::new(GatewayLocator::new(
        TcpServicePool::new(config.clone()),
        config,
    ));

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Cannot listen for CTRL+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    match stream::listen(locator, shutdown).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
