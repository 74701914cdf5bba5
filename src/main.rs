use mihome::command::{self, App, Command};
use mihome::{GatewayConfig, GatewayLocator, TcpServicePool};
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let (config, args) = GatewayConfig::from_env_and_args(std::env::args().skip(1));

    // Usage errors are reported before touching the network
    let command = match Command::parse(&args) {
        Ok(command) => command,
        Err(e) if e.is_help() => {
            usage(&e.to_string());
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    info!("Gateway address: {}", config.address);
    let locator = GatewayLocator::new(TcpServicePool::new(config.clone()), config);
    let client = match locator.get_client().await {
        Ok(client) => client,
        Err(e) => {
            error!("Cannot reach gateway: {}", e);
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // CTRL+C ends a receive; other commands keep the default SIGINT exit
    let shutdown = CancellationToken::new();
    if command.is_streaming() {
        tokio::spawn({
            let shutdown = shutdown.clone();
            async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("Interrupted");
                    shutdown.cancel();
                }
            }
        });
    }

    let mut app = App::new(client.clone(), client).with_shutdown(shutdown);

    match app.execute(command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is_help() => {
            usage(&e.to_string());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn usage(reason: &str) {
    eprintln!("{}", reason);
    eprintln!(
        "Usage: mihome [--addr <host:port>] <command> [args...]\n\
         The gateway address can also be set with {}.\n",
        mihome::config::ADDR_ENV
    );
    let _ = command::print_commands(&mut std::io::stderr());
}
