//! Gateway client configuration

use mihome_shared::limits;
use std::time::Duration;

/// Environment variable holding the gateway address
pub const ADDR_ENV: &str = "MIHOME_GATEWAY_ADDR";

/// Configuration for locating and talking to the gateway
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Gateway address (`host:port`); a bare host gets the default port
    pub address: String,
    /// Service type the gateway must advertise
    pub service: String,
    /// Upper bound on discovery
    pub discovery_timeout: Duration,
    /// TCP connect timeout
    pub connect_timeout: Duration,
    /// How long to wait for a single response
    pub request_timeout: Duration,
    /// Capacity of the message channel between receiver and consumer
    pub channel_capacity: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            address: format!("127.0.0.1:{}", limits::DEFAULT_PORT),
            service: limits::SERVICE_NAME.into(),
            discovery_timeout: Duration::from_millis(limits::DISCOVERY_TIMEOUT_MS),
            connect_timeout: Duration::from_secs(2),
            request_timeout: Duration::from_millis(limits::REQUEST_TIMEOUT_MS),
            channel_capacity: 64,
        }
    }
}

impl GatewayConfig {
    /// Build a configuration from the process environment and arguments
    ///
    /// `--addr <host:port>` (also `-addr` and `--addr=`) is removed from the
    /// returned positional arguments and wins over the environment.
    pub fn from_env_and_args<I>(args: I) -> (Self, Vec<String>)
    where
        I: IntoIterator<Item = String>,
    {
        let env_addr = std::env::var(ADDR_ENV).ok();
        Self::resolve(env_addr, args)
    }

    fn resolve<I>(env_addr: Option<String>, args: I) -> (Self, Vec<String>)
    where
        I: IntoIterator<Item = String>,
    {
        let mut config = Self::default();
        if let Some(addr) = env_addr.filter(|a| !a.is_empty()) {
            config.address = addr;
        }

        let mut positional = Vec::new();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            if arg == "--addr" || arg == "-addr" {
                if let Some(addr) = args.next() {
                    config.address = addr;
                }
            } else if let Some(addr) = arg
                .strip_prefix("--addr=")
                .or_else(|| arg.strip_prefix("-addr="))
            {
                config.address = addr.to_string();
            } else {
                positional.push(arg);
            }
        }

        config.address = with_default_port(&config.address);
        (config, positional)
    }
}

/// Append the default gateway port to an address that has none
fn with_default_port(address: &str) -> String {
    let port = limits::DEFAULT_PORT;
    if address.starts_with('[') {
        if address.contains("]:") {
            address.to_string()
        } else {
            format!("{}:{}", address, port)
        }
    } else if address.matches(':').count() > 1 {
        // Bare IPv6 literal
        format!("[{}]:{}", address, port)
    } else if address.contains(':') {
        address.to_string()
    } else {
        format!("{}:{}", address, port)
    }
}
