//! MiHome gateway shared protocol types
//!
//! This crate provides the wire messages and framing codec used between the
//! radio gateway service and the clients that command it.

pub mod codec;
pub mod proto;

use std::time::{SystemTime, UNIX_EPOCH};

// Re-export commonly used types at crate root
pub use proto::*;

/// Get current timestamp in milliseconds since Unix epoch
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Protocol parameters shared by both ends
pub mod limits {
    /// Service type advertised by the gateway in its hello frame
    pub const SERVICE_NAME: &str = "sensors.MiHome";

    /// Protocol version sent in the hello frame
    pub const PROTOCOL_VERSION: &str = "1";

    /// Default TCP port of the gateway service
    pub const DEFAULT_PORT: u16 = 8765;

    /// Upper bound on service discovery
    pub const DISCOVERY_TIMEOUT_MS: u64 = 100;

    /// Interval between keepalive events on an active subscription
    pub const KEEPALIVE_INTERVAL_MS: u64 = 1000;

    /// How long a client waits for the response to a single request
    pub const REQUEST_TIMEOUT_MS: u64 = 5000;
}

/// Builder helpers for creating frames
impl Envelope {
    /// Create the hello frame a gateway sends when a session opens
    pub fn hello(service: impl Into<String>) -> Self {
        Self {
            id: 0,
            timestamp_ms: now_ms(),
            payload: Some(Payload::Hello(Hello {
                service: service.into(),
                version: limits::PROTOCOL_VERSION.into(),
            })),
        }
    }

    /// Create a request frame
    pub fn request(id: u64, command: Command) -> Self {
        Self {
            id,
            timestamp_ms: now_ms(),
            payload: Some(Payload::Request(Request {
                command: Some(command),
            })),
        }
    }

    /// Create the response to request `id`
    pub fn response(id: u64, response: Response) -> Self {
        Self {
            id,
            timestamp_ms: now_ms(),
            payload: Some(Payload::Response(response)),
        }
    }

    /// Create a pushed event frame
    pub fn event(kind: EventKind) -> Self {
        Self {
            id: 0,
            timestamp_ms: now_ms(),
            payload: Some(Payload::Event(Event { kind: Some(kind) })),
        }
    }

    /// Create a keepalive event frame
    pub fn keepalive() -> Self {
        Self::event(EventKind::Keepalive(Empty {}))
    }
}

impl Response {
    /// Successful response without a value
    pub fn ok() -> Self {
        Self {
            error: String::new(),
            celsius: None,
        }
    }

    /// Successful temperature measurement
    pub fn temperature(celsius: f32) -> Self {
        Self {
            error: String::new(),
            celsius: Some(celsius),
        }
    }

    /// Failed request
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            celsius: None,
        }
    }

    /// True if the gateway reported an error
    pub fn is_error(&self) -> bool {
        !self.error.is_empty()
    }
}

impl Command {
    /// Name used when logging a request
    pub fn name(&self) -> &'static str {
        match self {
            Command::Ping(_) => "ping",
            Command::ResetRadio(_) => "reset_radio",
            Command::MeasureTemperature(_) => "measure_temperature",
            Command::On(_) => "on",
            Command::Off(_) => "off",
            Command::SetPinMode(_) => "set_pin_mode",
            Command::Receive(_) => "receive",
            Command::StopReceive(_) => "stop_receive",
        }
    }
}

impl std::fmt::Display for ReceiveMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReceiveMode::Unspecified => write!(f, "unspecified"),
            ReceiveMode::Control => write!(f, "OOK"),
            ReceiveMode::Monitor => write!(f, "FSK"),
        }
    }
}
