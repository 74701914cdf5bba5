//! Error types for the gateway client

use mihome_shared::codec::CodecError;
use std::num::ParseIntError;
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by discovery, the gateway session and command dispatch
#[derive(Error, Debug)]
pub enum Error {
    /// Discovery found no service record within the bound
    #[error("No gateway service found within {0:?}")]
    DiscoveryTimeout(Duration),

    /// Transport connect or client construction failed
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The gateway did not answer the ping that follows connecting
    #[error("Gateway is not responding: {0}")]
    Liveness(#[source] Box<Error>),

    /// Unknown command or wrong argument count; the caller shows usage
    #[error("{0}")]
    Help(String),

    /// A socket identifier is not a non-negative integer
    #[error("Invalid socket {value:?}: expected a non-negative integer")]
    ArgumentFormat {
        value: String,
        #[source]
        source: Option<ParseIntError>,
    },

    /// The radio or GPIO reported a failure executing a command
    #[error("{0}")]
    Domain(String),

    #[error("No response to {0} request")]
    RequestTimeout(&'static str),

    #[error("Receive stream closed: {0}")]
    StreamClosed(String),

    #[error("Protocol error: {0}")]
    Codec(#[from] CodecError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for the usage signal, which is not a real failure
    pub fn is_help(&self) -> bool {
        matches!(self, Error::Help(_))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
