//! Gateway session and typed client
//!
//! This module handles:
//! - One framed TCP session per gateway, opened with a hello exchange
//! - Request/response correlation by request id
//! - Routing pushed events to the active receive subscription

mod connection;
mod gateway;

pub use connection::GatewayConnection;
pub use gateway::GatewayClient;
