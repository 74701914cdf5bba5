//! Gateway discovery and the cached client
//!
//! This module handles:
//! - Resolving the gateway address into service records
//! - Connecting to the first record and checking the advertised service
//! - Caching the single live client for the lifetime of the process

mod locator;
mod pool;
mod tcp;

pub use locator::GatewayLocator;
pub use pool::{ServicePool, ServiceRecord};
pub use tcp::TcpServicePool;
