//! Service pool abstraction for pluggable discovery and transport backends

use crate::capability::MessageSource;
use crate::error::Result;
use async_trait::async_trait;
use std::net::SocketAddr;

/// A discovered gateway endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRecord {
    /// Service type the record was looked up for
    pub service: String,
    /// Address as it was configured, before resolution
    pub host: String,
    pub addr: SocketAddr,
}

/// Discovery, transport and client construction for one kind of service
#[async_trait]
pub trait ServicePool: Send + Sync {
    /// Raw transport session produced by [`ServicePool::connect`]
    type Connection: Send;

    /// Typed client built over a connection
    type Client: MessageSource + 'static;

    /// Find at most `max_results` records for `service` at `address`
    async fn lookup(
        &self,
        service: &str,
        address: &str,
        max_results: usize,
    ) -> Result<Vec<ServiceRecord>>;

    /// Open a transport session to a record
    async fn connect(&self, record: &ServiceRecord) -> Result<Self::Connection>;

    /// Wrap a connection in a typed client; `None` if the session is not `service`
    fn new_client(&self, service: &str, connection: Self::Connection) -> Option<Self::Client>;
}
