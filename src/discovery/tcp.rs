//! TCP service pool: host lookup plus a framed TCP session to the gateway

use super::pool::{ServicePool, ServiceRecord};
use crate::client::{GatewayClient, GatewayConnection};
use crate::config::GatewayConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use tokio::net::lookup_host;
use tracing::{debug, warn};

/// Resolves the configured gateway address and connects to it over TCP
pub struct TcpServicePool {
    config: GatewayConfig,
}

impl TcpServicePool {
    pub fn new(config: GatewayConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ServicePool for TcpServicePool {
    type Connection = GatewayConnection;
    type Client = GatewayClient;

    async fn lookup(
        &self,
        service: &str,
        address: &str,
        max_results: usize,
    ) -> Result<Vec<ServiceRecord>> {
        let addrs = lookup_host(address)
            .await
            .map_err(|e| Error::Connection(format!("Cannot resolve {}: {}", address, e)))?;

        let records: Vec<ServiceRecord> = addrs
            .take(max_results)
            .map(|addr| ServiceRecord {
                service: service.to_string(),
                host: address.to_string(),
                addr,
            })
            .collect();
        debug!("Lookup of {} returned {} record(s)", address, records.len());

        Ok(records)
    }

    async fn connect(&self, record: &ServiceRecord) -> Result<GatewayConnection> {
        GatewayConnection::open(record.addr, &self.config).await
    }

    fn new_client(&self, service: &str, connection: GatewayConnection) -> Option<GatewayClient> {
        if connection.service() != service {
            warn!(
                "Gateway at {} advertises {:?}, expected {:?}",
                connection.peer(),
                connection.service(),
                service
            );
            return None;
        }
        Some(GatewayClient::new(connection, &self.config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::GatewayLocator;
    use futures::{SinkExt, StreamExt};
    use mihome_shared::codec::EnvelopeCodec;
    use mihome_shared::{limits, Envelope, Payload, Response};
    use std::net::SocketAddr;
    use std::sync::Arc;
    use tokio::net::TcpListener;
    use tokio_util::codec::Framed;

    /// Gateway that advertises `service` and answers every request
    async fn gateway(service: &'static str) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut wire = Framed::new(socket, EnvelopeCodec);
                    wire.send(Envelope::hello(service)).await.expect("write hello");
                    while let Some(Ok(envelope)) = wire.next().await {
                        if let Some(Payload::Request(_)) = envelope.payload {
                            let response = Envelope::response(envelope.id, Response::ok());
                            if wire.send(response).await.is_err() {
                                return;
                            }
                        }
                    }
                });
            }
        });
        addr
    }

    fn locator(addr: SocketAddr) -> GatewayLocator<TcpServicePool> {
        let config = GatewayConfig {
            address: addr.to_string(),
            ..GatewayConfig::default()
        };
        GatewayLocator::new(TcpServicePool::new(config.clone()), config)
    }

    #[tokio::test]
    async fn test_lookup_literal_address() {
        let pool = TcpServicePool::new(GatewayConfig::default());
        let records = pool
            .lookup("sensors.MiHome", "127.0.0.1:8765", 1)
            .await
            .expect("lookup");

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].addr, ([127, 0, 0, 1], 8765).into());
        assert_eq!(records[0].service, "sensors.MiHome");
    }

    #[tokio::test]
    async fn test_lookup_rejects_malformed_address() {
        let pool = TcpServicePool::new(GatewayConfig::default());
        let result = pool.lookup("sensors.MiHome", "no port here", 1).await;
        assert!(matches!(result, Err(Error::Connection(_))));
    }

    #[tokio::test]
    async fn test_get_client_over_tcp_is_cached() {
        let locator = locator(gateway(limits::SERVICE_NAME).await);

        let first = locator.get_client().await.expect("client");
        let second = locator.get_client().await.expect("cached client");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.peer(), locator.config().address.parse::<SocketAddr>().expect("addr"));
    }

    #[tokio::test]
    async fn test_wrong_service_is_refused() {
        let locator = locator(gateway("sensors.Other").await);

        match locator.get_client().await {
            Err(Error::Connection(message)) => {
                assert!(message.contains(limits::SERVICE_NAME), "{}", message)
            }
            Err(e) => panic!("expected connection failure, got {}", e),
            Ok(_) => panic!("client created for the wrong service"),
        }
        assert!(locator.cached().is_none());
    }
}
