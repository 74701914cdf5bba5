//! Gateway locator with a single-flight client cache

use super::pool::ServicePool;
use crate::capability::MessageSource;
use crate::config::GatewayConfig;
use crate::error::{Error, Result};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Locates the gateway once and hands out the same client afterwards
///
/// Concurrent first callers share one discovery; a failed attempt leaves the
/// cache empty so the next call tries again.
pub struct GatewayLocator<P: ServicePool> {
    pool: P,
    config: GatewayConfig,
    client: OnceCell<Arc<P::Client>>,
}

impl<P: ServicePool> GatewayLocator<P> {
    /// Create a new locator over a service pool
    pub fn new(pool: P, config: GatewayConfig) -> Self {
        Self {
            pool,
            config,
            client: OnceCell::new(),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// The cached client, if discovery has already succeeded
    pub fn cached(&self) -> Option<Arc<P::Client>> {
        self.client.get().cloned()
    }

    /// Return the cached client, discovering and connecting on first use
    pub async fn get_client(&self) -> Result<Arc<P::Client>> {
        self.client
            .get_or_try_init(|| self.discover())
            .await
            .map(Arc::clone)
    }

    async fn discover(&self) -> Result<Arc<P::Client>> {
        let config = &self.config;
        debug!(
            "Looking up {} at {} (timeout {:?})",
            config.service, config.address, config.discovery_timeout
        );

        let lookup = self.pool.lookup(&config.service, &config.address, 1);
        let records = match timeout(config.discovery_timeout, lookup).await {
            Ok(result) => result?,
            Err(_) => return Err(Error::DiscoveryTimeout(config.discovery_timeout)),
        };

        // Only the first record is used, there is no fallback between records
        let record = records
            .into_iter()
            .next()
            .ok_or(Error::DiscoveryTimeout(config.discovery_timeout))?;
        info!("Found {} at {}", record.service, record.addr);

        let connection = self.pool.connect(&record).await?;
        let client = self
            .pool
            .new_client(&config.service, connection)
            .ok_or_else(|| {
                warn!("{} does not serve {}", record.addr, config.service);
                Error::Connection(format!(
                    "{} is not a {} service",
                    record.addr, config.service
                ))
            })?;

        client
            .ping()
            .await
            .map_err(|e| Error::Liveness(Box::new(e)))?;
        info!("Connected to gateway at {}", record.addr);

        Ok(Arc::new(client))
    }
}
