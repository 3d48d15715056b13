//! Redis connection handling
//!
//! A multiplexed async connection established with bounded, backed-off
//! retries, plus key helpers shared by the Redis adapters.

use redis::{aio::MultiplexedConnection, Client, RedisError};
use sha2::{Digest, Sha256};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use otp_shared::config::CacheConfig;

use crate::InfrastructureError;

/// Base delay between connection attempts; doubled each time, capped at 5s
const CONNECT_RETRY_DELAY_MS: u64 = 100;

/// Redis client with connection retry and key namespacing
#[derive(Clone)]
pub struct RedisClient {
    connection: MultiplexedConnection,
    key_prefix: String,
}

impl RedisClient {
    /// Connect using the cache configuration
    ///
    /// # Arguments
    /// * `config` - Cache configuration (URL, key prefix, connect retries)
    ///
    /// # Returns
    /// * `Result<Self, InfrastructureError>` - Redis client or error
    pub async fn new(config: &CacheConfig) -> Result<Self, InfrastructureError> {
        info!(url = %mask_url(&config.url), "Creating Redis client");

        let client = Client::open(config.url.as_str()).map_err(|e| {
            error!("Failed to parse Redis URL: {}", e);
            InfrastructureError::Config(format!("Invalid Redis URL: {}", e))
        })?;

        let connection =
            Self::create_connection_with_retry(client, config.connect_retries.max(1)).await?;

        Ok(Self {
            connection,
            key_prefix: config.key_prefix.clone(),
        })
    }

    async fn create_connection_with_retry(
        client: Client,
        max_retries: u32,
    ) -> Result<MultiplexedConnection, InfrastructureError> {
        let mut attempts = 0;
        let mut delay = CONNECT_RETRY_DELAY_MS;

        loop {
            attempts += 1;
            debug!("Attempting to connect to Redis (attempt {})", attempts);

            match client.get_multiplexed_async_connection().await {
                Ok(connection) => {
                    info!("Successfully connected to Redis");
                    return Ok(connection);
                }
                Err(e) if attempts < max_retries && is_retriable_error(&e) => {
                    warn!(
                        "Failed to connect to Redis (attempt {}/{}): {}. Retrying in {}ms...",
                        attempts, max_retries, e, delay
                    );
                    sleep(Duration::from_millis(delay)).await;
                    delay = (delay * 2).min(5000);
                }
                Err(e) => {
                    error!("Failed to connect to Redis after {} attempts: {}", attempts, e);
                    return Err(InfrastructureError::Cache(e));
                }
            }
        }
    }

    /// Cheap handle to the shared multiplexed connection
    pub fn connection(&self) -> MultiplexedConnection {
        self.connection.clone()
    }

    /// `PING`; `true` when Redis answers
    pub async fn health_check(&self) -> Result<bool, InfrastructureError> {
        let mut conn = self.connection();
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(pong == "PONG")
    }

    /// Namespaced key: `<prefix>:<kind>:<id>`
    pub fn key(&self, kind: &str, id: &str) -> String {
        format!("{}:{}:{}", self.key_prefix, kind, id)
    }
}

/// SHA-256 of an identifier, so raw phone numbers never appear in key names
pub(crate) fn hash_identifier(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Hide credentials in a Redis URL for logging
pub(crate) fn mask_url(url: &str) -> String {
    if let Some(at_pos) = url.find('@') {
        if let Some(proto_end) = url.find("://") {
            let proto = &url[..proto_end + 3];
            let host_part = &url[at_pos..];
            return format!("{}****{}", proto, host_part);
        }
    }
    url.to_string()
}

/// Connection-level failures are worth retrying; protocol errors are not
pub(crate) fn is_retriable_error(error: &RedisError) -> bool {
    error.is_io_error() || error.is_connection_refusal() || error.is_timeout()
}
