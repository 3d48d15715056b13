//! State backends for challenges and rate windows
//!
//! The in-memory adapters are the default and suit a single process. The
//! Redis adapters (feature `redis-cache`) share state between processes and
//! survive restarts of the service.

pub mod memory_challenge_store;
pub mod memory_rate_limiter;

#[cfg(feature = "redis-cache")]
pub mod redis_challenge_store;
#[cfg(feature = "redis-cache")]
pub mod redis_client;
#[cfg(feature = "redis-cache")]
pub mod redis_rate_limiter;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use tracing::info;

use otp_core::services::verification::{ChallengeStore, IssuanceRateLimiter};
use otp_shared::config::{CacheBackend, CacheConfig, RateLimitConfig};

use crate::InfrastructureError;

pub use memory_challenge_store::MemoryChallengeStore;
pub use memory_rate_limiter::MemoryRateLimiter;

#[cfg(feature = "redis-cache")]
pub use redis_challenge_store::RedisChallengeStore;
#[cfg(feature = "redis-cache")]
pub use redis_client::RedisClient;
#[cfg(feature = "redis-cache")]
pub use redis_rate_limiter::RedisRateLimiter;

/// Challenge store and rate limiter sharing one backend
#[derive(Clone)]
pub struct StateBackends {
    pub store: Arc<dyn ChallengeStore>,
    pub limiter: Arc<dyn IssuanceRateLimiter>,
}

impl StateBackends {
    /// Fresh in-process state
    pub fn in_memory(rate_limit: &RateLimitConfig) -> Self {
        Self {
            store: Arc::new(MemoryChallengeStore::new()),
            limiter: Arc::new(MemoryRateLimiter::new(rate_limit)),
        }
    }
}

/// Build the configured state backends
///
/// Connecting to Redis happens here, with the configured retries, so a
/// misconfigured deployment fails at startup rather than on first request.
pub async fn build_state_backends(
    cache: &CacheConfig,
    rate_limit: &RateLimitConfig,
) -> Result<StateBackends, InfrastructureError> {
    match cache.backend {
        CacheBackend::Memory => {
            info!(backend = "memory", "Using in-process challenge state");
            Ok(StateBackends::in_memory(rate_limit))
        }
        #[cfg(feature = "redis-cache")]
        CacheBackend::Redis => {
            let client = RedisClient::new(cache).await?;
            info!(backend = "redis", prefix = %cache.key_prefix, "Using Redis challenge state");
            Ok(StateBackends {
                store: Arc::new(RedisChallengeStore::new(client.clone())),
                limiter: Arc::new(RedisRateLimiter::new(client, rate_limit)),
            })
        }
        #[cfg(not(feature = "redis-cache"))]
        CacheBackend::Redis => Err(InfrastructureError::Config(
            "Redis backend requested but the `redis-cache` feature is disabled".to_string(),
        )),
    }
}
