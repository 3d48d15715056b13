//! # Infrastructure Layer
//!
//! Concrete implementations of the collaborator traits defined in `otp_core`:
//! where challenges and rate windows live, and how codes reach a handset.
//!
//! ## Architecture
//!
//! The infrastructure layer contains:
//! - **Cache**: in-memory (default) and Redis-backed challenge stores and rate limiters
//! - **SMS**: SMS providers (mock, Twilio) and the queued delivery gateway
//!
//! ## Features
//!
//! - `redis-cache`: Enable the Redis-backed state adapters (default)

pub mod cache;
pub mod sms;

pub use cache::{build_state_backends, MemoryChallengeStore, MemoryRateLimiter, StateBackends};
pub use sms::{
    create_sms_provider, spawn_delivery_worker, ChannelDeliveryGateway, DeliveryWorkerConfig,
    MockSmsProvider, SmsProvider,
};

#[cfg(feature = "redis-cache")]
pub use cache::{RedisChallengeStore, RedisClient, RedisRateLimiter};

use otp_core::DomainError;

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// Redis cache error
    #[cfg(feature = "redis-cache")]
    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    /// HTTP request error for external services
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// SMS service error; may succeed on retry
    #[error("SMS service error: {0}")]
    Sms(String),

    /// The provider refused the message outright; retrying will not help
    #[error("SMS rejected: {0}")]
    SmsRejected(String),
}

impl InfrastructureError {
    /// Whether a delivery failure is worth another attempt
    pub fn is_retriable(&self) -> bool {
        !matches!(self, InfrastructureError::SmsRejected(_) | InfrastructureError::Config(_))
    }

    /// Map into the core's store-unavailable category
    pub fn into_store_error(self) -> DomainError {
        DomainError::store(self.to_string())
    }

    /// Map into the core's limiter-unavailable category
    pub fn into_limiter_error(self) -> DomainError {
        DomainError::rate_limiter(self.to_string())
    }
}

impl From<InfrastructureError> for DomainError {
    fn from(error: InfrastructureError) -> Self {
        match error {
            InfrastructureError::Config(message) => DomainError::Configuration { message },
            other => DomainError::Internal {
                message: other.to_string(),
            },
        }
    }
}
