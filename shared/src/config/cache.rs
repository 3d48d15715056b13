//! State backend configuration module

use serde::{Deserialize, Serialize};

/// Where challenge and rate-limit state lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// Process memory; state is lost on restart and not shared between processes
    Memory,
    /// Shared Redis instance
    Redis,
}

/// State backend configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Selected backend
    pub backend: CacheBackend,

    /// Redis connection URL
    #[serde(default = "default_url")]
    pub url: String,

    /// Prefix prepended to every Redis key
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Connection attempts before giving up at startup
    #[serde(default = "default_connect_retries")]
    pub connect_retries: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Memory,
            url: default_url(),
            key_prefix: default_key_prefix(),
            connect_retries: default_connect_retries(),
        }
    }
}

impl CacheConfig {
    /// Redis-backed configuration for the given URL
    pub fn redis(url: impl Into<String>) -> Self {
        Self {
            backend: CacheBackend::Redis,
            url: url.into(),
            ..Default::default()
        }
    }
}

fn default_url() -> String {
    String::from("redis://localhost:6379")
}

fn default_key_prefix() -> String {
    String::from("otp")
}

fn default_connect_retries() -> u32 {
    3
}
