//! Identity assertion (JWT) configuration

use serde::{Deserialize, Serialize};

const DEFAULT_SECRET: &str = "change-me-identity-secret";

/// Signing settings for the verified-phone identity token
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IdentityConfig {
    /// HMAC secret used to sign tokens
    pub secret: String,

    /// JWT issuer claim
    #[serde(default = "default_issuer")]
    pub issuer: String,

    /// JWT audience claim
    #[serde(default = "default_audience")]
    pub audience: String,

    /// Token lifetime in seconds
    #[serde(default = "default_token_ttl")]
    pub token_ttl_seconds: i64,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            secret: String::from(DEFAULT_SECRET),
            issuer: default_issuer(),
            audience: default_audience(),
            token_ttl_seconds: default_token_ttl(),
        }
    }
}

impl IdentityConfig {
    /// Create a configuration with the given secret
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ..Default::default()
        }
    }

    /// Check if using default secret (security warning)
    pub fn is_using_default_secret(&self) -> bool {
        self.secret == DEFAULT_SECRET
    }
}

fn default_issuer() -> String {
    String::from("krishibazaar-auth")
}

fn default_audience() -> String {
    String::from("krishibazaar-identity")
}

fn default_token_ttl() -> i64 {
    600
}
