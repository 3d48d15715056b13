//! Configuration for the verification engine

use chrono::Duration;

use otp_shared::config::OtpConfig;

use crate::domain::entities::challenge::{CODE_LENGTH, DEFAULT_TTL_SECONDS, MAX_ATTEMPTS};

/// Settings the engine applies to every challenge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationEngineConfig {
    /// Digits per code; also the accepted length on verification
    pub code_length: usize,
    /// Lifetime of an issued challenge
    pub ttl: Duration,
    /// Wrong guesses allowed per challenge
    pub max_attempts: u32,
}

impl Default for VerificationEngineConfig {
    fn default() -> Self {
        Self {
            code_length: CODE_LENGTH,
            ttl: Duration::seconds(DEFAULT_TTL_SECONDS as i64),
            max_attempts: MAX_ATTEMPTS,
        }
    }
}

impl VerificationEngineConfig {
    pub fn ttl_seconds(&self) -> u64 {
        self.ttl.num_seconds().max(0) as u64
    }
}

impl From<&OtpConfig> for VerificationEngineConfig {
    fn from(config: &OtpConfig) -> Self {
        Self {
            code_length: config.code_length,
            ttl: Duration::seconds(config.ttl_seconds as i64),
            max_attempts: config.max_attempts,
        }
    }
}
