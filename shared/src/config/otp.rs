//! One-time passcode configuration

use serde::{Deserialize, Serialize};

/// Default number of digits in a code
pub const DEFAULT_CODE_LENGTH: usize = 6;

/// Default challenge lifetime (5 minutes)
pub const DEFAULT_TTL_SECONDS: u64 = 300;

/// Default number of wrong guesses allowed per challenge
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Settings for code generation and the challenge lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct OtpConfig {
    /// Number of digits in every issued code
    #[serde(default = "default_code_length")]
    pub code_length: usize,

    /// Seconds a challenge stays valid after issuance
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u64,

    /// Failed comparisons allowed before the challenge is burned
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Run the periodic expiry sweep
    #[serde(default = "default_sweep_enabled")]
    pub sweep_enabled: bool,

    /// Seconds between sweep passes
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            code_length: DEFAULT_CODE_LENGTH,
            ttl_seconds: DEFAULT_TTL_SECONDS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            sweep_enabled: default_sweep_enabled(),
            sweep_interval_seconds: default_sweep_interval(),
        }
    }
}

impl OtpConfig {
    /// Override the challenge lifetime
    pub fn with_ttl_seconds(mut self, ttl_seconds: u64) -> Self {
        self.ttl_seconds = ttl_seconds;
        self
    }

    /// Override the attempt budget
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }
}

fn default_code_length() -> usize {
    DEFAULT_CODE_LENGTH
}

fn default_ttl_seconds() -> u64 {
    DEFAULT_TTL_SECONDS
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_sweep_enabled() -> bool {
    true
}

fn default_sweep_interval() -> u64 {
    60
}
