//! Error types for the OTP core.
//!
//! Only infrastructure failures are errors here. Wrong codes, expiry, rate
//! limiting and malformed input are ordinary outcomes and live in
//! [`crate::domain::value_objects::outcome`].

use thiserror::Error;

/// Infrastructure failures surfaced by the core
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Challenge store unavailable: {message}")]
    Store { message: String },

    #[error("Rate limiter unavailable: {message}")]
    RateLimiter { message: String },

    #[error("Code generation failed: {message}")]
    CodeGeneration { message: String },

    #[error("Identity issuer failed: {message}")]
    IdentityIssuer { message: String },

    #[error("Invalid configuration: {message}")]
    Configuration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn store(message: impl Into<String>) -> Self {
        DomainError::Store { message: message.into() }
    }

    pub fn rate_limiter(message: impl Into<String>) -> Self {
        DomainError::RateLimiter { message: message.into() }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        DomainError::Configuration { message: message.into() }
    }

    /// Whether the failure comes from shared state that may recover on retry
    pub fn is_unavailable(&self) -> bool {
        matches!(self, DomainError::Store { .. } | DomainError::RateLimiter { .. })
    }

    /// Stable error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::Store { .. } => "STORE_UNAVAILABLE",
            DomainError::RateLimiter { .. } => "RATE_LIMITER_UNAVAILABLE",
            DomainError::CodeGeneration { .. } => "CODE_GENERATION_FAILED",
            DomainError::IdentityIssuer { .. } => "IDENTITY_ISSUER_FAILED",
            DomainError::Configuration { .. } => "CONFIGURATION_ERROR",
            DomainError::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
