//! Shared utilities and common types for the OTP authentication server
//!
//! This crate provides common functionality used across all server modules:
//! - Configuration types and the layered loader
//! - The API error envelope and error codes
//! - Phone formatting helpers (stripping, masking)

pub mod config;
pub mod errors;
pub mod utils;

// Re-export commonly used items at crate root
pub use crate::config::{
    AppConfig, CacheBackend, CacheConfig, ConfigError, Environment, IdentityConfig, LogFormat,
    LoggingConfig, OtpConfig, PhoneConfig, RateLimitConfig, RateRule, RegionRule, ServerConfig,
    SmsConfig, SmsProviderKind,
};
pub use crate::errors::{error_codes, ErrorResponse};
pub use crate::utils::phone::{mask_phone_number, strip_formatting};
