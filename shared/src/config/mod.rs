//! Configuration module with business-specific sub-modules
//!
//! This module organizes configuration into logical areas:
//! - `otp` - Code length, challenge lifetime and attempt budget
//! - `phone` - Accepted regions and leading-digit rules
//! - `rate_limit` - Issuance and verification limits
//! - `sms` - Delivery provider settings
//! - `identity` - Signing settings for the verified-identity token
//! - `cache` - Backend for challenge and rate-limit state
//! - `environment` - Environment detection and logging configuration
//! - `server` - HTTP server configuration
//!
//! Values are layered: built-in defaults, then an optional
//! `config.<environment>.toml`, then `AUTH__`-prefixed environment variables
//! (`AUTH__OTP__TTL_SECONDS=120`).

pub mod cache;
pub mod environment;
pub mod identity;
pub mod otp;
pub mod phone;
pub mod rate_limit;
pub mod server;
pub mod sms;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use cache::{CacheBackend, CacheConfig};
pub use environment::{Environment, LogFormat, LoggingConfig};
pub use identity::IdentityConfig;
pub use otp::OtpConfig;
pub use phone::{PhoneConfig, RegionRule};
pub use rate_limit::{RateLimitConfig, RateRule};
pub use server::ServerConfig;
pub use sms::{SmsConfig, SmsProviderKind};

/// Prefix for configuration environment variables
pub const ENV_PREFIX: &str = "AUTH";

/// Configuration loading and validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("Invalid configuration value for {field}: {reason}")]
    Invalid { field: String, reason: String },
}

impl ConfigError {
    fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Complete application configuration combining all sub-configurations
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub otp: OtpConfig,
    pub phone: PhoneConfig,
    pub rate_limit: RateLimitConfig,
    pub sms: SmsConfig,
    pub identity: IdentityConfig,
    pub cache: CacheConfig,
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::development()
    }
}

impl AppConfig {
    /// Create configuration for development environment
    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig::default(),
            otp: OtpConfig::default(),
            phone: PhoneConfig::default(),
            rate_limit: RateLimitConfig::development(),
            sms: SmsConfig::default(),
            identity: IdentityConfig::default(),
            cache: CacheConfig::default(),
            logging: LoggingConfig::for_environment(Environment::Development),
        }
    }

    /// Create configuration for production environment
    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig::new("0.0.0.0", 8080),
            otp: OtpConfig::default(),
            phone: PhoneConfig::default(),
            rate_limit: RateLimitConfig::production(),
            sms: SmsConfig::default(),
            identity: IdentityConfig::default(),
            cache: CacheConfig::default(),
            logging: LoggingConfig::for_environment(Environment::Production),
        }
    }

    /// Preset for an environment
    pub fn for_environment(env: Environment) -> Self {
        match env {
            Environment::Development => Self::development(),
            Environment::Production => Self::production(),
            Environment::Staging => {
                let mut config = Self::production();
                config.environment = Environment::Staging;
                config.logging = LoggingConfig::for_environment(Environment::Staging);
                config
            }
        }
    }

    /// Load configuration for the detected environment
    ///
    /// Reads `.env` if present, starts from the environment preset, overlays
    /// the optional environment config file and finally `AUTH__*` variables.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let env = Environment::from_env();
        let defaults = Self::for_environment(env);

        let loaded: AppConfig = ::config::Config::builder()
            .add_source(::config::Config::try_from(&defaults)?)
            .add_source(::config::File::with_name(env.config_file()).required(false))
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        loaded.validate()?;
        Ok(loaded)
    }

    /// Reject values the services cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.otp.code_length == 0 || self.otp.code_length > 9 {
            return Err(ConfigError::invalid("otp.code_length", "must be between 1 and 9"));
        }
        if self.otp.ttl_seconds == 0 {
            return Err(ConfigError::invalid("otp.ttl_seconds", "must be positive"));
        }
        if self.otp.max_attempts == 0 {
            return Err(ConfigError::invalid("otp.max_attempts", "must be positive"));
        }
        if self.otp.sweep_enabled && self.otp.sweep_interval_seconds == 0 {
            return Err(ConfigError::invalid(
                "otp.sweep_interval_seconds",
                "must be positive when the sweep is enabled",
            ));
        }

        for rule in self.rate_limit.all_rules() {
            if rule.limit == 0 || rule.window_seconds == 0 {
                return Err(ConfigError::invalid(
                    format!("rate_limit.{}", rule.name),
                    "limit and window_seconds must be positive",
                ));
            }
        }

        if self.phone.default_rule().is_none() {
            return Err(ConfigError::invalid(
                "phone.default_region",
                format!("no region rule named {}", self.phone.default_region),
            ));
        }
        for rule in &self.phone.regions {
            let digits_ok = !rule.country_code.is_empty()
                && rule.country_code.chars().all(|c| c.is_ascii_digit())
                && !rule.country_code.starts_with('0');
            if !digits_ok {
                return Err(ConfigError::invalid(
                    format!("phone.regions.{}", rule.region),
                    "country_code must be digits without a leading zero",
                ));
            }
            if rule.national_length == 0
                || rule.valid_leading_digits.is_empty()
                || !rule.valid_leading_digits.chars().all(|c| c.is_ascii_digit())
            {
                return Err(ConfigError::invalid(
                    format!("phone.regions.{}", rule.region),
                    "national_length and valid_leading_digits must be set",
                ));
            }
            // E.164 caps a full number at 15 digits
            if rule.country_code.len() + rule.national_length > 15 {
                return Err(ConfigError::invalid(
                    format!("phone.regions.{}", rule.region),
                    "country_code and national_length exceed 15 digits",
                ));
            }
        }

        if self.identity.secret.is_empty() {
            return Err(ConfigError::invalid("identity.secret", "must not be empty"));
        }
        if self.environment.is_production() && self.identity.is_using_default_secret() {
            return Err(ConfigError::invalid(
                "identity.secret",
                "the default secret cannot be used in production",
            ));
        }
        if self.identity.token_ttl_seconds <= 0 {
            return Err(ConfigError::invalid("identity.token_ttl_seconds", "must be positive"));
        }
        if self.sms.queue_capacity == 0 {
            return Err(ConfigError::invalid("sms.queue_capacity", "must be positive"));
        }
        if self.sms.max_in_flight == 0 {
            return Err(ConfigError::invalid("sms.max_in_flight", "must be positive"));
        }

        Ok(())
    }
}
