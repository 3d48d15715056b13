//! Rate limiting configuration module

use serde::{Deserialize, Serialize};

/// One counting window: at most `limit` events per `window_seconds`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RateRule {
    /// Rule name reported with denials ("cooldown", "hourly")
    pub name: String,

    /// Maximum events inside one window
    pub limit: u32,

    /// Window length in seconds
    pub window_seconds: u64,
}

impl RateRule {
    pub fn new(name: impl Into<String>, limit: u32, window_seconds: u64) -> Self {
        Self {
            name: name.into(),
            limit,
            window_seconds,
        }
    }
}

/// Rate limiting configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Enable rate limiting
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Issuance limits per phone number; always enforced when enabled
    #[serde(default = "default_phone_rules")]
    pub phone: Vec<RateRule>,

    /// Issuance limits per requester network address
    #[serde(default = "default_network_issue_rules")]
    pub network_issue: Vec<RateRule>,

    /// Verification call limits per requester network address
    #[serde(default = "default_network_verify_rules")]
    pub network_verify: Vec<RateRule>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            phone: default_phone_rules(),
            network_issue: default_network_issue_rules(),
            network_verify: default_network_verify_rules(),
        }
    }
}

impl RateLimitConfig {
    /// Create a development configuration (more lenient limits)
    pub fn development() -> Self {
        Self {
            enabled: true,
            phone: vec![
                RateRule::new("cooldown", 1, 10),
                RateRule::new("hourly", 20, 3600),
            ],
            network_issue: vec![RateRule::new("network", 1000, 900)],
            network_verify: vec![RateRule::new("network_verify", 1000, 900)],
        }
    }

    /// Create a production configuration (stricter limits)
    pub fn production() -> Self {
        Self::default()
    }

    /// Every configured rule, for validation
    pub fn all_rules(&self) -> impl Iterator<Item = &RateRule> {
        self.phone
            .iter()
            .chain(self.network_issue.iter())
            .chain(self.network_verify.iter())
    }
}

fn default_enabled() -> bool {
    true
}

fn default_phone_rules() -> Vec<RateRule> {
    vec![
        RateRule::new("cooldown", 1, 60),
        RateRule::new("hourly", 5, 3600),
    ]
}

fn default_network_issue_rules() -> Vec<RateRule> {
    vec![RateRule::new("network", 100, 900)]
}

fn default_network_verify_rules() -> Vec<RateRule> {
    vec![RateRule::new("network_verify", 60, 900)]
}
