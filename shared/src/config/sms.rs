//! SMS delivery configuration

use serde::{Deserialize, Serialize};

/// SMS provider selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SmsProviderKind {
    /// Log messages instead of sending them
    Mock,
    /// Twilio Programmable Messaging
    Twilio,
}

/// SMS delivery configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SmsConfig {
    /// Which provider sends the messages
    pub provider: SmsProviderKind,

    /// Provider account identifier (Twilio account SID)
    #[serde(default)]
    pub account_id: String,

    /// Provider secret (Twilio auth token)
    #[serde(default)]
    pub auth_token: String,

    /// Sender number in E.164 format
    #[serde(default)]
    pub from_number: String,

    /// Override for the provider API base URL
    #[serde(default)]
    pub api_base_url: Option<String>,

    /// Message body; `{code}` and `{minutes}` are substituted
    #[serde(default = "default_template")]
    pub message_template: String,

    /// Pending deliveries buffered before new ones are dropped
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Send attempts per message
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Deliveries the worker runs concurrently
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,

    /// Initial retry delay, doubled after each failure
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Provider request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for SmsConfig {
    fn default() -> Self {
        Self {
            provider: SmsProviderKind::Mock,
            account_id: String::new(),
            auth_token: String::new(),
            from_number: String::new(),
            api_base_url: None,
            message_template: default_template(),
            queue_capacity: default_queue_capacity(),
            max_retries: default_max_retries(),
            max_in_flight: default_max_in_flight(),
            retry_delay_ms: default_retry_delay_ms(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl SmsConfig {
    /// Render the message body for a code
    pub fn render_message(&self, code: &str, ttl_seconds: u64) -> String {
        let minutes = ttl_seconds.div_ceil(60).max(1);
        self.message_template
            .replace("{code}", code)
            .replace("{minutes}", &minutes.to_string())
    }
}

fn default_template() -> String {
    String::from("Your Krishi Bazaar verification code is {code}. It expires in {minutes} minutes. Do not share it with anyone.")
}

fn default_queue_capacity() -> usize {
    1024
}

fn default_max_retries() -> u32 {
    3
}

fn default_max_in_flight() -> usize {
    16
}

fn default_retry_delay_ms() -> u64 {
    500
}

fn default_request_timeout() -> u64 {
    10
}
