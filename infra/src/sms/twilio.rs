//! Twilio SMS provider
//!
//! Sends messages through the Twilio Programmable Messaging REST API with a
//! plain HTTP client. One call is one attempt; retries belong to the delivery
//! worker, which is told through the error variant whether to try again.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use otp_shared::config::SmsConfig;
use otp_shared::mask_phone_number;

use super::sms_provider::SmsProvider;
use crate::InfrastructureError;

const DEFAULT_API_BASE_URL: &str = "https://api.twilio.com";

/// Twilio credentials and endpoint
#[derive(Debug, Clone)]
pub struct TwilioConfig {
    /// Twilio Account SID
    pub account_sid: String,
    /// Twilio Auth Token
    pub auth_token: String,
    /// Sender number (must be a Twilio number, E.164)
    pub from_number: String,
    /// API root, overridable for tests and regional endpoints
    pub api_base_url: String,
    /// Timeout for API requests
    pub request_timeout: Duration,
}

impl TwilioConfig {
    /// Extract and validate Twilio settings from the SMS configuration
    pub fn from_sms_config(config: &SmsConfig) -> Result<Self, InfrastructureError> {
        if config.account_id.trim().is_empty() {
            return Err(InfrastructureError::Config(
                "Twilio account SID is not set".to_string(),
            ));
        }
        if config.auth_token.trim().is_empty() {
            return Err(InfrastructureError::Config(
                "Twilio auth token is not set".to_string(),
            ));
        }
        if !config.from_number.starts_with('+') {
            return Err(InfrastructureError::Config(
                "Twilio from number must be in E.164 format (starting with '+')".to_string(),
            ));
        }

        Ok(Self {
            account_sid: config.account_id.clone(),
            auth_token: config.auth_token.clone(),
            from_number: config.from_number.clone(),
            api_base_url: config
                .api_base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        })
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_base_url.trim_end_matches('/'),
            self.account_sid
        )
    }
}

#[derive(Debug, Deserialize)]
struct MessageResource {
    sid: String,
}

#[derive(Debug, Deserialize)]
struct TwilioErrorBody {
    code: Option<i64>,
    message: Option<String>,
}

/// Twilio SMS provider
pub struct TwilioSmsProvider {
    http: reqwest::Client,
    config: TwilioConfig,
}

impl TwilioSmsProvider {
    pub fn new(config: TwilioConfig) -> Result<Self, InfrastructureError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        info!(
            from = %mask_phone_number(&config.from_number),
            "Twilio SMS provider initialized"
        );

        Ok(Self { http, config })
    }

    pub fn from_sms_config(config: &SmsConfig) -> Result<Self, InfrastructureError> {
        Self::new(TwilioConfig::from_sms_config(config)?)
    }
}

/// 429 and 5xx are transient; any other non-success status is a refusal
pub(crate) fn classify_status(status: reqwest::StatusCode, detail: String) -> InfrastructureError {
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        InfrastructureError::Sms(format!("Twilio returned {}: {}", status, detail))
    } else {
        InfrastructureError::SmsRejected(format!("Twilio returned {}: {}", status, detail))
    }
}

#[async_trait]
impl SmsProvider for TwilioSmsProvider {
    async fn send_sms(
        &self,
        phone_number: &str,
        message: &str,
    ) -> Result<String, InfrastructureError> {
        debug!(phone = %mask_phone_number(phone_number), "Sending SMS via Twilio");

        let response = self
            .http
            .post(self.config.messages_url())
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&[
                ("To", phone_number),
                ("From", self.config.from_number.as_str()),
                ("Body", message),
            ])
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let resource: MessageResource = response.json().await?;
            info!(
                phone = %mask_phone_number(phone_number),
                sid = %resource.sid,
                "SMS accepted by Twilio"
            );
            return Ok(resource.sid);
        }

        let detail = match response.json::<TwilioErrorBody>().await {
            Ok(body) => format!(
                "{} (code {})",
                body.message.unwrap_or_default(),
                body.code.map(|c| c.to_string()).unwrap_or_else(|| "-".to_string())
            ),
            Err(_) => "unreadable error body".to_string(),
        };
        warn!(
            phone = %mask_phone_number(phone_number),
            status = %status,
            "Twilio refused SMS"
        );
        Err(classify_status(status, detail))
    }

    fn provider_name(&self) -> &str {
        "twilio"
    }
}
