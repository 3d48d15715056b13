//! Mock SMS provider
//!
//! Logs messages instead of sending them and keeps an outbox that tests can
//! inspect. Used for development and as the default provider.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};
use uuid::Uuid;

use otp_shared::mask_phone_number;

use super::sms_provider::SmsProvider;
use crate::InfrastructureError;

/// A message accepted by the mock provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub phone_number: String,
    pub body: String,
    pub message_id: String,
}

/// Mock SMS provider for development and testing
#[derive(Clone, Default)]
pub struct MockSmsProvider {
    message_count: Arc<AtomicU64>,
    simulate_failure: Arc<AtomicBool>,
    outbox: Arc<Mutex<Vec<SentMessage>>>,
}

impl MockSmsProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mock that fails every send with a transient error
    pub fn failing() -> Self {
        let provider = Self::new();
        provider.set_simulate_failure(true);
        provider
    }

    /// Number of messages accepted so far
    pub fn message_count(&self) -> u64 {
        self.message_count.load(Ordering::SeqCst)
    }

    pub fn set_simulate_failure(&self, simulate: bool) {
        self.simulate_failure.store(simulate, Ordering::SeqCst);
    }

    /// Messages accepted so far, oldest first
    pub fn sent(&self) -> Vec<SentMessage> {
        self.outbox.lock().map(|o| o.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl SmsProvider for MockSmsProvider {
    async fn send_sms(
        &self,
        phone_number: &str,
        message: &str,
    ) -> Result<String, InfrastructureError> {
        if !phone_number.starts_with('+') {
            return Err(InfrastructureError::SmsRejected(format!(
                "Invalid phone number format: {}",
                mask_phone_number(phone_number)
            )));
        }

        if self.simulate_failure.load(Ordering::SeqCst) {
            warn!(
                phone = %mask_phone_number(phone_number),
                "Mock SMS provider simulating failure"
            );
            return Err(InfrastructureError::Sms(
                "Simulated SMS sending failure".to_string(),
            ));
        }

        let message_id = format!("mock_{}", Uuid::new_v4());
        let count = self.message_count.fetch_add(1, Ordering::SeqCst) + 1;

        if let Ok(mut outbox) = self.outbox.lock() {
            outbox.push(SentMessage {
                phone_number: phone_number.to_string(),
                body: message.to_string(),
                message_id: message_id.clone(),
            });
        }

        info!(
            target: "sms_service",
            provider = "mock",
            phone = %mask_phone_number(phone_number),
            message_id = %message_id,
            count,
            "Mock SMS accepted"
        );

        Ok(message_id)
    }

    fn provider_name(&self) -> &str {
        "mock"
    }
}
