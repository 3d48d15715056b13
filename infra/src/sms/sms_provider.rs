//! SMS provider interface

use async_trait::async_trait;

use crate::InfrastructureError;

/// Sends one text message through an SMS vendor
///
/// Implementations include:
/// - Twilio Programmable Messaging
/// - Mock implementation for development and tests
#[async_trait]
pub trait SmsProvider: Send + Sync {
    /// Send `message` to `phone_number` (E.164)
    ///
    /// # Returns
    ///
    /// * `Ok(message_id)` - Provider identifier for the sent message
    /// * `Err(InfrastructureError::SmsRejected)` - Permanent refusal, do not retry
    /// * `Err(_)` - Transient failure
    async fn send_sms(&self, phone_number: &str, message: &str)
        -> Result<String, InfrastructureError>;

    /// Provider name for logs ("twilio", "mock")
    fn provider_name(&self) -> &str;

    /// Health check; default assumes the provider is reachable
    async fn is_available(&self) -> bool {
        true
    }
}
