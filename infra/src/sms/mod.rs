//! SMS delivery
//!
//! - **Provider trait**: one interface for every SMS vendor
//! - **Mock provider**: logs instead of sending; the development default
//! - **Twilio provider**: production delivery over the Twilio REST API
//! - **Dispatcher**: bounded queue and retrying worker behind the core's
//!   delivery gateway

pub mod dispatcher;
pub mod mock_sms;
pub mod sms_provider;
pub mod twilio;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use otp_shared::config::{SmsConfig, SmsProviderKind};

use crate::InfrastructureError;

pub use dispatcher::{spawn_delivery_worker, ChannelDeliveryGateway, DeliveryWorkerConfig};
pub use mock_sms::{MockSmsProvider, SentMessage};
pub use sms_provider::SmsProvider;
pub use twilio::{TwilioConfig, TwilioSmsProvider};

/// Create the configured SMS provider
///
/// Fails when the selected provider is missing credentials, so the service
/// refuses to start instead of silently dropping every code.
pub fn create_sms_provider(config: &SmsConfig) -> Result<Arc<dyn SmsProvider>, InfrastructureError> {
    match config.provider {
        SmsProviderKind::Mock => Ok(Arc::new(MockSmsProvider::new())),
        SmsProviderKind::Twilio => Ok(Arc::new(TwilioSmsProvider::from_sms_config(config)?)),
    }
}
