//! Queued, fire-and-forget delivery of verification codes
//!
//! The engine hands a [`DeliveryRequest`] to [`ChannelDeliveryGateway`], which
//! only enqueues it. A background worker drains the queue and runs each
//! delivery as its own task, at most `max_in_flight` at a time, so one number
//! stuck in backoff does not hold up the codes queued behind it. Neither a
//! slow nor a failing provider ever blocks or fails an issuance.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use otp_core::services::verification::{DeliveryGateway, DeliveryRequest};
use otp_shared::config::SmsConfig;

use super::sms_provider::SmsProvider;

/// Retry and rendering settings for the delivery worker
#[derive(Debug, Clone)]
pub struct DeliveryWorkerConfig {
    /// Message body template; `{code}` and `{minutes}` are substituted
    pub sms: SmsConfig,
    /// Attempts per message, at least 1
    pub max_attempts: u32,
    /// Delay before the second attempt; doubled for each one after
    pub initial_backoff: Duration,
    /// Deliveries running at once, at least 1
    pub max_in_flight: usize,
}

impl DeliveryWorkerConfig {
    pub fn from_sms_config(config: &SmsConfig) -> Self {
        Self {
            sms: config.clone(),
            max_attempts: config.max_retries.max(1),
            initial_backoff: Duration::from_millis(config.retry_delay_ms),
            max_in_flight: config.max_in_flight.max(1),
        }
    }
}

/// [`DeliveryGateway`] backed by a bounded queue
///
/// When the queue is full the request is dropped and counted: the user can
/// ask for a new code, while blocking would stall issuance for everyone.
#[derive(Debug, Clone)]
pub struct ChannelDeliveryGateway {
    sender: mpsc::Sender<DeliveryRequest>,
    dropped: Arc<AtomicU64>,
}

impl ChannelDeliveryGateway {
    /// Create the gateway and the receiving end for the worker
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<DeliveryRequest>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (
            Self {
                sender,
                dropped: Arc::new(AtomicU64::new(0)),
            },
            receiver,
        )
    }

    /// Requests discarded because the queue was full or closed
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl DeliveryGateway for ChannelDeliveryGateway {
    fn send(&self, request: DeliveryRequest) {
        match self.sender.try_send(request) {
            Ok(()) => {}
            Err(TrySendError::Full(request)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(
                    event = "sms_queue_full",
                    phone = %request.phone.masked(),
                    "Delivery queue full; dropping verification SMS"
                );
            }
            Err(TrySendError::Closed(request)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                error!(
                    event = "sms_queue_closed",
                    phone = %request.phone.masked(),
                    "Delivery worker is gone; dropping verification SMS"
                );
            }
        }
    }
}

/// Drain `receiver` until every sender is dropped, then wait for the
/// deliveries still in flight
pub fn spawn_delivery_worker(
    mut receiver: mpsc::Receiver<DeliveryRequest>,
    provider: Arc<dyn SmsProvider>,
    config: DeliveryWorkerConfig,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let max_in_flight = config.max_in_flight.max(1);
        let permits = Arc::new(Semaphore::new(max_in_flight));
        let config = Arc::new(config);
        info!(
            provider = provider.provider_name(),
            max_in_flight, "Delivery worker started"
        );

        while let Some(request) = receiver.recv().await {
            let permit = match Arc::clone(&permits).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };
            let provider = Arc::clone(&provider);
            let config = Arc::clone(&config);
            tokio::spawn(async move {
                deliver(provider.as_ref(), &config, request).await;
                drop(permit);
            });
        }

        // Every permit back means every spawned delivery has finished
        let _ = permits.acquire_many(max_in_flight as u32).await;
        info!("Delivery worker stopped");
    })
}

/// Send one request, retrying transient failures. Returns whether it was sent.
pub(crate) async fn deliver(
    provider: &dyn SmsProvider,
    config: &DeliveryWorkerConfig,
    request: DeliveryRequest,
) -> bool {
    let body = config
        .sms
        .render_message(request.code.expose(), request.ttl_seconds);
    let phone = request.phone.as_str();
    let max_attempts = config.max_attempts.max(1);
    let mut delay = config.initial_backoff;
    let mut attempt = 0;

    loop {
        attempt += 1;
        match provider.send_sms(phone, &body).await {
            Ok(message_id) => {
                info!(
                    event = "sms_sent",
                    provider = provider.provider_name(),
                    phone = %request.phone.masked(),
                    message_id = %message_id,
                    attempt,
                    "Verification SMS sent"
                );
                return true;
            }
            Err(e) if e.is_retriable() && attempt < max_attempts => {
                warn!(
                    provider = provider.provider_name(),
                    phone = %request.phone.masked(),
                    attempt,
                    max_attempts,
                    "SMS send failed: {}. Retrying in {:?}",
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
                delay = delay.saturating_mul(2);
            }
            Err(e) => {
                error!(
                    event = "sms_dispatch_failed",
                    provider = provider.provider_name(),
                    phone = %request.phone.masked(),
                    attempt,
                    "Giving up on verification SMS: {}",
                    e
                );
                return false;
            }
        }
    }
}
