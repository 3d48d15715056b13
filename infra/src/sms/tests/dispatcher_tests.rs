//! Queue and worker behaviour

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::sms::dispatcher::deliver;
use crate::sms::{
    spawn_delivery_worker, ChannelDeliveryGateway, DeliveryWorkerConfig, MockSmsProvider,
    SmsProvider,
};
use crate::InfrastructureError;
use otp_core::services::verification::{DeliveryGateway, DeliveryRequest};
use otp_core::{OtpCode, PhoneKey};
use otp_shared::config::SmsConfig;

fn request(code: &str) -> DeliveryRequest {
    request_to("+919876543210", code)
}

fn request_to(phone: &str, code: &str) -> DeliveryRequest {
    DeliveryRequest {
        phone: PhoneKey::try_from(phone.to_string()).unwrap(),
        code: OtpCode::new(code),
        ttl_seconds: 300,
    }
}

fn worker_config(max_attempts: u32) -> DeliveryWorkerConfig {
    DeliveryWorkerConfig {
        sms: SmsConfig {
            message_template: "code {code}, {minutes} min".to_string(),
            ..Default::default()
        },
        max_attempts,
        initial_backoff: Duration::from_millis(100),
        max_in_flight: 4,
    }
}

/// Fails transiently a fixed number of times, then succeeds
struct FlakyProvider {
    failures_left: AtomicU32,
    calls: AtomicU32,
    permanent: bool,
}

impl FlakyProvider {
    fn new(failures: u32, permanent: bool) -> Self {
        Self {
            failures_left: AtomicU32::new(failures),
            calls: AtomicU32::new(0),
            permanent,
        }
    }
}

#[async_trait]
impl SmsProvider for FlakyProvider {
    async fn send_sms(&self, _phone: &str, _message: &str) -> Result<String, InfrastructureError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failures_left.load(Ordering::SeqCst) == 0 {
            return Ok("ok".to_string());
        }
        self.failures_left.fetch_sub(1, Ordering::SeqCst);
        if self.permanent {
            Err(InfrastructureError::SmsRejected("blocked".to_string()))
        } else {
            Err(InfrastructureError::Sms("timeout".to_string()))
        }
    }

    fn provider_name(&self) -> &str {
        "flaky"
    }
}

/// Hangs for a minute on one number, answers everything else at once
struct StallingProvider {
    stalled: &'static str,
    delivered: Mutex<Vec<String>>,
}

#[async_trait]
impl SmsProvider for StallingProvider {
    async fn send_sms(&self, phone: &str, _message: &str) -> Result<String, InfrastructureError> {
        if phone == self.stalled {
            tokio::time::sleep(Duration::from_secs(60)).await;
        }
        self.delivered.lock().unwrap().push(phone.to_string());
        Ok("ok".to_string())
    }

    fn provider_name(&self) -> &str {
        "stalling"
    }
}

#[tokio::test(start_paused = true)]
async fn test_deliver_retries_transient_failures() {
    let provider = FlakyProvider::new(2, false);
    assert!(deliver(&provider, &worker_config(3), request("482913")).await);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn test_deliver_gives_up_after_max_attempts() {
    let provider = FlakyProvider::new(5, false);
    assert!(!deliver(&provider, &worker_config(3), request("482913")).await);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn test_deliver_does_not_retry_rejection() {
    let provider = FlakyProvider::new(1, true);
    assert!(!deliver(&provider, &worker_config(3), request("482913")).await);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_worker_renders_and_sends() {
    let provider = MockSmsProvider::new();
    let (gateway, receiver) = ChannelDeliveryGateway::new(8);
    let worker = spawn_delivery_worker(receiver, Arc::new(provider.clone()), worker_config(1));

    gateway.send(request("482913"));
    drop(gateway);
    worker.await.unwrap();

    let sent = provider.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].phone_number, "+919876543210");
    assert_eq!(sent[0].body, "code 482913, 5 min");
}

#[tokio::test(start_paused = true)]
async fn test_slow_number_does_not_hold_up_queue() {
    let provider = Arc::new(StallingProvider {
        stalled: "+15551234567",
        delivered: Mutex::new(Vec::new()),
    });
    let (gateway, receiver) = ChannelDeliveryGateway::new(8);
    let worker = spawn_delivery_worker(receiver, provider.clone(), worker_config(1));

    gateway.send(request_to("+15551234567", "111111"));
    gateway.send(request_to("+919876543210", "222222"));

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(*provider.delivered.lock().unwrap(), vec!["+919876543210"]);

    // Shutdown waits for the stalled delivery to finish
    drop(gateway);
    worker.await.unwrap();
    assert_eq!(provider.delivered.lock().unwrap().len(), 2);
}

#[test]
fn test_full_queue_drops_without_blocking() {
    let (gateway, _receiver) = ChannelDeliveryGateway::new(1);

    gateway.send(request("111111"));
    gateway.send(request("222222"));
    gateway.send(request("333333"));

    assert_eq!(gateway.dropped(), 2);
}

#[test]
fn test_closed_queue_counts_drop() {
    let (gateway, receiver) = ChannelDeliveryGateway::new(4);
    drop(receiver);

    gateway.send(request("111111"));
    assert_eq!(gateway.dropped(), 1);
}

#[test]
fn test_worker_config_from_sms_config() {
    let config = DeliveryWorkerConfig::from_sms_config(&SmsConfig {
        max_retries: 0,
        retry_delay_ms: 250,
        ..Default::default()
    });
    assert_eq!(config.max_attempts, 1);
    assert_eq!(config.initial_backoff, Duration::from_millis(250));
    assert_eq!(config.max_in_flight, 16);
}
