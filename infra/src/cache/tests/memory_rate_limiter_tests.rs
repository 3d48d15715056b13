//! Unit tests for the in-memory rate limiter

use std::net::IpAddr;
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::cache::MemoryRateLimiter;
use otp_core::services::verification::IssuanceRateLimiter;
use otp_core::{PhoneKey, RateDecision, RateKey};
use otp_shared::config::{RateLimitConfig, RateRule};

fn phone_key() -> RateKey {
    RateKey::Phone(PhoneKey::try_from("+919876543210".to_string()).unwrap())
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
}

fn config() -> RateLimitConfig {
    RateLimitConfig {
        enabled: true,
        phone: vec![
            RateRule::new("cooldown", 1, 60),
            RateRule::new("hourly", 3, 3600),
        ],
        network_issue: vec![RateRule::new("network", 2, 900)],
        network_verify: vec![RateRule::new("network_verify", 5, 900)],
    }
}

#[tokio::test]
async fn test_cooldown_denies_then_reopens() {
    let limiter = MemoryRateLimiter::new(&config());

    assert!(limiter.allow(&phone_key(), t0()).await.unwrap().is_allowed());

    let denied = limiter
        .allow(&phone_key(), t0() + Duration::seconds(20))
        .await
        .unwrap();
    assert_eq!(
        denied,
        RateDecision::Denied {
            retry_after_seconds: 40,
            rule: "cooldown".to_string(),
        }
    );

    assert!(limiter
        .allow(&phone_key(), t0() + Duration::seconds(60))
        .await
        .unwrap()
        .is_allowed());
}

#[tokio::test]
async fn test_denial_does_not_count() {
    let limiter = MemoryRateLimiter::new(&config());

    // Three issuances a minute apart fill the hourly window
    for minute in 0..3 {
        let now = t0() + Duration::minutes(minute);
        assert!(limiter.allow(&phone_key(), now).await.unwrap().is_allowed());
    }

    // Repeated denials must not extend anything
    for _ in 0..5 {
        let denied = limiter
            .allow(&phone_key(), t0() + Duration::minutes(5))
            .await
            .unwrap();
        assert!(matches!(
            denied,
            RateDecision::Denied { ref rule, retry_after_seconds: 3300 } if rule == "hourly"
        ));
    }

    assert!(limiter
        .allow(&phone_key(), t0() + Duration::hours(1))
        .await
        .unwrap()
        .is_allowed());
}

#[tokio::test]
async fn test_allowed_reports_smallest_headroom() {
    let limiter = MemoryRateLimiter::new(&config());
    let ip: IpAddr = "203.0.113.7".parse().unwrap();

    let decision = limiter
        .allow(&RateKey::NetworkIssue(ip), t0())
        .await
        .unwrap();
    assert_eq!(decision, RateDecision::Allowed { remaining: 1 });
}

#[tokio::test]
async fn test_keys_are_independent() {
    let limiter = MemoryRateLimiter::new(&config());
    let ip: IpAddr = "203.0.113.7".parse().unwrap();
    let other = RateKey::Phone(PhoneKey::try_from("+15551234567".to_string()).unwrap());

    assert!(limiter.allow(&phone_key(), t0()).await.unwrap().is_allowed());
    assert!(limiter.allow(&other, t0()).await.unwrap().is_allowed());
    assert!(limiter
        .allow(&RateKey::NetworkVerify(ip), t0())
        .await
        .unwrap()
        .is_allowed());
    assert!(limiter
        .allow(&RateKey::NetworkIssue(ip), t0())
        .await
        .unwrap()
        .is_allowed());
    assert_eq!(limiter.tracked_keys(), 4);
}

#[tokio::test]
async fn test_disabled_allows_everything() {
    let limiter = MemoryRateLimiter::new(&RateLimitConfig {
        enabled: false,
        ..config()
    });

    for _ in 0..10 {
        assert!(limiter.allow(&phone_key(), t0()).await.unwrap().is_allowed());
    }
    assert_eq!(limiter.tracked_keys(), 0);
}

#[tokio::test]
async fn test_reset_and_purge() {
    let limiter = MemoryRateLimiter::new(&config());

    limiter.allow(&phone_key(), t0()).await.unwrap();
    limiter.reset(&phone_key()).await.unwrap();
    assert!(limiter.allow(&phone_key(), t0()).await.unwrap().is_allowed());

    // Cooldown closes after a minute but the hourly window keeps the entry
    assert_eq!(limiter.purge_expired(t0() + Duration::minutes(2)).await.unwrap(), 0);
    assert_eq!(limiter.purge_expired(t0() + Duration::hours(1)).await.unwrap(), 1);
    assert_eq!(limiter.tracked_keys(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_allows_never_overshoot_limit() {
    let limiter = Arc::new(MemoryRateLimiter::new(&RateLimitConfig {
        phone: vec![RateRule::new("burst", 5, 60)],
        ..config()
    }));

    let mut handles = Vec::new();
    for _ in 0..40 {
        let limiter = Arc::clone(&limiter);
        handles.push(tokio::spawn(async move {
            limiter.allow(&phone_key(), t0()).await.unwrap()
        }));
    }

    let mut allowed = 0;
    for handle in handles {
        if handle.await.unwrap().is_allowed() {
            allowed += 1;
        }
    }
    assert_eq!(allowed, 5);
}
