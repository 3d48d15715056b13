//! In-process fixed-window rate limiter
//!
//! One entry per rate key holding a window per configured rule. The entry
//! lock makes check-and-count atomic for that key, so two concurrent requests
//! can never both take the last slot.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::debug;

use otp_core::services::verification::IssuanceRateLimiter;
use otp_core::{DomainResult, RateDecision, RateKey, RatePolicy, RateWindow};
use otp_shared::config::RateLimitConfig;

/// Concurrent map of rate windows keyed by [`RateKey::storage_key`]
#[derive(Debug)]
pub struct MemoryRateLimiter {
    policy: RatePolicy,
    windows: DashMap<String, Vec<RateWindow>>,
}

impl MemoryRateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            policy: RatePolicy::from_config(config),
            windows: DashMap::new(),
        }
    }

    /// Keys with live bookkeeping
    pub fn tracked_keys(&self) -> usize {
        self.windows.len()
    }
}

#[async_trait]
impl IssuanceRateLimiter for MemoryRateLimiter {
    async fn allow(&self, key: &RateKey, now: DateTime<Utc>) -> DomainResult<RateDecision> {
        let rules = self.policy.rules_for(key);
        if rules.is_empty() {
            return Ok(RateDecision::Allowed { remaining: u32::MAX });
        }

        let mut entry = self
            .windows
            .entry(key.storage_key())
            .or_insert_with(|| self.policy.windows_for(key, now));

        let decision = RateWindow::admit(entry.value_mut().as_mut_slice(), rules, now);

        if let RateDecision::Denied { retry_after_seconds, rule } = &decision {
            debug!(
                key = %key.masked(),
                rule = %rule,
                retry_after_seconds,
                "Rate window full"
            );
        }

        Ok(decision)
    }

    async fn reset(&self, key: &RateKey) -> DomainResult<()> {
        self.windows.remove(&key.storage_key());
        Ok(())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> DomainResult<usize> {
        let mut purged = 0;
        self.windows.retain(|_, windows| {
            let keep = windows.iter().any(|w| !w.is_stale(now));
            if !keep {
                purged += 1;
            }
            keep
        });
        Ok(purged)
    }
}
