//! Redis-backed fixed-window rate limiter
//!
//! One counter key per (rate key, rule), expiring with its window. All rules
//! for a rate key are checked and counted by one Lua script, so admission is
//! all-or-nothing even when several processes share the Redis.
//!
//! Windows follow Redis server time (key TTLs), not the injected clock.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use redis::Script;
use tracing::debug;

use otp_core::services::verification::IssuanceRateLimiter;
use otp_core::{DomainError, DomainResult, RateDecision, RateKey, RatePolicy};
use otp_shared::config::RateLimitConfig;

use super::redis_client::{hash_identifier, RedisClient};
use crate::InfrastructureError;

/// KEYS: one counter per rule. ARGV: (limit, window_ms) per rule.
/// Returns {0, rule_index, pttl_ms} when refused, {1, 0, remaining} when counted.
static ADMIT_SCRIPT: Lazy<Script> = Lazy::new(|| {
    Script::new(
        r#"
        local blocking = 0
        local longest = -1
        for i, key in ipairs(KEYS) do
            local limit = tonumber(ARGV[2 * i - 1])
            local count = tonumber(redis.call('GET', key) or '0')
            if count >= limit then
                local ttl = redis.call('PTTL', key)
                if ttl < 0 then ttl = tonumber(ARGV[2 * i]) end
                if ttl > longest then
                    longest = ttl
                    blocking = i
                end
            end
        end
        if blocking > 0 then
            return {0, blocking - 1, longest}
        end
        local remaining = -1
        for i, key in ipairs(KEYS) do
            local limit = tonumber(ARGV[2 * i - 1])
            local count = redis.call('INCR', key)
            if count == 1 then
                redis.call('PEXPIRE', key, ARGV[2 * i])
            end
            local left = limit - count
            if left < 0 then left = 0 end
            if remaining < 0 or left < remaining then remaining = left end
        end
        return {1, 0, remaining}
        "#,
    )
});

/// Rate limiter shared by every process pointing at the same Redis
#[derive(Clone)]
pub struct RedisRateLimiter {
    client: RedisClient,
    policy: RatePolicy,
}

impl RedisRateLimiter {
    pub fn new(client: RedisClient, config: &RateLimitConfig) -> Self {
        Self {
            client,
            policy: RatePolicy::from_config(config),
        }
    }

    /// Counter keys for `key`, one per rule. The `{..}` hash tag keeps them in
    /// one cluster slot so the script may touch them together.
    fn counter_keys(&self, key: &RateKey) -> Vec<String> {
        let tag = format!(
            "{{{}:{}}}",
            key.scope(),
            hash_identifier(&key.storage_key())
        );
        self.policy
            .rules_for(key)
            .iter()
            .map(|rule| self.client.key("rate", &format!("{}:{}", tag, rule.name)))
            .collect()
    }
}

fn limiter_error(error: redis::RedisError) -> DomainError {
    InfrastructureError::Cache(error).into_limiter_error()
}

#[async_trait]
impl IssuanceRateLimiter for RedisRateLimiter {
    async fn allow(&self, key: &RateKey, _now: DateTime<Utc>) -> DomainResult<RateDecision> {
        let rules = self.policy.rules_for(key);
        if rules.is_empty() {
            return Ok(RateDecision::Allowed { remaining: u32::MAX });
        }

        let mut invocation = ADMIT_SCRIPT.prepare_invoke();
        for counter in self.counter_keys(key) {
            invocation.key(counter);
        }
        for rule in rules {
            invocation
                .arg(rule.limit)
                .arg(rule.window_seconds.saturating_mul(1000));
        }

        let mut conn = self.client.connection();
        let (allowed, rule_index, value): (i64, usize, i64) = invocation
            .invoke_async(&mut conn)
            .await
            .map_err(limiter_error)?;

        if allowed == 1 {
            return Ok(RateDecision::Allowed {
                remaining: u32::try_from(value).unwrap_or(u32::MAX),
            });
        }

        let rule = rules
            .get(rule_index)
            .map(|r| r.name.clone())
            .ok_or_else(|| DomainError::rate_limiter("limiter reply named an unknown rule"))?;
        let retry_after_seconds = (value.max(0) as u64).div_ceil(1000).max(1);

        debug!(
            key = %key.masked(),
            rule = %rule,
            retry_after_seconds,
            "Rate window full"
        );

        Ok(RateDecision::Denied {
            retry_after_seconds,
            rule,
        })
    }

    async fn reset(&self, key: &RateKey) -> DomainResult<()> {
        let keys = self.counter_keys(key);
        if keys.is_empty() {
            return Ok(());
        }
        let mut conn = self.client.connection();
        let _: i64 = redis::cmd("DEL")
            .arg(keys)
            .query_async(&mut conn)
            .await
            .map_err(limiter_error)?;
        Ok(())
    }

    async fn purge_expired(&self, _now: DateTime<Utc>) -> DomainResult<usize> {
        // Counters carry their own TTL
        Ok(0)
    }
}
