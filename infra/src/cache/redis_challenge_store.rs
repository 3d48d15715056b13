//! Redis-backed challenge store
//!
//! One hash per phone (`<prefix>:challenge:<sha256(phone)>`) with fields
//! `id`, `code`, `expires_at` (epoch millis) and `remaining`. Each operation
//! is a single Lua script, so it runs atomically on the server and the same
//! per-key linearizability holds across processes. The key carries a Redis
//! expiry at `expires_at`, which makes the background sweep a no-op here.

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use once_cell::sync::Lazy;
use redis::Script;
use tracing::debug;
use uuid::Uuid;

use otp_core::services::verification::{
    AttemptRecord, ChallengeLookup, ChallengeReceipt, ChallengeStore, ConsumeResult,
};
use otp_core::{ActiveChallenge, DomainError, DomainResult, OtpCode, PhoneKey};

use super::redis_client::{hash_identifier, RedisClient};
use crate::InfrastructureError;

/// ARGV: id, code, expires_at_ms, attempts, now_ms. Returns 1 if an active
/// challenge was replaced.
static PUT_SCRIPT: Lazy<Script> = Lazy::new(|| {
    Script::new(
        r#"
        local prev = redis.call('HGET', KEYS[1], 'expires_at')
        local superseded = 0
        if prev and tonumber(prev) > tonumber(ARGV[5]) then superseded = 1 end
        redis.call('DEL', KEYS[1])
        redis.call('HSET', KEYS[1], 'id', ARGV[1], 'code', ARGV[2], 'expires_at', ARGV[3], 'remaining', ARGV[4])
        redis.call('PEXPIREAT', KEYS[1], ARGV[3])
        return superseded
        "#,
    )
});

/// ARGV: now_ms
static PEEK_SCRIPT: Lazy<Script> = Lazy::new(|| {
    Script::new(
        r#"
        local f = redis.call('HMGET', KEYS[1], 'id', 'code', 'expires_at', 'remaining')
        if not f[1] then return {'not_found'} end
        if tonumber(f[3]) <= tonumber(ARGV[1]) then
            redis.call('DEL', KEYS[1])
            return {'expired'}
        end
        return {'active', f[1], f[2], f[3], f[4]}
        "#,
    )
});

/// ARGV: id, now_ms
static FAIL_SCRIPT: Lazy<Script> = Lazy::new(|| {
    Script::new(
        r#"
        local f = redis.call('HMGET', KEYS[1], 'id', 'expires_at')
        if not f[1] or f[1] ~= ARGV[1] then return {'not_found'} end
        if tonumber(f[2]) <= tonumber(ARGV[2]) then
            redis.call('DEL', KEYS[1])
            return {'expired'}
        end
        local remaining = redis.call('HINCRBY', KEYS[1], 'remaining', -1)
        if remaining <= 0 then
            redis.call('DEL', KEYS[1])
            remaining = 0
        end
        return {'remaining', tostring(remaining)}
        "#,
    )
});

/// ARGV: id, now_ms
static CONSUME_SCRIPT: Lazy<Script> = Lazy::new(|| {
    Script::new(
        r#"
        local f = redis.call('HMGET', KEYS[1], 'id', 'expires_at')
        if not f[1] or f[1] ~= ARGV[1] then return 'not_found' end
        redis.call('DEL', KEYS[1])
        if tonumber(f[2]) <= tonumber(ARGV[2]) then return 'expired' end
        return 'consumed'
        "#,
    )
});

/// Challenge store shared by every process pointing at the same Redis
#[derive(Clone)]
pub struct RedisChallengeStore {
    client: RedisClient,
}

impl RedisChallengeStore {
    pub fn new(client: RedisClient) -> Self {
        Self { client }
    }

    fn key(&self, phone_key: &PhoneKey) -> String {
        self.client.key("challenge", &hash_identifier(phone_key.as_str()))
    }
}

fn store_error(error: redis::RedisError) -> DomainError {
    InfrastructureError::Cache(error).into_store_error()
}

fn corrupt(field: &str) -> DomainError {
    DomainError::store(format!("corrupt challenge record: bad {}", field))
}

fn parse_active(fields: &[String]) -> DomainResult<ActiveChallenge> {
    let [id, code, expires_at, remaining] = fields else {
        return Err(corrupt("shape"));
    };
    let challenge_id = Uuid::parse_str(id).map_err(|_| corrupt("id"))?;
    let expires_ms: i64 = expires_at.parse().map_err(|_| corrupt("expires_at"))?;
    let expires_at = Utc
        .timestamp_millis_opt(expires_ms)
        .single()
        .ok_or_else(|| corrupt("expires_at"))?;
    let remaining_attempts: u32 = remaining.parse().map_err(|_| corrupt("remaining"))?;

    Ok(ActiveChallenge {
        challenge_id,
        code: OtpCode::new(code.clone()),
        expires_at,
        remaining_attempts,
    })
}

#[async_trait]
impl ChallengeStore for RedisChallengeStore {
    async fn put(
        &self,
        phone_key: &PhoneKey,
        code: OtpCode,
        now: DateTime<Utc>,
        ttl: Duration,
        max_attempts: u32,
    ) -> DomainResult<ChallengeReceipt> {
        let challenge_id = Uuid::new_v4();
        let expires_at = now + ttl;
        let mut conn = self.client.connection();

        let superseded: i64 = PUT_SCRIPT
            .key(self.key(phone_key))
            .arg(challenge_id.to_string())
            .arg(code.expose())
            .arg(expires_at.timestamp_millis())
            .arg(max_attempts)
            .arg(now.timestamp_millis())
            .invoke_async(&mut conn)
            .await
            .map_err(store_error)?;

        Ok(ChallengeReceipt {
            challenge_id,
            expires_at,
            superseded: superseded == 1,
        })
    }

    async fn try_consume(
        &self,
        phone_key: &PhoneKey,
        now: DateTime<Utc>,
    ) -> DomainResult<ChallengeLookup> {
        let mut conn = self.client.connection();
        let reply: Vec<String> = PEEK_SCRIPT
            .key(self.key(phone_key))
            .arg(now.timestamp_millis())
            .invoke_async(&mut conn)
            .await
            .map_err(store_error)?;

        match reply.split_first() {
            Some((status, _)) if status == "not_found" => Ok(ChallengeLookup::NotFound),
            Some((status, _)) if status == "expired" => Ok(ChallengeLookup::Expired),
            Some((status, fields)) if status == "active" => {
                Ok(ChallengeLookup::Active(parse_active(fields)?))
            }
            _ => Err(corrupt("reply")),
        }
    }

    async fn record_failed_attempt(
        &self,
        phone_key: &PhoneKey,
        challenge_id: Uuid,
        now: DateTime<Utc>,
    ) -> DomainResult<AttemptRecord> {
        let mut conn = self.client.connection();
        let reply: Vec<String> = FAIL_SCRIPT
            .key(self.key(phone_key))
            .arg(challenge_id.to_string())
            .arg(now.timestamp_millis())
            .invoke_async(&mut conn)
            .await
            .map_err(store_error)?;

        match reply.as_slice() {
            [status] if status == "not_found" => Ok(AttemptRecord::NotFound),
            [status] if status == "expired" => Ok(AttemptRecord::Expired),
            [status, remaining] if status == "remaining" => {
                let remaining = remaining.parse().map_err(|_| corrupt("remaining"))?;
                if remaining == 0 {
                    debug!(phone = %phone_key.masked(), "Challenge burned after last attempt");
                }
                Ok(AttemptRecord::Remaining(remaining))
            }
            _ => Err(corrupt("reply")),
        }
    }

    async fn mark_consumed(
        &self,
        phone_key: &PhoneKey,
        challenge_id: Uuid,
        now: DateTime<Utc>,
    ) -> DomainResult<ConsumeResult> {
        let mut conn = self.client.connection();
        let reply: String = CONSUME_SCRIPT
            .key(self.key(phone_key))
            .arg(challenge_id.to_string())
            .arg(now.timestamp_millis())
            .invoke_async(&mut conn)
            .await
            .map_err(store_error)?;

        match reply.as_str() {
            "consumed" => Ok(ConsumeResult::Consumed),
            "expired" => Ok(ConsumeResult::Expired),
            "not_found" => Ok(ConsumeResult::NotFound),
            _ => Err(corrupt("reply")),
        }
    }

    async fn invalidate(&self, phone_key: &PhoneKey) -> DomainResult<bool> {
        let mut conn = self.client.connection();
        let removed: i64 = redis::cmd("DEL")
            .arg(self.key(phone_key))
            .query_async(&mut conn)
            .await
            .map_err(store_error)?;
        Ok(removed > 0)
    }

    async fn purge_expired(&self, _now: DateTime<Utc>) -> DomainResult<usize> {
        // Keys expire server-side at `expires_at`
        Ok(0)
    }
}
