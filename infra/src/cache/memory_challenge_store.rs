//! In-process challenge store
//!
//! A sharded concurrent map keyed by phone. Every operation goes through the
//! map's entry API, which holds the shard lock for that key only, so calls for
//! one phone are serialized while unrelated phones proceed in parallel.
//!
//! State lives in process memory: it is lost on restart and is not shared
//! between processes. Use the Redis store when either matters.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

use otp_core::services::verification::{
    AttemptRecord, ChallengeLookup, ChallengeReceipt, ChallengeStore, ConsumeResult,
};
use otp_core::{Challenge, DomainResult, OtpCode, PhoneKey};

/// Concurrent map of outstanding challenges
#[derive(Debug, Default)]
pub struct MemoryChallengeStore {
    challenges: DashMap<PhoneKey, Challenge>,
}

impl MemoryChallengeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Challenges currently held, including expired ones not yet evicted
    pub fn len(&self) -> usize {
        self.challenges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.challenges.is_empty()
    }
}

#[async_trait]
impl ChallengeStore for MemoryChallengeStore {
    async fn put(
        &self,
        phone_key: &PhoneKey,
        code: OtpCode,
        now: DateTime<Utc>,
        ttl: Duration,
        max_attempts: u32,
    ) -> DomainResult<ChallengeReceipt> {
        let challenge = Challenge::new(phone_key.clone(), code, now, ttl, max_attempts);
        let challenge_id = challenge.id;
        let expires_at = challenge.expires_at;

        let previous = self.challenges.insert(phone_key.clone(), challenge);

        Ok(ChallengeReceipt {
            challenge_id,
            expires_at,
            superseded: previous.map_or(false, |p| p.is_active(now)),
        })
    }

    async fn try_consume(
        &self,
        phone_key: &PhoneKey,
        now: DateTime<Utc>,
    ) -> DomainResult<ChallengeLookup> {
        let lookup = match self.challenges.entry(phone_key.clone()) {
            Entry::Vacant(_) => ChallengeLookup::NotFound,
            Entry::Occupied(entry) if entry.get().is_expired(now) => {
                entry.remove();
                ChallengeLookup::Expired
            }
            Entry::Occupied(entry) => ChallengeLookup::Active(entry.get().snapshot()),
        };
        Ok(lookup)
    }

    async fn record_failed_attempt(
        &self,
        phone_key: &PhoneKey,
        challenge_id: Uuid,
        now: DateTime<Utc>,
    ) -> DomainResult<AttemptRecord> {
        let record = match self.challenges.entry(phone_key.clone()) {
            Entry::Vacant(_) => AttemptRecord::NotFound,
            Entry::Occupied(entry) if entry.get().id != challenge_id => AttemptRecord::NotFound,
            Entry::Occupied(entry) if entry.get().is_expired(now) => {
                entry.remove();
                AttemptRecord::Expired
            }
            Entry::Occupied(mut entry) => {
                let remaining = entry.get_mut().record_failure();
                if remaining == 0 {
                    entry.remove();
                    debug!(phone = %phone_key.masked(), "Challenge burned after last attempt");
                }
                AttemptRecord::Remaining(remaining)
            }
        };
        Ok(record)
    }

    async fn mark_consumed(
        &self,
        phone_key: &PhoneKey,
        challenge_id: Uuid,
        now: DateTime<Utc>,
    ) -> DomainResult<ConsumeResult> {
        let result = match self.challenges.entry(phone_key.clone()) {
            Entry::Vacant(_) => ConsumeResult::NotFound,
            Entry::Occupied(entry) if entry.get().id != challenge_id => ConsumeResult::NotFound,
            Entry::Occupied(entry) => {
                let expired = entry.get().is_expired(now);
                entry.remove();
                if expired {
                    ConsumeResult::Expired
                } else {
                    ConsumeResult::Consumed
                }
            }
        };
        Ok(result)
    }

    async fn invalidate(&self, phone_key: &PhoneKey) -> DomainResult<bool> {
        Ok(self.challenges.remove(phone_key).is_some())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> DomainResult<usize> {
        let mut purged = 0;
        self.challenges.retain(|_, challenge| {
            let keep = !challenge.is_expired(now);
            if !keep {
                purged += 1;
            }
            keep
        });
        Ok(purged)
    }
}
