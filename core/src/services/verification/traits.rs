//! Collaborator traits the verification engine is wired against

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::domain::value_objects::{IdentityAssertion, OtpCode, PhoneKey, RateDecision, RateKey};
use crate::errors::DomainResult;

use super::types::{AttemptRecord, ChallengeLookup, ChallengeReceipt, ConsumeResult, DeliveryRequest};

/// Owns the outstanding challenge per phone key
///
/// Every operation is atomic with respect to concurrent callers on the same
/// key. Mutations after a lookup name the challenge they expect, so a
/// superseded or already-consumed challenge is reported as `NotFound`
/// instead of being touched.
#[async_trait]
pub trait ChallengeStore: Send + Sync {
    /// Store a fresh challenge, replacing any prior one for the key
    async fn put(
        &self,
        phone_key: &PhoneKey,
        code: OtpCode,
        now: DateTime<Utc>,
        ttl: Duration,
        max_attempts: u32,
    ) -> DomainResult<ChallengeReceipt>;

    /// Read-only peek; an expired challenge is evicted and reported as such
    async fn try_consume(&self, phone_key: &PhoneKey, now: DateTime<Utc>)
        -> DomainResult<ChallengeLookup>;

    /// Decrement the attempt budget of `challenge_id`; evict at zero
    async fn record_failed_attempt(
        &self,
        phone_key: &PhoneKey,
        challenge_id: Uuid,
        now: DateTime<Utc>,
    ) -> DomainResult<AttemptRecord>;

    /// Remove `challenge_id` after a correct guess so it cannot be replayed
    async fn mark_consumed(
        &self,
        phone_key: &PhoneKey,
        challenge_id: Uuid,
        now: DateTime<Utc>,
    ) -> DomainResult<ConsumeResult>;

    /// Drop whatever is outstanding for the key; `true` if something was removed
    async fn invalidate(&self, phone_key: &PhoneKey) -> DomainResult<bool>;

    /// Evict every challenge with `expires_at <= now`; returns the count
    async fn purge_expired(&self, now: DateTime<Utc>) -> DomainResult<usize>;
}

/// Counts events per rate key and refuses the ones over budget
#[async_trait]
pub trait IssuanceRateLimiter: Send + Sync {
    /// Count one event for `key` unless a rule is already at its limit
    async fn allow(&self, key: &RateKey, now: DateTime<Utc>) -> DomainResult<RateDecision>;

    /// Forget all windows for `key`
    async fn reset(&self, key: &RateKey) -> DomainResult<()>;

    /// Drop windows that have fully elapsed; returns the count
    async fn purge_expired(&self, now: DateTime<Utc>) -> DomainResult<usize>;
}

/// Hands codes to an out-of-band channel
///
/// `send` must not wait for the channel; failures are the gateway's to log.
pub trait DeliveryGateway: Send + Sync {
    fn send(&self, request: DeliveryRequest);
}

/// Mints the credential returned on successful verification
#[async_trait]
pub trait IdentityAssertionIssuer: Send + Sync {
    async fn issue(&self, phone_key: &PhoneKey) -> DomainResult<IdentityAssertion>;
}
