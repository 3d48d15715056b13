//! Verification engine: request-code and verify-code orchestration

use std::net::IpAddr;
use std::sync::Arc;

use constant_time_eq::constant_time_eq;

use crate::domain::value_objects::{
    CancelOutcome, InputField, IssuanceOutcome, OtpCode, PhoneKey, RateDecision, RateKey,
    VerificationOutcome,
};
use crate::errors::DomainResult;
use crate::services::clock::{Clock, SystemClock};
use crate::services::code_generator::{CodeGenerator, OsRngCodeGenerator};
use crate::services::phone::PhoneNormalizer;

use super::config::VerificationEngineConfig;
use super::traits::{ChallengeStore, DeliveryGateway, IdentityAssertionIssuer, IssuanceRateLimiter};
use super::types::{AttemptRecord, ChallengeLookup, ConsumeResult, DeliveryRequest};

/// Stateless orchestrator over the challenge store and rate limiter
///
/// All persistent state lives in the injected collaborators; the engine can
/// be shared freely across request handlers.
pub struct VerificationEngine {
    normalizer: Arc<PhoneNormalizer>,
    generator: Arc<dyn CodeGenerator>,
    store: Arc<dyn ChallengeStore>,
    limiter: Arc<dyn IssuanceRateLimiter>,
    delivery: Arc<dyn DeliveryGateway>,
    issuer: Arc<dyn IdentityAssertionIssuer>,
    clock: Arc<dyn Clock>,
    config: VerificationEngineConfig,
}

impl VerificationEngine {
    /// Create an engine using the OS random source and the system clock
    ///
    /// # Arguments
    ///
    /// * `normalizer` - Phone normalizer built from the phone configuration
    /// * `store` - Challenge store
    /// * `limiter` - Issuance and verification rate limiter
    /// * `delivery` - Non-blocking delivery gateway
    /// * `issuer` - Identity assertion issuer
    /// * `config` - Code length, TTL and attempt budget
    pub fn new(
        normalizer: Arc<PhoneNormalizer>,
        store: Arc<dyn ChallengeStore>,
        limiter: Arc<dyn IssuanceRateLimiter>,
        delivery: Arc<dyn DeliveryGateway>,
        issuer: Arc<dyn IdentityAssertionIssuer>,
        config: VerificationEngineConfig,
    ) -> Self {
        Self {
            normalizer,
            generator: Arc::new(OsRngCodeGenerator::new(config.code_length)),
            store,
            limiter,
            delivery,
            issuer,
            clock: Arc::new(SystemClock),
            config,
        }
    }

    /// Replace the time source
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the code source
    pub fn with_code_generator(mut self, generator: Arc<dyn CodeGenerator>) -> Self {
        self.generator = generator;
        self
    }

    pub fn config(&self) -> &VerificationEngineConfig {
        &self.config
    }

    /// Issue a fresh code for `raw_phone`
    ///
    /// This method:
    /// 1. Normalizes the phone number
    /// 2. Applies the network-address issuance limit when `origin` is known
    /// 3. Applies the per-phone issuance limit
    /// 4. Generates and stores a code, superseding any earlier challenge
    /// 5. Hands the code to delivery without waiting for it
    ///
    /// Denied requests generate and store nothing.
    pub async fn request_code(
        &self,
        raw_phone: &str,
        origin: Option<IpAddr>,
    ) -> DomainResult<IssuanceOutcome> {
        let phone_key = match self.normalizer.normalize(raw_phone) {
            Ok(key) => key,
            Err(reason) => {
                tracing::debug!(event = "otp_invalid_phone", reason = %reason, "Rejected phone number");
                return Ok(IssuanceOutcome::InvalidFormat);
            }
        };

        let now = self.clock.now();

        if let Some(ip) = origin {
            if let Some(retry_after_seconds) =
                self.check_limit(&RateKey::NetworkIssue(ip), &phone_key, now).await?
            {
                return Ok(IssuanceOutcome::RateLimited { retry_after_seconds });
            }
        }
        if let Some(retry_after_seconds) =
            self.check_limit(&RateKey::Phone(phone_key.clone()), &phone_key, now).await?
        {
            return Ok(IssuanceOutcome::RateLimited { retry_after_seconds });
        }

        let code = self.generator.generate()?;
        let receipt = self
            .store
            .put(&phone_key, code.clone(), now, self.config.ttl, self.config.max_attempts)
            .await?;

        if receipt.superseded {
            tracing::info!(
                phone = %phone_key.masked(),
                event = "otp_superseded",
                "Replaced outstanding challenge"
            );
        }

        self.delivery.send(DeliveryRequest {
            phone: phone_key.clone(),
            code,
            ttl_seconds: self.config.ttl_seconds(),
        });

        tracing::info!(
            phone = %phone_key.masked(),
            challenge_id = %receipt.challenge_id,
            expires_at = %receipt.expires_at,
            event = "otp_issued",
            "Issued verification code"
        );

        Ok(IssuanceOutcome::Issued {
            phone_key,
            ttl_seconds: self.config.ttl_seconds(),
            expires_at: receipt.expires_at,
        })
    }

    /// Check `supplied_code` against the outstanding challenge for `raw_phone`
    ///
    /// A malformed code is rejected before the store is consulted and does not
    /// spend an attempt. A correct code consumes the challenge exactly once;
    /// a concurrent second caller observes `NoActiveChallenge`.
    pub async fn verify_code(
        &self,
        raw_phone: &str,
        supplied_code: &str,
        origin: Option<IpAddr>,
    ) -> DomainResult<VerificationOutcome> {
        let phone_key = match self.normalizer.normalize(raw_phone) {
            Ok(key) => key,
            Err(reason) => {
                tracing::debug!(event = "otp_invalid_phone", reason = %reason, "Rejected phone number");
                return Ok(VerificationOutcome::InvalidFormat(InputField::Phone));
            }
        };

        let now = self.clock.now();

        if let Some(ip) = origin {
            if let Some(retry_after_seconds) =
                self.check_limit(&RateKey::NetworkVerify(ip), &phone_key, now).await?
            {
                return Ok(VerificationOutcome::RateLimited { retry_after_seconds });
            }
        }

        let supplied_code = supplied_code.trim();
        if !OtpCode::is_well_formed(supplied_code, self.config.code_length) {
            return Ok(VerificationOutcome::InvalidFormat(InputField::Code));
        }

        let active = match self.store.try_consume(&phone_key, now).await? {
            ChallengeLookup::Active(active) => active,
            ChallengeLookup::Expired => return Ok(self.finish(&phone_key, VerificationOutcome::Expired)),
            ChallengeLookup::NotFound => {
                return Ok(self.finish(&phone_key, VerificationOutcome::NoActiveChallenge))
            }
        };

        let matches = constant_time_eq(active.code.expose().as_bytes(), supplied_code.as_bytes());

        let outcome = if matches {
            match self
                .store
                .mark_consumed(&phone_key, active.challenge_id, now)
                .await?
            {
                ConsumeResult::Consumed => {
                    let assertion = self.issuer.issue(&phone_key).await?;
                    VerificationOutcome::Success(assertion)
                }
                ConsumeResult::Expired => VerificationOutcome::Expired,
                ConsumeResult::NotFound => VerificationOutcome::NoActiveChallenge,
            }
        } else {
            match self
                .store
                .record_failed_attempt(&phone_key, active.challenge_id, now)
                .await?
            {
                AttemptRecord::Remaining(0) => VerificationOutcome::AttemptsExhausted,
                AttemptRecord::Remaining(remaining_attempts) => {
                    VerificationOutcome::InvalidCode { remaining_attempts }
                }
                AttemptRecord::Expired => VerificationOutcome::Expired,
                AttemptRecord::NotFound => VerificationOutcome::NoActiveChallenge,
            }
        };

        Ok(self.finish(&phone_key, outcome))
    }

    /// Drop the outstanding challenge for `raw_phone`, if any
    pub async fn cancel(&self, raw_phone: &str) -> DomainResult<CancelOutcome> {
        let phone_key = match self.normalizer.normalize(raw_phone) {
            Ok(key) => key,
            Err(_) => return Ok(CancelOutcome::InvalidFormat),
        };

        if self.store.invalidate(&phone_key).await? {
            tracing::info!(phone = %phone_key.masked(), event = "otp_cancelled", "Cancelled challenge");
            Ok(CancelOutcome::Cancelled)
        } else {
            Ok(CancelOutcome::NothingToCancel)
        }
    }

    /// Ask the limiter; `Some(retry_after)` when denied
    async fn check_limit(
        &self,
        key: &RateKey,
        phone_key: &PhoneKey,
        now: chrono::DateTime<chrono::Utc>,
    ) -> DomainResult<Option<u64>> {
        match self.limiter.allow(key, now).await? {
            RateDecision::Allowed { .. } => Ok(None),
            RateDecision::Denied { retry_after_seconds, rule } => {
                tracing::warn!(
                    phone = %phone_key.masked(),
                    key = %key.masked(),
                    rule = %rule,
                    retry_after_seconds,
                    event = "otp_rate_limited",
                    "Rate limit exceeded"
                );
                Ok(Some(retry_after_seconds))
            }
        }
    }

    fn finish(&self, phone_key: &PhoneKey, outcome: VerificationOutcome) -> VerificationOutcome {
        match &outcome {
            VerificationOutcome::Success(assertion) => tracing::info!(
                phone = %phone_key.masked(),
                expires_at = %assertion.expires_at,
                event = "otp_verified",
                "Phone number verified"
            ),
            VerificationOutcome::AttemptsExhausted => tracing::warn!(
                phone = %phone_key.masked(),
                event = "otp_attempts_exhausted",
                "Attempt budget exhausted; challenge burned"
            ),
            VerificationOutcome::Expired => tracing::info!(
                phone = %phone_key.masked(),
                event = "otp_expired",
                "Verification against expired challenge"
            ),
            other => tracing::info!(
                phone = %phone_key.masked(),
                outcome = other.label(),
                event = "otp_verification_failed",
                "Verification failed"
            ),
        }
        outcome
    }
}
