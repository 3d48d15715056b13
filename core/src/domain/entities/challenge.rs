//! Challenge entity: one outstanding code for one phone number.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::domain::value_objects::{OtpCode, PhoneKey};

/// Default number of wrong guesses allowed per challenge
pub const MAX_ATTEMPTS: u32 = otp_shared::config::otp::DEFAULT_MAX_ATTEMPTS;

/// Length of the verification code
pub const CODE_LENGTH: usize = otp_shared::config::otp::DEFAULT_CODE_LENGTH;

/// Default lifetime for challenges (5 minutes)
pub const DEFAULT_TTL_SECONDS: u64 = otp_shared::config::otp::DEFAULT_TTL_SECONDS;

/// Stored record of one issuance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    /// Distinguishes this issuance from earlier and later ones for the same phone
    pub id: Uuid,

    /// Normalized phone the code was sent to
    pub phone_key: PhoneKey,

    /// The code to compare against; never logged
    pub code: OtpCode,

    /// Timestamp when the challenge was issued
    pub created_at: DateTime<Utc>,

    /// `created_at + ttl`; the challenge is dead at and after this instant
    pub expires_at: DateTime<Utc>,

    /// Wrong guesses left before the challenge is burned
    ///
    /// A consumed or invalidated challenge is removed from its store rather
    /// than flagged, so there is no separate consumed state.
    pub remaining_attempts: u32,
}

impl Challenge {
    /// Creates a challenge with a full attempt budget
    ///
    /// # Arguments
    ///
    /// * `phone_key` - Normalized phone the code is bound to
    /// * `code` - Freshly generated code
    /// * `now` - Issuance instant
    /// * `ttl` - Lifetime of the challenge
    /// * `max_attempts` - Wrong guesses allowed
    pub fn new(
        phone_key: PhoneKey,
        code: OtpCode,
        now: DateTime<Utc>,
        ttl: Duration,
        max_attempts: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            phone_key,
            code,
            created_at: now,
            expires_at: now + ttl,
            remaining_attempts: max_attempts,
        }
    }

    /// `true` once `expires_at <= now`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Unexpired with at least one attempt left
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        !self.is_expired(now) && self.remaining_attempts > 0
    }

    /// Spends one guess and returns what is left
    pub fn record_failure(&mut self) -> u32 {
        self.remaining_attempts = self.remaining_attempts.saturating_sub(1);
        self.remaining_attempts
    }

    /// Time remaining until expiration, zero once expired
    pub fn time_until_expiration(&self, now: DateTime<Utc>) -> Duration {
        if self.expires_at > now {
            self.expires_at - now
        } else {
            Duration::zero()
        }
    }

    /// Copy of the fields a verifier needs
    pub fn snapshot(&self) -> ActiveChallenge {
        ActiveChallenge {
            challenge_id: self.id,
            code: self.code.clone(),
            expires_at: self.expires_at,
            remaining_attempts: self.remaining_attempts,
        }
    }
}

/// Read-only view of a live challenge returned by a store lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveChallenge {
    pub challenge_id: Uuid,
    pub code: OtpCode,
    pub expires_at: DateTime<Utc>,
    pub remaining_attempts: u32,
}
