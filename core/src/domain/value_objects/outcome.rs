//! Typed results of issuance and verification
//!
//! Every expected, user-facing result is a variant here. Callers branch on
//! the variant; none of these are errors.

use chrono::{DateTime, Utc};

use otp_shared::error_codes;

use super::identity::IdentityAssertion;
use super::phone_key::PhoneKey;

/// Which input failed format validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputField {
    Phone,
    Code,
}

impl InputField {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputField::Phone => "phone",
            InputField::Code => "code",
        }
    }
}

/// Result of `request_code`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssuanceOutcome {
    /// A code was stored and handed to delivery
    Issued {
        phone_key: PhoneKey,
        ttl_seconds: u64,
        expires_at: DateTime<Utc>,
    },
    /// The phone number could not be normalized
    InvalidFormat,
    /// An issuance budget is spent; nothing was generated or stored
    RateLimited { retry_after_seconds: u64 },
}

impl IssuanceOutcome {
    pub fn is_issued(&self) -> bool {
        matches!(self, IssuanceOutcome::Issued { .. })
    }

    pub fn error_code(&self) -> Option<&'static str> {
        match self {
            IssuanceOutcome::Issued { .. } => None,
            IssuanceOutcome::InvalidFormat => Some(error_codes::INVALID_FORMAT),
            IssuanceOutcome::RateLimited { .. } => Some(error_codes::RATE_LIMITED),
        }
    }
}

/// Result of `verify_code`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// Code matched; the challenge is consumed
    Success(IdentityAssertion),
    /// Code did not match; the caller may retry
    InvalidCode { remaining_attempts: u32 },
    /// The challenge lapsed before this attempt
    Expired,
    /// This attempt spent the last guess; the challenge is gone
    AttemptsExhausted,
    /// Nothing outstanding for this phone (never issued, consumed, superseded or burned)
    NoActiveChallenge,
    /// Too many verification calls from the requester's address
    RateLimited { retry_after_seconds: u64 },
    /// Phone or code failed format validation; no state was touched
    InvalidFormat(InputField),
}

impl VerificationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, VerificationOutcome::Success(_))
    }

    pub fn error_code(&self) -> Option<&'static str> {
        match self {
            VerificationOutcome::Success(_) => None,
            VerificationOutcome::InvalidCode { .. } => Some(error_codes::INVALID_CODE),
            VerificationOutcome::Expired => Some(error_codes::CODE_EXPIRED),
            VerificationOutcome::AttemptsExhausted => Some(error_codes::ATTEMPTS_EXHAUSTED),
            VerificationOutcome::NoActiveChallenge => Some(error_codes::NO_ACTIVE_CHALLENGE),
            VerificationOutcome::RateLimited { .. } => Some(error_codes::RATE_LIMITED),
            VerificationOutcome::InvalidFormat(_) => Some(error_codes::INVALID_FORMAT),
        }
    }

    /// Label used in structured logs
    pub fn label(&self) -> &'static str {
        match self {
            VerificationOutcome::Success(_) => "success",
            VerificationOutcome::InvalidCode { .. } => "invalid_code",
            VerificationOutcome::Expired => "expired",
            VerificationOutcome::AttemptsExhausted => "attempts_exhausted",
            VerificationOutcome::NoActiveChallenge => "no_active_challenge",
            VerificationOutcome::RateLimited { .. } => "rate_limited",
            VerificationOutcome::InvalidFormat(_) => "invalid_format",
        }
    }
}

/// Result of `cancel`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// An outstanding challenge was dropped
    Cancelled,
    /// There was nothing to drop
    NothingToCancel,
    /// The phone number could not be normalized
    InvalidFormat,
}
