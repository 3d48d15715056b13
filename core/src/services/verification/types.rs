//! Values exchanged between the engine and its collaborators

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entities::ActiveChallenge;
use crate::domain::value_objects::{OtpCode, PhoneKey};

/// Result of peeking at the challenge for a phone
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChallengeLookup {
    Active(ActiveChallenge),
    /// The challenge lapsed and has been evicted
    Expired,
    NotFound,
}

/// Result of spending one guess on a specific challenge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptRecord {
    /// Guesses left; `0` means the challenge was burned and evicted
    Remaining(u32),
    /// The challenge lapsed before the guess was recorded
    Expired,
    /// The challenge was superseded, consumed or burned in the meantime
    NotFound,
}

/// Result of consuming a specific challenge after a correct guess
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumeResult {
    Consumed,
    Expired,
    /// Someone else consumed, superseded or burned it first
    NotFound,
}

/// What `put` stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeReceipt {
    pub challenge_id: Uuid,
    pub expires_at: DateTime<Utc>,
    /// A still-active challenge for the same phone was replaced
    pub superseded: bool,
}

/// One code to hand to the delivery channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryRequest {
    pub phone: PhoneKey,
    pub code: OtpCode,
    pub ttl_seconds: u64,
}
