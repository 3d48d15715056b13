//! Verification module: the challenge lifecycle for phone OTP sign-in
//!
//! This module provides:
//! - The collaborator traits the engine is wired against (store, limiter,
//!   delivery, identity issuer)
//! - The value types those collaborators exchange
//! - [`VerificationEngine`], which orchestrates issuance and verification

mod config;
mod engine;
mod traits;
mod types;


pub use config::VerificationEngineConfig;
pub use engine::VerificationEngine;
pub use traits::{ChallengeStore, DeliveryGateway, IdentityAssertionIssuer, IssuanceRateLimiter};
pub use types::{AttemptRecord, ChallengeLookup, ChallengeReceipt, ConsumeResult, DeliveryRequest};
