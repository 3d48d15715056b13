//! # OTP Core
//!
//! Phone one-time-passcode authentication core: normalization, code
//! generation, the challenge lifecycle, rate limiting contracts and the
//! identity hand-off. Storage and delivery are injected through the traits in
//! [`services::verification`]; concrete adapters live in `otp_infra`.

pub mod domain;
pub mod errors;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::entities::{ActiveChallenge, Challenge, RatePolicy, RateWindow};
pub use domain::value_objects::{
    CancelOutcome, IdentityAssertion, InputField, IssuanceOutcome, OtpCode, PhoneKey,
    RateDecision, RateKey, VerificationOutcome,
};
pub use errors::{DomainError, DomainResult};
pub use services::{
    AttemptRecord, ChallengeLookup, ChallengeReceipt, ChallengeStore, Clock, CodeGenerator,
    ConsumeResult, DeliveryGateway, DeliveryRequest, ExpirySweeper, IdentityAssertionIssuer,
    IdentityClaims, IssuanceRateLimiter, JwtIdentityIssuer, ManualClock, OsRngCodeGenerator,
    PhoneFormatError, PhoneNormalizer, SweepReport, SystemClock, VerificationEngine,
    VerificationEngineConfig,
};
