//! Value objects: identities, codes, rate keys and outcomes.

pub mod identity;
pub mod otp_code;
pub mod outcome;
pub mod phone_key;
pub mod rate_key;

pub use identity::IdentityAssertion;
pub use otp_code::OtpCode;
pub use outcome::{CancelOutcome, InputField, IssuanceOutcome, VerificationOutcome};
pub use phone_key::PhoneKey;
pub use rate_key::{RateDecision, RateKey};
