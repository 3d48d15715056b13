//! Domain entities representing core business objects.

pub mod challenge;
pub mod rate_window;

pub use challenge::{ActiveChallenge, Challenge, CODE_LENGTH, DEFAULT_TTL_SECONDS, MAX_ATTEMPTS};
pub use rate_window::{RatePolicy, RateWindow};
