//! Verified-identity assertion handed to the rest of the system

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::phone_key::PhoneKey;

/// Opaque credential proving the holder controls `subject`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityAssertion {
    /// Phone number that was proven
    pub subject: PhoneKey,
    /// The token itself
    pub token: String,
    /// Token scheme ("Bearer")
    pub token_type: String,
    /// When the token stops being accepted
    pub expires_at: DateTime<Utc>,
    /// Lifetime from the issuer's stamping instant to `expires_at`
    pub expires_in_seconds: i64,
}
