//! Canonical phone identity

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use otp_shared::mask_phone_number;

static CANONICAL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\+[1-9]\d{6,14}$").expect("canonical phone regex is valid")
});

/// Normalized `+<countrycode><nationalnumber>` string
///
/// Two inputs that denote the same handset always produce equal keys, so the
/// key is what challenges and rate windows are indexed by.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneKey(String);

impl PhoneKey {
    /// Build from an already-canonical value produced by the normalizer
    pub(crate) fn from_canonical(value: String) -> Self {
        debug_assert!(CANONICAL_REGEX.is_match(&value));
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Masked form for logs
    pub fn masked(&self) -> String {
        mask_phone_number(&self.0)
    }
}

impl TryFrom<String> for PhoneKey {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if CANONICAL_REGEX.is_match(&value) {
            Ok(Self(value))
        } else {
            Err(format!("not a canonical phone key: {}", mask_phone_number(&value)))
        }
    }
}

impl From<PhoneKey> for String {
    fn from(key: PhoneKey) -> Self {
        key.0
    }
}

impl AsRef<str> for PhoneKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for PhoneKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PhoneKey({})", self.masked())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_from_accepts_canonical() {
        let key = PhoneKey::try_from("+15551234567".to_string()).unwrap();
        assert_eq!(key.as_str(), "+15551234567");
        assert_eq!(key.masked(), "+15****4567");
    }

    #[test]
    fn test_try_from_rejects_non_canonical() {
        assert!(PhoneKey::try_from("15551234567".to_string()).is_err());
        assert!(PhoneKey::try_from("+0551234567".to_string()).is_err());
        assert!(PhoneKey::try_from("+1555-123".to_string()).is_err());
    }

    #[test]
    fn test_debug_is_masked() {
        let key = PhoneKey::try_from("+919876543210".to_string()).unwrap();
        assert_eq!(format!("{:?}", key), "PhoneKey(+91****3210)");
    }
}
