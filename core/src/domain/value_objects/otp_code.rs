//! One-time passcode value

use std::fmt;

/// A numeric one-time passcode
///
/// `Debug` never prints the digits so a code cannot leak through a stray
/// `{:?}` in a log statement.
#[derive(Clone, PartialEq, Eq)]
pub struct OtpCode(String);

impl OtpCode {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The digits, for comparison and delivery only
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Exactly `length` ASCII digits
    pub fn is_well_formed(value: &str, length: usize) -> bool {
        value.len() == length && value.bytes().all(|b| b.is_ascii_digit())
    }
}

impl fmt::Debug for OtpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OtpCode({})", "*".repeat(self.0.len()))
    }
}
