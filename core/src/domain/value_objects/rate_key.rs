//! Keys and decisions for issuance/verification rate limiting

use std::net::IpAddr;

use super::phone_key::PhoneKey;

/// What a rate window counts against
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RateKey {
    /// Issuances for one phone number
    Phone(PhoneKey),
    /// Issuances requested from one network address
    NetworkIssue(IpAddr),
    /// Verification calls from one network address
    NetworkVerify(IpAddr),
}

impl RateKey {
    /// Short name of the rule family, also the storage namespace
    pub fn scope(&self) -> &'static str {
        match self {
            RateKey::Phone(_) => "phone",
            RateKey::NetworkIssue(_) => "net_issue",
            RateKey::NetworkVerify(_) => "net_verify",
        }
    }

    /// Unique key for maps and external stores (`phone:+15551234567`)
    pub fn storage_key(&self) -> String {
        match self {
            RateKey::Phone(phone) => format!("{}:{}", self.scope(), phone.as_str()),
            RateKey::NetworkIssue(ip) | RateKey::NetworkVerify(ip) => {
                format!("{}:{}", self.scope(), ip)
            }
        }
    }

    /// Loggable form; phone numbers are masked
    pub fn masked(&self) -> String {
        match self {
            RateKey::Phone(phone) => format!("{}:{}", self.scope(), phone.masked()),
            _ => self.storage_key(),
        }
    }
}

/// Result of asking a limiter for one more event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateDecision {
    /// Event counted; `remaining` is the smallest headroom across all rules
    Allowed { remaining: u32 },
    /// Event rejected and not counted
    Denied {
        retry_after_seconds: u64,
        /// Name of the rule that refused
        rule: String,
    },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateDecision::Allowed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_keys_are_namespaced() {
        let phone = PhoneKey::try_from("+919876543210".to_string()).unwrap();
        let ip: IpAddr = "203.0.113.7".parse().unwrap();

        assert_eq!(RateKey::Phone(phone.clone()).storage_key(), "phone:+919876543210");
        assert_eq!(RateKey::NetworkIssue(ip).storage_key(), "net_issue:203.0.113.7");
        assert_eq!(RateKey::NetworkVerify(ip).storage_key(), "net_verify:203.0.113.7");
        assert!(!RateKey::Phone(phone).masked().contains("9876543"));
    }
}
