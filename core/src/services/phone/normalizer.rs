//! Turns user-typed phone numbers into canonical [`PhoneKey`]s
//!
//! Accepted shapes, after formatting characters are stripped:
//! - a bare national number of the default region's length
//! - the same national number prefixed with a known country calling code
//! - a `+`-prefixed international number

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use otp_shared::config::{PhoneConfig, RegionRule};
use otp_shared::strip_formatting;

use crate::domain::value_objects::PhoneKey;
use crate::errors::{DomainError, DomainResult};

static GENERIC_E164: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[1-9]\d{6,14}$").expect("generic E.164 regex is valid"));

/// Why a phone input was rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneFormatError {
    #[error("phone number is empty")]
    Empty,

    #[error("phone number contains non-numeric characters")]
    NonNumeric,

    #[error("unsupported country calling code")]
    UnknownCountryCode,

    #[error("{region} numbers have {expected} digits, got {actual}")]
    InvalidLength {
        region: String,
        expected: usize,
        actual: usize,
    },

    #[error("{region} numbers cannot start with that digit")]
    InvalidLeadingDigit { region: String },

    #[error("unrecognized phone number shape")]
    Unrecognized,
}

#[derive(Debug)]
struct CompiledRegion {
    rule: RegionRule,
    national: Regex,
}

impl CompiledRegion {
    fn compile(rule: &RegionRule) -> DomainResult<Self> {
        if rule.country_code.len() + rule.national_length > 15 {
            return Err(DomainError::configuration(format!(
                "phone region {}: numbers would exceed 15 digits",
                rule.region
            )));
        }
        let pattern = format!(
            r"^[{}]\d{{{}}}$",
            rule.valid_leading_digits,
            rule.national_length.saturating_sub(1)
        );
        let national = Regex::new(&pattern).map_err(|e| {
            DomainError::configuration(format!("phone region {}: {}", rule.region, e))
        })?;
        Ok(Self {
            rule: rule.clone(),
            national,
        })
    }

    fn check_national(&self, national: &str) -> Result<PhoneKey, PhoneFormatError> {
        if national.len() != self.rule.national_length {
            return Err(PhoneFormatError::InvalidLength {
                region: self.rule.region.clone(),
                expected: self.rule.national_length,
                actual: national.len(),
            });
        }
        if !self.national.is_match(national) {
            return Err(PhoneFormatError::InvalidLeadingDigit {
                region: self.rule.region.clone(),
            });
        }
        Ok(PhoneKey::from_canonical(format!(
            "+{}{}",
            self.rule.country_code, national
        )))
    }

    /// `digits` is exactly country code + national number of this region
    fn fits_international(&self, digits: &str) -> bool {
        digits.len() == self.rule.country_code.len() + self.rule.national_length
            && digits.starts_with(&self.rule.country_code)
    }
}

/// Pure, configuration-driven phone normalizer
#[derive(Debug)]
pub struct PhoneNormalizer {
    regions: Vec<CompiledRegion>,
    default_index: usize,
    allow_other_international: bool,
}

impl PhoneNormalizer {
    /// Compile the region rules once
    ///
    /// Fails with [`DomainError::Configuration`] when the default region is
    /// missing or a rule does not form a valid pattern.
    pub fn new(config: &PhoneConfig) -> DomainResult<Self> {
        let regions = config
            .regions
            .iter()
            .map(CompiledRegion::compile)
            .collect::<DomainResult<Vec<_>>>()?;

        let default_index = regions
            .iter()
            .position(|r| r.rule.region == config.default_region)
            .ok_or_else(|| {
                DomainError::configuration(format!(
                    "default phone region {} has no rule",
                    config.default_region
                ))
            })?;

        Ok(Self {
            regions,
            default_index,
            allow_other_international: config.allow_other_international,
        })
    }

    /// Canonicalize `raw` to `+<countrycode><nationalnumber>`
    pub fn normalize(&self, raw: &str) -> Result<PhoneKey, PhoneFormatError> {
        if raw.trim().is_empty() {
            return Err(PhoneFormatError::Empty);
        }
        if raw.chars().any(|c| c.is_alphabetic()) {
            return Err(PhoneFormatError::NonNumeric);
        }

        let stripped = strip_formatting(raw);
        match stripped.strip_prefix('+') {
            Some(international) => self.normalize_international(international),
            None => self.normalize_bare(&stripped),
        }
    }

    fn normalize_international(&self, digits: &str) -> Result<PhoneKey, PhoneFormatError> {
        if digits.is_empty() {
            return Err(PhoneFormatError::Empty);
        }

        // Longest matching calling code wins
        let region = self
            .regions
            .iter()
            .filter(|r| digits.starts_with(&r.rule.country_code))
            .max_by_key(|r| r.rule.country_code.len());

        match region {
            Some(region) => region.check_national(&digits[region.rule.country_code.len()..]),
            None if self.allow_other_international && GENERIC_E164.is_match(digits) => {
                Ok(PhoneKey::from_canonical(format!("+{}", digits)))
            }
            None => Err(PhoneFormatError::UnknownCountryCode),
        }
    }

    fn normalize_bare(&self, digits: &str) -> Result<PhoneKey, PhoneFormatError> {
        if digits.is_empty() {
            return Err(PhoneFormatError::NonNumeric);
        }

        let default = &self.regions[self.default_index];
        if digits.len() == default.rule.national_length {
            return default.check_national(digits);
        }

        if let Some(region) = self.regions.iter().find(|r| r.fits_international(digits)) {
            return region.check_national(&digits[region.rule.country_code.len()..]);
        }

        Err(PhoneFormatError::InvalidLength {
            region: default.rule.region.clone(),
            expected: default.rule.national_length,
            actual: digits.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> PhoneNormalizer {
        PhoneNormalizer::new(&PhoneConfig::default()).unwrap()
    }

    fn canonical(raw: &str) -> String {
        normalizer().normalize(raw).unwrap().as_str().to_string()
    }

    #[test]
    fn test_equivalent_forms_share_one_key() {
        assert_eq!(canonical("9876543210"), "+919876543210");
        assert_eq!(canonical("919876543210"), "+919876543210");
        assert_eq!(canonical("+919876543210"), "+919876543210");
        assert_eq!(canonical("+91 98765-43210"), "+919876543210");
        assert_eq!(canonical(" (987) 654 3210 "), "+919876543210");
    }

    #[test]
    fn test_north_american_numbers() {
        assert_eq!(canonical("+15551234567"), "+15551234567");
        assert_eq!(canonical("1 (555) 123-4567"), "+15551234567");
        assert_eq!(canonical("+1 212.555.0100"), "+12125550100");
    }

    #[test]
    fn test_rejects_bad_leading_digit() {
        assert_eq!(
            normalizer().normalize("5876543210"),
            Err(PhoneFormatError::InvalidLeadingDigit { region: "IN".to_string() })
        );
        assert!(matches!(
            normalizer().normalize("+10551234567"),
            Err(PhoneFormatError::InvalidLeadingDigit { .. })
        ));
    }

    #[test]
    fn test_rejects_wrong_length() {
        assert!(matches!(
            normalizer().normalize("98765432"),
            Err(PhoneFormatError::InvalidLength { expected: 10, actual: 8, .. })
        ));
        assert!(matches!(
            normalizer().normalize("+9198765432101"),
            Err(PhoneFormatError::InvalidLength { .. })
        ));
    }

    #[test]
    fn test_rejects_non_numeric_and_empty() {
        assert_eq!(normalizer().normalize(""), Err(PhoneFormatError::Empty));
        assert_eq!(normalizer().normalize("   "), Err(PhoneFormatError::Empty));
        assert_eq!(normalizer().normalize("+"), Err(PhoneFormatError::Empty));
        assert_eq!(normalizer().normalize("98765abc10"), Err(PhoneFormatError::NonNumeric));
        assert_eq!(normalizer().normalize("---"), Err(PhoneFormatError::NonNumeric));
    }

    #[test]
    fn test_unknown_country_code() {
        assert_eq!(
            normalizer().normalize("+447911123456"),
            Err(PhoneFormatError::UnknownCountryCode)
        );

        let mut config = PhoneConfig::default();
        config.allow_other_international = true;
        let permissive = PhoneNormalizer::new(&config).unwrap();
        assert_eq!(
            permissive.normalize("+44 7911 123456").unwrap().as_str(),
            "+447911123456"
        );
        assert!(permissive.normalize("+0123456789").is_err());
    }

    #[test]
    fn test_missing_default_region_is_configuration_error() {
        let mut config = PhoneConfig::default();
        config.default_region = "XX".to_string();
        assert!(matches!(
            PhoneNormalizer::new(&config),
            Err(DomainError::Configuration { .. })
        ));
    }

    #[test]
    fn test_region_longer_than_e164_is_configuration_error() {
        let mut config = PhoneConfig::default();
        config.regions.push(RegionRule::new("ZZ", "999", 13, "1"));
        assert!(matches!(
            PhoneNormalizer::new(&config),
            Err(DomainError::Configuration { .. })
        ));
    }

    #[test]
    fn test_custom_region_default() {
        let config = PhoneConfig {
            default_region: "US".to_string(),
            regions: vec![RegionRule::north_america()],
            allow_other_international: false,
        };
        let normalizer = PhoneNormalizer::new(&config).unwrap();
        assert_eq!(normalizer.normalize("555-123-4567").unwrap().as_str(), "+15551234567");
        assert!(normalizer.normalize("+919876543210").is_err());
    }
}
