//! Phone number acceptance rules

use serde::{Deserialize, Serialize};

/// National numbering rules for one calling region
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RegionRule {
    /// Short region name used in logs ("IN", "US")
    pub region: String,

    /// Country calling code without the plus sign ("91")
    pub country_code: String,

    /// Digits in the national significant number
    pub national_length: usize,

    /// Digits a national number may start with ("6789")
    pub valid_leading_digits: String,
}

impl RegionRule {
    pub fn new(
        region: impl Into<String>,
        country_code: impl Into<String>,
        national_length: usize,
        valid_leading_digits: impl Into<String>,
    ) -> Self {
        Self {
            region: region.into(),
            country_code: country_code.into(),
            national_length,
            valid_leading_digits: valid_leading_digits.into(),
        }
    }

    /// India mobile numbering: 10 digits starting with 6-9
    pub fn india() -> Self {
        Self::new("IN", "91", 10, "6789")
    }

    /// North American numbering plan: 10 digits, area code cannot start with 0 or 1
    pub fn north_america() -> Self {
        Self::new("US", "1", 10, "23456789")
    }
}

/// Which phone inputs are accepted and how bare numbers are interpreted
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PhoneConfig {
    /// Region assumed for bare national numbers (must name one of `regions`)
    pub default_region: String,

    /// Regions with strict national validation
    pub regions: Vec<RegionRule>,

    /// Accept `+`-prefixed numbers from calling codes not listed in `regions`
    #[serde(default)]
    pub allow_other_international: bool,
}

impl Default for PhoneConfig {
    fn default() -> Self {
        Self {
            default_region: String::from("IN"),
            regions: vec![RegionRule::india(), RegionRule::north_america()],
            allow_other_international: false,
        }
    }
}

impl PhoneConfig {
    /// Look up the rule for the configured default region
    pub fn default_rule(&self) -> Option<&RegionRule> {
        self.regions.iter().find(|r| r.region == self.default_region)
    }
}
