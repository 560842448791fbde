//! SWIFT/BIC code validation.
//!
//! Layout: 4-letter bank code, 2-letter country, 2-character location and an
//! optional 3-character branch.

use serde::Serialize;

use crate::config::policy::RiskPolicy;

pub const REASON_VALID: &str = "Valid SWIFT/BIC code";
pub const REASON_LENGTH: &str = "Invalid SWIFT code length";
pub const REASON_FORMAT: &str = "Invalid SWIFT/BIC format";
pub const REASON_RESTRICTED: &str = "SWIFT code from restricted country";
pub const REASON_MISSING: &str = "SWIFT code is required";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwiftValidation {
    pub valid: bool,
    pub reason: &'static str,
    pub swift_code: String,
}

impl SwiftValidation {
    fn invalid(swift_code: String, reason: &'static str) -> Self {
        Self {
            valid: false,
            reason,
            swift_code,
        }
    }
}

fn normalize(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// `^[A-Z]{6}[A-Z0-9]{2}([A-Z0-9]{3})?$`, on an already normalized code.
fn is_well_formed(code: &str) -> bool {
    let bytes = code.as_bytes();
    if bytes.len() != 8 && bytes.len() != 11 {
        return false;
    }

    bytes[..6].iter().all(u8::is_ascii_uppercase)
        && bytes[6..]
            .iter()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
}

/// Country segment at offsets 4..6. `None` for codes too short to carry one.
pub fn country_segment(code: &str) -> Option<&str> {
    code.get(4..6)
}

/// Structural check only: trims, uppercases and verifies length and layout.
pub fn normalize_structure(code: &str) -> Result<String, &'static str> {
    let normalized = normalize(code);

    if normalized.is_empty() {
        return Err(REASON_MISSING);
    }
    if normalized.len() != 8 && normalized.len() != 11 {
        return Err(REASON_LENGTH);
    }
    if !is_well_formed(&normalized) {
        return Err(REASON_FORMAT);
    }

    Ok(normalized)
}

/// Full validation including the restricted-country policy.
pub fn validate(code: &str, high_risk_countries: &[String]) -> SwiftValidation {
    let swift_code = match normalize_structure(code) {
        Ok(normalized) => normalized,
        Err(reason) => return SwiftValidation::invalid(normalize(code), reason),
    };

    let restricted = country_segment(&swift_code)
        .map(|country| high_risk_countries.iter().any(|c| c == country))
        .unwrap_or(false);

    if restricted {
        return SwiftValidation::invalid(swift_code, REASON_RESTRICTED);
    }

    SwiftValidation {
        valid: true,
        reason: REASON_VALID,
        swift_code,
    }
}

/// Validator bound to a restricted-country list.
#[derive(Debug, Clone)]
pub struct SwiftValidator {
    high_risk_countries: Vec<String>,
}

impl SwiftValidator {
    pub fn new(high_risk_countries: Vec<String>) -> Self {
        Self {
            high_risk_countries,
        }
    }

    pub fn from_policy(policy: &RiskPolicy) -> Self {
        Self::new(policy.high_risk_countries.clone())
    }

    pub fn validate(&self, code: &str) -> SwiftValidation {
        validate(code, &self.high_risk_countries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::policy::HIGH_RISK_COUNTRIES;

    fn high_risk() -> Vec<String> {
        HIGH_RISK_COUNTRIES.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn accepts_eight_and_eleven_character_codes() {
        assert!(validate("DEUTDEFF", &high_risk()).valid);
        assert!(validate("DEUTDEFFXXX", &high_risk()).valid);
        assert!(validate("SBZAZAJJ", &high_risk()).valid);
    }

    #[test]
    fn normalizes_case_and_whitespace() {
        let result = validate("  deutdeff ", &high_risk());
        assert!(result.valid);
        assert_eq!(result.swift_code, "DEUTDEFF");
        assert_eq!(result.reason, REASON_VALID);
    }

    #[test]
    fn rejects_bad_lengths() {
        let result = validate("AB12", &high_risk());
        assert!(!result.valid);
        assert_eq!(result.reason, REASON_LENGTH);

        assert_eq!(validate("DEUTDEFFX", &high_risk()).reason, REASON_LENGTH);
        assert_eq!(validate("DEUTDEFFXXXX", &high_risk()).reason, REASON_LENGTH);
        assert_eq!(validate("", &high_risk()).reason, REASON_MISSING);
    }

    #[test]
    fn rejects_malformed_structure() {
        assert_eq!(validate("DEU1DEFF", &high_risk()).reason, REASON_FORMAT);
        assert_eq!(validate("DEUTDE-F", &high_risk()).reason, REASON_FORMAT);
        assert_eq!(validate("DEUTDEFFXX!", &high_risk()).reason, REASON_FORMAT);
    }

    #[test]
    fn rejects_restricted_country_even_when_well_formed() {
        let result = validate("SBZARUJJ", &high_risk());
        assert!(!result.valid);
        assert_eq!(result.reason, REASON_RESTRICTED);
        assert!(normalize_structure("SBZARUJJ").is_ok());
    }

    #[test]
    fn validator_uses_policy_country_list() {
        let validator = SwiftValidator::from_policy(&RiskPolicy::default());
        assert_eq!(validator.validate("BKCHCNBJ").reason, REASON_RESTRICTED);

        let permissive = SwiftValidator::new(Vec::new());
        assert!(permissive.validate("BKCHCNBJ").valid);
    }

    #[test]
    fn country_segment_handles_short_codes() {
        assert_eq!(country_segment("DEUTDEFF"), Some("DE"));
        assert_eq!(country_segment("AB12"), None);
        assert_eq!(country_segment(""), None);
    }
}
