//! Fixed business policy: risk weights, thresholds and field rules.
//!
//! Built once at startup and shared read-only behind an `Arc`. Tests build
//! their own values to exercise alternate thresholds.

use bigdecimal::BigDecimal;
use chrono::Duration;
use std::fmt;
use std::str::FromStr;

pub const RISK_THRESHOLD: u32 = 70;
pub const HIGH_RISK_COUNTRIES: &[&str] = &["RU", "CN", "KP", "IR"];

/// How recipient account numbers are normalized before storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccountNumberPolicy {
    /// Letters and digits, stored uppercased.
    #[default]
    Alphanumeric,
    /// Non-digit characters are stripped; the remainder must still be a valid length.
    Numeric,
}

impl AccountNumberPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountNumberPolicy::Alphanumeric => "alphanumeric",
            AccountNumberPolicy::Numeric => "numeric",
        }
    }
}

impl fmt::Display for AccountNumberPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountNumberPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "alphanumeric" => Ok(AccountNumberPolicy::Alphanumeric),
            "numeric" => Ok(AccountNumberPolicy::Numeric),
            other => anyhow::bail!(
                "ACCOUNT_NUMBER_POLICY must be 'alphanumeric' or 'numeric', got '{}'",
                other
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RiskPolicy {
    pub threshold: u32,
    pub high_risk_countries: Vec<String>,
    pub country_weight: u32,
    /// Amounts at or below this carry no amount risk.
    pub amount_floor: BigDecimal,
    /// Currency units per risk point above the floor.
    pub amount_step: BigDecimal,
    pub amount_cap: u32,
    /// Submissions above this count inside the window trigger velocity risk.
    pub velocity_limit: u64,
    pub velocity_window: Duration,
    pub velocity_weight: u32,
    pub historical_weight: u32,
}

impl Default for RiskPolicy {
    fn default() -> Self {
        Self {
            threshold: RISK_THRESHOLD,
            high_risk_countries: HIGH_RISK_COUNTRIES.iter().map(|c| c.to_string()).collect(),
            country_weight: 30,
            amount_floor: BigDecimal::from(5000),
            amount_step: BigDecimal::from(100),
            amount_cap: 50,
            velocity_limit: 15,
            velocity_window: Duration::hours(24),
            velocity_weight: 30,
            historical_weight: 10,
        }
    }
}

impl RiskPolicy {
    pub fn is_high_risk_country(&self, country: &str) -> bool {
        self.high_risk_countries.iter().any(|c| c == country)
    }
}

#[derive(Debug, Clone)]
pub struct FieldPolicy {
    pub account_numbers: AccountNumberPolicy,
    pub notes_max_len: usize,
    /// Punctuation accepted in verification notes besides letters, digits and whitespace.
    pub notes_punctuation: &'static str,
}

impl Default for FieldPolicy {
    fn default() -> Self {
        Self {
            account_numbers: AccountNumberPolicy::default(),
            notes_max_len: 200,
            notes_punctuation: ".,!?@()-'\"%&*:;/<>",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PolicyConfig {
    pub risk: RiskPolicy,
    pub fields: FieldPolicy,
}

impl PolicyConfig {
    pub fn with_account_number_policy(mut self, policy: AccountNumberPolicy) -> Self {
        self.fields.account_numbers = policy;
        self
    }
}
