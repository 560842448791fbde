use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::policy::{AccountNumberPolicy, FieldPolicy};
use crate::domain::{Currency, Provider, RecipientAccountInfo, TransactionDraft};

pub mod swift;

pub const AMOUNT_INPUT_MAX_LEN: usize = 64;
/// Integer digits that fit the `NUMERIC(20, 2)` amount column.
pub const AMOUNT_MAX_INTEGER_DIGITS: usize = 18;
pub const NAME_MIN_LEN: usize = 2;
pub const NAME_MAX_LEN: usize = 50;
pub const ACCOUNT_NUMBER_MIN_LEN: usize = 10;
pub const ACCOUNT_NUMBER_MAX_LEN: usize = 20;

/// Untrusted transaction input as submitted by a customer.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RawTransactionDraft {
    #[serde(default)]
    pub amount: Option<AmountInput>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub swift_code: Option<String>,
    #[serde(default)]
    pub recipient_account_info: Option<RawRecipientAccountInfo>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RawRecipientAccountInfo {
    #[serde(default)]
    pub account_name: Option<String>,
    #[serde(default)]
    pub account_number: Option<String>,
    #[serde(default)]
    pub bank_name: Option<String>,
}

/// Amounts arrive either as JSON strings or JSON numbers.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum AmountInput {
    Text(String),
    Number(serde_json::Number),
}

impl AmountInput {
    pub fn as_text(&self) -> String {
        match self {
            AmountInput::Text(text) => text.clone(),
            AmountInput::Number(number) => number.to_string(),
        }
    }
}

impl From<&str> for AmountInput {
    fn from(value: &str) -> Self {
        AmountInput::Text(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Every field-level failure found in one input.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl ValidationErrors {
    pub fn push(&mut self, error: ValidationError) {
        self.0.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> Vec<&'static str> {
        self.0.iter().map(|e| e.field).collect()
    }
}

impl From<ValidationError> for ValidationErrors {
    fn from(error: ValidationError) -> Self {
        Self(vec![error])
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .0
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        f.write_str(&joined)
    }
}

impl std::error::Error for ValidationErrors {}

pub type ValidationResult<T = ()> = Result<T, ValidationError>;

pub fn sanitize_string(value: &str) -> String {
    value
        .chars()
        .filter(|ch| !ch.is_control() || ch.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Removes HTML-significant angle brackets so stored text cannot carry markup.
pub fn strip_markup(value: &str) -> String {
    value.chars().filter(|ch| !matches!(ch, '<' | '>')).collect()
}

pub fn validate_required(field: &'static str, value: &str) -> ValidationResult {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }

    Ok(())
}

pub fn validate_max_len(field: &'static str, value: &str, max_len: usize) -> ValidationResult {
    if value.chars().count() > max_len {
        return Err(ValidationError::new(
            field,
            format!("must be at most {} characters", max_len),
        ));
    }

    Ok(())
}

pub fn validate_enum(field: &'static str, value: &str, allowed: &[&str]) -> ValidationResult {
    if allowed.iter().all(|candidate| value != *candidate) {
        return Err(ValidationError::new(
            field,
            format!("must be one of: {}", allowed.join(", ")),
        ));
    }

    Ok(())
}

fn required<'a>(field: &'static str, value: Option<&'a str>) -> ValidationResult<&'a str> {
    let value = value.ok_or_else(|| ValidationError::new(field, "is required"))?;
    validate_required(field, value)?;
    Ok(value)
}

/// `^(?!0\d)\d+(\.\d{1,2})?$`
fn is_canonical_amount(value: &str) -> bool {
    let (int_part, frac_part) = match value.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (value, None),
    };

    if int_part.is_empty() || !int_part.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    if int_part.len() > 1 && int_part.starts_with('0') {
        return false;
    }

    match frac_part {
        Some(frac) => (1..=2).contains(&frac.len()) && frac.bytes().all(|b| b.is_ascii_digit()),
        None => true,
    }
}

/// Parses an amount into a positive fixed-point decimal with exactly two fractional digits.
pub fn validate_amount(raw: &str) -> ValidationResult<BigDecimal> {
    let amount = raw.trim();
    validate_required("amount", amount)?;
    validate_max_len("amount", amount, AMOUNT_INPUT_MAX_LEN)?;

    if !is_canonical_amount(amount) {
        return Err(ValidationError::new(
            "amount",
            "must be a plain decimal with at most 2 fractional digits",
        ));
    }

    let integer_digits = amount.split('.').next().map_or(0, str::len);
    if integer_digits > AMOUNT_MAX_INTEGER_DIGITS {
        return Err(ValidationError::new(
            "amount",
            format!(
                "must have at most {} digits before the decimal point",
                AMOUNT_MAX_INTEGER_DIGITS
            ),
        ));
    }

    let parsed = BigDecimal::from_str(amount)
        .map_err(|_| ValidationError::new("amount", "is not a valid decimal"))?;
    validate_positive_amount(&parsed)?;

    Ok(parsed.with_scale(2))
}

pub fn validate_positive_amount(amount: &BigDecimal) -> ValidationResult {
    if amount <= &BigDecimal::from(0) {
        return Err(ValidationError::new("amount", "must be greater than zero"));
    }

    Ok(())
}

pub fn validate_currency(raw: &str) -> ValidationResult<Currency> {
    let code = sanitize_string(raw).to_ascii_uppercase();
    validate_required("currency", &code)?;

    let allowed: Vec<&str> = Currency::ALL.iter().map(Currency::code).collect();
    validate_enum("currency", &code, &allowed)?;

    Currency::from_str(&code).map_err(|e| ValidationError::new("currency", e))
}

pub fn validate_provider(raw: &str) -> ValidationResult<Provider> {
    let name = sanitize_string(&strip_markup(raw));
    validate_required("provider", &name)?;

    let allowed: Vec<&str> = Provider::ALL.iter().map(Provider::name).collect();
    validate_enum("provider", &name, &allowed)?;

    Provider::from_str(&name).map_err(|e| ValidationError::new("provider", e))
}

fn is_name_char(ch: char) -> bool {
    ch.is_ascii_alphabetic()
        || (('\u{C0}'..='\u{FF}').contains(&ch) && ch != '\u{D7}' && ch != '\u{F7}')
        || matches!(ch, ' ' | '\'' | '-')
}

/// Letters, spaces, apostrophes and hyphens. Angle brackets are stripped first.
pub fn validate_name(field: &'static str, raw: &str) -> ValidationResult<String> {
    let name = sanitize_string(&strip_markup(raw));
    validate_required(field, &name)?;

    let len = name.chars().count();
    if !(NAME_MIN_LEN..=NAME_MAX_LEN).contains(&len) {
        return Err(ValidationError::new(
            field,
            format!(
                "must be between {} and {} characters",
                NAME_MIN_LEN, NAME_MAX_LEN
            ),
        ));
    }

    if !name.chars().all(is_name_char) || !name.chars().any(char::is_alphabetic) {
        return Err(ValidationError::new(
            field,
            "must contain only letters, spaces, apostrophes and hyphens",
        ));
    }

    Ok(name)
}

fn validate_account_number_len(value: &str) -> ValidationResult {
    if !(ACCOUNT_NUMBER_MIN_LEN..=ACCOUNT_NUMBER_MAX_LEN).contains(&value.len()) {
        return Err(ValidationError::new(
            "recipient_account_info.account_number",
            format!(
                "must be between {} and {} characters",
                ACCOUNT_NUMBER_MIN_LEN, ACCOUNT_NUMBER_MAX_LEN
            ),
        ));
    }

    Ok(())
}

pub fn validate_account_number(raw: &str, policy: AccountNumberPolicy) -> ValidationResult<String> {
    const FIELD: &str = "recipient_account_info.account_number";

    let compact: String = raw.chars().filter(|ch| !ch.is_whitespace()).collect();
    validate_required(FIELD, &compact)?;

    if !compact.chars().all(|ch| ch.is_ascii_alphanumeric()) {
        return Err(ValidationError::new(
            FIELD,
            "must contain only letters and digits",
        ));
    }
    validate_account_number_len(&compact)?;

    let normalized = match policy {
        AccountNumberPolicy::Numeric => {
            let digits = compact
                .chars()
                .filter(char::is_ascii_digit)
                .collect::<String>();
            validate_account_number_len(&digits)?;
            digits
        }
        AccountNumberPolicy::Alphanumeric => compact.to_ascii_uppercase(),
    };

    Ok(normalized)
}

/// Notes are optional. Any character outside the policy rejects the whole value.
pub fn validate_verification_notes(
    raw: Option<&str>,
    policy: &FieldPolicy,
) -> ValidationResult<Option<String>> {
    const FIELD: &str = "verification_notes";

    let notes = match raw.map(str::trim) {
        Some(notes) if !notes.is_empty() => notes,
        _ => return Ok(None),
    };

    validate_max_len(FIELD, notes, policy.notes_max_len)?;

    if let Some(bad) = notes.chars().find(|ch| {
        !(ch.is_ascii_alphanumeric() || *ch == ' ' || *ch == '\n' || *ch == '\t')
            && !policy.notes_punctuation.contains(*ch)
    }) {
        return Err(ValidationError::new(
            FIELD,
            format!("contains disallowed character {:?}", bad),
        ));
    }

    let cleaned = strip_markup(notes).trim().to_string();
    Ok(if cleaned.is_empty() { None } else { Some(cleaned) })
}

/// Validates every field of a submission and collects all failures.
pub fn validate_draft(
    raw: &RawTransactionDraft,
    policy: &FieldPolicy,
) -> Result<TransactionDraft, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let amount = raw
        .amount
        .as_ref()
        .map(AmountInput::as_text)
        .ok_or_else(|| ValidationError::new("amount", "is required"))
        .and_then(|text| validate_amount(&text));

    let currency = required("currency", raw.currency.as_deref()).and_then(validate_currency);
    let provider = required("provider", raw.provider.as_deref()).and_then(validate_provider);

    let swift_code = match raw.swift_code.as_deref().map(str::trim) {
        Some(code) if !code.is_empty() => swift::normalize_structure(code)
            .map(Some)
            .map_err(|reason| ValidationError::new("swift_code", reason)),
        _ => Ok(None),
    };

    let recipient = raw.recipient_account_info.clone().unwrap_or_default();
    let account_name = required(
        "recipient_account_info.account_name",
        recipient.account_name.as_deref(),
    )
    .and_then(|v| validate_name("recipient_account_info.account_name", v));
    let account_number = required(
        "recipient_account_info.account_number",
        recipient.account_number.as_deref(),
    )
    .and_then(|v| validate_account_number(v, policy.account_numbers));
    let bank_name = required(
        "recipient_account_info.bank_name",
        recipient.bank_name.as_deref(),
    )
    .and_then(|v| validate_name("recipient_account_info.bank_name", v));

    let amount = collect(&mut errors, amount);
    let currency = collect(&mut errors, currency);
    let provider = collect(&mut errors, provider);
    let swift_code = collect(&mut errors, swift_code);
    let account_name = collect(&mut errors, account_name);
    let account_number = collect(&mut errors, account_number);
    let bank_name = collect(&mut errors, bank_name);

    match (
        amount,
        currency,
        provider,
        swift_code,
        account_name,
        account_number,
        bank_name,
    ) {
        (
            Some(amount),
            Some(currency),
            Some(provider),
            Some(swift_code),
            Some(account_name),
            Some(account_number),
            Some(bank_name),
        ) if errors.is_empty() => Ok(TransactionDraft {
            amount,
            currency,
            provider,
            swift_code,
            recipient: RecipientAccountInfo {
                account_name,
                account_number,
                bank_name,
            },
        }),
        _ => Err(errors),
    }
}

fn collect<T>(errors: &mut ValidationErrors, result: ValidationResult<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(error) => {
            errors.push(error);
            None
        }
    }
}
