//! Transaction domain entity.
//! Framework-agnostic representation of an interbank payment.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Lifecycle state. `Completed` and `Rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Rejected,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransactionStatus::Pending)
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TransactionStatus::Pending),
            "completed" => Ok(TransactionStatus::Completed),
            "rejected" => Ok(TransactionStatus::Rejected),
            other => Err(format!("unknown transaction status '{}'", other)),
        }
    }
}

/// Decision an administrator can take on a pending transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationAction {
    Completed,
    Rejected,
}

impl VerificationAction {
    pub fn target_status(&self) -> TransactionStatus {
        match self {
            VerificationAction::Completed => TransactionStatus::Completed,
            VerificationAction::Rejected => TransactionStatus::Rejected,
        }
    }

    pub fn as_str(&self) -> &'static str {
        self.target_status().as_str()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    #[serde(rename = "USD")]
    Usd,
    #[serde(rename = "EUR")]
    Eur,
    #[serde(rename = "ZAR")]
    Zar,
    #[serde(rename = "GBP")]
    Gbp,
    #[serde(rename = "CNY")]
    Cny,
    #[serde(rename = "RUB")]
    Rub,
}

impl Currency {
    pub const ALL: [Currency; 6] = [
        Currency::Usd,
        Currency::Eur,
        Currency::Zar,
        Currency::Gbp,
        Currency::Cny,
        Currency::Rub,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Zar => "ZAR",
            Currency::Gbp => "GBP",
            Currency::Cny => "CNY",
            Currency::Rub => "RUB",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Currency::ALL
            .iter()
            .copied()
            .find(|c| c.code() == s)
            .ok_or_else(|| format!("unknown currency '{}'", s))
    }
}

/// Originating institution. Serialized by display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Provider {
    #[serde(rename = "ABSA Bank")]
    Absa,
    #[serde(rename = "Capitec Bank")]
    Capitec,
    #[serde(rename = "First National Bank")]
    FirstNational,
    #[serde(rename = "Nedbank")]
    Nedbank,
    #[serde(rename = "Standard Bank")]
    StandardBank,
    #[serde(rename = "African Bank")]
    AfricanBank,
    #[serde(rename = "Investec Bank")]
    Investec,
    #[serde(rename = "TymeBank")]
    TymeBank,
    #[serde(rename = "Discovery Bank")]
    Discovery,
    #[serde(rename = "Bank Zero")]
    BankZero,
}

impl Provider {
    pub const ALL: [Provider; 10] = [
        Provider::Absa,
        Provider::Capitec,
        Provider::FirstNational,
        Provider::Nedbank,
        Provider::StandardBank,
        Provider::AfricanBank,
        Provider::Investec,
        Provider::TymeBank,
        Provider::Discovery,
        Provider::BankZero,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Provider::Absa => "ABSA Bank",
            Provider::Capitec => "Capitec Bank",
            Provider::FirstNational => "First National Bank",
            Provider::Nedbank => "Nedbank",
            Provider::StandardBank => "Standard Bank",
            Provider::AfricanBank => "African Bank",
            Provider::Investec => "Investec Bank",
            Provider::TymeBank => "TymeBank",
            Provider::Discovery => "Discovery Bank",
            Provider::BankZero => "Bank Zero",
        }
    }

    /// Head-office routing BIC, used when the customer does not supply one.
    pub fn routing_bic(&self) -> &'static str {
        match self {
            Provider::Absa => "ABSAZAJJ",
            Provider::Capitec => "CABLZAJJ",
            Provider::FirstNational => "FIRNZAJJ",
            Provider::Nedbank => "NEDSZAJJ",
            Provider::StandardBank => "SBZAZAJJ",
            Provider::AfricanBank => "AFRCZAJJ",
            Provider::Investec => "IVESZAJJ",
            Provider::TymeBank => "TYMEZAJJ",
            Provider::Discovery => "DISCZAJJ",
            Provider::BankZero => "ZEROZAJJ",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Provider::ALL
            .iter()
            .copied()
            .find(|p| p.name() == s)
            .ok_or_else(|| format!("unknown provider '{}'", s))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientAccountInfo {
    pub account_name: String,
    pub account_number: String,
    pub bank_name: String,
}

/// Normalized, validated customer input. Produced only by the field validator.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionDraft {
    pub amount: BigDecimal,
    pub currency: Currency,
    pub provider: Provider,
    pub swift_code: Option<String>,
    pub recipient: RecipientAccountInfo,
}

/// Domain entity representing a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub customer_id: String,
    pub amount: BigDecimal,
    pub currency: Currency,
    pub provider: Provider,
    pub swift_code: String,
    pub recipient_account_info: RecipientAccountInfo,
    pub status: TransactionStatus,
    pub risk_score: u8,
    pub verified_by: Option<String>,
    pub verification_notes: Option<String>,
    pub verification_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Builds a pending transaction from a validated draft. A missing SWIFT code
    /// falls back to the provider's routing BIC.
    pub fn new(customer_id: String, draft: TransactionDraft) -> Self {
        let now = Utc::now();
        let swift_code = draft
            .swift_code
            .unwrap_or_else(|| draft.provider.routing_bic().to_string());

        Self {
            id: Uuid::new_v4(),
            customer_id,
            amount: draft.amount,
            currency: draft.currency,
            provider: draft.provider,
            swift_code,
            recipient_account_info: draft.recipient,
            status: TransactionStatus::Pending,
            risk_score: 0,
            verified_by: None,
            verification_notes: None,
            verification_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == TransactionStatus::Pending
    }
}

/// Fields written by a verification transition, and nothing else.
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationUpdate {
    pub status: TransactionStatus,
    pub verified_by: String,
    pub verification_notes: Option<String>,
    pub verification_date: DateTime<Utc>,
    pub risk_score: u8,
}

impl VerificationUpdate {
    /// Applies the transition to an in-memory record.
    pub fn apply_to(&self, tx: &mut Transaction) {
        tx.status = self.status;
        tx.verified_by = Some(self.verified_by.clone());
        tx.verification_notes = self.verification_notes.clone();
        tx.verification_date = Some(self.verification_date);
        tx.risk_score = self.risk_score;
        tx.updated_at = self.verification_date;
    }
}
