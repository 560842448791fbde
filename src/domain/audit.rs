//! Append-only audit trail entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    LoginAttempt,
    Transaction,
    AdminAction,
    FraudAttempt,
}

impl AuditEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditEventType::LoginAttempt => "login_attempt",
            AuditEventType::Transaction => "transaction",
            AuditEventType::AdminAction => "admin_action",
            AuditEventType::FraudAttempt => "fraud_attempt",
        }
    }
}

impl fmt::Display for AuditEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditEventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "login_attempt" => Ok(AuditEventType::LoginAttempt),
            "transaction" => Ok(AuditEventType::Transaction),
            "admin_action" => Ok(AuditEventType::AdminAction),
            "fraud_attempt" => Ok(AuditEventType::FraudAttempt),
            other => Err(format!("unknown audit event type '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditOutcome {
    Success,
    Failed,
    Pending,
}

impl AuditOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditOutcome::Success => "success",
            AuditOutcome::Failed => "failed",
            AuditOutcome::Pending => "pending",
        }
    }
}

impl fmt::Display for AuditOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditOutcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(AuditOutcome::Success),
            "failed" => Ok(AuditOutcome::Failed),
            "pending" => Ok(AuditOutcome::Pending),
            other => Err(format!("unknown audit outcome '{}'", other)),
        }
    }
}

/// A single audit record. Never mutated once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: Uuid,
    pub event_type: AuditEventType,
    pub user_id: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub outcome: AuditOutcome,
    pub metadata: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

impl AuditLogEntry {
    pub fn new(
        event_type: AuditEventType,
        user_id: Option<String>,
        ip_address: Option<String>,
        user_agent: Option<String>,
        outcome: AuditOutcome,
        metadata: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_type,
            user_id,
            ip_address,
            user_agent,
            outcome,
            metadata,
            timestamp: Utc::now(),
        }
    }
}
