//! Outbound ports. The core talks to persistence only through these traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{AuditLogEntry, Transaction, VerificationUpdate};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Duplicate record: {0}")]
    Duplicate(String),

    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => RepositoryError::NotFound("row".to_string()),
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                RepositoryError::Duplicate(db.message().to_string())
            }
            other => RepositoryError::Database(other.to_string()),
        }
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[async_trait]
pub trait TransactionStore: Send + Sync {
    async fn create(&self, tx: &Transaction) -> RepositoryResult<Transaction>;

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Transaction>>;

    /// Pending transactions, newest first.
    async fn find_pending(&self) -> RepositoryResult<Vec<Transaction>>;

    /// A customer's transactions, newest first.
    async fn find_by_customer(&self, customer_id: &str) -> RepositoryResult<Vec<Transaction>>;

    /// Applies `update` only if the transaction is still pending.
    /// Returns `None` when it does not exist or has already been decided.
    async fn atomic_update_if_pending(
        &self,
        id: Uuid,
        update: &VerificationUpdate,
    ) -> RepositoryResult<Option<Transaction>>;

    /// Transactions created by `customer_id` at or after `since`.
    async fn count_recent_by_customer(
        &self,
        customer_id: &str,
        since: DateTime<Utc>,
    ) -> RepositoryResult<u64>;

    /// Rejected transactions sent to the same account number or the same bank.
    async fn count_rejected_matching(
        &self,
        account_number: &str,
        bank_name: &str,
    ) -> RepositoryResult<u64>;

    /// Deletes pending transactions created before `cutoff`. Returns the count removed.
    async fn purge_stale_pending(&self, cutoff: DateTime<Utc>) -> RepositoryResult<u64>;

    async fn health_check(&self) -> RepositoryResult<()> {
        Ok(())
    }
}

#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn append(&self, entry: &AuditLogEntry) -> RepositoryResult<()>;

    /// Most recent entries first.
    async fn list_recent(&self, limit: i64) -> RepositoryResult<Vec<AuditLogEntry>>;
}
