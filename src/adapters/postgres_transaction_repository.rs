//! Postgres implementation of TransactionStore.

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{RecipientAccountInfo, Transaction, TransactionStatus, VerificationUpdate};
use crate::ports::{RepositoryError, RepositoryResult, TransactionStore};

const COLUMNS: &str = "id, customer_id, amount, currency, provider, swift_code, \
    account_name, account_number, bank_name, status, risk_score, \
    verified_by, verification_notes, verification_date, created_at, updated_at";

/// Postgres-backed transaction store.
#[derive(Clone)]
pub struct PostgresTransactionRepository {
    pool: PgPool,
}

impl PostgresTransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionStore for PostgresTransactionRepository {
    async fn create(&self, tx: &Transaction) -> RepositoryResult<Transaction> {
        let row = sqlx::query_as::<_, TransactionRow>(&format!(
            r#"
            INSERT INTO transactions (
                id, customer_id, amount, currency, provider, swift_code,
                account_name, account_number, bank_name, status, risk_score,
                verified_by, verification_notes, verification_date, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING {}
            "#,
            COLUMNS
        ))
        .bind(tx.id)
        .bind(&tx.customer_id)
        .bind(&tx.amount)
        .bind(tx.currency.code())
        .bind(tx.provider.name())
        .bind(&tx.swift_code)
        .bind(&tx.recipient_account_info.account_name)
        .bind(&tx.recipient_account_info.account_number)
        .bind(&tx.recipient_account_info.bank_name)
        .bind(tx.status.as_str())
        .bind(i16::from(tx.risk_score))
        .bind(&tx.verified_by)
        .bind(&tx.verification_notes)
        .bind(tx.verification_date)
        .bind(tx.created_at)
        .bind(tx.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        row.into_domain()
    }

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Transaction>> {
        let row = sqlx::query_as::<_, TransactionRow>(&format!(
            "SELECT {} FROM transactions WHERE id = $1",
            COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        row.map(TransactionRow::into_domain).transpose()
    }

    async fn find_pending(&self) -> RepositoryResult<Vec<Transaction>> {
        let rows = sqlx::query_as::<_, TransactionRow>(&format!(
            "SELECT {} FROM transactions WHERE status = 'pending' ORDER BY created_at DESC",
            COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        rows.into_iter().map(TransactionRow::into_domain).collect()
    }

    async fn find_by_customer(&self, customer_id: &str) -> RepositoryResult<Vec<Transaction>> {
        let rows = sqlx::query_as::<_, TransactionRow>(&format!(
            "SELECT {} FROM transactions WHERE customer_id = $1 ORDER BY created_at DESC",
            COLUMNS
        ))
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        rows.into_iter().map(TransactionRow::into_domain).collect()
    }

    async fn atomic_update_if_pending(
        &self,
        id: Uuid,
        update: &VerificationUpdate,
    ) -> RepositoryResult<Option<Transaction>> {
        // The status predicate makes this a compare-and-set on a single row.
        let row = sqlx::query_as::<_, TransactionRow>(&format!(
            r#"
            UPDATE transactions
            SET status = $2,
                verified_by = $3,
                verification_notes = $4,
                verification_date = $5,
                risk_score = $6,
                updated_at = $5
            WHERE id = $1 AND status = 'pending'
            RETURNING {}
            "#,
            COLUMNS
        ))
        .bind(id)
        .bind(update.status.as_str())
        .bind(&update.verified_by)
        .bind(&update.verification_notes)
        .bind(update.verification_date)
        .bind(i16::from(update.risk_score))
        .fetch_optional(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        row.map(TransactionRow::into_domain).transpose()
    }

    async fn count_recent_by_customer(
        &self,
        customer_id: &str,
        since: DateTime<Utc>,
    ) -> RepositoryResult<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM transactions WHERE customer_id = $1 AND created_at >= $2",
        )
        .bind(customer_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        Ok(count.max(0) as u64)
    }

    async fn count_rejected_matching(
        &self,
        account_number: &str,
        bank_name: &str,
    ) -> RepositoryResult<u64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM transactions
            WHERE status = 'rejected'
            AND (account_number = $1 OR bank_name = $2)
            "#,
        )
        .bind(account_number)
        .bind(bank_name)
        .fetch_one(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        Ok(count.max(0) as u64)
    }

    async fn purge_stale_pending(&self, cutoff: DateTime<Utc>) -> RepositoryResult<u64> {
        let result =
            sqlx::query("DELETE FROM transactions WHERE status = 'pending' AND created_at < $1")
                .bind(cutoff)
                .execute(&self.pool)
                .await
                .map_err(RepositoryError::from)?;

        Ok(result.rows_affected())
    }

    async fn health_check(&self) -> RepositoryResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(RepositoryError::from)?;
        Ok(())
    }
}

/// Internal row type for SQLx. Not exposed outside the adapter.
#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    id: Uuid,
    customer_id: String,
    amount: BigDecimal,
    currency: String,
    provider: String,
    swift_code: String,
    account_name: String,
    account_number: String,
    bank_name: String,
    status: String,
    risk_score: i16,
    verified_by: Option<String>,
    verification_notes: Option<String>,
    verification_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TransactionRow {
    fn into_domain(self) -> RepositoryResult<Transaction> {
        let corrupt =
            |e: String| RepositoryError::Corrupt(format!("transaction {}: {}", self.id, e));

        Ok(Transaction {
            id: self.id,
            currency: self.currency.parse().map_err(corrupt)?,
            provider: self.provider.parse().map_err(corrupt)?,
            status: self.status.parse::<TransactionStatus>().map_err(corrupt)?,
            risk_score: u8::try_from(self.risk_score)
                .map_err(|_| corrupt(format!("risk score {} out of range", self.risk_score)))?,
            customer_id: self.customer_id,
            amount: self.amount,
            swift_code: self.swift_code,
            recipient_account_info: RecipientAccountInfo {
                account_name: self.account_name,
                account_number: self.account_number,
                bank_name: self.bank_name,
            },
            verified_by: self.verified_by,
            verification_notes: self.verification_notes,
            verification_date: self.verification_date,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
