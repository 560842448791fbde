//! Postgres implementation of AuditStore.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::AuditLogEntry;
use crate::ports::{AuditStore, RepositoryError, RepositoryResult};

#[derive(Clone)]
pub struct PostgresAuditRepository {
    pool: PgPool,
}

impl PostgresAuditRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditStore for PostgresAuditRepository {
    async fn append(&self, entry: &AuditLogEntry) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            INSERT INTO audit_logs (
                id, event_type, user_id, ip_address, user_agent, outcome, metadata, timestamp
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(entry.id)
        .bind(entry.event_type.as_str())
        .bind(&entry.user_id)
        .bind(&entry.ip_address)
        .bind(&entry.user_agent)
        .bind(entry.outcome.as_str())
        .bind(&entry.metadata)
        .bind(entry.timestamp)
        .execute(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        Ok(())
    }

    async fn list_recent(&self, limit: i64) -> RepositoryResult<Vec<AuditLogEntry>> {
        let rows = sqlx::query_as::<_, AuditRow>(
            r#"
            SELECT id, event_type, user_id, ip_address, user_agent, outcome, metadata, timestamp
            FROM audit_logs
            ORDER BY timestamp DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        rows.into_iter().map(AuditRow::into_domain).collect()
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AuditRow {
    id: Uuid,
    event_type: String,
    user_id: Option<String>,
    ip_address: Option<String>,
    user_agent: Option<String>,
    outcome: String,
    metadata: serde_json::Value,
    timestamp: DateTime<Utc>,
}

impl AuditRow {
    fn into_domain(self) -> RepositoryResult<AuditLogEntry> {
        let corrupt =
            |e: String| RepositoryError::Corrupt(format!("audit entry {}: {}", self.id, e));

        Ok(AuditLogEntry {
            id: self.id,
            event_type: self.event_type.parse().map_err(corrupt)?,
            outcome: self.outcome.parse().map_err(corrupt)?,
            user_id: self.user_id,
            ip_address: self.ip_address,
            user_agent: self.user_agent,
            metadata: self.metadata,
            timestamp: self.timestamp,
        })
    }
}
