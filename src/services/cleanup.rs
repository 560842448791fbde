//! Stale pending purge.
//!
//! Pending transactions nobody has decided on within the retention window are
//! removed on a cron schedule. Decided transactions are never touched.

use chrono::{Duration, Utc};
use cron::Schedule;
use serde_json::json;
use std::sync::Arc;

use crate::domain::{AuditEventType, AuditOutcome, RequestContext};
use crate::ports::{RepositoryResult, TransactionStore};
use crate::services::AuditRecorder;

pub const SYSTEM_ACTOR: &str = "system";

#[derive(Clone)]
pub struct CleanupService {
    transactions: Arc<dyn TransactionStore>,
    audit: AuditRecorder,
    stale_after: Duration,
}

impl CleanupService {
    pub fn new(
        transactions: Arc<dyn TransactionStore>,
        audit: AuditRecorder,
        stale_pending_days: i64,
    ) -> Self {
        Self {
            transactions,
            audit,
            stale_after: Duration::days(stale_pending_days),
        }
    }

    /// Deletes pending transactions created before `now - stale_after`.
    pub async fn purge_stale_pending(&self) -> RepositoryResult<u64> {
        let cutoff = Utc::now() - self.stale_after;
        let purged = self.transactions.purge_stale_pending(cutoff).await?;

        tracing::info!(purged, cutoff = %cutoff, "Stale pending transactions purged");

        self.audit
            .record(
                AuditEventType::AdminAction,
                Some(SYSTEM_ACTOR),
                &RequestContext::default(),
                AuditOutcome::Success,
                json!({
                    "action": "purge_stale_pending",
                    "purged": purged,
                    "cutoff": cutoff,
                }),
            )
            .await;

        Ok(purged)
    }

    /// Runs the purge on every tick of `schedule` until the task is dropped.
    pub fn start(&self, schedule: Schedule) {
        let service = self.clone();
        tokio::spawn(async move {
            loop {
                let next = match schedule.upcoming(Utc).next() {
                    Some(next) => next,
                    None => {
                        tracing::warn!("Cleanup schedule has no upcoming runs, stopping");
                        return;
                    }
                };
                let wait = (next - Utc::now()).to_std().unwrap_or_default();
                tokio::time::sleep(wait).await;

                if let Err(e) = service.purge_stale_pending().await {
                    tracing::error!("Failed to purge stale pending transactions: {}", e);
                }
            }
        });
    }
}
