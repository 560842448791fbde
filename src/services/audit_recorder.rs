//! Audit recorder.
//!
//! Appends are awaited but never fail the caller: a lost audit write is logged
//! and the business operation carries on.

use serde_json::Value;
use std::sync::Arc;

use crate::domain::{
    AuditEventType, AuditLogEntry, AuditOutcome, AuthenticatedPrincipal, RequestContext,
};
use crate::ports::AuditStore;
use crate::utils::sanitize::{sanitize_json, strip_unsafe_chars};

#[derive(Clone)]
pub struct AuditRecorder {
    store: Arc<dyn AuditStore>,
}

impl AuditRecorder {
    pub fn new(store: Arc<dyn AuditStore>) -> Self {
        Self { store }
    }

    pub async fn record(
        &self,
        event_type: AuditEventType,
        principal_id: Option<&str>,
        ctx: &RequestContext,
        outcome: AuditOutcome,
        metadata: Value,
    ) {
        let entry = AuditLogEntry::new(
            event_type,
            principal_id.map(str::to_string),
            ctx.ip_address.clone(),
            ctx.user_agent.clone(),
            outcome,
            strip_unsafe_chars(&metadata),
        );

        if let Err(e) = self.store.append(&entry).await {
            tracing::error!(
                audit_id = %entry.id,
                event_type = %entry.event_type,
                outcome = %entry.outcome,
                metadata = %sanitize_json(&entry.metadata),
                "Failed to append audit entry: {}",
                e
            );
            return;
        }

        tracing::debug!(
            audit_id = %entry.id,
            event_type = %entry.event_type,
            outcome = %entry.outcome,
            "Audit entry recorded"
        );
    }

    /// Convenience for events attributed to an authenticated principal.
    pub async fn record_for(
        &self,
        event_type: AuditEventType,
        principal: &AuthenticatedPrincipal,
        ctx: &RequestContext,
        outcome: AuditOutcome,
        metadata: Value,
    ) {
        self.record(event_type, Some(&principal.id), ctx, outcome, metadata)
            .await
    }
}
