//! Verification state machine.
//!
//! `pending -> completed` and `pending -> rejected` are the only transitions.
//! Both targets are terminal.

use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::PolicyConfig;
use crate::domain::{
    AuditEventType, AuditOutcome, AuthenticatedPrincipal, RequestContext, Transaction,
    VerificationAction, VerificationUpdate,
};
use crate::error::AppError;
use crate::ports::TransactionStore;
use crate::services::risk_engine::{RiskEngine, ScoringPoint, HIGH_RISK_REASON};
use crate::services::AuditRecorder;
use crate::validation::validate_verification_notes;

pub const NOT_PENDING: &str = "Transaction is no longer pending";

pub struct VerifyTransaction {
    transactions: Arc<dyn TransactionStore>,
    risk: RiskEngine,
    audit: AuditRecorder,
    policy: Arc<PolicyConfig>,
}

impl VerifyTransaction {
    pub fn new(
        transactions: Arc<dyn TransactionStore>,
        risk: RiskEngine,
        audit: AuditRecorder,
        policy: Arc<PolicyConfig>,
    ) -> Self {
        Self {
            transactions,
            risk,
            audit,
            policy,
        }
    }

    pub async fn decide(
        &self,
        transaction_id: Uuid,
        principal: &AuthenticatedPrincipal,
        action: VerificationAction,
        notes: Option<&str>,
        ctx: &RequestContext,
    ) -> Result<Transaction, AppError> {
        if !principal.is_admin() {
            tracing::warn!(
                principal_id = %principal.id,
                transaction_id = %transaction_id,
                "Non-admin attempted a verification decision"
            );
            return Err(AppError::Forbidden("Admin role required".to_string()));
        }

        let tx = self
            .transactions
            .find_by_id(transaction_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Transaction {} not found", transaction_id))
            })?;

        if tx.status.is_terminal() {
            return Err(AppError::Conflict(NOT_PENDING.to_string()));
        }

        let notes = validate_verification_notes(notes, &self.policy.fields)?;

        // Velocity and history move over time, so the creation-time score is not reused.
        let assessment = self
            .risk
            .score(&tx, ScoringPoint::Decision, principal, ctx)
            .await?;

        if action == VerificationAction::Completed && !assessment.approvable {
            tracing::warn!(
                transaction_id = %tx.id,
                admin_id = %principal.id,
                risk_score = assessment.total,
                "Completion blocked by risk policy"
            );
            self.audit
                .record_for(
                    AuditEventType::FraudAttempt,
                    principal,
                    ctx,
                    AuditOutcome::Failed,
                    json!({
                        "transaction_id": tx.id,
                        "action": action.as_str(),
                        "reason": HIGH_RISK_REASON,
                        "risk_score": assessment.total,
                    }),
                )
                .await;
            return Err(AppError::RiskBlocked {
                reason: HIGH_RISK_REASON.to_string(),
                risk_score: assessment.total,
            });
        }

        let update = VerificationUpdate {
            status: action.target_status(),
            verified_by: principal.id.clone(),
            verification_notes: notes,
            verification_date: Utc::now(),
            risk_score: assessment.total,
        };

        let decided = self
            .transactions
            .atomic_update_if_pending(tx.id, &update)
            .await?
            // Lost the race to a concurrent decision.
            .ok_or_else(|| AppError::Conflict(NOT_PENDING.to_string()))?;

        tracing::info!(
            transaction_id = %decided.id,
            admin_id = %principal.id,
            status = %decided.status,
            risk_score = decided.risk_score,
            "Transaction decided"
        );

        self.audit
            .record_for(
                AuditEventType::Transaction,
                principal,
                ctx,
                AuditOutcome::Success,
                json!({
                    "transaction_id": decided.id,
                    "action": action.as_str(),
                    "risk_score": assessment.total,
                }),
            )
            .await;

        Ok(decided)
    }
}
