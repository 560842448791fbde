//! Create transaction use case.
//! Validates a customer submission, scores it and stores it as pending.

use serde_json::json;
use std::sync::Arc;

use crate::config::PolicyConfig;
use crate::domain::{
    AuditEventType, AuditOutcome, AuthenticatedPrincipal, RequestContext, Transaction,
};
use crate::error::AppError;
use crate::ports::TransactionStore;
use crate::services::risk_engine::{RiskEngine, ScoringPoint};
use crate::services::AuditRecorder;
use crate::validation::{validate_draft, RawTransactionDraft};

pub struct CreateTransaction {
    transactions: Arc<dyn TransactionStore>,
    risk: RiskEngine,
    audit: AuditRecorder,
    policy: Arc<PolicyConfig>,
}

impl CreateTransaction {
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

    pub async fn execute(
        &self,
        principal: &AuthenticatedPrincipal,
        raw: &RawTransactionDraft,
        ctx: &RequestContext,
    ) -> Result<Transaction, AppError> {
        let draft = validate_draft(raw, &self.policy.fields).map_err(|errors| {
            tracing::info!(
                customer_id = %principal.id,
                fields = ?errors.fields(),
                "Transaction submission rejected by validation"
            );
            AppError::Validation(errors)
        })?;

        let mut tx = Transaction::new(principal.id.clone(), draft);
        let assessment = self
            .risk
            .score(&tx, ScoringPoint::Submission, principal, ctx)
            .await?;
        tx.risk_score = assessment.total;

        // The submission score is already audited under this id, so a failed
        // insert is recorded too.
        let saved = match self.transactions.create(&tx).await {
            Ok(saved) => saved,
            Err(e) => {
                tracing::error!(
                    transaction_id = %tx.id,
                    customer_id = %tx.customer_id,
                    "Failed to store transaction: {}",
                    e
                );
                self.audit
                    .record_for(
                        AuditEventType::Transaction,
                        principal,
                        ctx,
                        AuditOutcome::Failed,
                        json!({
                            "action": "created",
                            "transaction_id": tx.id,
                            "persisted": false,
                        }),
                    )
                    .await;
                return Err(e.into());
            }
        };

        tracing::info!(
            transaction_id = %saved.id,
            customer_id = %saved.customer_id,
            risk_score = saved.risk_score,
            "Transaction created"
        );

        self.audit
            .record_for(
                AuditEventType::Transaction,
                principal,
                ctx,
                AuditOutcome::Pending,
                json!({
                    "action": "created",
                    "transaction_id": saved.id,
                    "risk_score": saved.risk_score,
                }),
            )
            .await;

        Ok(saved)
    }
}
