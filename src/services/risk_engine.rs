//! Risk scoring engine.
//!
//! Four independent signals are summed and clamped to `0..=100`. The score is a
//! snapshot of store state at call time, so it is recomputed at every decision
//! point rather than reused.

use bigdecimal::{BigDecimal, ToPrimitive};
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

use crate::config::policy::{PolicyConfig, RiskPolicy};
use crate::domain::{
    AuditEventType, AuditOutcome, AuthenticatedPrincipal, RequestContext, Transaction,
};
use crate::ports::{RepositoryResult, TransactionStore};
use crate::services::AuditRecorder;
use crate::validation::swift::country_segment;

pub const HIGH_RISK_REASON: &str = "High risk transaction detected";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RiskAssessment {
    pub country_risk: u32,
    pub amount_risk: u32,
    pub velocity_risk: u32,
    pub historical_risk: u32,
    pub total: u8,
    pub approvable: bool,
}

/// Where in the lifecycle a score is being taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoringPoint {
    /// The transaction is not stored yet and counts towards its own velocity.
    Submission,
    Decision,
}

/// Store-derived inputs to a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HistorySignals {
    pub recent_submissions: u64,
    pub prior_rejections: u64,
}

pub fn country_risk(policy: &RiskPolicy, swift_code: &str) -> u32 {
    match country_segment(swift_code) {
        Some(country) if policy.is_high_risk_country(country) => policy.country_weight,
        _ => 0,
    }
}

/// Linear ramp above the floor, one point per step, truncated and capped.
pub fn amount_risk(policy: &RiskPolicy, amount: &BigDecimal) -> u32 {
    if amount <= &policy.amount_floor {
        return 0;
    }

    let excess = amount - &policy.amount_floor;
    let points = (&excess / &policy.amount_step).with_scale(0);
    if points >= BigDecimal::from(policy.amount_cap) {
        return policy.amount_cap;
    }

    points.to_u32().unwrap_or(policy.amount_cap).min(policy.amount_cap)
}

pub fn velocity_risk(policy: &RiskPolicy, recent_submissions: u64) -> u32 {
    if recent_submissions > policy.velocity_limit {
        policy.velocity_weight
    } else {
        0
    }
}

pub fn historical_risk(policy: &RiskPolicy, prior_rejections: u64) -> u32 {
    let count = u32::try_from(prior_rejections).unwrap_or(u32::MAX);
    policy.historical_weight.saturating_mul(count)
}

/// Pure scoring over already-gathered signals.
pub fn assess(policy: &RiskPolicy, tx: &Transaction, history: HistorySignals) -> RiskAssessment {
    let country_risk = country_risk(policy, &tx.swift_code);
    let amount_risk = amount_risk(policy, &tx.amount);
    let velocity_risk = velocity_risk(policy, history.recent_submissions);
    let historical_risk = historical_risk(policy, history.prior_rejections);

    let sum = [country_risk, amount_risk, velocity_risk, historical_risk]
        .iter()
        .fold(0u32, |acc, r| acc.saturating_add(*r));
    let total = sum.min(100) as u8;

    RiskAssessment {
        country_risk,
        amount_risk,
        velocity_risk,
        historical_risk,
        total,
        approvable: u32::from(total) < policy.threshold,
    }
}

#[derive(Clone)]
pub struct RiskEngine {
    store: Arc<dyn TransactionStore>,
    policy: Arc<PolicyConfig>,
    audit: AuditRecorder,
}

impl RiskEngine {
    pub fn new(
        store: Arc<dyn TransactionStore>,
        policy: Arc<PolicyConfig>,
        audit: AuditRecorder,
    ) -> Self {
        Self {
            store,
            policy,
            audit,
        }
    }

    async fn gather(
        &self,
        tx: &Transaction,
        point: ScoringPoint,
    ) -> RepositoryResult<HistorySignals> {
        let since = Utc::now() - self.policy.risk.velocity_window;
        let stored = self
            .store
            .count_recent_by_customer(&tx.customer_id, since)
            .await?;
        let recent_submissions = match point {
            ScoringPoint::Submission => stored + 1,
            ScoringPoint::Decision => stored,
        };

        let prior_rejections = self
            .store
            .count_rejected_matching(
                &tx.recipient_account_info.account_number,
                &tx.recipient_account_info.bank_name,
            )
            .await?;

        Ok(HistorySignals {
            recent_submissions,
            prior_rejections,
        })
    }

    /// Scores `tx` against current store state and records a `fraud_attempt`
    /// audit entry carrying the full breakdown, whatever the outcome.
    pub async fn score(
        &self,
        tx: &Transaction,
        point: ScoringPoint,
        actor: &AuthenticatedPrincipal,
        ctx: &RequestContext,
    ) -> RepositoryResult<RiskAssessment> {
        let history = self.gather(tx, point).await?;
        let assessment = assess(&self.policy.risk, tx, history);

        tracing::info!(
            transaction_id = %tx.id,
            phase = ?point,
            risk_score = assessment.total,
            approvable = assessment.approvable,
            "Risk assessed"
        );

        let outcome = if assessment.approvable {
            AuditOutcome::Success
        } else {
            AuditOutcome::Failed
        };
        self.audit
            .record_for(
                AuditEventType::FraudAttempt,
                actor,
                ctx,
                outcome,
                json!({
                    "transaction_id": tx.id,
                    "phase": point,
                    "risk_score": assessment.total,
                    "threshold": self.policy.risk.threshold,
                    "factors": {
                        "country_risk": assessment.country_risk,
                        "amount_risk": assessment.amount_risk,
                        "velocity_risk": assessment.velocity_risk,
                        "historical_risk": assessment.historical_risk,
                    },
                }),
            )
            .await;

        Ok(assessment)
    }
}
