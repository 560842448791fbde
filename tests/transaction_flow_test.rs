use chrono::Utc;
use std::sync::Arc;

use remit_guard::adapters::{InMemoryAuditStore, InMemoryTransactionStore};
use remit_guard::config::PolicyConfig;
use remit_guard::domain::{
    AuditEventType, AuditOutcome, AuthenticatedPrincipal, Currency, Provider,
    RecipientAccountInfo, RequestContext, Transaction, TransactionDraft, TransactionStatus,
    VerificationAction,
};
use remit_guard::error::AppError;
use remit_guard::ports::TransactionStore;
use remit_guard::validation::{AmountInput, RawRecipientAccountInfo, RawTransactionDraft};
use remit_guard::AppState;

struct Harness {
    store: InMemoryTransactionStore,
    audit: InMemoryAuditStore,
    state: AppState,
}

fn harness() -> Harness {
    let store = InMemoryTransactionStore::new();
    let audit = InMemoryAuditStore::new();
    let state = AppState::new(
        Arc::new(store.clone()),
        Arc::new(audit.clone()),
        PolicyConfig::default(),
    );
    Harness { store, audit, state }
}

fn raw_draft(amount: &str, swift_code: Option<&str>) -> RawTransactionDraft {
    RawTransactionDraft {
        amount: Some(AmountInput::from(amount)),
        currency: Some("ZAR".to_string()),
        provider: Some("Capitec Bank".to_string()),
        swift_code: swift_code.map(str::to_string),
        recipient_account_info: Some(RawRecipientAccountInfo {
            account_name: Some("Jane Doe".to_string()),
            account_number: Some("1234567890".to_string()),
            bank_name: Some("Nedbank".to_string()),
        }),
    }
}

fn seeded(customer: &str) -> Transaction {
    Transaction::new(
        customer.to_string(),
        TransactionDraft {
            amount: "10.00".parse().unwrap(),
            currency: Currency::Zar,
            provider: Provider::Capitec,
            swift_code: None,
            recipient: RecipientAccountInfo {
                account_name: "Other Person".to_string(),
                account_number: "9988776655".to_string(),
                bank_name: "Capitec Bank".to_string(),
            },
        },
    )
}

fn ctx() -> RequestContext {
    RequestContext::new(Some("203.0.113.7".to_string()), Some("flow-test".to_string()))
}

fn count(
    entries: &[remit_guard::domain::AuditLogEntry],
    event: AuditEventType,
    outcome: AuditOutcome,
) -> usize {
    entries
        .iter()
        .filter(|e| e.event_type == event && e.outcome == outcome)
        .count()
}

#[tokio::test]
async fn test_low_risk_transaction_is_completed() {
    let h = harness();
    let customer = AuthenticatedPrincipal::customer("cust-1");
    let admin = AuthenticatedPrincipal::admin("admin-1");

    let tx = h
        .state
        .create_transaction
        .execute(&customer, &raw_draft("100.00", None), &ctx())
        .await
        .unwrap();
    assert_eq!(tx.status, TransactionStatus::Pending);
    assert_eq!(tx.risk_score, 0);
    assert_eq!(tx.swift_code, "CABLZAJJ");

    let decided = h
        .state
        .verify_transaction
        .decide(tx.id, &admin, VerificationAction::Completed, Some("Checked."), &ctx())
        .await
        .unwrap();

    assert_eq!(decided.status, TransactionStatus::Completed);
    assert_eq!(decided.verified_by.as_deref(), Some("admin-1"));
    assert_eq!(decided.verification_notes.as_deref(), Some("Checked."));
    assert!(decided.verification_date.is_some());

    let entries = h.audit.entries().await;
    assert_eq!(count(&entries, AuditEventType::Transaction, AuditOutcome::Success), 1);
    assert_eq!(count(&entries, AuditEventType::Transaction, AuditOutcome::Pending), 1);
    assert_eq!(count(&entries, AuditEventType::FraudAttempt, AuditOutcome::Failed), 0);

    let success = entries
        .iter()
        .find(|e| e.event_type == AuditEventType::Transaction && e.outcome == AuditOutcome::Success)
        .unwrap();
    assert_eq!(success.user_id.as_deref(), Some("admin-1"));
    assert_eq!(success.ip_address.as_deref(), Some("203.0.113.7"));
}

#[tokio::test]
async fn test_high_risk_transaction_cannot_be_completed() {
    let h = harness();
    for _ in 0..16 {
        h.store.create(&seeded("cust-2")).await.unwrap();
    }

    let customer = AuthenticatedPrincipal::customer("cust-2");
    let admin = AuthenticatedPrincipal::admin("admin-1");

    let tx = h
        .state
        .create_transaction
        .execute(&customer, &raw_draft("6000.00", Some("SBZARUJJ")), &ctx())
        .await
        .unwrap();
    assert_eq!(tx.risk_score, 70);
    assert_eq!(tx.status, TransactionStatus::Pending);

    let blocked = h
        .state
        .verify_transaction
        .decide(tx.id, &admin, VerificationAction::Completed, None, &ctx())
        .await;
    match blocked {
        Err(AppError::RiskBlocked { reason, risk_score }) => {
            assert_eq!(reason, "High risk transaction detected");
            assert_eq!(risk_score, 70);
        }
        other => panic!("expected RiskBlocked, got {:?}", other),
    }

    let still_pending = h.store.find_by_id(tx.id).await.unwrap().unwrap();
    assert_eq!(still_pending.status, TransactionStatus::Pending);
    assert!(still_pending.verified_by.is_none());

    let entries = h.audit.entries().await;
    assert!(entries.iter().any(|e| e.event_type == AuditEventType::FraudAttempt
        && e.outcome == AuditOutcome::Failed
        && e.metadata["reason"] == "High risk transaction detected"));

    let rejected = h
        .state
        .verify_transaction
        .decide(tx.id, &admin, VerificationAction::Rejected, Some("Restricted corridor"), &ctx())
        .await
        .unwrap();
    assert_eq!(rejected.status, TransactionStatus::Rejected);
    assert_eq!(rejected.risk_score, 70);
}

#[tokio::test]
async fn test_second_decision_conflicts() {
    let h = harness();
    let customer = AuthenticatedPrincipal::customer("cust-3");
    let admin = AuthenticatedPrincipal::admin("admin-1");

    let tx = h
        .state
        .create_transaction
        .execute(&customer, &raw_draft("250.00", None), &ctx())
        .await
        .unwrap();

    h.state
        .verify_transaction
        .decide(tx.id, &admin, VerificationAction::Rejected, None, &ctx())
        .await
        .unwrap();

    for action in [VerificationAction::Completed, VerificationAction::Rejected] {
        let again = h
            .state
            .verify_transaction
            .decide(tx.id, &admin, action, None, &ctx())
            .await;
        assert!(matches!(again, Err(AppError::Conflict(_))));
    }

    let stored = h.store.find_by_id(tx.id).await.unwrap().unwrap();
    assert_eq!(stored.status, TransactionStatus::Rejected);
}

#[tokio::test]
async fn test_concurrent_decisions_have_one_winner() {
    let h = harness();
    let customer = AuthenticatedPrincipal::customer("cust-4");
    let tx = h
        .state
        .create_transaction
        .execute(&customer, &raw_draft("75.00", None), &ctx())
        .await
        .unwrap();

    let mut handles = Vec::new();
    for i in 0..8 {
        let state = h.state.clone();
        let id = tx.id;
        handles.push(tokio::spawn(async move {
            let admin = AuthenticatedPrincipal::admin(format!("admin-{}", i));
            let action = if i % 2 == 0 {
                VerificationAction::Completed
            } else {
                VerificationAction::Rejected
            };
            state
                .verify_transaction
                .decide(id, &admin, action, None, &RequestContext::default())
                .await
        }));
    }

    let mut wins = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => wins += 1,
            Err(AppError::Conflict(_)) => conflicts += 1,
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }
    assert_eq!(wins, 1);
    assert_eq!(conflicts, 7);

    let entries = h.audit.entries().await;
    assert_eq!(count(&entries, AuditEventType::Transaction, AuditOutcome::Success), 1);
}

#[tokio::test]
async fn test_customer_cannot_decide() {
    let h = harness();
    let customer = AuthenticatedPrincipal::customer("cust-5");
    let tx = h
        .state
        .create_transaction
        .execute(&customer, &raw_draft("100.00", None), &ctx())
        .await
        .unwrap();

    let result = h
        .state
        .verify_transaction
        .decide(tx.id, &customer, VerificationAction::Completed, None, &ctx())
        .await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));

    let stored = h.store.find_by_id(tx.id).await.unwrap().unwrap();
    assert_eq!(stored, tx);
}

#[tokio::test]
async fn test_unknown_transaction_is_not_found() {
    let h = harness();
    let admin = AuthenticatedPrincipal::admin("admin-1");
    let result = h
        .state
        .verify_transaction
        .decide(uuid::Uuid::new_v4(), &admin, VerificationAction::Rejected, None, &ctx())
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_invalid_notes_leave_transaction_pending() {
    let h = harness();
    let customer = AuthenticatedPrincipal::customer("cust-6");
    let admin = AuthenticatedPrincipal::admin("admin-1");
    let tx = h
        .state
        .create_transaction
        .execute(&customer, &raw_draft("100.00", None), &ctx())
        .await
        .unwrap();

    let result = h
        .state
        .verify_transaction
        .decide(tx.id, &admin, VerificationAction::Completed, Some("ok {drop}"), &ctx())
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));

    let long_notes = "a".repeat(201);
    let result = h
        .state
        .verify_transaction
        .decide(tx.id, &admin, VerificationAction::Completed, Some(&long_notes), &ctx())
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));

    let stored = h.store.find_by_id(tx.id).await.unwrap().unwrap();
    assert!(stored.is_pending());
}

#[tokio::test]
async fn test_invalid_submission_is_not_stored() {
    let h = harness();
    let customer = AuthenticatedPrincipal::customer("cust-7");

    let mut raw = raw_draft("-5.00", Some("AB12"));
    raw.currency = Some("JPY".to_string());

    let result = h
        .state
        .create_transaction
        .execute(&customer, &raw, &ctx())
        .await;
    match result {
        Err(AppError::Validation(errors)) => {
            let fields = errors.fields();
            assert!(fields.contains(&"amount"));
            assert!(fields.contains(&"currency"));
            assert!(fields.contains(&"swift_code"));
        }
        other => panic!("expected validation failure, got {:?}", other),
    }

    assert!(h.store.is_empty().await);
    assert!(h.audit.entries().await.is_empty());
}

#[tokio::test]
async fn test_amount_too_large_for_storage_is_a_validation_error() {
    let h = harness();
    let customer = AuthenticatedPrincipal::customer("cust-14");
    let amount = format!("1{}", "0".repeat(20));

    let result = h
        .state
        .create_transaction
        .execute(&customer, &raw_draft(&amount, None), &ctx())
        .await;
    match result {
        Err(AppError::Validation(errors)) => assert_eq!(errors.fields(), vec!["amount"]),
        other => panic!("expected validation failure, got {:?}", other),
    }

    assert!(h.store.is_empty().await);
    assert!(h.audit.entries().await.is_empty());
}

#[tokio::test]
async fn test_markup_is_stripped_before_storage() {
    let h = harness();
    let customer = AuthenticatedPrincipal::customer("cust-8");

    let mut raw = raw_draft("100.00", None);
    raw.recipient_account_info = Some(RawRecipientAccountInfo {
        account_name: Some("<Jane Doe>".to_string()),
        account_number: Some("1234 5678 90".to_string()),
        bank_name: Some("Nedbank".to_string()),
    });

    let tx = h
        .state
        .create_transaction
        .execute(&customer, &raw, &ctx())
        .await
        .unwrap();
    assert_eq!(tx.recipient_account_info.account_name, "Jane Doe");
    assert_eq!(tx.recipient_account_info.account_number, "1234567890");
}

#[tokio::test]
async fn test_prior_rejections_raise_later_scores() {
    let h = harness();
    let admin = AuthenticatedPrincipal::admin("admin-1");

    let first = h
        .state
        .create_transaction
        .execute(&AuthenticatedPrincipal::customer("cust-9"), &raw_draft("100.00", None), &ctx())
        .await
        .unwrap();
    h.state
        .verify_transaction
        .decide(first.id, &admin, VerificationAction::Rejected, None, &ctx())
        .await
        .unwrap();

    // Same recipient from a different customer.
    let second = h
        .state
        .create_transaction
        .execute(&AuthenticatedPrincipal::customer("cust-10"), &raw_draft("100.00", None), &ctx())
        .await
        .unwrap();
    assert_eq!(second.risk_score, 10);
}

#[tokio::test]
async fn test_queries_respect_ownership() {
    let h = harness();
    let owner = AuthenticatedPrincipal::customer("cust-11");
    let stranger = AuthenticatedPrincipal::customer("cust-12");
    let admin = AuthenticatedPrincipal::admin("admin-1");

    let tx = h
        .state
        .create_transaction
        .execute(&owner, &raw_draft("100.00", None), &ctx())
        .await
        .unwrap();

    assert_eq!(h.state.queries.get(&owner, tx.id).await.unwrap().id, tx.id);
    assert_eq!(h.state.queries.get(&admin, tx.id).await.unwrap().id, tx.id);
    assert!(matches!(
        h.state.queries.get(&stranger, tx.id).await,
        Err(AppError::Forbidden(_))
    ));

    assert_eq!(h.state.queries.list_mine(&owner).await.unwrap().len(), 1);
    assert!(h.state.queries.list_mine(&stranger).await.unwrap().is_empty());

    assert_eq!(h.state.queries.list_pending(&admin).await.unwrap().len(), 1);
    assert!(matches!(
        h.state.queries.list_pending(&owner).await,
        Err(AppError::Forbidden(_))
    ));
}

#[tokio::test]
async fn test_stale_velocity_window_is_ignored() {
    let h = harness();
    for _ in 0..20 {
        let mut old = seeded("cust-13");
        old.created_at = Utc::now() - chrono::Duration::days(2);
        h.store.create(&old).await.unwrap();
    }

    let tx = h
        .state
        .create_transaction
        .execute(&AuthenticatedPrincipal::customer("cust-13"), &raw_draft("100.00", None), &ctx())
        .await
        .unwrap();
    assert_eq!(tx.risk_score, 0);
}
