pub mod adapters;
pub mod cli;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod ports;
pub mod services;
pub mod use_cases;
pub mod utils;
pub mod validation;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::config::PolicyConfig;
use crate::middleware::{auth::require_admin, request_logger::request_logger_middleware};
use crate::ports::{AuditStore, TransactionStore};
use crate::services::{AuditRecorder, RiskEngine};
use crate::use_cases::{CreateTransaction, TransactionQueries, VerifyTransaction};
use crate::validation::swift::SwiftValidator;

#[derive(Clone)]
pub struct AppState {
    pub transactions: Arc<dyn TransactionStore>,
    pub create_transaction: Arc<CreateTransaction>,
    pub verify_transaction: Arc<VerifyTransaction>,
    pub queries: TransactionQueries,
    pub swift: SwiftValidator,
    pub audit: AuditRecorder,
}

impl AppState {
    pub fn new(
        transactions: Arc<dyn TransactionStore>,
        audit_store: Arc<dyn AuditStore>,
        policy: PolicyConfig,
    ) -> Self {
        let policy = Arc::new(policy);
        let audit = AuditRecorder::new(audit_store);
        let risk = RiskEngine::new(transactions.clone(), policy.clone(), audit.clone());

        Self {
            create_transaction: Arc::new(CreateTransaction::new(
                transactions.clone(),
                risk.clone(),
                audit.clone(),
                policy.clone(),
            )),
            verify_transaction: Arc::new(VerifyTransaction::new(
                transactions.clone(),
                risk,
                audit.clone(),
                policy.clone(),
            )),
            queries: TransactionQueries::new(transactions.clone()),
            swift: SwiftValidator::from_policy(&policy.risk),
            transactions,
            audit,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    let admin = Router::new()
        .route("/transactions/pending", get(handlers::admin::list_pending))
        .route(
            "/transactions/:id/verify",
            post(handlers::admin::verify_transaction),
        )
        .route("/swift/validate", post(handlers::admin::validate_swift))
        .route_layer(axum::middleware::from_fn(require_admin));

    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/transactions",
            post(handlers::transactions::create_transaction),
        )
        .route(
            "/transactions/mine",
            get(handlers::transactions::list_my_transactions),
        )
        .route(
            "/transactions/:id",
            get(handlers::transactions::get_transaction),
        )
        .nest("/admin", admin)
        .layer(axum::middleware::from_fn(request_logger_middleware))
        .with_state(state)
}
