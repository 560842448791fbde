//! Domain entities shared by the validator, risk engine and verification workflow.

pub mod audit;
pub mod principal;
pub mod transaction;

pub use audit::{AuditEventType, AuditLogEntry, AuditOutcome};
pub use principal::{AuthenticatedPrincipal, RequestContext, Role};
pub use transaction::{
    Currency, Provider, RecipientAccountInfo, Transaction, TransactionDraft, TransactionStatus,
    VerificationAction, VerificationUpdate,
};
