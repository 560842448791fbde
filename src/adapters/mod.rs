pub mod memory;
pub mod postgres_audit_repository;
pub mod postgres_transaction_repository;

pub use memory::{InMemoryAuditStore, InMemoryTransactionStore};
pub use postgres_audit_repository::PostgresAuditRepository;
pub use postgres_transaction_repository::PostgresTransactionRepository;
