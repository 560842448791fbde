pub mod create_transaction;
pub mod query_transactions;
pub mod verify_transaction;

pub use create_transaction::CreateTransaction;
pub use query_transactions::TransactionQueries;
pub use verify_transaction::VerifyTransaction;
