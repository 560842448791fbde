//! Read-side use cases: a customer's own history, single lookups and the admin queue.

use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{AuthenticatedPrincipal, Transaction};
use crate::error::AppError;
use crate::ports::TransactionStore;

#[derive(Clone)]
pub struct TransactionQueries {
    transactions: Arc<dyn TransactionStore>,
}

impl TransactionQueries {
    pub fn new(transactions: Arc<dyn TransactionStore>) -> Self {
        Self { transactions }
    }

    pub async fn list_mine(
        &self,
        principal: &AuthenticatedPrincipal,
    ) -> Result<Vec<Transaction>, AppError> {
        Ok(self.transactions.find_by_customer(&principal.id).await?)
    }

    /// Visible to admins and to the submitting customer only.
    pub async fn get(
        &self,
        principal: &AuthenticatedPrincipal,
        id: Uuid,
    ) -> Result<Transaction, AppError> {
        let tx = self
            .transactions
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Transaction {} not found", id)))?;

        if !principal.is_admin() && tx.customer_id != principal.id {
            return Err(AppError::Forbidden(
                "Transaction belongs to another customer".to_string(),
            ));
        }

        Ok(tx)
    }

    pub async fn list_pending(
        &self,
        principal: &AuthenticatedPrincipal,
    ) -> Result<Vec<Transaction>, AppError> {
        if !principal.is_admin() {
            return Err(AppError::Forbidden("Admin role required".to_string()));
        }

        Ok(self.transactions.find_pending().await?)
    }
}
