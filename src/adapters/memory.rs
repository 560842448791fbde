//! In-memory stores for tests and local runs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{AuditLogEntry, Transaction, TransactionStatus, VerificationUpdate};
use crate::ports::{AuditStore, RepositoryError, RepositoryResult, TransactionStore};

fn newest_first(mut txs: Vec<Transaction>) -> Vec<Transaction> {
    txs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    txs
}

#[derive(Clone, Default)]
pub struct InMemoryTransactionStore {
    transactions: Arc<RwLock<HashMap<Uuid, Transaction>>>,
}

impl InMemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.transactions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.transactions.read().await.is_empty()
    }
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn create(&self, tx: &Transaction) -> RepositoryResult<Transaction> {
        let mut transactions = self.transactions.write().await;
        if transactions.contains_key(&tx.id) {
            return Err(RepositoryError::Duplicate(tx.id.to_string()));
        }
        transactions.insert(tx.id, tx.clone());
        Ok(tx.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Transaction>> {
        Ok(self.transactions.read().await.get(&id).cloned())
    }

    async fn find_pending(&self) -> RepositoryResult<Vec<Transaction>> {
        let pending = self
            .transactions
            .read()
            .await
            .values()
            .filter(|tx| tx.status == TransactionStatus::Pending)
            .cloned()
            .collect();
        Ok(newest_first(pending))
    }

    async fn find_by_customer(&self, customer_id: &str) -> RepositoryResult<Vec<Transaction>> {
        let owned = self
            .transactions
            .read()
            .await
            .values()
            .filter(|tx| tx.customer_id == customer_id)
            .cloned()
            .collect();
        Ok(newest_first(owned))
    }

    async fn atomic_update_if_pending(
        &self,
        id: Uuid,
        update: &VerificationUpdate,
    ) -> RepositoryResult<Option<Transaction>> {
        // Check and write under one guard so concurrent decisions serialize here.
        let mut transactions = self.transactions.write().await;
        match transactions.get_mut(&id) {
            Some(tx) if tx.is_pending() => {
                update.apply_to(tx);
                Ok(Some(tx.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn count_recent_by_customer(
        &self,
        customer_id: &str,
        since: DateTime<Utc>,
    ) -> RepositoryResult<u64> {
        let count = self
            .transactions
            .read()
            .await
            .values()
            .filter(|tx| tx.customer_id == customer_id && tx.created_at >= since)
            .count();
        Ok(count as u64)
    }

    async fn count_rejected_matching(
        &self,
        account_number: &str,
        bank_name: &str,
    ) -> RepositoryResult<u64> {
        let count = self
            .transactions
            .read()
            .await
            .values()
            .filter(|tx| tx.status == TransactionStatus::Rejected)
            .filter(|tx| {
                tx.recipient_account_info.account_number == account_number
                    || tx.recipient_account_info.bank_name == bank_name
            })
            .count();
        Ok(count as u64)
    }

    async fn purge_stale_pending(&self, cutoff: DateTime<Utc>) -> RepositoryResult<u64> {
        let mut transactions = self.transactions.write().await;
        let before = transactions.len();
        transactions.retain(|_, tx| !(tx.is_pending() && tx.created_at < cutoff));
        Ok((before - transactions.len()) as u64)
    }
}

#[derive(Clone, Default)]
pub struct InMemoryAuditStore {
    entries: Arc<RwLock<Vec<AuditLogEntry>>>,
}

impl InMemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot in append order.
    pub async fn entries(&self) -> Vec<AuditLogEntry> {
        self.entries.read().await.clone()
    }
}

#[async_trait]
impl AuditStore for InMemoryAuditStore {
    async fn append(&self, entry: &AuditLogEntry) -> RepositoryResult<()> {
        self.entries.write().await.push(entry.clone());
        Ok(())
    }

    async fn list_recent(&self, limit: i64) -> RepositoryResult<Vec<AuditLogEntry>> {
        let limit = usize::try_from(limit.max(0)).unwrap_or(0);
        Ok(self
            .entries
            .read()
            .await
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Currency, Provider, RecipientAccountInfo, TransactionDraft};
    use chrono::Duration;

    fn sample(customer_id: &str, account_number: &str, bank_name: &str) -> Transaction {
        Transaction::new(
            customer_id.to_string(),
            TransactionDraft {
                amount: "10.00".parse().unwrap(),
                currency: Currency::Usd,
                provider: Provider::Nedbank,
                swift_code: None,
                recipient: RecipientAccountInfo {
                    account_name: "Jane Doe".to_string(),
                    account_number: account_number.to_string(),
                    bank_name: bank_name.to_string(),
                },
            },
        )
    }

    fn rejection(by: &str) -> VerificationUpdate {
        VerificationUpdate {
            status: TransactionStatus::Rejected,
            verified_by: by.to_string(),
            verification_notes: None,
            verification_date: Utc::now(),
            risk_score: 0,
        }
    }

    #[tokio::test]
    async fn test_atomic_update_only_applies_once() {
        let store = InMemoryTransactionStore::new();
        let tx = store.create(&sample("c1", "1234567890", "Nedbank")).await.unwrap();

        let first = store.atomic_update_if_pending(tx.id, &rejection("a1")).await.unwrap();
        let second = store.atomic_update_if_pending(tx.id, &rejection("a2")).await.unwrap();

        assert_eq!(first.unwrap().verified_by.as_deref(), Some("a1"));
        assert!(second.is_none());
        let stored = store.find_by_id(tx.id).await.unwrap().unwrap();
        assert_eq!(stored.verified_by.as_deref(), Some("a1"));
    }

    #[tokio::test]
    async fn test_concurrent_updates_have_single_winner() {
        let store = InMemoryTransactionStore::new();
        let id = store
            .create(&sample("c1", "1234567890", "Nedbank"))
            .await
            .unwrap()
            .id;

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .atomic_update_if_pending(id, &rejection(&format!("a{}", i)))
                        .await
                        .unwrap()
                })
            })
            .collect();

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap().is_some() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn test_rejected_match_is_account_or_bank() {
        let store = InMemoryTransactionStore::new();
        let same_account = store.create(&sample("c1", "1111111111", "Nedbank")).await.unwrap();
        let same_bank = store.create(&sample("c2", "2222222222", "Shady Bank")).await.unwrap();
        store.create(&sample("c3", "3333333333", "Nedbank")).await.unwrap();
        store.create(&sample("c4", "1111111111", "Nedbank")).await.unwrap();

        for id in [same_account.id, same_bank.id] {
            store.atomic_update_if_pending(id, &rejection("a1")).await.unwrap();
        }

        let count = store
            .count_rejected_matching("1111111111", "Shady Bank")
            .await
            .unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn test_purge_only_removes_old_pending() {
        let store = InMemoryTransactionStore::new();
        let mut old_pending = sample("c1", "1234567890", "Nedbank");
        old_pending.created_at = Utc::now() - Duration::days(40);
        let mut old_decided = sample("c1", "1234567890", "Nedbank");
        old_decided.created_at = Utc::now() - Duration::days(40);
        old_decided.status = TransactionStatus::Completed;
        let fresh = sample("c1", "1234567890", "Nedbank");

        for tx in [&old_pending, &old_decided, &fresh] {
            store.create(tx).await.unwrap();
        }

        let purged = store
            .purge_stale_pending(Utc::now() - Duration::days(30))
            .await
            .unwrap();
        assert_eq!(purged, 1);
        assert!(store.find_by_id(old_pending.id).await.unwrap().is_none());
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_audit_store_lists_newest_first() {
        let store = InMemoryAuditStore::new();
        for i in 0..3 {
            store
                .append(&AuditLogEntry::new(
                    crate::domain::AuditEventType::AdminAction,
                    Some(format!("u{}", i)),
                    None,
                    None,
                    crate::domain::AuditOutcome::Success,
                    serde_json::json!({}),
                ))
                .await
                .unwrap();
        }

        let recent = store.list_recent(2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].user_id.as_deref(), Some("u2"));
    }
}
