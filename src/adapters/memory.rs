//! In-memory implementations of the storage ports. Used by the integration
//! suite and anywhere a throwaway backend is useful.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{Account, SettlementOutcome, Transaction, TransactionStatus};
use crate::ports::{AccountStore, Resolution, StoreError, TransactionLedger};

#[derive(Clone, Default)]
pub struct InMemoryLedger {
    rows: Arc<RwLock<HashMap<String, Transaction>>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl TransactionLedger for InMemoryLedger {
    async fn insert(&self, tx: Transaction) -> Result<Transaction, StoreError> {
        let mut rows = self.rows.write().await;
        if rows.contains_key(&tx.id) {
            return Err(StoreError::Backend(format!(
                "duplicate transaction id {}",
                tx.id
            )));
        }
        rows.insert(tx.id.clone(), tx.clone());
        Ok(tx)
    }

    async fn get(&self, id: &str) -> Result<Option<Transaction>, StoreError> {
        Ok(self.rows.read().await.get(id).cloned())
    }

    async fn resolve(
        &self,
        id: &str,
        outcome: &SettlementOutcome,
    ) -> Result<Resolution, StoreError> {
        let mut rows = self.rows.write().await;

        let current = rows
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("transaction {}", id)))?;

        // Same guard the Postgres adapter expresses in its WHERE clause.
        if current.status != TransactionStatus::Pending {
            return Ok(Resolution::AlreadySettled);
        }

        let resolved = current.resolved(outcome, Utc::now());
        rows.insert(id.to_string(), resolved.clone());
        Ok(Resolution::Applied(resolved))
    }

    async fn stale_pending(
        &self,
        cutoff: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Transaction>, StoreError> {
        let rows = self.rows.read().await;
        let mut stale: Vec<Transaction> = rows
            .values()
            .filter(|tx| tx.status == TransactionStatus::Pending && tx.created_at < cutoff)
            .cloned()
            .collect();
        stale.sort_by_key(|tx| tx.created_at);
        stale.truncate(limit as usize);
        Ok(stale)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryAccounts {
    accounts: Arc<RwLock<HashMap<Uuid, Account>>>,
    by_sandbox_key: Arc<RwLock<HashMap<String, Uuid>>>,
    by_fingerprint: Arc<RwLock<HashMap<String, Uuid>>>,
}

impl InMemoryAccounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an account under its credentials. `live_fingerprint` is the
    /// SHA-256 hex of the live key, exactly as the durable store holds it.
    pub async fn add(
        &self,
        account: Account,
        sandbox_key: Option<String>,
        live_fingerprint: Option<String>,
    ) {
        if let Some(key) = sandbox_key {
            self.by_sandbox_key.write().await.insert(key, account.id);
        }
        if let Some(fp) = live_fingerprint {
            self.by_fingerprint.write().await.insert(fp, account.id);
        }
        self.accounts.write().await.insert(account.id, account);
    }
}

#[async_trait]
impl AccountStore for InMemoryAccounts {
    async fn find_by_sandbox_key(&self, key: &str) -> Result<Option<Account>, StoreError> {
        let id = self.by_sandbox_key.read().await.get(key).copied();
        match id {
            Some(id) => Ok(self.accounts.read().await.get(&id).cloned()),
            None => Ok(None),
        }
    }

    async fn find_by_live_fingerprint(
        &self,
        fingerprint: &str,
    ) -> Result<Option<Account>, StoreError> {
        let id = self.by_fingerprint.read().await.get(fingerprint).copied();
        match id {
            Some(id) => Ok(self.accounts.read().await.get(&id).cloned()),
            None => Ok(None),
        }
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        Ok(self.accounts.read().await.get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NewCharge, Rail};
    use serde_json::json;

    fn pending_tx() -> Transaction {
        Transaction::new(NewCharge {
            account_id: Uuid::new_v4(),
            amount: 10_000,
            currency: "KES".to_string(),
            phone: "254712345678".to_string(),
            rail: Rail::Mpesa,
            fee_amount: 2_250,
            fee_rate_bps: 250,
            description: None,
            external_ref: None,
            metadata: json!({}),
        })
    }

    #[tokio::test]
    async fn insert_then_get_round_trips() {
        let ledger = InMemoryLedger::new();
        let tx = ledger.insert(pending_tx()).await.unwrap();

        let fetched = ledger.get(&tx.id).await.unwrap().unwrap();
        assert_eq!(fetched.id, tx.id);
        assert_eq!(fetched.status, TransactionStatus::Pending);
    }

    #[tokio::test]
    async fn resolve_requires_an_existing_row() {
        let ledger = InMemoryLedger::new();
        let outcome = SettlementOutcome::Failed {
            reason: "declined".to_string(),
            simulated: true,
        };

        let err = ledger.resolve("txn_missing", &outcome).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn duplicate_resolution_is_a_noop() {
        let ledger = InMemoryLedger::new();
        let tx = ledger.insert(pending_tx()).await.unwrap();

        let win = SettlementOutcome::Succeeded {
            provider_ref: "SANDBOX_1".to_string(),
            simulated: true,
        };
        let lose = SettlementOutcome::Failed {
            reason: "late duplicate callback".to_string(),
            simulated: true,
        };

        assert!(matches!(
            ledger.resolve(&tx.id, &win).await.unwrap(),
            Resolution::Applied(_)
        ));
        assert!(matches!(
            ledger.resolve(&tx.id, &lose).await.unwrap(),
            Resolution::AlreadySettled
        ));

        // The loser did not clobber the terminal state.
        let fetched = ledger.get(&tx.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, TransactionStatus::Success);
        assert_eq!(fetched.provider_ref.as_deref(), Some("SANDBOX_1"));
    }

    #[tokio::test]
    async fn stale_pending_skips_terminal_and_fresh_rows() {
        let ledger = InMemoryLedger::new();
        let old = ledger.insert(pending_tx()).await.unwrap();
        let settled = ledger.insert(pending_tx()).await.unwrap();

        let outcome = SettlementOutcome::Succeeded {
            provider_ref: "SANDBOX_2".to_string(),
            simulated: true,
        };
        ledger.resolve(&settled.id, &outcome).await.unwrap();

        let stale = ledger.stale_pending(Utc::now(), 10).await.unwrap();
        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].id, old.id);

        // Nothing is stale against a cutoff in the past.
        let cutoff = Utc::now() - chrono::Duration::hours(1);
        assert!(ledger.stale_pending(cutoff, 10).await.unwrap().is_empty());
    }
}
