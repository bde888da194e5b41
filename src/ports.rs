//! Storage interfaces consumed by the orchestrator and the settlement
//! strategies. Implementations live in `adapters`; tests substitute the
//! in-memory ones.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{Account, SettlementOutcome, Transaction};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("storage failure: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound("row".to_string()),
            other => StoreError::Backend(other.to_string()),
        }
    }
}

/// Result of a conditional settlement update.
#[derive(Debug)]
pub enum Resolution {
    /// This caller won the race; the returned row is terminal.
    Applied(Transaction),
    /// The transaction had already left PENDING. Not an error: duplicate
    /// provider callbacks land here.
    AlreadySettled,
}

/// Durable store of transaction records; the single source of truth for
/// status. Creation is strictly ordered before any settlement update because
/// `resolve` requires an existing PENDING row.
#[async_trait]
pub trait TransactionLedger: Send + Sync {
    async fn insert(&self, tx: Transaction) -> Result<Transaction, StoreError>;

    async fn get(&self, id: &str) -> Result<Option<Transaction>, StoreError>;

    /// Compare-and-set update: applies `outcome` only while the row is still
    /// PENDING. Concurrent attempts serialize here; losers observe
    /// `Resolution::AlreadySettled`.
    async fn resolve(&self, id: &str, outcome: &SettlementOutcome)
        -> Result<Resolution, StoreError>;

    /// PENDING rows created before `cutoff`, oldest first, for the
    /// reconciliation sweep.
    async fn stale_pending(
        &self,
        cutoff: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Transaction>, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

/// Read surface onto the account/compliance collaborators. Credential
/// lookups are point lookups; the hot path never scans.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_by_sandbox_key(&self, key: &str) -> Result<Option<Account>, StoreError>;

    async fn find_by_live_fingerprint(
        &self,
        fingerprint: &str,
    ) -> Result<Option<Account>, StoreError>;

    /// Used by out-of-band paths (webhook delivery for swept transactions).
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError>;
}
