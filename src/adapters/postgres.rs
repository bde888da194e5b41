//! Postgres implementations of the ledger and account store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{Account, SettlementOutcome, Transaction};
use crate::ports::{AccountStore, Resolution, StoreError, TransactionLedger};

#[derive(Clone)]
pub struct PostgresLedger {
    pool: PgPool,
}

impl PostgresLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionLedger for PostgresLedger {
    async fn insert(&self, tx: Transaction) -> Result<Transaction, StoreError> {
        let row = sqlx::query_as::<_, TransactionRow>(
            r#"
            INSERT INTO transactions (
                id, account_id, amount, currency, phone, rail, status,
                fee_amount, fee_rate_bps, description, external_ref, provider_ref,
                metadata, created_at, completed_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING *
            "#,
        )
        .bind(&tx.id)
        .bind(tx.account_id)
        .bind(tx.amount)
        .bind(&tx.currency)
        .bind(&tx.phone)
        .bind(tx.rail.as_str())
        .bind(tx.status.as_str())
        .bind(tx.fee_amount)
        .bind(tx.fee_rate_bps)
        .bind(&tx.description)
        .bind(&tx.external_ref)
        .bind(&tx.provider_ref)
        .bind(&tx.metadata)
        .bind(tx.created_at)
        .bind(tx.completed_at)
        .fetch_one(&self.pool)
        .await?;

        row.into_domain()
    }

    async fn get(&self, id: &str) -> Result<Option<Transaction>, StoreError> {
        let row = sqlx::query_as::<_, TransactionRow>("SELECT * FROM transactions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(TransactionRow::into_domain).transpose()
    }

    async fn resolve(
        &self,
        id: &str,
        outcome: &SettlementOutcome,
    ) -> Result<Resolution, StoreError> {
        // Single conditional update: the WHERE clause is the PENDING guard,
        // so concurrent callbacks serialize inside the database.
        let row = sqlx::query_as::<_, TransactionRow>(
            r#"
            UPDATE transactions
            SET status = $2, provider_ref = $3, completed_at = $4, metadata = metadata || $5
            WHERE id = $1 AND status = 'PENDING'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(outcome.status().as_str())
        .bind(outcome.provider_ref())
        .bind(Utc::now())
        .bind(outcome.metadata_patch())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Resolution::Applied(row.into_domain()?)),
            None => {
                // Nothing updated: either the row is already terminal or it
                // never existed. The ledger refuses updates before creation.
                match self.get(id).await? {
                    Some(_) => Ok(Resolution::AlreadySettled),
                    None => Err(StoreError::NotFound(format!("transaction {}", id))),
                }
            }
        }
    }

    async fn stale_pending(
        &self,
        cutoff: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Transaction>, StoreError> {
        let rows = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT * FROM transactions
            WHERE status = 'PENDING' AND created_at < $1
            ORDER BY created_at ASC
            LIMIT $2
            "#,
        )
        .bind(cutoff)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TransactionRow::into_domain).collect()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct PostgresAccountStore {
    pool: PgPool,
}

impl PostgresAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountStore for PostgresAccountStore {
    async fn find_by_sandbox_key(&self, key: &str) -> Result<Option<Account>, StoreError> {
        let row = sqlx::query_as::<_, AccountRow>("SELECT * FROM accounts WHERE sandbox_key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        row.map(AccountRow::into_domain).transpose()
    }

    async fn find_by_live_fingerprint(
        &self,
        fingerprint: &str,
    ) -> Result<Option<Account>, StoreError> {
        let row = sqlx::query_as::<_, AccountRow>(
            "SELECT * FROM accounts WHERE live_key_fingerprint = $1",
        )
        .bind(fingerprint)
        .fetch_optional(&self.pool)
        .await?;

        row.map(AccountRow::into_domain).transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        let row = sqlx::query_as::<_, AccountRow>("SELECT * FROM accounts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(AccountRow::into_domain).transpose()
    }
}

/// Internal row types for SQLx. Status and rail are stored as text; parsing
/// them back is where schema drift would surface, so it is an explicit error.
#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    id: String,
    account_id: Uuid,
    amount: i64,
    currency: String,
    phone: String,
    rail: String,
    status: String,
    fee_amount: i64,
    fee_rate_bps: i32,
    description: Option<String>,
    external_ref: Option<String>,
    provider_ref: Option<String>,
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl TransactionRow {
    fn into_domain(self) -> Result<Transaction, StoreError> {
        Ok(Transaction {
            id: self.id,
            account_id: self.account_id,
            amount: self.amount,
            currency: self.currency,
            phone: self.phone,
            rail: self.rail.parse().map_err(StoreError::Backend)?,
            status: self.status.parse().map_err(StoreError::Backend)?,
            fee_amount: self.fee_amount,
            fee_rate_bps: self.fee_rate_bps,
            description: self.description,
            external_ref: self.external_ref,
            provider_ref: self.provider_ref,
            metadata: self.metadata,
            created_at: self.created_at,
            completed_at: self.completed_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AccountRow {
    id: Uuid,
    business_name: String,
    email: String,
    status: String,
    webhook_url: Option<String>,
    webhook_secret: Option<String>,
    created_at: DateTime<Utc>,
}

impl AccountRow {
    fn into_domain(self) -> Result<Account, StoreError> {
        Ok(Account {
            id: self.id,
            business_name: self.business_name,
            email: self.email,
            status: self.status.parse().map_err(StoreError::Backend)?,
            webhook_url: self.webhook_url,
            webhook_secret: self.webhook_secret,
            created_at: self.created_at,
        })
    }
}
