//! Transaction domain entity and its settlement state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::domain::phone::Rail;

/// Lifecycle of a charge. PENDING resolves exactly once to SUCCESS or FAILED;
/// HELD/RELEASED/REFUNDED belong to the escrow extension and are only
/// reachable from SUCCESS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionStatus {
    Pending,
    Success,
    Failed,
    Held,
    Released,
    Refunded,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "PENDING",
            TransactionStatus::Success => "SUCCESS",
            TransactionStatus::Failed => "FAILED",
            TransactionStatus::Held => "HELD",
            TransactionStatus::Released => "RELEASED",
            TransactionStatus::Refunded => "REFUNDED",
        }
    }

    /// Statuses that carry a completion timestamp. HELD funds are settled but
    /// the charge is not finished, so it stays unset there.
    pub fn sets_completed_at(&self) -> bool {
        !matches!(self, TransactionStatus::Pending | TransactionStatus::Held)
    }

    /// The monotonic transition table. Anything not listed is refused, which
    /// is what makes duplicate settlement callbacks a no-op.
    pub fn can_transition_to(&self, next: TransactionStatus) -> bool {
        use TransactionStatus::*;
        matches!(
            (self, next),
            (Pending, Success)
                | (Pending, Failed)
                | (Success, Held)
                | (Success, Refunded)
                | (Held, Released)
                | (Held, Refunded)
        )
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(TransactionStatus::Pending),
            "SUCCESS" => Ok(TransactionStatus::Success),
            "FAILED" => Ok(TransactionStatus::Failed),
            "HELD" => Ok(TransactionStatus::Held),
            "RELEASED" => Ok(TransactionStatus::Released),
            "REFUNDED" => Ok(TransactionStatus::Refunded),
            other => Err(format!("unknown transaction status: {}", other)),
        }
    }
}

/// The one-shot result a settlement strategy applies to a PENDING
/// transaction through the ledger.
#[derive(Debug, Clone)]
pub enum SettlementOutcome {
    Succeeded {
        provider_ref: String,
        simulated: bool,
    },
    Failed {
        reason: String,
        simulated: bool,
    },
}

impl SettlementOutcome {
    pub fn status(&self) -> TransactionStatus {
        match self {
            SettlementOutcome::Succeeded { .. } => TransactionStatus::Success,
            SettlementOutcome::Failed { .. } => TransactionStatus::Failed,
        }
    }

    pub fn provider_ref(&self) -> Option<&str> {
        match self {
            SettlementOutcome::Succeeded { provider_ref, .. } => Some(provider_ref),
            SettlementOutcome::Failed { .. } => None,
        }
    }

    /// Keys merged into the transaction's metadata when the outcome lands.
    pub fn metadata_patch(&self) -> serde_json::Value {
        match self {
            SettlementOutcome::Succeeded { simulated, .. } => {
                serde_json::json!({ "sandbox_simulated": simulated })
            }
            SettlementOutcome::Failed { reason, simulated } => {
                serde_json::json!({ "sandbox_simulated": simulated, "failure_reason": reason })
            }
        }
    }
}

/// Inputs captured at charge time. Everything here is immutable once the
/// transaction row exists.
#[derive(Debug, Clone)]
pub struct NewCharge {
    pub account_id: Uuid,
    pub amount: i64,
    pub currency: String,
    pub phone: String,
    pub rail: Rail,
    pub fee_amount: i64,
    pub fee_rate_bps: i32,
    pub description: Option<String>,
    pub external_ref: Option<String>,
    pub metadata: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub account_id: Uuid,
    pub amount: i64,
    pub currency: String,
    pub phone: String,
    pub rail: Rail,
    pub status: TransactionStatus,
    pub fee_amount: i64,
    pub fee_rate_bps: i32,
    pub description: Option<String>,
    pub external_ref: Option<String>,
    pub provider_ref: Option<String>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Transaction {
    pub fn new(charge: NewCharge) -> Self {
        Self {
            id: generate_id(),
            account_id: charge.account_id,
            amount: charge.amount,
            currency: charge.currency,
            phone: charge.phone,
            rail: charge.rail,
            status: TransactionStatus::Pending,
            fee_amount: charge.fee_amount,
            fee_rate_bps: charge.fee_rate_bps,
            description: charge.description,
            external_ref: charge.external_ref,
            provider_ref: None,
            metadata: charge.metadata,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Apply a settlement outcome, producing the terminal row. The caller
    /// (a ledger implementation) is responsible for the PENDING guard.
    pub fn resolved(mut self, outcome: &SettlementOutcome, at: DateTime<Utc>) -> Self {
        self.status = outcome.status();
        self.provider_ref = outcome.provider_ref().map(str::to_owned);
        self.completed_at = Some(at);
        merge_metadata(&mut self.metadata, outcome.metadata_patch());
        self
    }
}

/// Globally unique, prefixed, opaque transaction identifier.
pub fn generate_id() -> String {
    let uuid = Uuid::new_v4().simple().to_string();
    format!("txn_{}", &uuid[..12])
}

fn merge_metadata(base: &mut serde_json::Value, patch: serde_json::Value) {
    match base.as_object_mut() {
        Some(map) => {
            if let serde_json::Value::Object(additions) = patch {
                map.extend(additions);
            }
        }
        None => *base = patch,
    }
}
