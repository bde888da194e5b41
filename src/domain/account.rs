//! Merchant account entity. Accounts are created by the onboarding surface;
//! this engine only reads them to authenticate callers and gate live mode.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Merchant onboarding lifecycle. Accounts are never hard-deleted, only
/// suspended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountStatus {
    Unverified,
    EmailVerified,
    Pending,
    Approved,
    Rejected,
    Suspended,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Unverified => "UNVERIFIED",
            AccountStatus::EmailVerified => "EMAIL_VERIFIED",
            AccountStatus::Pending => "PENDING",
            AccountStatus::Approved => "APPROVED",
            AccountStatus::Rejected => "REJECTED",
            AccountStatus::Suspended => "SUSPENDED",
        }
    }

    /// Live-mode settlement is only open to approved merchants.
    pub fn can_transact_live(&self) -> bool {
        matches!(self, AccountStatus::Approved)
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AccountStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UNVERIFIED" => Ok(AccountStatus::Unverified),
            "EMAIL_VERIFIED" => Ok(AccountStatus::EmailVerified),
            "PENDING" => Ok(AccountStatus::Pending),
            "APPROVED" => Ok(AccountStatus::Approved),
            "REJECTED" => Ok(AccountStatus::Rejected),
            "SUSPENDED" => Ok(AccountStatus::Suspended),
            other => Err(format!("unknown account status: {}", other)),
        }
    }
}

/// Which credential class a caller presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiMode {
    Sandbox,
    Live,
}

impl ApiMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiMode::Sandbox => "sandbox",
            ApiMode::Live => "live",
        }
    }
}

impl fmt::Display for ApiMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub business_name: String,
    pub email: String,
    pub status: AccountStatus,
    pub webhook_url: Option<String>,
    pub webhook_secret: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Where terminal-state events go, if the merchant configured delivery.
    /// Both pieces are required: an unsigned webhook is not deliverable.
    pub fn webhook_endpoint(&self) -> Option<(String, String)> {
        match (&self.webhook_url, &self.webhook_secret) {
            (Some(url), Some(secret)) => Some((url.clone(), secret.clone())),
            _ => None,
        }
    }
}
