//! Compliance (KYC) record, one-to-one with an account. Owned by the
//! onboarding and admin surfaces; the settlement engine only cares that its
//! approval flips the account to APPROVED. The transition guard lives here so
//! every mutating surface shares it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum KycStatus {
    Draft,
    Pending,
    Approved,
    Rejected,
}

impl KycStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            KycStatus::Draft => "DRAFT",
            KycStatus::Pending => "PENDING",
            KycStatus::Approved => "APPROVED",
            KycStatus::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for KycStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for KycStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DRAFT" => Ok(KycStatus::Draft),
            "PENDING" => Ok(KycStatus::Pending),
            "APPROVED" => Ok(KycStatus::Approved),
            "REJECTED" => Ok(KycStatus::Rejected),
            other => Err(format!("unknown kyc status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid KYC transition: {from} -> {to}")]
pub struct KycTransitionError {
    pub from: KycStatus,
    pub to: KycStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KycRecord {
    pub id: Uuid,
    pub account_id: Uuid,
    pub director_name: Option<String>,
    pub director_phone: Option<String>,
    pub address: Option<String>,
    pub tax_pin: Option<String>,
    pub expected_monthly_volume: Option<String>,
    pub id_document_url: Option<String>,
    pub business_cert_url: Option<String>,
    pub status: KycStatus,
    pub rejection_reason: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

impl KycRecord {
    fn transition(&mut self, to: KycStatus) -> Result<(), KycTransitionError> {
        let allowed = matches!(
            (self.status, to),
            (KycStatus::Draft, KycStatus::Pending)
                | (KycStatus::Rejected, KycStatus::Pending)
                | (KycStatus::Pending, KycStatus::Approved)
                | (KycStatus::Pending, KycStatus::Rejected)
        );

        if !allowed {
            return Err(KycTransitionError {
                from: self.status,
                to,
            });
        }

        self.status = to;
        Ok(())
    }

    /// Merchant submits (or resubmits after rejection) for review.
    pub fn submit(&mut self) -> Result<(), KycTransitionError> {
        self.transition(KycStatus::Pending)?;
        self.rejection_reason = None;
        self.submitted_at = Some(Utc::now());
        Ok(())
    }

    /// Admin review outcomes.
    pub fn approve(&mut self) -> Result<(), KycTransitionError> {
        self.transition(KycStatus::Approved)?;
        self.reviewed_at = Some(Utc::now());
        Ok(())
    }

    pub fn reject(&mut self, reason: impl Into<String>) -> Result<(), KycTransitionError> {
        self.transition(KycStatus::Rejected)?;
        self.rejection_reason = Some(reason.into());
        self.reviewed_at = Some(Utc::now());
        Ok(())
    }
}
