//! Resolves an opaque API credential to a merchant account and an operating
//! mode. Sandbox keys are matched verbatim; live keys are matched by SHA-256
//! fingerprint so the plaintext production credential is never stored. Both
//! lookups are point lookups; this sits on the hot path of every charge.

use axum::http::HeaderMap;
use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::domain::{Account, AccountStatus, ApiMode};
use crate::error::AppError;
use crate::ports::AccountStore;

/// Who is calling, and in which mode their credential operates.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub account: Account,
    pub mode: ApiMode,
}

#[derive(Clone)]
pub struct Authenticator {
    accounts: Arc<dyn AccountStore>,
}

impl Authenticator {
    pub fn new(accounts: Arc<dyn AccountStore>) -> Self {
        Self { accounts }
    }

    /// SHA-256 hex fingerprint, as stored in `accounts.live_key_fingerprint`.
    pub fn fingerprint(credential: &str) -> String {
        hex::encode(Sha256::digest(credential.as_bytes()))
    }

    pub async fn authenticate(&self, credential: &str) -> Result<AuthContext, AppError> {
        if credential.is_empty() {
            return Err(AppError::Unauthorized("Missing API key".to_string()));
        }

        if let Some(account) = self.accounts.find_by_sandbox_key(credential).await? {
            check_not_suspended(&account)?;
            return Ok(AuthContext {
                account,
                mode: ApiMode::Sandbox,
            });
        }

        let fingerprint = Self::fingerprint(credential);
        if let Some(account) = self.accounts.find_by_live_fingerprint(&fingerprint).await? {
            check_not_suspended(&account)?;
            if !account.status.can_transact_live() {
                return Err(AppError::ComplianceGate);
            }
            return Ok(AuthContext {
                account,
                mode: ApiMode::Live,
            });
        }

        Err(AppError::Unauthorized("Invalid API key".to_string()))
    }
}

fn check_not_suspended(account: &Account) -> Result<(), AppError> {
    if account.status == AccountStatus::Suspended {
        return Err(AppError::Unauthorized("Account suspended".to_string()));
    }
    Ok(())
}

/// Credential from the dedicated header, falling back to a bearer token.
pub fn credential_from_headers(headers: &HeaderMap) -> Option<String> {
    if let Some(key) = headers.get("x-api-key").and_then(|v| v.to_str().ok()) {
        return Some(key.to_string());
    }

    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}
