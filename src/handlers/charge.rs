//! The charge orchestrator: the single write path into the transaction
//! ledger. Authentication strictly precedes payload parsing, so no
//! transaction can ever exist for a rejected credential.

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::{phone, ApiMode, NewCharge, Rail, Transaction, TransactionStatus};
use crate::error::AppError;
use crate::ports::TransactionLedger;
use crate::services::credential_from_headers;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ChargeRequest {
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub external_ref: Option<String>,
}

/// Acknowledgment for a simulated charge.
#[derive(Debug, Serialize)]
pub struct SandboxChargeResponse {
    pub success: bool,
    pub transaction_id: String,
    pub status: TransactionStatus,
    pub message: String,
    pub mode: ApiMode,
    pub amount: i64,
    pub fee: i64,
    pub net_amount: i64,
}

/// Acknowledgment for a live charge. Shaped differently from the sandbox
/// ack on purpose; both forms are part of the public contract.
#[derive(Debug, Serialize)]
pub struct LiveChargeResponse {
    pub success: bool,
    pub transaction_id: String,
    pub status: TransactionStatus,
    pub message: String,
    pub amount: i64,
    pub currency: String,
    pub fee: i64,
    pub payment_method: Rail,
}

pub async fn create_charge(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    // The credential decides the operating mode.
    let credential = credential_from_headers(&headers)
        .ok_or_else(|| AppError::Unauthorized("Missing API key".to_string()))?;
    let auth = state.authenticator.authenticate(&credential).await?;

    let request: ChargeRequest = serde_json::from_slice(&body)
        .map_err(|err| AppError::Validation(format!("Invalid request body: {}", err)))?;

    let floor = state.config.min_charge_amount;
    let amount = request
        .amount
        .filter(|amount| *amount >= floor)
        .ok_or_else(|| {
            AppError::Validation(format!(
                "Amount must be at least {} cents (KSh {})",
                floor,
                floor / 100
            ))
        })?;

    let raw_phone = request
        .phone
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| AppError::Validation("Phone number is required".to_string()))?;

    let (canonical_phone, rail) = phone::canonicalize(&raw_phone)?;

    // Fee snapshot, fixed for the life of the transaction.
    let fee_amount = state.config.fees.fee(amount);

    // Caller metadata is captured at creation time and never again.
    let origin_ip = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");

    let tx = state
        .ledger
        .insert(Transaction::new(NewCharge {
            account_id: auth.account.id,
            amount,
            currency: request
                .currency
                .unwrap_or_else(|| state.config.default_currency.clone()),
            phone: canonical_phone,
            rail,
            fee_amount,
            fee_rate_bps: state.config.fees.rate_bps as i32,
            description: request.description,
            external_ref: request.external_ref,
            metadata: json!({
                "mode": auth.mode.as_str(),
                "ip": origin_ip,
            }),
        }))
        .await?;

    tracing::info!(
        transaction_id = %tx.id,
        account_id = %auth.account.id,
        mode = %auth.mode,
        rail = %tx.rail,
        amount = tx.amount,
        "charge accepted"
    );

    // Hand off settlement; the response does not wait for it.
    state
        .settlement
        .dispatch(auth.mode, &tx, &auth.account)
        .await?;

    let response = match auth.mode {
        ApiMode::Sandbox => {
            let delay_secs = (state.config.simulator.delay_ms + 999) / 1000;
            Json(SandboxChargeResponse {
                success: true,
                transaction_id: tx.id.clone(),
                status: tx.status,
                message: format!(
                    "[SANDBOX] STK Push simulated to {}. Check status in ~{} seconds.",
                    tx.phone, delay_secs
                ),
                mode: auth.mode,
                amount: tx.amount,
                fee: tx.fee_amount,
                net_amount: tx.amount - tx.fee_amount,
            })
            .into_response()
        }
        ApiMode::Live => Json(LiveChargeResponse {
            success: true,
            transaction_id: tx.id.clone(),
            status: tx.status,
            message: format!("STK Push sent to {}", tx.phone),
            amount: tx.amount,
            currency: tx.currency.clone(),
            fee: tx.fee_amount,
            payment_method: tx.rail,
        })
        .into_response(),
    };

    Ok(response)
}
