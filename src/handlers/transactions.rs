use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::IntoResponse,
    Json,
};

use crate::error::AppError;
use crate::ports::TransactionLedger;
use crate::services::credential_from_headers;
use crate::AppState;

/// Status lookup for the charging merchant. A transaction belonging to a
/// different account is reported as missing, not as forbidden.
pub async fn get_transaction(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let credential = credential_from_headers(&headers)
        .ok_or_else(|| AppError::Unauthorized("Missing API key".to_string()))?;
    let auth = state.authenticator.authenticate(&credential).await?;

    let tx = state
        .ledger
        .get(&id)
        .await?
        .filter(|tx| tx.account_id == auth.account.id)
        .ok_or_else(|| AppError::NotFound(format!("Transaction {} not found", id)))?;

    Ok(Json(tx))
}
