pub mod charge;
pub mod transactions;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use crate::error::AppError;
use crate::ports::TransactionLedger;
use crate::AppState;

#[derive(Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
    pub ledger: &'static str,
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let ledger_status = match state.ledger.ping().await {
        Ok(()) => "connected",
        Err(_) => "disconnected",
    };

    let healthy = ledger_status == "connected";
    let body = HealthStatus {
        status: if healthy { "healthy" } else { "unhealthy" },
        version: env!("CARGO_PKG_VERSION"),
        ledger: ledger_status,
    };

    let status_code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(body))
}

/// Per-route method fallback so a wrong verb gets the structured 405
/// envelope instead of axum's bare default.
pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}
