use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::domain::PhoneError;
use crate::ports::StoreError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("{0}")]
    Unauthorized(String),

    /// Live credential is valid but the account has not cleared compliance.
    /// Kept apart from Unauthorized so merchants can tell "bad key" from
    /// "not yet compliant".
    #[error("Live mode requires approved compliance. Complete KYC verification to go live.")]
    ComplianceGate,

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    UnsupportedPhone(#[from] PhoneError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Unauthorized(_) | AppError::ComplianceGate => StatusCode::UNAUTHORIZED,
            AppError::Validation(_) | AppError::UnsupportedPhone(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message put on the wire. Server-side failures are logged with detail
    /// but surfaced generically.
    fn public_message(&self) -> String {
        match self {
            AppError::Database(_) | AppError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => AppError::NotFound(what),
            StoreError::Backend(detail) => AppError::Database(detail),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = Json(json!({
            "success": false,
            "error": self.public_message(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_not_allowed_status_code() {
        assert_eq!(
            AppError::MethodNotAllowed.status_code(),
            StatusCode::METHOD_NOT_ALLOWED
        );
    }

    #[test]
    fn test_unauthorized_status_code() {
        let error = AppError::Unauthorized("Invalid API key".to_string());
        assert_eq!(error.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_compliance_gate_is_unauthorized_but_distinct() {
        let error = AppError::ComplianceGate;
        assert_eq!(error.status_code(), StatusCode::UNAUTHORIZED);
        assert_ne!(
            error.to_string(),
            AppError::Unauthorized("Invalid API key".to_string()).to_string()
        );
        assert!(error.to_string().contains("compliance"));
    }

    #[test]
    fn test_validation_error_status_code() {
        let error = AppError::Validation("Phone number is required".to_string());
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_phone_errors_map_to_bad_request() {
        assert_eq!(
            AppError::from(PhoneError::TooShort).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(PhoneError::UnsupportedRail).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_database_error_is_masked() {
        let error = AppError::Database("connection refused on 10.0.0.5".to_string());
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error.public_message(), "Internal server error");
    }

    #[tokio::test]
    async fn test_error_envelope_shape() {
        let response = AppError::Validation("Phone number is required".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Phone number is required");
    }
}
