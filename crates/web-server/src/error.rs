use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use core_types::CoreError;
use database::DbError;
use ledger::LedgerError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("Database error: {0}")]
    Database(#[from] DbError),
    #[error("{0}")]
    Validation(#[from] CoreError),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
}

impl AppError {
    /// The HTTP status for this error. Anything the user can fix is a 4xx.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Ledger(err) => match err {
                LedgerError::InsufficientBalance { .. } | LedgerError::AlreadyResolved { .. } => {
                    StatusCode::CONFLICT
                }
                LedgerError::BetNotFound(_) | LedgerError::AccountNotFound(_) => StatusCode::NOT_FOUND,
                LedgerError::BelowMinimumTransfer { .. } | LedgerError::Validation(_) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                LedgerError::Database(DbError::NotFound) => StatusCode::NOT_FOUND,
                LedgerError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Database(DbError::NotFound) | AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

/// Converts our custom `AppError` into an HTTP response.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = ?self, "Request failed.");
            "An internal database error occurred".to_string()
        } else {
            tracing::warn!(%status, error = %self, "Request rejected.");
            self.to_string()
        };

        let mut body = json!({ "error": error_message });
        if let AppError::Ledger(LedgerError::InsufficientBalance { shortfalls }) = &self {
            body["shortfalls"] = json!(shortfalls);
        }
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::BetStatus;
    use ledger::Shortfall;
    use rust_decimal_macros::dec;

    #[test]
    fn ledger_errors_map_to_client_statuses() {
        let cases = [
            (
                AppError::from(LedgerError::InsufficientBalance {
                    shortfalls: vec![Shortfall { account_id: 1, required: dec!(10), available: dec!(5) }],
                }),
                StatusCode::CONFLICT,
            ),
            (
                AppError::from(LedgerError::AlreadyResolved { bet_id: 3, status: BetStatus::Won }),
                StatusCode::CONFLICT,
            ),
            (AppError::from(LedgerError::BetNotFound(3)), StatusCode::NOT_FOUND),
            (AppError::from(LedgerError::AccountNotFound(3)), StatusCode::NOT_FOUND),
            (
                AppError::from(LedgerError::BelowMinimumTransfer { amount: dec!(10), minimum: dec!(250) }),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                AppError::from(LedgerError::Validation(CoreError::InvalidInput("odds".into(), "bad".into()))),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (AppError::from(DbError::NotFound), StatusCode::NOT_FOUND),
            (AppError::BadRequest("confirm".into()), StatusCode::BAD_REQUEST),
        ];
        for (error, expected) in cases {
            assert_eq!(error.status(), expected, "{error}");
            assert_eq!(error.into_response().status(), expected);
        }
    }

    #[test]
    fn store_failures_are_internal_errors() {
        let error = AppError::from(DbError::CorruptValue {
            column: "balance".to_string(),
            reason: "not a decimal".to_string(),
        });
        assert_eq!(error.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
