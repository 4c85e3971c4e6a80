use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use bankes_accounts::Rejection;
use bankes_core::DomainError;
use bankes_infra::{BankError, EventStoreError};

pub fn bank_error_to_response(err: BankError) -> axum::response::Response {
    match err {
        BankError::Domain(DomainError::NotFound) => not_found(),
        BankError::Domain(DomainError::Validation(msg)) => validation_error(vec![msg]),
        BankError::Domain(DomainError::InvalidId(_)) => not_found(),
        BankError::Domain(DomainError::Conflict(msg)) => json_error(StatusCode::CONFLICT, "conflict", msg),
        BankError::Domain(DomainError::InvariantViolation(msg)) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation", msg)
        }
        BankError::Store(EventStoreError::Concurrency(msg)) => json_error(StatusCode::CONFLICT, "conflict", msg),
        BankError::Store(e) => {
            tracing::error!(error = %e, "event store failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", e.to_string())
        }
        e @ BankError::Timeout(_) => json_error(StatusCode::GATEWAY_TIMEOUT, "timeout", e.to_string()),
        e @ BankError::Unavailable => json_error(StatusCode::SERVICE_UNAVAILABLE, "unavailable", e.to_string()),
    }
}

pub fn rejection_to_response(rejection: Rejection) -> axum::response::Response {
    let code = match rejection {
        Rejection::InsufficientFunds { .. } => "insufficient_funds",
        Rejection::CurrencyMismatch { .. } => "currency_mismatch",
    };
    json_error(StatusCode::UNPROCESSABLE_ENTITY, code, rejection.to_string())
}

pub fn validation_error(messages: Vec<String>) -> axum::response::Response {
    (
        StatusCode::BAD_REQUEST,
        axum::Json(json!({
            "error": "validation_error",
            "messages": messages,
        })),
    )
        .into_response()
}

pub fn not_found() -> axum::response::Response {
    json_error(StatusCode::NOT_FOUND, "not_found", "account not found")
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
