use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};

use crate::app::errors;
use crate::app::services::AppServices;

/// Liveness plus the number of registered accounts. Answers through the router, so a
/// stuck router shows up here as 503/504.
pub async fn health(Extension(services): Extension<AppServices>) -> axum::response::Response {
    match services.bank.account_count().await {
        Ok(accounts) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "ok",
                "accounts": accounts,
            })),
        )
            .into_response(),
        Err(e) => errors::bank_error_to_response(e),
    }
}
