use axum::{
    Json,
    extract::{Extension, Path, rejection::JsonRejection},
    http::{StatusCode, header},
    response::IntoResponse,
};

use bankes_accounts::{AccountId, UpdateOutcome};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub async fn create_account(
    Extension(services): Extension<AppServices>,
    body: Result<Json<dto::CreateAccountRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::validation_error(vec![e.body_text()]),
    };
    let open = match body.validate() {
        Ok(open) => open,
        Err(messages) => return errors::validation_error(messages),
    };

    match services.bank.create_account(open).await {
        Ok(id) => (
            StatusCode::CREATED,
            [(header::LOCATION, format!("/bank/{id}"))],
            Json(dto::CreatedResponse { id: id.to_string() }),
        )
            .into_response(),
        Err(e) => errors::bank_error_to_response(e),
    }
}

pub async fn get_account(
    Extension(services): Extension<AppServices>,
    Path(id): Path<String>,
) -> axum::response::Response {
    // An id that cannot be parsed cannot exist either.
    let Ok(account_id) = id.parse::<AccountId>() else {
        return errors::not_found();
    };

    match services.bank.get_account(account_id).await {
        Ok(Some(account)) => (StatusCode::OK, Json(dto::AccountResponse::from(account))).into_response(),
        Ok(None) => errors::not_found(),
        Err(e) => errors::bank_error_to_response(e),
    }
}

pub async fn update_balance(
    Extension(services): Extension<AppServices>,
    Path(id): Path<String>,
    body: Result<Json<dto::UpdateBalanceRequest>, JsonRejection>,
) -> axum::response::Response {
    let Ok(account_id) = id.parse::<AccountId>() else {
        return errors::not_found();
    };
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::validation_error(vec![e.body_text()]),
    };
    let command = match body.validate(account_id) {
        Ok(command) => command,
        Err(messages) => return errors::validation_error(messages),
    };

    match services.bank.update_balance(command).await {
        Ok(Some(UpdateOutcome::Updated(account))) => {
            (StatusCode::OK, Json(dto::AccountResponse::from(account))).into_response()
        }
        Ok(Some(UpdateOutcome::Rejected(rejection))) => errors::rejection_to_response(rejection),
        Ok(None) => errors::not_found(),
        Err(e) => errors::bank_error_to_response(e),
    }
}
