use axum::{
    Router,
    routing::{get, post},
};

pub mod accounts;
pub mod system;

/// Router for the account endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/bank", post(accounts::create_account))
        .route("/bank/:id", get(accounts::get_account).put(accounts::update_balance))
}
