//! HTTP API application wiring (Axum router + service wiring).
//!
//! This folder is structured like:
//! - `services.rs`: infrastructure wiring (event store, router, `Bank` handle)
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: request/response DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use bankes_infra::Bank;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::AppServices;

/// Build the full HTTP router around an already running account service.
pub fn build_app(bank: Bank) -> Router {
    let services = AppServices::new(bank);

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router())
        .layer(ServiceBuilder::new().layer(Extension(services)))
}
