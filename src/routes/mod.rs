use axum::{Router, routing::get};

use crate::state::AppState;

pub mod auth;
pub mod doc;
pub mod health;
pub mod order;
pub mod params;
pub mod payment;
pub mod transactions;
pub mod webhook;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .nest("/auth", auth::router())
        .nest("/payment", payment::router())
        .nest("/order", order::router())
        .nest("/transactions", transactions::router())
        .nest("/transaction-status", transactions::status_router())
        .nest("/webhook", webhook::router())
}
