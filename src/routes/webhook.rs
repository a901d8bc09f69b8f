use axum::{
    Json, Router,
    extract::{Query, State},
    http::HeaderMap,
    routing::{get, post},
};
use serde_json::Value;

use crate::{
    dto::webhooks::{WebhookAck, WebhookLogList, WebhookPayload},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    routes::params::WebhookLogQuery,
    services::webhook_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(receive))
        .route("/logs", get(list_logs))
}

#[utoipa::path(
    post,
    path = "/api/webhook",
    request_body = WebhookPayload,
    responses(
        (status = 200, description = "Callback logged; `processed` tells whether it was applied", body = ApiResponse<WebhookAck>),
        (status = 400, description = "Unknown payment status"),
        (status = 500, description = "Processing failed, callback kept in the log")
    ),
    tag = "Webhook"
)]
pub async fn receive(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> AppResult<Json<ApiResponse<WebhookAck>>> {
    let resp = webhook_service::handle_webhook(&state, payload, client_ip(&headers)).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/webhook/logs",
    params(WebhookLogQuery),
    responses(
        (status = 200, description = "Webhook logs, newest first", body = ApiResponse<WebhookLogList>),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Webhook"
)]
pub async fn list_logs(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<WebhookLogQuery>,
) -> AppResult<Json<ApiResponse<WebhookLogList>>> {
    let resp = webhook_service::list_logs(&state, &user, query).await?;
    Ok(Json(resp))
}

/// First hop of `x-forwarded-for`, else `x-real-ip`.
fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .or_else(|| headers.get("x-real-ip").and_then(|v| v.to_str().ok()))
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
}
