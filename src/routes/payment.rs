use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::payments::{
        AdminApproveRequest, ApprovalResponse, AutoApproveRequest, CreatePaymentRequest,
        CreatePaymentResponse,
    },
    error::AppResult,
    gateway::CollectRequestStatus,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::payment_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create-payment", post(create_payment))
        .route("/status/{collect_request_id}", get(payment_status))
        .route("/admin-approve/{id}", post(admin_approve))
        .route("/auto-approve/{id}", post(auto_approve))
}

#[utoipa::path(
    post,
    path = "/api/payment/create-payment",
    request_body = CreatePaymentRequest,
    responses(
        (status = 201, description = "Order created, awaiting approval", body = ApiResponse<CreatePaymentResponse>),
        (status = 400, description = "Invalid amount or student info"),
        (status = 409, description = "Order id collision")
    ),
    security(("bearer_auth" = [])),
    tag = "Payment"
)]
pub async fn create_payment(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreatePaymentRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<CreatePaymentResponse>>)> {
    let resp = payment_service::create_payment(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/payment/status/{collect_request_id}",
    params(("collect_request_id" = String, Path, description = "Gateway collect request id")),
    responses(
        (status = 200, description = "Gateway payment status", body = ApiResponse<CollectRequestStatus>),
        (status = 502, description = "Gateway unavailable")
    ),
    security(("bearer_auth" = [])),
    tag = "Payment"
)]
pub async fn payment_status(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(collect_request_id): Path<String>,
) -> AppResult<Json<ApiResponse<CollectRequestStatus>>> {
    let resp = payment_service::check_status(&state, &collect_request_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/payment/admin-approve/{id}",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = AdminApproveRequest,
    responses(
        (status = 200, description = "Order reviewed", body = ApiResponse<ApprovalResponse>),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Order already reviewed"),
        (status = 502, description = "Gateway collect request failed")
    ),
    security(("bearer_auth" = [])),
    tag = "Payment"
)]
pub async fn admin_approve(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AdminApproveRequest>,
) -> AppResult<Json<ApiResponse<ApprovalResponse>>> {
    let resp = payment_service::admin_approve(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/payment/auto-approve/{id}",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = AutoApproveRequest,
    responses(
        (status = 200, description = "Order approved", body = ApiResponse<ApprovalResponse>),
        (status = 403, description = "Not the creator or amount above limit"),
        (status = 409, description = "Order already reviewed"),
        (status = 502, description = "Gateway collect request failed")
    ),
    security(("bearer_auth" = [])),
    tag = "Payment"
)]
pub async fn auto_approve(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    payload: Option<Json<AutoApproveRequest>>,
) -> AppResult<Json<ApiResponse<ApprovalResponse>>> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    let resp = payment_service::auto_approve(&state, &user, id, payload).await?;
    Ok(Json(resp))
}
