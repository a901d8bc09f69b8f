use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};

use crate::{
    dto::transactions::{SchoolTransactionList, TransactionList},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Transaction,
    response::ApiResponse,
    routes::params::{Pagination, TransactionQuery},
    services::transaction_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_transactions))
        .route("/school/{school_id}", get(list_by_school))
        .route("/status/{custom_order_id}", get(transaction_status))
}

/// Mounted at `/api/transaction-status` for dashboard links.
pub fn status_router() -> Router<AppState> {
    Router::new().route("/{custom_order_id}", get(transaction_status_alias))
}

#[utoipa::path(
    get,
    path = "/api/transactions",
    params(TransactionQuery),
    responses(
        (status = 200, description = "Paginated transactions", body = ApiResponse<TransactionList>),
        (status = 400, description = "Invalid status filter")
    ),
    security(("bearer_auth" = [])),
    tag = "Transactions"
)]
pub async fn list_transactions(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<TransactionQuery>,
) -> AppResult<Json<ApiResponse<TransactionList>>> {
    let resp = transaction_service::list_transactions(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/transactions/school/{school_id}",
    params(
        ("school_id" = String, Path, description = "School id"),
        Pagination
    ),
    responses(
        (status = 200, description = "Transactions of one school", body = ApiResponse<SchoolTransactionList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Transactions"
)]
pub async fn list_by_school(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(school_id): Path<String>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<SchoolTransactionList>>> {
    let resp = transaction_service::list_by_school(&state, school_id, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/transactions/status/{custom_order_id}",
    params(("custom_order_id" = String, Path, description = "Merchant order id")),
    responses(
        (status = 200, description = "Transaction status", body = ApiResponse<Transaction>),
        (status = 404, description = "Unknown order id")
    ),
    security(("bearer_auth" = [])),
    tag = "Transactions"
)]
pub async fn transaction_status(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(custom_order_id): Path<String>,
) -> AppResult<Json<ApiResponse<Transaction>>> {
    let resp = transaction_service::transaction_status(&state, &custom_order_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/transaction-status/{custom_order_id}",
    params(("custom_order_id" = String, Path, description = "Merchant order id")),
    responses(
        (status = 200, description = "Transaction status", body = ApiResponse<Transaction>),
        (status = 404, description = "Unknown order id")
    ),
    security(("bearer_auth" = [])),
    tag = "Transactions"
)]
pub async fn transaction_status_alias(
    state: State<AppState>,
    user: AuthUser,
    custom_order_id: Path<String>,
) -> AppResult<Json<ApiResponse<Transaction>>> {
    transaction_status(state, user, custom_order_id).await
}
