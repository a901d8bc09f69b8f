use axum::{
    Json, Router,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};

use crate::{
    dto::orders::{DummyDataResponse, ExportList, OrderList, RawDataRequest, RawDataResponse},
    error::AppResult,
    export::transactions_to_csv,
    middleware::auth::AuthUser,
    response::ApiResponse,
    routes::params::{ExportFormat, ExportQuery, Pagination},
    services::order_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/pending-approval", get(pending_approval))
        .route("/create-raw-data", post(create_raw_data))
        .route("/create-dummy-data", post(create_dummy_data))
        .route("/export", get(export))
}

#[utoipa::path(
    get,
    path = "/api/order/pending-approval",
    params(Pagination),
    responses(
        (status = 200, description = "Orders awaiting review", body = ApiResponse<OrderList>),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Order"
)]
pub async fn pending_approval(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = order_service::list_pending_approval(&state, &user, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/order/create-raw-data",
    request_body = RawDataRequest,
    responses(
        (status = 201, description = "Transaction recorded", body = ApiResponse<RawDataResponse>),
        (status = 400, description = "Invalid input")
    ),
    security(("bearer_auth" = [])),
    tag = "Order"
)]
pub async fn create_raw_data(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<RawDataRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<RawDataResponse>>)> {
    let resp = order_service::create_raw_data(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    post,
    path = "/api/order/create-dummy-data",
    responses(
        (status = 201, description = "Sample transactions created", body = ApiResponse<DummyDataResponse>)
    ),
    security(("bearer_auth" = [])),
    tag = "Order"
)]
pub async fn create_dummy_data(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<(StatusCode, Json<ApiResponse<DummyDataResponse>>)> {
    let resp = order_service::create_dummy_data(&state, &user).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/order/export",
    params(ExportQuery),
    responses(
        (status = 200, description = "CSV attachment, or the envelope when format=json", content(
            (String = "text/csv"),
            (ApiResponse<ExportList> = "application/json")
        )),
        (status = 400, description = "Invalid filter")
    ),
    security(("bearer_auth" = [])),
    tag = "Order"
)]
pub async fn export(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<ExportQuery>,
) -> AppResult<Response> {
    let items = order_service::export_transactions(&state, &query).await?;
    tracing::debug!(count = items.len(), "transactions exported");

    match query.format.unwrap_or_default() {
        ExportFormat::Json => Ok(Json(order_service::export_list(items)).into_response()),
        ExportFormat::Csv => Ok((
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"transactions.csv\"",
                ),
            ],
            transactions_to_csv(&items),
        )
            .into_response()),
    }
}
