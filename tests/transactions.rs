mod common;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use school_payments_api::{
    dto::orders::RawDataRequest,
    error::AppError,
    models::{PaymentState, Role},
    routes::{
        create_api_router,
        params::{Pagination, SortOrder, TransactionQuery, TransactionSortBy},
    },
    services::{order_service, transaction_service},
    state::AppState,
};
use tower::ServiceExt;

fn entry(school: &str, amount: f64, status: PaymentState) -> RawDataRequest {
    RawDataRequest {
        institute_name: Some(school.into()),
        student_name: "Arjun Nair".into(),
        student_id: "STU009".into(),
        student_email: "arjun.nair@example.com".into(),
        order_amount: amount,
        transaction_amount: None,
        payment_method: None,
        status: Some(status),
        gateway: None,
    }
}

async fn seed(state: &AppState) -> anyhow::Result<()> {
    let user = common::create_account(state, "clerk@example.com", Role::User).await?;
    for (school, amount, status) in [
        ("Delhi Public School", 5000.0, PaymentState::Success),
        ("Delhi Public School", 12000.0, PaymentState::Failed),
        ("Kendriya Vidyalaya", 3500.0, PaymentState::Success),
        ("Kendriya Vidyalaya", 8500.0, PaymentState::Pending),
    ] {
        order_service::create_raw_data(state, &user, entry(school, amount, status)).await?;
    }
    Ok(())
}

fn app(state: AppState) -> Router {
    Router::new().nest("/api", create_api_router()).with_state(state)
}

#[tokio::test]
async fn listing_filters_sorts_and_counts() -> anyhow::Result<()> {
    let state = common::setup_state("http://127.0.0.1:9").await?;
    seed(&state).await?;

    let resp = transaction_service::list_transactions(
        &state,
        TransactionQuery {
            status: Some("success".into()),
            sort: Some(TransactionSortBy::OrderAmount),
            order: Some(SortOrder::Asc),
            ..Default::default()
        },
    )
    .await?;
    let meta = resp.meta.expect("meta");
    let items = resp.data.expect("items").items;
    assert_eq!(meta.total, Some(2));
    assert_eq!(meta.total_pages, Some(1));
    let amounts: Vec<f64> = items.iter().map(|t| t.order_amount).collect();
    assert_eq!(amounts, vec![3500.0, 5000.0]);
    assert!(items.iter().all(|t| t.order_status == "success"));

    let page = transaction_service::list_transactions(
        &state,
        TransactionQuery {
            page: Some(2),
            limit: Some(3),
            status: Some("all".into()),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(page.meta.expect("meta").total, Some(4));
    assert_eq!(page.data.expect("items").items.len(), 1);

    let school = transaction_service::list_by_school(
        &state,
        "Kendriya Vidyalaya".into(),
        Pagination::default(),
    )
    .await?
    .data
    .expect("school list");
    assert_eq!(school.items.len(), 2);
    assert!(school.items.iter().all(|t| t.school_id == "Kendriya Vidyalaya"));

    let err = transaction_service::transaction_status(&state, "EDV-missing")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));
    Ok(())
}

#[tokio::test]
async fn huge_page_returns_empty_page() -> anyhow::Result<()> {
    let state = common::setup_state("http://127.0.0.1:9").await?;
    seed(&state).await?;

    let resp = transaction_service::list_by_school(
        &state,
        "Delhi Public School".into(),
        Pagination {
            page: Some(i64::MAX),
            per_page: Some(10),
        },
    )
    .await?;
    assert!(resp.data.expect("school list").items.is_empty());
    assert_eq!(resp.meta.expect("meta").total, Some(2));
    Ok(())
}

#[tokio::test]
async fn dummy_data_creates_twenty_transactions() -> anyhow::Result<()> {
    let state = common::setup_state("http://127.0.0.1:9").await?;
    let user = common::create_account(&state, "clerk@example.com", Role::User).await?;

    let created = order_service::create_dummy_data(&state, &user)
        .await?
        .data
        .expect("dummy data");
    assert_eq!(created.created.len(), order_service::DUMMY_BATCH_SIZE);

    let listed = transaction_service::list_transactions(&state, TransactionQuery::default()).await?;
    assert_eq!(
        listed.meta.expect("meta").total,
        Some(order_service::DUMMY_BATCH_SIZE as i64)
    );
    Ok(())
}

#[tokio::test]
async fn export_requires_a_token() -> anyhow::Result<()> {
    let state = common::setup_state("http://127.0.0.1:9").await?;

    let response = app(state)
        .oneshot(Request::get("/api/order/export").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn export_serves_csv_attachment() -> anyhow::Result<()> {
    let state = common::setup_state("http://127.0.0.1:9").await?;
    seed(&state).await?;
    let token = common::bearer_token(&state, "viewer@example.com", Role::User).await?;

    let response = app(state)
        .oneshot(
            Request::get("/api/order/export?status=success")
                .header(header::AUTHORIZATION, token)
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/csv; charset=utf-8"
    );
    assert!(
        response.headers()[header::CONTENT_DISPOSITION]
            .to_str()?
            .contains("transactions.csv")
    );

    let body = to_bytes(response.into_body(), usize::MAX).await?;
    let csv = String::from_utf8(body.to_vec())?;
    let lines: Vec<&str> = csv.lines().collect();
    assert!(lines[0].starts_with("Sr.No,Institute Name"));
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("1,"));
    assert!(csv.contains("\"success\""));
    assert!(!csv.contains("\"failed\""));
    Ok(())
}

#[tokio::test]
async fn export_json_and_date_validation() -> anyhow::Result<()> {
    let state = common::setup_state("http://127.0.0.1:9").await?;
    seed(&state).await?;
    let token = common::bearer_token(&state, "viewer@example.com", Role::User).await?;
    let app = app(state);

    let response = app
        .clone()
        .oneshot(
            Request::get("/api/order/export?format=json&start_date=2000-01-01")
                .header(header::AUTHORIZATION, token.clone())
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await?;
    let json: serde_json::Value = serde_json::from_slice(&body)?;
    assert_eq!(json["data"]["count"], 4);

    let response = app
        .oneshot(
            Request::get("/api/order/export?start_date=2025-05-02&end_date=2025-05-01")
                .header(header::AUTHORIZATION, token)
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}
