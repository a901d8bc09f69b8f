#![allow(dead_code)]

use axum::{
    Json, Router,
    extract::Path,
    http::StatusCode,
    routing::{get, post},
};
use school_payments_api::{
    config::{AppConfig, IN_MEMORY_DATABASE_URL},
    db::{create_orm_conn, run_migrations},
    middleware::auth::AuthUser,
    models::Role,
    services::auth_service::{create_user, issue_token},
    state::AppState,
};
use serde_json::json;

pub fn test_config(gateway_url: &str) -> AppConfig {
    AppConfig {
        database_url: None,
        host: "127.0.0.1".into(),
        port: 0,
        jwt_secret: "test-secret".into(),
        jwt_expires_hours: 1,
        payment_api_url: gateway_url.to_string(),
        payment_api_key: "test-api-key".into(),
        pg_key: "test-pg-key".into(),
        school_id: "EDV DEMO SCHOOL".into(),
        frontend_url: "http://localhost:3000".into(),
        cors_origins: vec!["http://localhost:3000".into()],
        auto_approve_limit: 10_000.0,
        gateway_timeout_secs: 5,
    }
}

/// Fresh in-memory database per call.
pub async fn setup_state(gateway_url: &str) -> anyhow::Result<AppState> {
    let orm = create_orm_conn(IN_MEMORY_DATABASE_URL).await?;
    run_migrations(&orm).await?;
    AppState::new(orm, test_config(gateway_url))
}

pub async fn create_account(state: &AppState, email: &str, role: Role) -> anyhow::Result<AuthUser> {
    let user = create_user(&state.orm, email, "secret123", "Test Account", role).await?;
    Ok(AuthUser {
        user_id: user.id,
        email: user.email,
        role,
    })
}

pub async fn bearer_token(state: &AppState, email: &str, role: Role) -> anyhow::Result<String> {
    let user = create_user(&state.orm, email, "secret123", "Test Account", role).await?;
    let token = issue_token(&state.config, &user)?;
    Ok(format!("Bearer {token}"))
}

/// Gateway stand-in answering collect requests and status checks.
pub async fn spawn_gateway() -> anyhow::Result<String> {
    let app = Router::new()
        .route(
            "/create-collect-request",
            post(|| async {
                Json(json!({
                    "collect_request_id": "6808bc4888e4e3c149e757f1",
                    "Collect_request_url": "https://pay.example/collect/6808bc4888e4e3c149e757f1",
                    "sign": "ignored"
                }))
            }),
        )
        .route(
            "/collect-request/{id}",
            get(|Path(id): Path<String>| async move {
                Json(json!({
                    "status": "SUCCESS",
                    "amount": 1500.0,
                    "details": { "collect_request_id": id }
                }))
            }),
        );
    serve(app).await
}

/// Gateway stand-in that fails every call.
pub async fn spawn_failing_gateway() -> anyhow::Result<String> {
    let app = Router::new().route(
        "/create-collect-request",
        post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "maintenance") }),
    );
    serve(app).await
}

async fn serve(app: Router) -> anyhow::Result<String> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{addr}"))
}
