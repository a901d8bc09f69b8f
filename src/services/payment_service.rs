use chrono::Utc;
use rand::Rng;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbErr, EntityTrait, QueryFilter, QuerySelect, Set, SqlErr,
    TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::payments::{
        AdminApproveRequest, ApprovalResponse, AutoApproveRequest, CreatePaymentRequest,
        CreatePaymentResponse, ReviewAction,
    },
    entity::{
        order_statuses::ActiveModel as OrderStatusActive,
        orders::{
            ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel,
        },
    },
    error::{AppError, AppResult},
    gateway::CollectRequestStatus,
    middleware::auth::{AuthUser, ensure_admin},
    models::{Order, OrderState, PaymentState, StudentInfo},
    response::{ApiResponse, Meta},
    state::AppState,
};

pub const DEFAULT_GATEWAY: &str = "Edviron";
pub const NOT_AVAILABLE: &str = "NA";
/// Generated order ids can collide within one millisecond.
pub const ORDER_ID_ATTEMPTS: u32 = 3;

pub async fn create_payment(
    state: &AppState,
    user: &AuthUser,
    payload: CreatePaymentRequest,
) -> AppResult<ApiResponse<CreatePaymentResponse>> {
    validate_amount(payload.order_amount)?;
    validate_student(&payload.student_info)?;

    let school_id = payload
        .school_id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(&state.config.school_id)
        .to_string();
    let gateway_name = payload
        .gateway_name
        .as_deref()
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .unwrap_or(DEFAULT_GATEWAY)
        .to_string();

    let mut attempt = 1;
    let order = loop {
        let custom_order_id = new_custom_order_id(rand::thread_rng().gen_range(0..1000));
        let inserted = insert_pending_order(
            state,
            user,
            &payload,
            &school_id,
            &gateway_name,
            custom_order_id,
        )
        .await;
        match inserted {
            Err(AppError::Conflict(_)) if attempt < ORDER_ID_ATTEMPTS => attempt += 1,
            other => break other?,
        }
    };
    let custom_order_id = order.custom_order_id.clone();

    tracing::info!(order_id = %order.id, custom_order_id = %order.custom_order_id, "payment order created");
    audit::record(
        &state.orm,
        Some(user.user_id),
        "payment_create",
        "orders",
        serde_json::json!({
            "order_id": order.id,
            "custom_order_id": order.custom_order_id,
            "created_by": user.email,
        }),
    )
    .await;

    Ok(ApiResponse::success(
        "Payment order created, awaiting approval",
        CreatePaymentResponse {
            custom_order_id,
            collect_id: order.id,
            order: Order::from(order),
        },
        Some(Meta::empty()),
    ))
}

async fn insert_pending_order(
    state: &AppState,
    user: &AuthUser,
    payload: &CreatePaymentRequest,
    school_id: &str,
    gateway_name: &str,
    custom_order_id: String,
) -> AppResult<OrderModel> {
    let now = Utc::now();
    let txn = state.orm.begin().await?;
    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        school_id: Set(school_id.to_string()),
        trustee_id: Set(user.user_id.to_string()),
        student_name: Set(payload.student_info.name.trim().to_string()),
        student_id: Set(payload.student_info.id.trim().to_string()),
        student_email: Set(payload.student_info.email.trim().to_string()),
        gateway_name: Set(gateway_name.to_string()),
        custom_order_id: Set(custom_order_id),
        order_amount: Set(payload.order_amount),
        status: Set(OrderState::PendingApproval.as_str().to_string()),
        created_by: Set(user.user_id),
        collect_request_id: Set(None),
        payment_url: Set(None),
        reviewed_by: Set(None),
        reviewed_at: Set(None),
        rejection_reason: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await;
    let order = match order {
        Ok(order) => order,
        Err(err) => {
            txn.rollback().await?;
            return Err(unique_violation_as_conflict(err));
        }
    };

    initial_status(order.id, payload.order_amount, payload.order_amount)
        .insert(&txn)
        .await?;
    txn.commit().await?;
    Ok(order)
}

pub async fn admin_approve(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: AdminApproveRequest,
) -> AppResult<ApiResponse<ApprovalResponse>> {
    ensure_admin(user)?;
    match payload.action {
        ReviewAction::Approve => {
            approve_and_collect(state, user, id, payload.callback_url, "order_approve").await
        }
        ReviewAction::Reject => reject(state, user, id, payload.reason).await,
    }
}

/// Approve without review when the requester owns the order (or is an admin)
/// and the amount is within the configured limit.
pub async fn auto_approve(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: AutoApproveRequest,
) -> AppResult<ApiResponse<ApprovalResponse>> {
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    if !user.is_admin() && order.created_by != user.user_id {
        return Err(AppError::Forbidden);
    }
    if order.order_amount > state.config.auto_approve_limit {
        tracing::info!(
            order_id = %order.id,
            amount = order.order_amount,
            limit = state.config.auto_approve_limit,
            "auto-approve refused, amount above limit"
        );
        return Err(AppError::Forbidden);
    }

    approve_and_collect(state, user, id, payload.callback_url, "order_auto_approve").await
}

pub async fn check_status(
    state: &AppState,
    collect_request_id: &str,
) -> AppResult<ApiResponse<CollectRequestStatus>> {
    if collect_request_id.trim().is_empty() {
        return Err(AppError::BadRequest("collect request id is required".into()));
    }
    let status = state
        .gateway
        .collect_request_status(collect_request_id)
        .await?;
    Ok(ApiResponse::success(
        "Payment status",
        status,
        Some(Meta::empty()),
    ))
}

async fn approve_and_collect(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    callback_url: Option<String>,
    action: &str,
) -> AppResult<ApiResponse<ApprovalResponse>> {
    let txn = state.orm.begin().await?;
    let order = Orders::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let current: OrderState = order.status.parse()?;
    let next = current.approve()?;

    let amount = order.order_amount;
    let order = if current == OrderState::PendingApproval {
        let mut active: OrderActive = order.into();
        active.status = Set(next.as_str().to_string());
        active.reviewed_by = Set(Some(user.user_id));
        active.reviewed_at = Set(Some(Utc::now().into()));
        active.updated_at = Set(Utc::now().into());
        active.update(&txn).await?
    } else {
        order
    };
    txn.commit().await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        action,
        "orders",
        serde_json::json!({ "order_id": order.id, "reviewer": user.email }),
    )
    .await;

    let callback_url = callback_url
        .filter(|url| !url.trim().is_empty())
        .unwrap_or_else(|| state.config.callback_url());

    // The order stays approved when the gateway call fails so it can be retried.
    let collect = match state
        .gateway
        .create_collect_request(amount, &callback_url)
        .await
    {
        Ok(collect) => collect,
        Err(err) => {
            tracing::warn!(order_id = %order.id, error = %err, "collect request failed");
            audit::record(
                &state.orm,
                Some(user.user_id),
                "payment_collect_failed",
                "orders",
                serde_json::json!({ "order_id": order.id, "error": err.to_string() }),
            )
            .await;
            return Err(err);
        }
    };

    let pending = OrderState::Approved.start_collection()?;
    Orders::update_many()
        .col_expr(
            OrderCol::CollectRequestId,
            Expr::value(Some(collect.collect_request_id.clone())),
        )
        .col_expr(OrderCol::PaymentUrl, Expr::value(Some(collect.payment_url.clone())))
        .col_expr(OrderCol::UpdatedAt, Expr::value(DateTimeWithTimeZone::from(Utc::now())))
        .filter(OrderCol::Id.eq(order.id))
        .exec(&state.orm)
        .await?;
    // A webhook may already have moved the order past `approved`.
    Orders::update_many()
        .col_expr(OrderCol::Status, Expr::value(pending.as_str()))
        .filter(OrderCol::Id.eq(order.id))
        .filter(OrderCol::Status.eq(OrderState::Approved.as_str()))
        .exec(&state.orm)
        .await?;

    let order = Orders::find_by_id(order.id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    tracing::info!(
        order_id = %order.id,
        collect_request_id = %collect.collect_request_id,
        "collect request created"
    );

    Ok(ApiResponse::success(
        "Order approved",
        ApprovalResponse {
            order: Order::from(order),
            collect_request_id: Some(collect.collect_request_id),
            payment_url: Some(collect.payment_url),
        },
        Some(Meta::empty()),
    ))
}

async fn reject(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    reason: Option<String>,
) -> AppResult<ApiResponse<ApprovalResponse>> {
    let txn = state.orm.begin().await?;
    let order = Orders::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let next = order.status.parse::<OrderState>()?.reject()?;

    let mut active: OrderActive = order.into();
    active.status = Set(next.as_str().to_string());
    active.reviewed_by = Set(Some(user.user_id));
    active.reviewed_at = Set(Some(Utc::now().into()));
    active.rejection_reason = Set(reason.filter(|r| !r.trim().is_empty()));
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;
    txn.commit().await?;

    tracing::info!(order_id = %order.id, "order rejected");
    audit::record(
        &state.orm,
        Some(user.user_id),
        "order_reject",
        "orders",
        serde_json::json!({ "order_id": order.id, "reason": order.rejection_reason }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order rejected",
        ApprovalResponse {
            order: Order::from(order),
            collect_request_id: None,
            payment_url: None,
        },
        Some(Meta::empty()),
    ))
}

/// `EDV<unix millis><3-digit suffix>`, matching the gateway's order id format.
pub fn new_custom_order_id(suffix: u32) -> String {
    format!("EDV{}{:03}", Utc::now().timestamp_millis(), suffix % 1000)
}

pub fn initial_status(collect_id: Uuid, order_amount: f64, transaction_amount: f64) -> OrderStatusActive {
    let now = Utc::now();
    OrderStatusActive {
        id: Set(Uuid::new_v4()),
        collect_id: Set(collect_id),
        order_amount: Set(order_amount),
        transaction_amount: Set(transaction_amount),
        payment_mode: Set(NOT_AVAILABLE.to_string()),
        payment_details: Set(NOT_AVAILABLE.to_string()),
        bank_reference: Set(NOT_AVAILABLE.to_string()),
        payment_message: Set(NOT_AVAILABLE.to_string()),
        status: Set(PaymentState::Pending.as_str().to_string()),
        error_message: Set(NOT_AVAILABLE.to_string()),
        payment_time: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
}

pub fn validate_amount(amount: f64) -> AppResult<()> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(AppError::BadRequest("Amount must be a positive number".into()));
    }
    Ok(())
}

pub fn validate_student(student: &StudentInfo) -> AppResult<()> {
    if student.name.trim().is_empty() || student.id.trim().is_empty() {
        return Err(AppError::BadRequest("Student name and id are required".into()));
    }
    if !student.email.contains('@') {
        return Err(AppError::BadRequest("Invalid student email".into()));
    }
    Ok(())
}

pub fn unique_violation_as_conflict(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("custom_order_id already exists".into())
        }
        _ => AppError::OrmError(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_order_ids_are_prefixed_and_padded() {
        let id = new_custom_order_id(7);
        assert!(id.starts_with("EDV"));
        assert!(id.ends_with("007"));
        assert!(id[3..].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn amounts_must_be_positive_and_finite() {
        assert!(validate_amount(1500.0).is_ok());
        assert!(validate_amount(0.0).is_err());
        assert!(validate_amount(-5.0).is_err());
        assert!(validate_amount(f64::NAN).is_err());
    }
}
