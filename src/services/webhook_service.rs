use chrono::{DateTime, Utc};
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    dto::webhooks::{OrderInfo, WebhookAck, WebhookLogList, WebhookPayload},
    entity::{
        order_statuses::{
            ActiveModel as OrderStatusActive, Column as StatusCol, Entity as OrderStatuses,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        webhook_logs::{ActiveModel as WebhookLogActive, Column as LogCol, Entity as WebhookLogs},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{OrderState, PaymentState, WebhookLog},
    response::{ApiResponse, Meta},
    routes::params::{Pagination, WebhookLogQuery},
    services::payment_service::{NOT_AVAILABLE, initial_status},
    state::AppState,
};

const UNKNOWN_ORDER: &str = "unknown";
const LOG_PAGE_SIZE: i64 = 20;

enum Outcome {
    Processed,
    Ignored(String),
}

/// Record a gateway callback and apply it.
///
/// The raw payload is logged before anything else so that a callback that
/// fails validation or processing can still be inspected later. Callbacks that
/// cannot be matched to an order that accepts payment updates are acknowledged
/// with `processed = false`; the gateway must not be told to retry those.
pub async fn handle_webhook(
    state: &AppState,
    raw: Value,
    source_ip: Option<String>,
) -> AppResult<ApiResponse<WebhookAck>> {
    let parsed = serde_json::from_value::<WebhookPayload>(raw.clone());
    // Read from the raw body so a payload with a mistyped field is still
    // logged against its order.
    let order_id = raw
        .pointer("/order_info/order_id")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string);
    let status_code = raw
        .get("status")
        .and_then(Value::as_i64)
        .and_then(|code| i32::try_from(code).ok())
        .unwrap_or_default();

    let log_id = insert_log(
        state,
        order_id.as_deref().unwrap_or(UNKNOWN_ORDER),
        raw,
        status_code,
        source_ip,
    )
    .await?;

    let payload = match parsed {
        Ok(payload) => payload,
        Err(err) => {
            let message = format!("Malformed webhook payload: {err}");
            finish_log(state, log_id, false, Some(message.clone())).await;
            return Err(AppError::BadRequest(message));
        }
    };

    let (Some(order_id), Some(info)) = (order_id, payload.order_info) else {
        tracing::info!(%log_id, "webhook without order info ignored");
        finish_log(state, log_id, false, Some("Missing order_info.order_id".into())).await;
        return Ok(ack(false, None, Some("missing order_info.order_id".into())));
    };

    let payment: PaymentState = match info.status.as_deref().map(str::trim) {
        Some(raw_status) if !raw_status.is_empty() => match raw_status.parse() {
            Ok(payment) => payment,
            Err(err) => {
                finish_log(state, log_id, false, Some(err.to_string())).await;
                return Err(err);
            }
        },
        _ => PaymentState::Pending,
    };

    let txn = state.orm.begin().await?;
    match apply_update(&txn, &order_id, payment, &info).await {
        Ok(Outcome::Processed) => {
            txn.commit().await?;
            finish_log(state, log_id, true, None).await;
            tracing::info!(%log_id, %order_id, status = payment.as_str(), "webhook processed");
            Ok(ack(true, Some(order_id), None))
        }
        Ok(Outcome::Ignored(reason)) => {
            txn.rollback().await?;
            tracing::info!(%log_id, %order_id, %reason, "webhook ignored");
            finish_log(state, log_id, false, Some(reason.clone())).await;
            Ok(ack(false, Some(order_id), Some(reason)))
        }
        Err(err) => {
            if let Err(rollback_err) = txn.rollback().await {
                tracing::warn!(error = %rollback_err, "webhook rollback failed");
            }
            tracing::error!(%log_id, %order_id, error = %err, "webhook processing failed");
            finish_log(state, log_id, false, Some(err.to_string())).await;
            Err(err)
        }
    }
}

pub async fn list_logs(
    state: &AppState,
    user: &AuthUser,
    query: WebhookLogQuery,
) -> AppResult<ApiResponse<WebhookLogList>> {
    ensure_admin(user)?;
    let (page, per_page, offset) = Pagination {
        page: query.page,
        per_page: Some(query.per_page.unwrap_or(LOG_PAGE_SIZE)),
    }
    .normalize();

    let mut finder = WebhookLogs::find().order_by_desc(LogCol::CreatedAt);
    if let Some(processed) = query.processed {
        finder = finder.filter(LogCol::Processed.eq(processed));
    }

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(per_page as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(WebhookLog::from)
        .collect();

    Ok(ApiResponse::success(
        "Webhook logs",
        WebhookLogList { items },
        Some(Meta::new(page, per_page, total)),
    ))
}

async fn apply_update(
    txn: &DatabaseTransaction,
    order_id: &str,
    payment: PaymentState,
    info: &OrderInfo,
) -> AppResult<Outcome> {
    let Some(order) = find_order(txn, order_id).await? else {
        return Ok(Outcome::Ignored(format!("Order {order_id} not found")));
    };

    let current: OrderState = order.status.parse()?;
    if !current.accepts_payment_updates() {
        return Ok(Outcome::Ignored(format!(
            "Order in state {current} does not accept payment updates"
        )));
    }
    let next = match current.apply_payment(payment) {
        Ok(next) => next,
        Err(AppError::Conflict(reason)) => return Ok(Outcome::Ignored(reason)),
        Err(err) => return Err(err),
    };

    upsert_status(txn, &order, payment, info).await?;

    if next != current {
        let mut active: OrderActive = order.into();
        active.status = Set(next.as_str().to_string());
        active.updated_at = Set(Utc::now().into());
        active.update(txn).await?;
    }

    Ok(Outcome::Processed)
}

/// Match on the merchant order id first, then on the order's own id.
async fn find_order<C: ConnectionTrait>(db: &C, order_id: &str) -> AppResult<Option<OrderModel>> {
    let by_custom_id = Orders::find()
        .filter(OrderCol::CustomOrderId.eq(order_id))
        .lock(LockType::Update)
        .one(db)
        .await?;
    if by_custom_id.is_some() {
        return Ok(by_custom_id);
    }

    match Uuid::parse_str(order_id) {
        Ok(id) => Ok(Orders::find_by_id(id).lock(LockType::Update).one(db).await?),
        Err(_) => Ok(None),
    }
}

async fn upsert_status(
    txn: &DatabaseTransaction,
    order: &OrderModel,
    payment: PaymentState,
    info: &OrderInfo,
) -> AppResult<()> {
    let order_amount = info
        .order_amount
        .filter(|a| a.is_finite())
        .unwrap_or(order.order_amount);
    let transaction_amount = info
        .transaction_amount
        .filter(|a| a.is_finite())
        .unwrap_or(order_amount);
    let payment_time = info
        .payment_time
        .as_deref()
        .and_then(|t| DateTime::parse_from_rfc3339(t.trim()).ok())
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);

    let existing = OrderStatuses::find()
        .filter(StatusCol::CollectId.eq(order.id))
        .one(txn)
        .await?;

    let (mut active, is_new): (OrderStatusActive, bool) = match existing {
        Some(model) => (model.into(), false),
        None => (initial_status(order.id, order_amount, transaction_amount), true),
    };
    active.order_amount = Set(order_amount);
    active.transaction_amount = Set(transaction_amount);
    active.payment_mode = Set(or_na(info.payment_mode.as_deref()));
    active.payment_details = Set(or_na(info.payment_details.as_deref()));
    active.bank_reference = Set(or_na(info.bank_reference.as_deref()));
    active.payment_message = Set(or_na(info.payment_message.as_deref()));
    active.error_message = Set(or_na(info.error_message.as_deref()));
    active.status = Set(payment.as_str().to_string());
    active.payment_time = Set(Some(payment_time.into()));
    active.updated_at = Set(Utc::now().into());

    if is_new {
        active.insert(txn).await?;
    } else {
        active.update(txn).await?;
    }
    Ok(())
}

async fn insert_log(
    state: &AppState,
    order_id: &str,
    payload: Value,
    status_code: i32,
    source_ip: Option<String>,
) -> AppResult<Uuid> {
    let now = Utc::now();
    let log = WebhookLogActive {
        id: Set(Uuid::new_v4()),
        order_id: Set(order_id.to_string()),
        payload: Set(payload),
        status_code: Set(status_code),
        processed: Set(false),
        error_message: Set(None),
        source_ip: Set(source_ip),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;
    Ok(log.id)
}

async fn finish_log(state: &AppState, log_id: Uuid, processed: bool, error: Option<String>) {
    let update = WebhookLogActive {
        id: Set(log_id),
        processed: Set(processed),
        error_message: Set(error),
        updated_at: Set(Utc::now().into()),
        ..Default::default()
    };
    if let Err(err) = update.update(&state.orm).await {
        tracing::warn!(%log_id, error = %err, "failed to update webhook log");
    }
}

fn ack(processed: bool, order_id: Option<String>, reason: Option<String>) -> ApiResponse<WebhookAck> {
    let message = if processed {
        "Webhook processed"
    } else {
        "Webhook received"
    };
    ApiResponse::success(
        message,
        WebhookAck {
            processed,
            order_id,
            reason,
        },
        Some(Meta::empty()),
    )
}

fn or_na(value: Option<&str>) -> String {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(NOT_AVAILABLE)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_fields_become_na() {
        assert_eq!(or_na(None), "NA");
        assert_eq!(or_na(Some("  ")), "NA");
        assert_eq!(or_na(Some("upi")), "upi");
    }

    #[test]
    fn payload_accepts_gateway_spellings() {
        let payload: WebhookPayload = serde_json::from_value(serde_json::json!({
            "status": 200,
            "order_info": {
                "order_id": "EDV1713000000000001",
                "order_amount": 2000,
                "transaction_amount": 2200,
                "status": "success",
                "payemnt_details": "success@ybl",
                "Payment_message": "payment success"
            }
        }))
        .unwrap();
        let info = payload.order_info.unwrap();
        assert_eq!(info.payment_details.as_deref(), Some("success@ybl"));
        assert_eq!(info.payment_message.as_deref(), Some("payment success"));
        assert_eq!(info.transaction_amount, Some(2200.0));
    }

    #[test]
    fn amounts_accept_numeric_strings() {
        let info: OrderInfo = serde_json::from_value(serde_json::json!({
            "order_id": "EDV1",
            "order_amount": "100",
            "transaction_amount": " 102.5 "
        }))
        .unwrap();
        assert_eq!(info.order_amount, Some(100.0));
        assert_eq!(info.transaction_amount, Some(102.5));

        let bad = serde_json::from_value::<OrderInfo>(serde_json::json!({ "order_amount": "ten" }));
        assert!(bad.is_err());
    }
}
