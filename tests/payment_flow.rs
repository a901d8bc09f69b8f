mod common;

use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use school_payments_api::{
    dto::payments::{AdminApproveRequest, AutoApproveRequest, CreatePaymentRequest, ReviewAction},
    entity::{
        audit_logs::{Column as AuditCol, Entity as AuditLogs},
        order_statuses::{Column as StatusCol, Entity as OrderStatuses},
    },
    error::AppError,
    models::{Role, StudentInfo},
    services::{payment_service, transaction_service, webhook_service},
};
use serde_json::json;

fn payment_request(amount: f64) -> CreatePaymentRequest {
    CreatePaymentRequest {
        order_amount: amount,
        student_info: StudentInfo {
            name: "Rohan Sharma".into(),
            id: "STU001".into(),
            email: "rohan.sharma@example.com".into(),
        },
        school_id: None,
        gateway_name: None,
        callback_url: None,
    }
}

fn approve() -> AdminApproveRequest {
    AdminApproveRequest {
        action: ReviewAction::Approve,
        reason: None,
        callback_url: None,
    }
}

fn success_webhook(order_id: &str) -> serde_json::Value {
    json!({
        "status": 200,
        "order_info": {
            "order_id": order_id,
            "order_amount": 1500,
            "transaction_amount": 1520,
            "gateway": "PhonePe",
            "bank_reference": "YESBNK222",
            "status": "success",
            "payment_mode": "upi",
            "payemnt_details": "success@ybl",
            "Payment_message": "payment success",
            "payment_time": "2025-04-23T08:14:21.945+00:00",
            "error_message": "NA"
        }
    })
}

// create -> admin approve -> gateway collect -> webhook success, delivered twice.
#[tokio::test]
async fn approved_order_settles_through_webhook() -> anyhow::Result<()> {
    let gateway = common::spawn_gateway().await?;
    let state = common::setup_state(&gateway).await?;
    let user = common::create_account(&state, "user@example.com", Role::User).await?;
    let admin = common::create_account(&state, "admin@example.com", Role::Admin).await?;

    let created = payment_service::create_payment(&state, &user, payment_request(1500.0))
        .await?
        .data
        .expect("created order");
    assert_eq!(created.order.status, "pending_approval");
    assert_eq!(created.order.school_id, "EDV DEMO SCHOOL");
    assert_eq!(created.order.gateway_name, "Edviron");

    let approved = payment_service::admin_approve(&state, &admin, created.collect_id, approve())
        .await?
        .data
        .expect("approval");
    assert_eq!(approved.order.status, "pending");
    assert_eq!(
        approved.collect_request_id.as_deref(),
        Some("6808bc4888e4e3c149e757f1")
    );
    assert_eq!(
        approved.order.payment_url.as_deref(),
        Some("https://pay.example/collect/6808bc4888e4e3c149e757f1")
    );
    assert_eq!(approved.order.reviewed_by, Some(admin.user_id));

    let approval_audit = AuditLogs::find()
        .filter(AuditCol::Action.eq("order_approve"))
        .one(&state.orm)
        .await?
        .expect("approval audit row");
    assert_eq!(approval_audit.user_id, Some(admin.user_id));
    assert_eq!(
        approval_audit.metadata.expect("metadata")["reviewer"],
        json!("admin@example.com")
    );

    for _ in 0..2 {
        let ack = webhook_service::handle_webhook(
            &state,
            success_webhook(&created.custom_order_id),
            Some("203.0.113.7".into()),
        )
        .await?
        .data
        .expect("ack");
        assert!(ack.processed);
    }

    let status_rows = OrderStatuses::find()
        .filter(StatusCol::CollectId.eq(created.collect_id))
        .count(&state.orm)
        .await?;
    assert_eq!(status_rows, 1);

    let tx = transaction_service::transaction_status(&state, &created.custom_order_id)
        .await?
        .data
        .expect("transaction");
    assert_eq!(tx.status, "success");
    assert_eq!(tx.order_status, "success");
    assert_eq!(tx.transaction_amount, 1520.0);
    assert_eq!(tx.payment_mode, "upi");
    assert_eq!(tx.bank_reference, "YESBNK222");

    // success is terminal
    let mut failed = success_webhook(&created.custom_order_id);
    failed["order_info"]["status"] = json!("failed");
    let ack = webhook_service::handle_webhook(&state, failed, None)
        .await?
        .data
        .expect("ack");
    assert!(!ack.processed);

    let tx = transaction_service::transaction_status(&state, &created.custom_order_id)
        .await?
        .data
        .expect("transaction");
    assert_eq!(tx.status, "success");
    Ok(())
}

#[tokio::test]
async fn rejected_order_cannot_be_approved_or_paid() -> anyhow::Result<()> {
    let gateway = common::spawn_gateway().await?;
    let state = common::setup_state(&gateway).await?;
    let user = common::create_account(&state, "user@example.com", Role::User).await?;
    let admin = common::create_account(&state, "admin@example.com", Role::Admin).await?;

    let created = payment_service::create_payment(&state, &user, payment_request(2500.0))
        .await?
        .data
        .expect("created order");

    let rejected = payment_service::admin_approve(
        &state,
        &admin,
        created.collect_id,
        AdminApproveRequest {
            action: ReviewAction::Reject,
            reason: Some("duplicate fee".into()),
            callback_url: None,
        },
    )
    .await?
    .data
    .expect("rejection");
    assert_eq!(rejected.order.status, "rejected");
    assert_eq!(rejected.order.rejection_reason.as_deref(), Some("duplicate fee"));
    assert!(rejected.collect_request_id.is_none());

    let err = payment_service::admin_approve(&state, &admin, created.collect_id, approve())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let ack = webhook_service::handle_webhook(&state, success_webhook(&created.custom_order_id), None)
        .await?
        .data
        .expect("ack");
    assert!(!ack.processed);
    assert!(ack.reason.unwrap_or_default().contains("rejected"));
    Ok(())
}

#[tokio::test]
async fn only_admins_review_orders() -> anyhow::Result<()> {
    let gateway = common::spawn_gateway().await?;
    let state = common::setup_state(&gateway).await?;
    let user = common::create_account(&state, "user@example.com", Role::User).await?;

    let created = payment_service::create_payment(&state, &user, payment_request(1500.0))
        .await?
        .data
        .expect("created order");

    let err = payment_service::admin_approve(&state, &user, created.collect_id, approve())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));
    Ok(())
}

#[tokio::test]
async fn auto_approve_respects_owner_and_limit() -> anyhow::Result<()> {
    let gateway = common::spawn_gateway().await?;
    let state = common::setup_state(&gateway).await?;
    let owner = common::create_account(&state, "owner@example.com", Role::User).await?;
    let other = common::create_account(&state, "other@example.com", Role::User).await?;

    let small = payment_service::create_payment(&state, &owner, payment_request(10_000.0))
        .await?
        .data
        .expect("small order");
    let large = payment_service::create_payment(&state, &owner, payment_request(10_000.5))
        .await?
        .data
        .expect("large order");

    let err = payment_service::auto_approve(&state, &other, small.collect_id, AutoApproveRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    let err = payment_service::auto_approve(&state, &owner, large.collect_id, AutoApproveRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    let approved = payment_service::auto_approve(&state, &owner, small.collect_id, AutoApproveRequest::default())
        .await?
        .data
        .expect("approval");
    assert_eq!(approved.order.status, "pending");
    Ok(())
}

#[tokio::test]
async fn gateway_failure_keeps_order_approved() -> anyhow::Result<()> {
    let gateway = common::spawn_failing_gateway().await?;
    let state = common::setup_state(&gateway).await?;
    let user = common::create_account(&state, "user@example.com", Role::User).await?;
    let admin = common::create_account(&state, "admin@example.com", Role::Admin).await?;

    let created = payment_service::create_payment(&state, &user, payment_request(1500.0))
        .await?
        .data
        .expect("created order");

    let err = payment_service::admin_approve(&state, &admin, created.collect_id, approve())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Gateway(_)));

    let tx = transaction_service::transaction_status(&state, &created.custom_order_id)
        .await?
        .data
        .expect("transaction");
    assert_eq!(tx.order_status, "approved");
    assert_eq!(tx.status, "pending");

    // approving again retries the collect request instead of conflicting
    let err = payment_service::admin_approve(&state, &admin, created.collect_id, approve())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Gateway(_)));
    Ok(())
}

#[tokio::test]
async fn status_check_proxies_the_gateway() -> anyhow::Result<()> {
    let gateway = common::spawn_gateway().await?;
    let state = common::setup_state(&gateway).await?;

    let status = payment_service::check_status(&state, "6808bc4888e4e3c149e757f1")
        .await?
        .data
        .expect("status");
    assert_eq!(status.status, "SUCCESS");
    assert_eq!(status.amount, Some(1500.0));
    Ok(())
}
