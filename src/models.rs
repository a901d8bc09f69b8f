use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    entity::{
        order_statuses as order_status_entity, orders as order_entity,
        webhook_logs as webhook_log_entity,
    },
    error::{AppError, AppResult},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            other => Err(AppError::BadRequest(format!("Invalid role {other}"))),
        }
    }
}

/// Lifecycle of an order from creation to the final gateway outcome.
///
/// `pending_approval -> approved | rejected`, then `approved -> pending` once
/// the collect request exists, and `pending -> success | failed` from webhooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderState {
    PendingApproval,
    Approved,
    Rejected,
    Pending,
    Success,
    Failed,
}

impl OrderState {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderState::PendingApproval => "pending_approval",
            OrderState::Approved => "approved",
            OrderState::Rejected => "rejected",
            OrderState::Pending => "pending",
            OrderState::Success => "success",
            OrderState::Failed => "failed",
        }
    }

    /// Approving an already approved order is allowed so that a failed
    /// collect request can be retried.
    pub fn approve(self) -> AppResult<OrderState> {
        match self {
            OrderState::PendingApproval | OrderState::Approved => Ok(OrderState::Approved),
            other => Err(invalid_transition(other, OrderState::Approved)),
        }
    }

    pub fn reject(self) -> AppResult<OrderState> {
        match self {
            OrderState::PendingApproval => Ok(OrderState::Rejected),
            other => Err(invalid_transition(other, OrderState::Rejected)),
        }
    }

    pub fn start_collection(self) -> AppResult<OrderState> {
        match self {
            OrderState::Approved => Ok(OrderState::Pending),
            other => Err(invalid_transition(other, OrderState::Pending)),
        }
    }

    pub fn accepts_payment_updates(self) -> bool {
        matches!(
            self,
            OrderState::Approved | OrderState::Pending | OrderState::Success | OrderState::Failed
        )
    }

    /// Mirror a gateway payment outcome onto the order.
    pub fn apply_payment(self, payment: PaymentState) -> AppResult<OrderState> {
        let target = payment.into();
        match (self, payment) {
            (OrderState::Approved | OrderState::Pending | OrderState::Failed, _) => Ok(target),
            // success is terminal; only a re-delivery of the same outcome is accepted
            (OrderState::Success, PaymentState::Success) => Ok(OrderState::Success),
            (other, _) => Err(invalid_transition(other, target)),
        }
    }
}

fn invalid_transition(from: OrderState, to: OrderState) -> AppError {
    AppError::Conflict(format!("Order cannot move from {from} to {to}"))
}

impl fmt::Display for OrderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderState {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending_approval" => Ok(OrderState::PendingApproval),
            "approved" => Ok(OrderState::Approved),
            "rejected" => Ok(OrderState::Rejected),
            "pending" => Ok(OrderState::Pending),
            "success" => Ok(OrderState::Success),
            "failed" => Ok(OrderState::Failed),
            other => Err(AppError::BadRequest(format!("Invalid order status {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentState {
    Pending,
    Success,
    Failed,
}

impl PaymentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentState::Pending => "pending",
            PaymentState::Success => "success",
            PaymentState::Failed => "failed",
        }
    }
}

impl From<PaymentState> for OrderState {
    fn from(value: PaymentState) -> Self {
        match value {
            PaymentState::Pending => OrderState::Pending,
            PaymentState::Success => OrderState::Success,
            PaymentState::Failed => OrderState::Failed,
        }
    }
}

impl FromStr for PaymentState {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(PaymentState::Pending),
            "success" => Ok(PaymentState::Success),
            "failed" => Ok(PaymentState::Failed),
            _ => Err(AppError::BadRequest(format!("Invalid payment status {s}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StudentInfo {
    pub name: String,
    pub id: String,
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub school_id: String,
    pub trustee_id: String,
    pub student_info: StudentInfo,
    pub gateway_name: String,
    pub custom_order_id: String,
    pub order_amount: f64,
    pub status: String,
    pub created_by: Uuid,
    pub collect_request_id: Option<String>,
    pub payment_url: Option<String>,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderStatus {
    pub id: Uuid,
    pub collect_id: Uuid,
    pub order_amount: f64,
    pub transaction_amount: f64,
    pub payment_mode: String,
    pub payment_details: String,
    pub bank_reference: String,
    pub payment_message: String,
    pub status: String,
    pub error_message: String,
    pub payment_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WebhookLog {
    pub id: Uuid,
    pub order_id: String,
    pub payload: serde_json::Value,
    pub status_code: i32,
    pub processed: bool,
    pub error_message: Option<String>,
    pub source_ip: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// An order joined with its payment status, as shown on the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Transaction {
    pub collect_id: Uuid,
    pub school_id: String,
    pub gateway: String,
    pub order_amount: f64,
    pub transaction_amount: f64,
    /// Payment status reported by the gateway.
    pub status: String,
    /// Lifecycle status of the order itself.
    pub order_status: String,
    pub custom_order_id: String,
    pub student_info: StudentInfo,
    pub payment_mode: String,
    pub payment_time: Option<DateTime<Utc>>,
    pub bank_reference: String,
    pub payment_message: String,
    pub created_at: DateTime<Utc>,
}

impl From<order_entity::Model> for Order {
    fn from(model: order_entity::Model) -> Self {
        Order {
            id: model.id,
            school_id: model.school_id,
            trustee_id: model.trustee_id,
            student_info: StudentInfo {
                name: model.student_name,
                id: model.student_id,
                email: model.student_email,
            },
            gateway_name: model.gateway_name,
            custom_order_id: model.custom_order_id,
            order_amount: model.order_amount,
            status: model.status,
            created_by: model.created_by,
            collect_request_id: model.collect_request_id,
            payment_url: model.payment_url,
            reviewed_by: model.reviewed_by,
            reviewed_at: model.reviewed_at.map(|dt| dt.with_timezone(&Utc)),
            rejection_reason: model.rejection_reason,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<order_status_entity::Model> for OrderStatus {
    fn from(model: order_status_entity::Model) -> Self {
        OrderStatus {
            id: model.id,
            collect_id: model.collect_id,
            order_amount: model.order_amount,
            transaction_amount: model.transaction_amount,
            payment_mode: model.payment_mode,
            payment_details: model.payment_details,
            bank_reference: model.bank_reference,
            payment_message: model.payment_message,
            status: model.status,
            error_message: model.error_message,
            payment_time: model.payment_time.map(|dt| dt.with_timezone(&Utc)),
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<webhook_log_entity::Model> for WebhookLog {
    fn from(model: webhook_log_entity::Model) -> Self {
        WebhookLog {
            id: model.id,
            order_id: model.order_id,
            payload: model.payload,
            status_code: model.status_code,
            processed: model.processed,
            error_message: model.error_message,
            source_ip: model.source_ip,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl Transaction {
    /// Join an order with its status row. Orders without one report a pending
    /// payment for the full order amount.
    pub fn from_parts(
        order: order_entity::Model,
        status: Option<order_status_entity::Model>,
    ) -> Self {
        let not_available = || "NA".to_string();
        let (transaction_amount, payment_status, payment_mode, payment_time, bank_reference, payment_message) =
            match status {
                Some(s) => (
                    s.transaction_amount,
                    s.status,
                    s.payment_mode,
                    s.payment_time.map(|dt| dt.with_timezone(&Utc)),
                    s.bank_reference,
                    s.payment_message,
                ),
                None => (
                    order.order_amount,
                    PaymentState::Pending.as_str().to_string(),
                    not_available(),
                    None,
                    not_available(),
                    not_available(),
                ),
            };

        Transaction {
            collect_id: order.id,
            school_id: order.school_id,
            gateway: order.gateway_name,
            order_amount: order.order_amount,
            transaction_amount,
            status: payment_status,
            order_status: order.status,
            custom_order_id: order.custom_order_id,
            student_info: StudentInfo {
                name: order.student_name,
                id: order.student_id,
                email: order.student_email,
            },
            payment_mode,
            payment_time,
            bank_reference,
            payment_message,
            created_at: order.created_at.with_timezone(&Utc),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn review_only_from_pending_approval() {
        assert_eq!(OrderState::PendingApproval.approve().unwrap(), OrderState::Approved);
        assert_eq!(OrderState::PendingApproval.reject().unwrap(), OrderState::Rejected);
        assert!(OrderState::Rejected.approve().is_err());
        assert!(OrderState::Pending.reject().is_err());
        assert!(OrderState::Approved.reject().is_err());
    }

    #[test]
    fn approved_order_can_be_reapproved_to_retry_collection() {
        assert_eq!(OrderState::Approved.approve().unwrap(), OrderState::Approved);
        assert_eq!(OrderState::Approved.start_collection().unwrap(), OrderState::Pending);
        assert!(OrderState::PendingApproval.start_collection().is_err());
    }

    #[test]
    fn webhook_outcomes_follow_the_lifecycle() {
        assert_eq!(
            OrderState::Pending.apply_payment(PaymentState::Success).unwrap(),
            OrderState::Success
        );
        assert_eq!(
            OrderState::Failed.apply_payment(PaymentState::Success).unwrap(),
            OrderState::Success
        );
        assert_eq!(
            OrderState::Success.apply_payment(PaymentState::Success).unwrap(),
            OrderState::Success
        );
        assert!(OrderState::Success.apply_payment(PaymentState::Failed).is_err());
        assert!(!OrderState::PendingApproval.accepts_payment_updates());
        assert!(!OrderState::Rejected.accepts_payment_updates());
    }

    #[test]
    fn payment_state_parsing_is_case_insensitive() {
        assert_eq!("SUCCESS".parse::<PaymentState>().unwrap(), PaymentState::Success);
        assert!("refunded".parse::<PaymentState>().is_err());
        assert_eq!(
            "pending_approval".parse::<OrderState>().unwrap(),
            OrderState::PendingApproval
        );
    }
}
