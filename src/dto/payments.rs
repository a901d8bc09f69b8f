use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Order, StudentInfo};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePaymentRequest {
    #[serde(alias = "amount")]
    pub order_amount: f64,
    pub student_info: StudentInfo,
    /// Defaults to the configured school.
    pub school_id: Option<String>,
    pub gateway_name: Option<String>,
    pub callback_url: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreatePaymentResponse {
    pub custom_order_id: String,
    pub collect_id: Uuid,
    pub order: Order,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReviewAction {
    Approve,
    Reject,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AdminApproveRequest {
    pub action: ReviewAction,
    pub reason: Option<String>,
    pub callback_url: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct AutoApproveRequest {
    pub callback_url: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApprovalResponse {
    pub order: Order,
    pub collect_request_id: Option<String>,
    pub payment_url: Option<String>,
}
