use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Order, PaymentState, Transaction};

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}

/// Manually entered transaction, recorded as already approved.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RawDataRequest {
    pub institute_name: Option<String>,
    pub student_name: String,
    pub student_id: String,
    pub student_email: String,
    pub order_amount: f64,
    pub transaction_amount: Option<f64>,
    pub payment_method: Option<String>,
    pub status: Option<PaymentState>,
    pub gateway: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RawDataResponse {
    pub custom_order_id: String,
    pub collect_request_id: Uuid,
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DummyTransaction {
    pub custom_order_id: String,
    pub amount: f64,
    pub status: String,
    pub institute: String,
    pub student: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DummyDataResponse {
    pub created: Vec<DummyTransaction>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ExportList {
    pub items: Vec<Transaction>,
    pub count: usize,
}
