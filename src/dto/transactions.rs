use serde::Serialize;
use utoipa::ToSchema;

use crate::models::Transaction;

#[derive(Debug, Serialize, ToSchema)]
pub struct TransactionList {
    pub items: Vec<Transaction>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SchoolTransactionList {
    pub school_id: String,
    pub items: Vec<Transaction>,
}
