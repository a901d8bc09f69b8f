use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

pub const MAX_PER_PAGE: i64 = 100;

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
pub struct Pagination {
    pub page: Option<i64>,
    #[serde(alias = "limit")]
    pub per_page: Option<i64>,
}

impl Pagination {
    pub fn normalize(&self) -> (i64, i64, i64) {
        let per_page = self.per_page.unwrap_or(10).clamp(1, MAX_PER_PAGE);
        let page = self.page.unwrap_or(1).clamp(1, i64::MAX / MAX_PER_PAGE);
        let offset = (page - 1).saturating_mul(per_page);
        (page, per_page, offset)
    }
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TransactionSortBy {
    #[serde(alias = "createdAt")]
    CreatedAt,
    OrderAmount,
    TransactionAmount,
    CustomOrderId,
    SchoolId,
    Status,
    PaymentTime,
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
pub struct TransactionQuery {
    pub page: Option<i64>,
    #[serde(alias = "per_page")]
    pub limit: Option<i64>,
    /// Payment status; `all` disables the filter.
    pub status: Option<String>,
    pub school_id: Option<String>,
    pub sort: Option<TransactionSortBy>,
    pub order: Option<SortOrder>,
}

impl TransactionQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.limit,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
pub struct ExportQuery {
    pub format: Option<ExportFormat>,
    pub status: Option<String>,
    /// `YYYY-MM-DD` or RFC 3339.
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
pub struct WebhookLogQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub processed: Option<bool>,
}
