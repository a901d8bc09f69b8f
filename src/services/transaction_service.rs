use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, Order, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Select, SelectTwo,
};

use crate::{
    dto::transactions::{SchoolTransactionList, TransactionList},
    entity::{
        order_statuses::{Column as StatusCol, Entity as OrderStatuses},
        orders::{Column as OrderCol, Entity as Orders},
    },
    error::{AppError, AppResult},
    models::{PaymentState, Transaction},
    response::{ApiResponse, Meta},
    routes::params::{Pagination, SortOrder, TransactionQuery, TransactionSortBy},
    state::AppState,
};

#[derive(Debug, Default, Clone)]
pub struct TransactionFilter {
    pub status: Option<PaymentState>,
    pub school_id: Option<String>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
}

impl TransactionFilter {
    fn condition(&self) -> Condition {
        let mut condition = Condition::all();
        if let Some(status) = self.status {
            condition = condition.add(StatusCol::Status.eq(status.as_str()));
        }
        if let Some(school_id) = &self.school_id {
            condition = condition.add(OrderCol::SchoolId.eq(school_id.as_str()));
        }
        if let Some(from) = self.created_from {
            condition = condition.add(OrderCol::CreatedAt.gte(DateTimeWithTimeZone::from(from)));
        }
        if let Some(to) = self.created_to {
            condition = condition.add(OrderCol::CreatedAt.lte(DateTimeWithTimeZone::from(to)));
        }
        condition
    }
}

pub async fn list_transactions(
    state: &AppState,
    query: TransactionQuery,
) -> AppResult<ApiResponse<TransactionList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let filter = TransactionFilter {
        status: parse_status_filter(query.status.as_deref())?,
        school_id: query.school_id.filter(|s| !s.is_empty()),
        ..Default::default()
    };

    let total = count(state, &filter).await?;
    let select = sorted(
        joined().filter(filter.condition()),
        query.sort.unwrap_or(TransactionSortBy::CreatedAt),
        query.order.unwrap_or(SortOrder::Desc),
    );
    let items = select
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|(order, status)| Transaction::from_parts(order, status))
        .collect();

    Ok(ApiResponse::success(
        "Transactions",
        TransactionList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn list_by_school(
    state: &AppState,
    school_id: String,
    pagination: Pagination,
) -> AppResult<ApiResponse<SchoolTransactionList>> {
    let (page, limit, offset) = pagination.normalize();
    let filter = TransactionFilter {
        school_id: Some(school_id.clone()),
        ..Default::default()
    };

    let total = count(state, &filter).await?;
    let items = sorted(
        joined().filter(filter.condition()),
        TransactionSortBy::CreatedAt,
        SortOrder::Desc,
    )
    .limit(limit as u64)
    .offset(offset as u64)
    .all(&state.orm)
    .await?
    .into_iter()
    .map(|(order, status)| Transaction::from_parts(order, status))
    .collect();

    Ok(ApiResponse::success(
        "School transactions",
        SchoolTransactionList { school_id, items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn transaction_status(
    state: &AppState,
    custom_order_id: &str,
) -> AppResult<ApiResponse<Transaction>> {
    let (order, status) = joined()
        .filter(OrderCol::CustomOrderId.eq(custom_order_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(ApiResponse::success(
        "Transaction status",
        Transaction::from_parts(order, status),
        Some(Meta::empty()),
    ))
}

/// Every transaction matching `filter`, newest first.
pub async fn all_matching(
    state: &AppState,
    filter: &TransactionFilter,
) -> AppResult<Vec<Transaction>> {
    let rows = sorted(
        joined().filter(filter.condition()),
        TransactionSortBy::CreatedAt,
        SortOrder::Desc,
    )
    .all(&state.orm)
    .await?;
    Ok(rows
        .into_iter()
        .map(|(order, status)| Transaction::from_parts(order, status))
        .collect())
}

/// `None` or `all` disables the status filter.
pub fn parse_status_filter(raw: Option<&str>) -> AppResult<Option<PaymentState>> {
    match raw.map(str::trim) {
        None | Some("") | Some("all") => Ok(None),
        Some(status) => status.parse().map(Some),
    }
}

/// Accepts `YYYY-MM-DD` (start or end of that day) or an RFC 3339 timestamp.
pub fn parse_date_bound(raw: &str, end_of_day: bool) -> AppResult<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest(format!("Invalid date {raw}")))?;
    let time = if end_of_day {
        NaiveTime::from_hms_milli_opt(23, 59, 59, 999)
    } else {
        NaiveTime::from_hms_opt(0, 0, 0)
    }
    .ok_or_else(|| AppError::Internal(anyhow::anyhow!("invalid time of day")))?;
    Ok(date.and_time(time).and_utc())
}

fn joined() -> SelectTwo<Orders, OrderStatuses> {
    Orders::find().find_also_related(OrderStatuses)
}

fn counted() -> Select<Orders> {
    Orders::find().left_join(OrderStatuses)
}

async fn count(state: &AppState, filter: &TransactionFilter) -> AppResult<i64> {
    let total = counted()
        .filter(filter.condition())
        .count(&state.orm)
        .await?;
    Ok(total as i64)
}

fn sorted(
    select: SelectTwo<Orders, OrderStatuses>,
    sort_by: TransactionSortBy,
    sort_order: SortOrder,
) -> SelectTwo<Orders, OrderStatuses> {
    let ord = match sort_order {
        SortOrder::Asc => Order::Asc,
        SortOrder::Desc => Order::Desc,
    };
    let select = match sort_by {
        TransactionSortBy::CreatedAt => select.order_by(OrderCol::CreatedAt, ord),
        TransactionSortBy::OrderAmount => select.order_by(OrderCol::OrderAmount, ord),
        TransactionSortBy::CustomOrderId => select.order_by(OrderCol::CustomOrderId, ord),
        TransactionSortBy::SchoolId => select.order_by(OrderCol::SchoolId, ord),
        TransactionSortBy::TransactionAmount => {
            select.order_by(StatusCol::TransactionAmount, ord)
        }
        TransactionSortBy::Status => select.order_by(StatusCol::Status, ord),
        TransactionSortBy::PaymentTime => select.order_by(StatusCol::PaymentTime, ord),
    };
    // stable pages when the sort key ties
    select.order_by_asc(OrderCol::CustomOrderId)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn status_filter_treats_all_as_unfiltered() {
        assert_eq!(parse_status_filter(Some("all")).unwrap(), None);
        assert_eq!(parse_status_filter(None).unwrap(), None);
        assert_eq!(
            parse_status_filter(Some("failed")).unwrap(),
            Some(PaymentState::Failed)
        );
        assert!(parse_status_filter(Some("approved")).is_err());
    }

    #[test]
    fn date_bounds_cover_whole_days() {
        let start = parse_date_bound("2025-04-01", false).unwrap();
        let end = parse_date_bound("2025-04-01", true).unwrap();
        assert_eq!(start.hour(), 0);
        assert_eq!(end.hour(), 23);
        assert_eq!(end.minute(), 59);

        let exact = parse_date_bound("2025-04-01T10:30:00+05:30", false).unwrap();
        assert_eq!(exact.hour(), 5);
        assert!(parse_date_bound("01/04/2025", false).is_err());
    }
}
