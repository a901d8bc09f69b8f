use chrono::Utc;
use rand::Rng;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::orders::{
        DummyDataResponse, DummyTransaction, ExportList, OrderList, RawDataRequest,
        RawDataResponse,
    },
    entity::orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Order, OrderState, PaymentState, StudentInfo, Transaction},
    response::{ApiResponse, Meta},
    routes::params::{ExportQuery, Pagination},
    services::{
        payment_service::{
            DEFAULT_GATEWAY, ORDER_ID_ATTEMPTS, initial_status, new_custom_order_id,
            unique_violation_as_conflict, validate_amount, validate_student,
        },
        transaction_service::{self, TransactionFilter, parse_date_bound, parse_status_filter},
    },
    state::AppState,
};

const INSTITUTES: [&str; 5] = [
    "Delhi Public School",
    "Kendriya Vidyalaya",
    "St. Mary's School",
    "Modern Public School",
    "EDV DEMO SCHOOL",
];

const STUDENTS: [(&str, &str, &str); 10] = [
    ("Rohan Sharma", "STU001", "rohan.sharma@example.com"),
    ("Priya Patel", "STU002", "priya.patel@example.com"),
    ("Amit Kumar", "STU003", "amit.kumar@example.com"),
    ("Sneha Singh", "STU004", "sneha.singh@example.com"),
    ("Vikram Gupta", "STU005", "vikram.gupta@example.com"),
    ("Anita Verma", "STU006", "anita.verma@example.com"),
    ("Rajesh Mehta", "STU007", "rajesh.mehta@example.com"),
    ("Sunita Reddy", "STU008", "sunita.reddy@example.com"),
    ("Arjun Nair", "STU009", "arjun.nair@example.com"),
    ("Kavya Iyer", "STU010", "kavya.iyer@example.com"),
];

const PAYMENT_STATES: [PaymentState; 3] = [
    PaymentState::Success,
    PaymentState::Pending,
    PaymentState::Failed,
];
const PAYMENT_METHODS: [&str; 5] = ["UPI", "Card", "Net Banking", "Wallet", "NA"];
const GATEWAYS: [&str; 5] = ["Razorpay", "PhonePe", "PayU", "Razorpay", "NA"];
const AMOUNTS: [f64; 10] = [
    5000.0, 7500.0, 12000.0, 3500.0, 8500.0, 15000.0, 2500.0, 9500.0, 18000.0, 4200.0,
];

pub const DUMMY_BATCH_SIZE: usize = 20;

/// A fully specified transaction recorded outside the approval flow.
struct ManualEntry {
    custom_order_id: String,
    school_id: String,
    student: StudentInfo,
    gateway: String,
    order_amount: f64,
    transaction_amount: f64,
    payment_mode: String,
    payment: PaymentState,
}

pub async fn list_pending_approval(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = pagination.normalize();

    let finder = Orders::find()
        .filter(OrderCol::Status.eq(OrderState::PendingApproval.as_str()))
        .order_by_asc(OrderCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Order::from)
        .collect();

    Ok(ApiResponse::success(
        "Orders awaiting approval",
        OrderList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn create_raw_data(
    state: &AppState,
    user: &AuthUser,
    payload: RawDataRequest,
) -> AppResult<ApiResponse<RawDataResponse>> {
    validate_amount(payload.order_amount)?;
    let student = StudentInfo {
        name: payload.student_name.trim().to_string(),
        id: payload.student_id.trim().to_string(),
        email: payload.student_email.trim().to_string(),
    };
    validate_student(&student)?;

    let transaction_amount = payload
        .transaction_amount
        .filter(|amount| amount.is_finite() && *amount > 0.0)
        .unwrap_or(payload.order_amount);

    let mut entry = ManualEntry {
        custom_order_id: String::new(),
        school_id: non_empty(payload.institute_name, &state.config.school_id),
        student,
        gateway: non_empty(payload.gateway, DEFAULT_GATEWAY),
        order_amount: payload.order_amount,
        transaction_amount,
        payment_mode: non_empty(payload.payment_method, "NA"),
        payment: payload.status.unwrap_or(PaymentState::Pending),
    };

    let mut attempt = 1;
    let order_id = loop {
        entry.custom_order_id = new_custom_order_id(rand::thread_rng().gen_range(0..1000));
        match insert_manual_entry(state, user, &entry).await {
            Err(AppError::Conflict(_)) if attempt < ORDER_ID_ATTEMPTS => attempt += 1,
            other => break other?,
        }
    };

    audit::record(
        &state.orm,
        Some(user.user_id),
        "order_raw_create",
        "orders",
        serde_json::json!({ "order_id": order_id, "custom_order_id": entry.custom_order_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Raw data created successfully",
        RawDataResponse {
            custom_order_id: entry.custom_order_id,
            collect_request_id: order_id,
            status: "created".to_string(),
        },
        Some(Meta::empty()),
    ))
}

pub async fn create_dummy_data(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<DummyDataResponse>> {
    let entries = dummy_entries(DUMMY_BATCH_SIZE);
    let mut created = Vec::with_capacity(entries.len());

    for entry in entries {
        insert_manual_entry(state, user, &entry).await?;
        created.push(DummyTransaction {
            custom_order_id: entry.custom_order_id,
            amount: entry.order_amount,
            status: entry.payment.as_str().to_string(),
            institute: entry.school_id,
            student: entry.student.name,
        });
    }

    tracing::info!(count = created.len(), "dummy transactions created");
    audit::record(
        &state.orm,
        Some(user.user_id),
        "order_dummy_create",
        "orders",
        serde_json::json!({ "count": created.len() }),
    )
    .await;

    Ok(ApiResponse::success(
        "Dummy data created",
        DummyDataResponse { created },
        Some(Meta::empty()),
    ))
}

pub async fn export_transactions(
    state: &AppState,
    query: &ExportQuery,
) -> AppResult<Vec<Transaction>> {
    let filter = TransactionFilter {
        status: parse_status_filter(query.status.as_deref())?,
        created_from: query
            .start_date
            .as_deref()
            .filter(|d| !d.is_empty())
            .map(|d| parse_date_bound(d, false))
            .transpose()?,
        created_to: query
            .end_date
            .as_deref()
            .filter(|d| !d.is_empty())
            .map(|d| parse_date_bound(d, true))
            .transpose()?,
        ..Default::default()
    };
    if let (Some(from), Some(to)) = (filter.created_from, filter.created_to) {
        if from > to {
            return Err(AppError::BadRequest(
                "start_date must not be after end_date".into(),
            ));
        }
    }

    transaction_service::all_matching(state, &filter).await
}

pub fn export_list(items: Vec<Transaction>) -> ApiResponse<ExportList> {
    let count = items.len();
    ApiResponse::success(
        "Export",
        ExportList { items, count },
        Some(Meta::new(1, count as i64, count as i64)),
    )
}

/// Manual entries skip review: the order mirrors the recorded payment outcome.
async fn insert_manual_entry(
    state: &AppState,
    user: &AuthUser,
    entry: &ManualEntry,
) -> AppResult<Uuid> {
    let now = Utc::now();
    let order_state = OrderState::from(entry.payment);

    let txn = state.orm.begin().await?;
    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        school_id: Set(entry.school_id.clone()),
        trustee_id: Set(user.user_id.to_string()),
        student_name: Set(entry.student.name.clone()),
        student_id: Set(entry.student.id.clone()),
        student_email: Set(entry.student.email.clone()),
        gateway_name: Set(entry.gateway.clone()),
        custom_order_id: Set(entry.custom_order_id.clone()),
        order_amount: Set(entry.order_amount),
        status: Set(order_state.as_str().to_string()),
        created_by: Set(user.user_id),
        collect_request_id: Set(None),
        payment_url: Set(None),
        reviewed_by: Set(Some(user.user_id)),
        reviewed_at: Set(Some(now.into())),
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

    let mut status = initial_status(order.id, entry.order_amount, entry.transaction_amount);
    status.status = Set(entry.payment.as_str().to_string());
    status.payment_mode = Set(entry.payment_mode.clone());
    if entry.payment == PaymentState::Success {
        status.payment_time = Set(Some(now.into()));
    }
    status.insert(&txn).await?;
    txn.commit().await?;

    Ok(order.id)
}

fn dummy_entries(count: usize) -> Vec<ManualEntry> {
    let mut rng = rand::thread_rng();
    let base = Utc::now().timestamp_millis();
    (0..count)
        .map(|index| {
            let (name, id, email) = STUDENTS[rng.gen_range(0..STUDENTS.len())];
            let amount = AMOUNTS[rng.gen_range(0..AMOUNTS.len())];
            ManualEntry {
                custom_order_id: format!("EDV{base}{index:03}"),
                school_id: INSTITUTES[rng.gen_range(0..INSTITUTES.len())].to_string(),
                student: StudentInfo {
                    name: name.to_string(),
                    id: id.to_string(),
                    email: email.to_string(),
                },
                gateway: GATEWAYS[rng.gen_range(0..GATEWAYS.len())].to_string(),
                order_amount: amount,
                transaction_amount: amount,
                payment_mode: PAYMENT_METHODS[rng.gen_range(0..PAYMENT_METHODS.len())]
                    .to_string(),
                payment: PAYMENT_STATES[rng.gen_range(0..PAYMENT_STATES.len())],
            }
        })
        .collect()
}

fn non_empty(value: Option<String>, default: &str) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn dummy_entries_have_unique_ids_and_known_values() {
        let entries = dummy_entries(DUMMY_BATCH_SIZE);
        assert_eq!(entries.len(), DUMMY_BATCH_SIZE);

        let ids: HashSet<_> = entries.iter().map(|e| e.custom_order_id.as_str()).collect();
        assert_eq!(ids.len(), DUMMY_BATCH_SIZE);

        for entry in &entries {
            assert!(INSTITUTES.contains(&entry.school_id.as_str()));
            assert!(AMOUNTS.contains(&entry.order_amount));
        }
    }

    #[test]
    fn blank_values_fall_back_to_default() {
        assert_eq!(non_empty(Some("  ".into()), "NA"), "NA");
        assert_eq!(non_empty(None, "Edviron"), "Edviron");
        assert_eq!(non_empty(Some(" UPI ".into()), "NA"), "UPI");
    }
}
