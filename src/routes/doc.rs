use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{AuthResponse, LoginRequest, RegisterRequest},
        orders::{
            DummyDataResponse, DummyTransaction, ExportList, OrderList, RawDataRequest,
            RawDataResponse,
        },
        payments::{
            AdminApproveRequest, ApprovalResponse, AutoApproveRequest, CreatePaymentRequest,
            CreatePaymentResponse, ReviewAction,
        },
        transactions::{SchoolTransactionList, TransactionList},
        webhooks::{OrderInfo, WebhookAck, WebhookLogList, WebhookPayload},
    },
    gateway::CollectRequestStatus,
    models::{Order, OrderState, OrderStatus, PaymentState, Role, StudentInfo, Transaction, User, WebhookLog},
    response::{ApiResponse, Meta},
    routes::{auth, health, order, params, payment, transactions, webhook},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        auth::me,
        payment::create_payment,
        payment::payment_status,
        payment::admin_approve,
        payment::auto_approve,
        order::pending_approval,
        order::create_raw_data,
        order::create_dummy_data,
        order::export,
        transactions::list_transactions,
        transactions::list_by_school,
        transactions::transaction_status,
        transactions::transaction_status_alias,
        webhook::receive,
        webhook::list_logs
    ),
    components(
        schemas(
            User,
            Role,
            StudentInfo,
            Order,
            OrderState,
            OrderStatus,
            PaymentState,
            Transaction,
            WebhookLog,
            RegisterRequest,
            LoginRequest,
            AuthResponse,
            CreatePaymentRequest,
            CreatePaymentResponse,
            ReviewAction,
            AdminApproveRequest,
            AutoApproveRequest,
            ApprovalResponse,
            CollectRequestStatus,
            OrderList,
            RawDataRequest,
            RawDataResponse,
            DummyTransaction,
            DummyDataResponse,
            ExportList,
            TransactionList,
            SchoolTransactionList,
            WebhookPayload,
            OrderInfo,
            WebhookAck,
            WebhookLogList,
            params::Pagination,
            params::TransactionQuery,
            params::TransactionSortBy,
            params::SortOrder,
            params::ExportFormat,
            params::ExportQuery,
            params::WebhookLogQuery,
            Meta,
            ApiResponse<AuthResponse>,
            ApiResponse<CreatePaymentResponse>,
            ApiResponse<ApprovalResponse>,
            ApiResponse<TransactionList>,
            ApiResponse<Transaction>,
            ApiResponse<WebhookAck>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Payment", description = "Payment creation and approval"),
        (name = "Order", description = "Order review, manual entry and export"),
        (name = "Transactions", description = "Transaction listings"),
        (name = "Webhook", description = "Payment gateway callbacks"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
