pub mod audit_logs;
pub mod order_statuses;
pub mod orders;
pub mod users;
pub mod webhook_logs;

pub use audit_logs::Entity as AuditLogs;
pub use order_statuses::Entity as OrderStatuses;
pub use orders::Entity as Orders;
pub use users::Entity as Users;
pub use webhook_logs::Entity as WebhookLogs;
