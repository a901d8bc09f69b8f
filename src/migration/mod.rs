use sea_orm_migration::prelude::*;

mod m20250801_000001_create_users;
mod m20250801_000002_create_orders;
mod m20250801_000003_create_order_statuses;
mod m20250801_000004_create_webhook_logs;
mod m20250801_000005_create_audit_logs;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250801_000001_create_users::Migration),
            Box::new(m20250801_000002_create_orders::Migration),
            Box::new(m20250801_000003_create_order_statuses::Migration),
            Box::new(m20250801_000004_create_webhook_logs::Migration),
            Box::new(m20250801_000005_create_audit_logs::Migration),
        ]
    }
}
