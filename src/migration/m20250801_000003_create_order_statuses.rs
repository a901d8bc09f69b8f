use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(OrderStatuses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OrderStatuses::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    // One status row per order; webhook upserts key on it.
                    .col(
                        ColumnDef::new(OrderStatuses::CollectId)
                            .uuid()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(OrderStatuses::OrderAmount)
                            .double()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OrderStatuses::TransactionAmount)
                            .double()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OrderStatuses::PaymentMode)
                            .string()
                            .not_null()
                            .default("NA"),
                    )
                    .col(
                        ColumnDef::new(OrderStatuses::PaymentDetails)
                            .string()
                            .not_null()
                            .default("NA"),
                    )
                    .col(
                        ColumnDef::new(OrderStatuses::BankReference)
                            .string()
                            .not_null()
                            .default("NA"),
                    )
                    .col(
                        ColumnDef::new(OrderStatuses::PaymentMessage)
                            .string()
                            .not_null()
                            .default("NA"),
                    )
                    .col(
                        ColumnDef::new(OrderStatuses::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(OrderStatuses::ErrorMessage)
                            .string()
                            .not_null()
                            .default("NA"),
                    )
                    .col(ColumnDef::new(OrderStatuses::PaymentTime).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(OrderStatuses::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OrderStatuses::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_order_statuses_collect_id")
                            .from(OrderStatuses::Table, OrderStatuses::CollectId)
                            .to(Orders::Table, Orders::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OrderStatuses::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum OrderStatuses {
    Table,
    Id,
    CollectId,
    OrderAmount,
    TransactionAmount,
    PaymentMode,
    PaymentDetails,
    BankReference,
    PaymentMessage,
    Status,
    ErrorMessage,
    PaymentTime,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Orders {
    Table,
    Id,
}
