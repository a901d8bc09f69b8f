use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Orders::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Orders::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Orders::SchoolId).string().not_null())
                    .col(ColumnDef::new(Orders::TrusteeId).string().not_null())
                    .col(ColumnDef::new(Orders::StudentName).string().not_null())
                    .col(ColumnDef::new(Orders::StudentId).string().not_null())
                    .col(ColumnDef::new(Orders::StudentEmail).string().not_null())
                    .col(ColumnDef::new(Orders::GatewayName).string().not_null())
                    .col(
                        ColumnDef::new(Orders::CustomOrderId)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Orders::OrderAmount).double().not_null())
                    .col(
                        ColumnDef::new(Orders::Status)
                            .string()
                            .not_null()
                            .default("pending_approval"),
                    )
                    .col(ColumnDef::new(Orders::CreatedBy).uuid().not_null())
                    .col(ColumnDef::new(Orders::CollectRequestId).string())
                    .col(ColumnDef::new(Orders::PaymentUrl).string())
                    .col(ColumnDef::new(Orders::ReviewedBy).uuid())
                    .col(ColumnDef::new(Orders::ReviewedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Orders::RejectionReason).string())
                    .col(
                        ColumnDef::new(Orders::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Orders::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Per-school listings and status filters.
        manager
            .create_index(
                Index::create()
                    .table(Orders::Table)
                    .col(Orders::SchoolId)
                    .col(Orders::CreatedAt)
                    .name("idx_orders_school_id_created_at")
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(Orders::Table)
                    .col(Orders::Status)
                    .name("idx_orders_status")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Orders::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Orders {
    Table,
    Id,
    SchoolId,
    TrusteeId,
    StudentName,
    StudentId,
    StudentEmail,
    GatewayName,
    CustomOrderId,
    OrderAmount,
    Status,
    CreatedBy,
    CollectRequestId,
    PaymentUrl,
    ReviewedBy,
    ReviewedAt,
    RejectionReason,
    CreatedAt,
    UpdatedAt,
}
