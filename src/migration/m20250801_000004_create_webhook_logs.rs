use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(WebhookLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WebhookLogs::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(WebhookLogs::OrderId).string().not_null())
                    .col(ColumnDef::new(WebhookLogs::Payload).json().not_null())
                    .col(ColumnDef::new(WebhookLogs::StatusCode).integer().not_null())
                    .col(
                        ColumnDef::new(WebhookLogs::Processed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(WebhookLogs::ErrorMessage).string())
                    .col(ColumnDef::new(WebhookLogs::SourceIp).string())
                    .col(
                        ColumnDef::new(WebhookLogs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WebhookLogs::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(WebhookLogs::Table)
                    .col(WebhookLogs::OrderId)
                    .name("idx_webhook_logs_order_id")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(WebhookLogs::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum WebhookLogs {
    Table,
    Id,
    OrderId,
    Payload,
    StatusCode,
    Processed,
    ErrorMessage,
    SourceIp,
    CreatedAt,
    UpdatedAt,
}
