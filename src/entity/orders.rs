use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub school_id: String,
    pub trustee_id: String,
    pub student_name: String,
    pub student_id: String,
    pub student_email: String,
    pub gateway_name: String,
    #[sea_orm(unique)]
    pub custom_order_id: String,
    #[sea_orm(column_type = "Double")]
    pub order_amount: f64,
    pub status: String,
    pub created_by: Uuid,
    pub collect_request_id: Option<String>,
    pub payment_url: Option<String>,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTimeWithTimeZone>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::order_statuses::Entity")]
    OrderStatuses,
}

impl Related<super::order_statuses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderStatuses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
