//! `SeaORM` Entity for loans table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "loans")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub member_number: String,
    pub loan_type: String,
    pub fee_category: String,
    pub admin_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub principal: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub installment_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((5, 2)))", nullable)]
    pub rate: Option<Decimal>,
    pub term_months: i32,
    pub start_date: Date,
    pub status: String,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub remaining: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub fee_amount: Decimal,
    pub merged_into: Option<Uuid>,
    pub version: i64,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::members::Entity",
        from = "Column::MemberNumber",
        to = "super::members::Column::Number"
    )]
    Members,
    #[sea_orm(
        belongs_to = "super::staff::Entity",
        from = "Column::AdminId",
        to = "super::staff::Column::Id"
    )]
    Staff,
    #[sea_orm(has_many = "super::installments::Entity")]
    Installments,
}

impl Related<super::members::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Members.def()
    }
}

impl Related<super::staff::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Staff.def()
    }
}

impl Related<super::installments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Installments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
