//! `SeaORM` Entity for members table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "members")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub number: String,
    pub name: String,
    pub status: String,
    pub joined_on: Date,
    pub deactivation_reason: Option<String>,
    pub deactivated_on: Option<Date>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::loans::Entity")]
    Loans,
    #[sea_orm(has_many = "super::savings_transactions::Entity")]
    SavingsTransactions,
    #[sea_orm(has_many = "super::withdrawals::Entity")]
    Withdrawals,
    #[sea_orm(has_many = "super::savings_history::Entity")]
    SavingsHistory,
}

impl Related<super::loans::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Loans.def()
    }
}

impl Related<super::savings_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SavingsHistory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
