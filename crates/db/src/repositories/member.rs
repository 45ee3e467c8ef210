//! Member registry repository.

use std::sync::Arc;

use koperasi_core::member::{Member, MemberService, MemberStatus, MemberTotals, RegisterMemberInput};
use koperasi_core::policy::{Action, Actor, authorize};
use koperasi_core::{Clock, CoreError};
use koperasi_shared::types::{MemberNumber, PageRequest, PageResponse};
use sea_orm::ActiveValue::Unchanged;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::entities::{loans, members, savings_history, savings_transactions, withdrawals};
use crate::error::{db_err, is_foreign_key_violation, is_unique_violation};

use super::convert::{member_active_model, member_from_model};
use super::ledger::{balances_by_type, find_member};

/// Filter options for listing members.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemberFilter {
    /// Only members with this status.
    #[serde(default)]
    pub status: Option<MemberStatus>,
    /// Substring of the member number or name.
    #[serde(default)]
    pub search: Option<String>,
}

/// Member repository.
#[derive(Debug, Clone)]
pub struct MemberRepository {
    db: DatabaseConnection,
    clock: Arc<dyn Clock>,
}

impl MemberRepository {
    /// Creates a new member repository.
    #[must_use]
    pub fn new(db: DatabaseConnection, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// Registers a new member.
    ///
    /// # Errors
    ///
    /// - `MissingField` for a blank number or name
    /// - `DuplicateMember` if the number is taken
    pub async fn register(
        &self,
        actor: &Actor,
        input: &RegisterMemberInput,
    ) -> Result<Member, CoreError> {
        authorize(actor, Action::ManageMembers)?;

        let exists = match MemberNumber::parse(&input.number) {
            Some(number) => members::Entity::find_by_id(number.as_str())
                .one(&self.db)
                .await
                .map_err(db_err)?
                .is_some(),
            None => false,
        };
        let member = MemberService::register(input, exists, self.clock.today())?;

        // A concurrent registration of the same number loses on the primary key.
        member_active_model(&member)
            .insert(&self.db)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    CoreError::DuplicateMember(member.number.to_string())
                } else {
                    db_err(e)
                }
            })?;

        info!(member = %member.number, actor = %actor.staff_id, "member registered");
        Ok(member)
    }

    /// Finds a member by number.
    ///
    /// # Errors
    ///
    /// Returns `MemberNotFound` if the number is unknown.
    pub async fn find(&self, number: &MemberNumber) -> Result<Member, CoreError> {
        find_member(&self.db, number, false).await
    }

    /// Lists members ordered by number.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        filter: &MemberFilter,
        page: &PageRequest,
    ) -> Result<PageResponse<Member>, CoreError> {
        let page = page.normalized();

        let mut query = members::Entity::find();
        if let Some(status) = filter.status {
            query = query.filter(members::Column::Status.eq(status.as_str()));
        }
        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(members::Column::Number.contains(search))
                    .add(members::Column::Name.contains(search)),
            );
        }

        let total = query.clone().count(&self.db).await.map_err(db_err)?;
        let data = query
            .order_by_asc(members::Column::Number)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(member_from_model)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PageResponse::new(data, page.page, page.per_page, total))
    }

    /// Deactivates a member.
    ///
    /// # Errors
    ///
    /// - `MemberNotFound` if the number is unknown
    /// - `MissingField` for a blank reason
    /// - `MemberAlreadyInactive` if already deactivated
    pub async fn deactivate(
        &self,
        actor: &Actor,
        number: &MemberNumber,
        reason: &str,
        date: Option<chrono::NaiveDate>,
    ) -> Result<Member, CoreError> {
        authorize(actor, Action::ManageMembers)?;

        let txn = self.db.begin().await.map_err(db_err)?;
        let member = find_member(&txn, number, true).await?;
        let deactivation = MemberService::deactivate(&member, reason, date, self.clock.today())?;

        let updated = members::ActiveModel {
            number: Unchanged(number.as_str().to_string()),
            status: Set(MemberStatus::Inactive.as_str().to_string()),
            deactivation_reason: Set(Some(deactivation.reason)),
            deactivated_on: Set(Some(deactivation.date)),
            ..Default::default()
        }
        .update(&txn)
        .await
        .map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;

        info!(member = %number, actor = %actor.staff_id, "member deactivated");
        member_from_model(updated)
    }

    /// Deletes a member with no financial records.
    ///
    /// # Errors
    ///
    /// - `MemberNotFound` if the number is unknown
    /// - `MemberHasRecords` while loans or savings rows reference the member
    pub async fn delete(&self, actor: &Actor, number: &MemberNumber) -> Result<(), CoreError> {
        authorize(actor, Action::ManageMembers)?;

        let txn = self.db.begin().await.map_err(db_err)?;
        let member = find_member(&txn, number, true).await?;

        let key = number.as_str();
        let records = loans::Entity::find()
            .filter(loans::Column::MemberNumber.eq(key))
            .count(&txn)
            .await
            .map_err(db_err)?
            + savings_transactions::Entity::find()
                .filter(savings_transactions::Column::MemberNumber.eq(key))
                .count(&txn)
                .await
                .map_err(db_err)?
            + withdrawals::Entity::find()
                .filter(withdrawals::Column::MemberNumber.eq(key))
                .count(&txn)
                .await
                .map_err(db_err)?
            + savings_history::Entity::find()
                .filter(savings_history::Column::MemberNumber.eq(key))
                .count(&txn)
                .await
                .map_err(db_err)?;
        MemberService::ensure_deletable(&member, records)?;

        members::Entity::delete_by_id(key)
            .exec(&txn)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    CoreError::MemberHasRecords(number.to_string())
                } else {
                    db_err(e)
                }
            })?;

        txn.commit().await.map_err(db_err)?;

        info!(member = %number, actor = %actor.staff_id, "member deleted");
        Ok(())
    }

    /// Total deposits, withdrawals and balance across all savings types.
    ///
    /// # Errors
    ///
    /// Returns `MemberNotFound` if the number is unknown.
    pub async fn totals(&self, number: &MemberNumber) -> Result<MemberTotals, CoreError> {
        find_member(&self.db, number, false).await?;
        let per_type = balances_by_type(&self.db, number).await?;
        Ok(MemberService::totals(per_type.iter().map(|(_, t)| t)))
    }
}
