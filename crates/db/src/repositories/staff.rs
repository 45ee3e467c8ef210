//! Staff repository.
//!
//! Staff rows exist so that loans, installments and savings records can name
//! their administering staff. Ids match the identity provider's `sub`.

use koperasi_core::policy::{Action, Actor, Role, authorize};
use koperasi_core::CoreError;
use koperasi_shared::types::StaffId;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::entities::{loans, savings_transactions, staff, withdrawals};
use crate::error::{db_err, is_foreign_key_violation, is_unique_violation};

/// Input for creating a staff record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateStaffInput {
    /// Identity-provider id; generated when absent.
    #[serde(default)]
    pub id: Option<StaffId>,
    /// Login name, unique.
    pub username: String,
    /// Display name.
    pub full_name: String,
    /// Role.
    pub role: Role,
}

/// Staff repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct StaffRepository {
    db: DatabaseConnection,
}

impl StaffRepository {
    /// Creates a new staff repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a staff record.
    ///
    /// # Errors
    ///
    /// - `Forbidden` unless the actor may manage staff
    /// - `MissingField` for a blank username or name
    /// - `InvalidInput` if the username or id is taken
    pub async fn create(
        &self,
        actor: &Actor,
        input: CreateStaffInput,
    ) -> Result<staff::Model, CoreError> {
        authorize(actor, Action::ManageStaff)?;

        let username = input.username.trim();
        if username.is_empty() {
            return Err(CoreError::MissingField("username"));
        }
        let full_name = input.full_name.trim();
        if full_name.is_empty() {
            return Err(CoreError::MissingField("full name"));
        }

        let model = staff::ActiveModel {
            id: Set(input.id.unwrap_or_default().into_inner()),
            username: Set(username.to_string()),
            full_name: Set(full_name.to_string()),
            role: Set(input.role.as_str().to_string()),
            created_at: Set(chrono::Utc::now().into()),
        };

        let created = model.insert(&self.db).await.map_err(|e| {
            if is_unique_violation(&e) {
                CoreError::InvalidInput(format!("staff {username} already exists"))
            } else {
                db_err(e)
            }
        })?;

        info!(staff_id = %created.id, role = %created.role, "staff created");
        Ok(created)
    }

    /// Finds a staff record by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: StaffId) -> Result<Option<staff::Model>, CoreError> {
        staff::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_err)
    }

    /// Deletes a staff record.
    ///
    /// Installments keep their history with the staff reference cleared.
    ///
    /// # Errors
    ///
    /// - `Forbidden` unless the actor may manage staff
    /// - `StaffNotFound` if the id is unknown
    /// - `StaffInUse` while loans, savings transactions or withdrawals reference the staff
    pub async fn delete(&self, actor: &Actor, id: StaffId) -> Result<(), CoreError> {
        authorize(actor, Action::ManageStaff)?;

        let txn = self.db.begin().await.map_err(db_err)?;
        let uuid = id.into_inner();

        staff::Entity::find_by_id(uuid)
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or(CoreError::StaffNotFound(id))?;

        let references = loans::Entity::find()
            .filter(loans::Column::AdminId.eq(uuid))
            .count(&txn)
            .await
            .map_err(db_err)?
            + savings_transactions::Entity::find()
                .filter(savings_transactions::Column::AdminId.eq(uuid))
                .count(&txn)
                .await
                .map_err(db_err)?
            + withdrawals::Entity::find()
                .filter(withdrawals::Column::AdminId.eq(uuid))
                .count(&txn)
                .await
                .map_err(db_err)?;
        if references > 0 {
            return Err(CoreError::StaffInUse(id));
        }

        staff::Entity::delete_by_id(uuid)
            .exec(&txn)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    CoreError::StaffInUse(id)
                } else {
                    db_err(e)
                }
            })?;

        txn.commit().await.map_err(db_err)?;

        info!(staff_id = %id, "staff deleted");
        Ok(())
    }
}
