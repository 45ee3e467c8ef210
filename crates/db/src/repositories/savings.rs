//! Savings ledger repository (simpanan, penarikan, history).
//!
//! Every mutation locks the member row, which serializes deposits and
//! withdrawals for all of the member's savings types.

use std::sync::Arc;

use chrono::NaiveDate;
use koperasi_core::policy::{Action, Actor, authorize};
use koperasi_core::savings::{
    DepositInput, HistoryEntry, SavingsService, SavingsSummary, SavingsTransaction, SavingsType,
    Withdrawal, WithdrawalInput,
};
use koperasi_core::{Clock, CoreError};
use koperasi_shared::types::MemberNumber;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, TransactionTrait,
};
use tracing::info;

use crate::entities::{savings_history, savings_transactions};
use crate::error::db_err;

use super::convert::{history_active_model, history_from_model, withdrawal_active_model};
use super::ledger::{
    balance_totals, balances_by_type, find_member, has_periodic_deposit_in_month, insert_deposit,
};

/// Savings repository.
#[derive(Debug, Clone)]
pub struct SavingsRepository {
    db: DatabaseConnection,
    clock: Arc<dyn Clock>,
}

impl SavingsRepository {
    /// Creates a new savings repository.
    #[must_use]
    pub fn new(db: DatabaseConnection, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// Records a deposit and its mirrored history entry.
    ///
    /// # Errors
    ///
    /// - `Forbidden` unless the actor may record deposits
    /// - `MemberNotFound` / `MemberInactive`
    /// - `NonPositiveAmount`, `NegativeSocialFund`, `SocialFundRequired`
    pub async fn deposit(
        &self,
        actor: &Actor,
        number: &MemberNumber,
        input: &DepositInput,
    ) -> Result<SavingsTransaction, CoreError> {
        authorize(actor, Action::RecordDeposit)?;

        let today = self.clock.today();
        let txn = self.db.begin().await.map_err(db_err)?;
        let member = find_member(&txn, number, true).await?;

        let date = input.date.unwrap_or(today);
        let has_periodic = has_periodic_deposit_in_month(&txn, number, date).await?;
        let plan = SavingsService::deposit(&member, actor.staff_id, input, has_periodic, today)?;

        insert_deposit(&txn, &plan).await?;
        txn.commit().await.map_err(db_err)?;

        info!(
            member = %number,
            savings_type = %plan.transaction.savings_type,
            amount = %plan.transaction.amount,
            social_fund = %plan.transaction.social_fund,
            "deposit recorded"
        );
        Ok(plan.transaction)
    }

    /// Records a withdrawal after checking it against the ledger balance.
    ///
    /// The balance is read under the member lock, so two concurrent
    /// withdrawals cannot both pass against the same snapshot.
    ///
    /// # Errors
    ///
    /// - `Forbidden` unless the actor may record withdrawals
    /// - `MemberNotFound`
    /// - `NonPositiveAmount`, `InsufficientFunds`
    pub async fn withdraw(
        &self,
        actor: &Actor,
        number: &MemberNumber,
        savings_type: SavingsType,
        input: &WithdrawalInput,
    ) -> Result<Withdrawal, CoreError> {
        authorize(actor, Action::RecordWithdrawal)?;

        let txn = self.db.begin().await.map_err(db_err)?;
        let member = find_member(&txn, number, true).await?;
        let current = balance_totals(&txn, number, savings_type).await?;

        let plan = SavingsService::withdraw(
            &member,
            savings_type,
            actor.staff_id,
            input,
            current,
            self.clock.today(),
        )?;

        withdrawal_active_model(&plan.withdrawal)
            .insert(&txn)
            .await
            .map_err(db_err)?;
        history_active_model(&plan.history)
            .insert(&txn)
            .await
            .map_err(db_err)?;
        txn.commit().await.map_err(db_err)?;

        info!(
            member = %number,
            savings_type = %savings_type,
            amount = %plan.history.amount,
            "withdrawal recorded"
        );
        Ok(plan.withdrawal)
    }

    /// Current balance of one savings type, derived from the history ledger.
    ///
    /// # Errors
    ///
    /// Returns `MemberNotFound` if the number is unknown.
    pub async fn balance(
        &self,
        number: &MemberNumber,
        savings_type: SavingsType,
    ) -> Result<Decimal, CoreError> {
        find_member(&self.db, number, false).await?;
        Ok(balance_totals(&self.db, number, savings_type).await?.balance())
    }

    /// Whether a wajib deposit on `date` (default today) needs a social fund amount.
    ///
    /// # Errors
    ///
    /// Returns `MemberNotFound` if the number is unknown.
    pub async fn social_fund_required(
        &self,
        number: &MemberNumber,
        date: Option<NaiveDate>,
    ) -> Result<bool, CoreError> {
        find_member(&self.db, number, false).await?;
        let date = date.unwrap_or_else(|| self.clock.today());
        let has_periodic = has_periodic_deposit_in_month(&self.db, number, date).await?;
        Ok(SavingsService::social_fund_required(
            SavingsType::MandatoryPeriodic,
            has_periodic,
        ))
    }

    /// Per-type balances plus the member's total social fund.
    ///
    /// # Errors
    ///
    /// Returns `MemberNotFound` if the number is unknown.
    pub async fn summary(&self, number: &MemberNumber) -> Result<SavingsSummary, CoreError> {
        find_member(&self.db, number, false).await?;
        let per_type = balances_by_type(&self.db, number).await?;

        let social_funds: Vec<Decimal> = savings_transactions::Entity::find()
            .select_only()
            .column(savings_transactions::Column::SocialFund)
            .filter(savings_transactions::Column::MemberNumber.eq(number.as_str()))
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(db_err)?;

        Ok(SavingsService::summarize(
            number,
            &per_type,
            social_funds.into_iter().sum(),
        ))
    }

    /// History entries of one savings type, newest first.
    ///
    /// # Errors
    ///
    /// Returns `MemberNotFound` if the number is unknown.
    pub async fn history(
        &self,
        number: &MemberNumber,
        savings_type: SavingsType,
        on_date: Option<NaiveDate>,
    ) -> Result<Vec<HistoryEntry>, CoreError> {
        find_member(&self.db, number, false).await?;

        let mut query = savings_history::Entity::find()
            .filter(savings_history::Column::MemberNumber.eq(number.as_str()))
            .filter(savings_history::Column::SavingsType.eq(savings_type.as_str()));
        if let Some(date) = on_date {
            query = query.filter(savings_history::Column::Date.eq(date));
        }

        query
            .order_by_desc(savings_history::Column::Date)
            .order_by_desc(savings_history::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(history_from_model)
            .collect()
    }
}
