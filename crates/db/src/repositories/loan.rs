//! Loan repository (pinjaman, angsuran).
//!
//! Origination locks the member row and then the member's active loans of the
//! requested type. Installment posting locks the loan row. Cached
//! `remaining`/`status` columns are written back on every mutation but read
//! models always derive them from the installment ledger.

use std::sync::Arc;

use chrono::NaiveDate;
use koperasi_core::installment::{
    BatchInstallmentInput, BatchPosting, Installment, InstallmentService, PostInstallmentInput,
    Posting,
};
use koperasi_core::loan::{
    CreateLoanInput, LoanLedger, LoanOverview, LoanRefresh, LoanService, LoanStatus, LoanSummary,
    MemberLoans, Origination,
};
use koperasi_core::policy::{Action, Actor, authorize};
use koperasi_core::{Clock, CoreError};
use koperasi_shared::types::{LoanId, MemberNumber, PageRequest, PageResponse};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, TransactionTrait,
};
use tracing::info;

use crate::entities::{installments, loans};
use crate::error::{db_err, is_unique_violation};

use super::convert::{installment_from_model, loan_active_model};
use super::ledger::{
    find_ledger, find_member, insert_installments, load_ledgers, mark_merged, member_ledgers,
    save_refresh,
};

/// Loan repository.
#[derive(Debug, Clone)]
pub struct LoanRepository {
    db: DatabaseConnection,
    clock: Arc<dyn Clock>,
}

impl LoanRepository {
    /// Creates a new loan repository.
    #[must_use]
    pub fn new(db: DatabaseConnection, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    // ========================================================================
    // Origination
    // ========================================================================

    /// Creates a loan, merging any active loan of the same type.
    ///
    /// The merged loans and the new loan are written in one transaction.
    ///
    /// # Errors
    ///
    /// - `Forbidden` unless the actor may create loans
    /// - `MemberNotFound` / `MemberInactive`
    /// - `InvalidTerm`, `NonPositiveAmount`, `InvalidRate`
    /// - `ConcurrencyConflict` if another origination raced this one
    pub async fn create(
        &self,
        actor: &Actor,
        number: &MemberNumber,
        input: &CreateLoanInput,
    ) -> Result<Origination, CoreError> {
        authorize(actor, Action::CreateLoan)?;

        let txn = self.db.begin().await.map_err(db_err)?;
        let member = find_member(&txn, number, true).await?;

        let prior_models = loans::Entity::find()
            .filter(loans::Column::MemberNumber.eq(number.as_str()))
            .filter(loans::Column::LoanType.eq(input.loan_type.as_str()))
            .filter(loans::Column::Status.eq(LoanStatus::Active.as_str()))
            .lock_exclusive()
            .all(&txn)
            .await
            .map_err(db_err)?;
        let prior = load_ledgers(&txn, prior_models).await?;

        let origination =
            LoanService::originate(input, &member, actor.staff_id, &prior, self.clock.today())?;

        // merged_into is deferred, so old loans can point at the new id first
        // and free the one-active-loan-per-type slot.
        for merged in &origination.merged {
            mark_merged(&txn, merged.id, merged.version, origination.loan.id).await?;
        }
        loan_active_model(&origination.loan)
            .insert(&txn)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    CoreError::ConcurrencyConflict(format!("active {} loan", input.loan_type))
                } else {
                    db_err(e)
                }
            })?;

        txn.commit().await.map_err(db_err)?;

        info!(
            loan_id = %origination.loan.id,
            member = %number,
            loan_type = %origination.loan.loan_type,
            principal = %origination.loan.principal,
            merged = origination.merged.len(),
            carried_over = %origination.carried_over,
            "loan created"
        );
        Ok(origination)
    }

    // ========================================================================
    // Read models
    // ========================================================================

    /// Loan with remaining, fee and status derived from its installments.
    ///
    /// # Errors
    ///
    /// Returns `LoanNotFound` if the id is unknown.
    pub async fn overview(&self, id: LoanId) -> Result<LoanOverview, CoreError> {
        let ledger = find_ledger(&self.db, id, false).await?;
        Ok(LoanService::overview(&ledger))
    }

    /// A member's loans split into current and settled.
    ///
    /// # Errors
    ///
    /// Returns `MemberNotFound` if the number is unknown.
    pub async fn member_loans(&self, number: &MemberNumber) -> Result<MemberLoans, CoreError> {
        find_member(&self.db, number, false).await?;
        let ledgers = member_ledgers(&self.db, number, None, false).await?;
        Ok(LoanService::member_loans(number, &ledgers))
    }

    /// Derived remaining balance of active loans per loan type.
    ///
    /// # Errors
    ///
    /// Returns `MemberNotFound` if the number is unknown.
    pub async fn summary(&self, number: &MemberNumber) -> Result<LoanSummary, CoreError> {
        find_member(&self.db, number, false).await?;
        let ledgers = member_ledgers(&self.db, number, Some(LoanStatus::Active), false).await?;
        Ok(LoanService::summarize(number, &ledgers))
    }

    /// Installments of a loan, newest first.
    ///
    /// # Errors
    ///
    /// Returns `LoanNotFound` if the id is unknown.
    pub async fn installments(
        &self,
        id: LoanId,
        on_date: Option<NaiveDate>,
        page: &PageRequest,
    ) -> Result<PageResponse<Installment>, CoreError> {
        let page = page.normalized();

        loans::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(CoreError::LoanNotFound(id))?;

        let mut query =
            installments::Entity::find().filter(installments::Column::LoanId.eq(id.into_inner()));
        if let Some(date) = on_date {
            query = query.filter(installments::Column::Date.eq(date));
        }

        let total = query.clone().count(&self.db).await.map_err(db_err)?;
        let data = query
            .order_by_desc(installments::Column::Date)
            .order_by_desc(installments::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(installment_from_model)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PageResponse::new(data, page.page, page.per_page, total))
    }

    // ========================================================================
    // Installment posting
    // ========================================================================

    /// Posts one manual installment.
    ///
    /// # Errors
    ///
    /// - `Forbidden` unless the actor may post installments
    /// - `LoanNotFound`
    /// - `LoanPaid` / `LoanMerged` if the loan no longer accepts payments
    /// - `NonPositiveAmount`
    pub async fn post_installment(
        &self,
        actor: &Actor,
        id: LoanId,
        input: &PostInstallmentInput,
    ) -> Result<Posting, CoreError> {
        authorize(actor, Action::PostInstallment)?;

        let txn = self.db.begin().await.map_err(db_err)?;
        let ledger = find_ledger(&txn, id, true).await?;

        let posting =
            InstallmentService::post(&ledger, Some(actor.staff_id), input, self.clock.today())?;

        insert_installments(&txn, std::slice::from_ref(&posting.installment)).await?;
        save_refresh(&txn, &ledger.loan, &posting.refresh).await?;
        txn.commit().await.map_err(db_err)?;

        info!(
            loan_id = %id,
            kind = %posting.installment.kind,
            amount = %posting.installment.amount,
            remaining = %posting.refresh.remaining,
            status = %posting.refresh.status,
            "installment posted"
        );
        Ok(posting)
    }

    /// Posts up to `months` installments, stopping once the loan is paid.
    ///
    /// # Errors
    ///
    /// - `Forbidden` unless the actor may post installments
    /// - `LoanNotFound`
    /// - `LoanPaid` / `LoanMerged`
    /// - `InvalidMonths` if `months` is zero or exceeds the remaining term
    pub async fn post_installments(
        &self,
        actor: &Actor,
        id: LoanId,
        input: &BatchInstallmentInput,
    ) -> Result<BatchPosting, CoreError> {
        authorize(actor, Action::PostInstallment)?;

        let txn = self.db.begin().await.map_err(db_err)?;
        let ledger = find_ledger(&txn, id, true).await?;

        let batch =
            InstallmentService::post_batch(&ledger, Some(actor.staff_id), input, self.clock.today())?;

        insert_installments(&txn, &batch.installments).await?;
        save_refresh(&txn, &ledger.loan, &batch.refresh).await?;
        txn.commit().await.map_err(db_err)?;

        info!(
            loan_id = %id,
            requested = batch.requested,
            applied = batch.applied,
            remaining = %batch.refresh.remaining,
            status = %batch.refresh.status,
            "installments posted"
        );
        Ok(batch)
    }

    /// Recomputes a loan's cached remaining balance and status from its ledger.
    ///
    /// Idempotent: with no new installments the second call writes the same
    /// values as the first.
    ///
    /// # Errors
    ///
    /// - `Forbidden` if the actor may not post installments
    /// - `LoanNotFound` if the id is unknown
    pub async fn refresh(&self, actor: &Actor, id: LoanId) -> Result<LoanRefresh, CoreError> {
        authorize(actor, Action::PostInstallment)?;

        let txn = self.db.begin().await.map_err(db_err)?;
        let ledger = find_ledger(&txn, id, true).await?;

        let refresh = LoanService::refresh_status(&ledger.loan, ledger.paid_count());
        if cache_is_stale(&ledger, &refresh) {
            save_refresh(&txn, &ledger.loan, &refresh).await?;
        }
        txn.commit().await.map_err(db_err)?;

        Ok(refresh)
    }
}

/// Whether the cached columns disagree with the ledger-derived state.
fn cache_is_stale(ledger: &LoanLedger, refresh: &LoanRefresh) -> bool {
    ledger.loan.remaining != refresh.remaining || ledger.loan.status != refresh.status
}

#[cfg(test)]
mod tests {
    use super::*;
    use koperasi_core::loan::{FeeCategory, Loan, LoanType};
    use koperasi_shared::types::StaffId;
    use rust_decimal_macros::dec;

    fn ledger(remaining: rust_decimal::Decimal, status: LoanStatus) -> LoanLedger {
        LoanLedger::new(
            Loan {
                id: LoanId::new(),
                member: MemberNumber::parse("A-001").unwrap(),
                loan_type: LoanType::Regular,
                fee_category: FeeCategory::Flat,
                admin_id: StaffId::new(),
                principal: dec!(1200000),
                installment_amount: dec!(100000),
                rate: Some(dec!(2)),
                term_months: 12,
                start_date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
                status,
                remaining,
                fee_amount: dec!(24000),
                merged_into: None,
                version: 0,
            },
            vec![],
        )
    }

    #[test]
    fn test_fresh_cache_is_not_rewritten() {
        let ledger = ledger(dec!(1200000), LoanStatus::Active);
        let refresh = LoanService::refresh_status(&ledger.loan, ledger.paid_count());
        assert!(!cache_is_stale(&ledger, &refresh));
    }

    #[test]
    fn test_lagging_cache_is_detected() {
        let ledger = ledger(dec!(900000), LoanStatus::Active);
        let refresh = LoanService::refresh_status(&ledger.loan, ledger.paid_count());
        assert_eq!(refresh.remaining, dec!(1200000));
        assert!(cache_is_stale(&ledger, &refresh));
    }
}
