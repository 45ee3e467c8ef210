//! Auto-sweep of voluntary savings into loan installments.
//!
//! Each member is swept in its own transaction: the member row is locked,
//! then the member's active loans, then the voluntary balance is read. The
//! savings debit and the installment for a loan commit together or not at
//! all. One member failing never aborts the rest of a run.

use std::sync::Arc;

use koperasi_core::loan::{LoanLedger, LoanStatus};
use koperasi_core::member::MemberStatus;
use koperasi_core::policy::{Action, Actor, authorize};
use koperasi_core::savings::SavingsType;
use koperasi_core::sweep::{MemberSweepPlan, SkipReason, SweepDecision, SweepReport, SweepService};
use koperasi_core::{Clock, CoreError, ErrorKind};
use koperasi_shared::types::{MemberNumber, StaffId};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait,
};
use tracing::{debug, error, info, warn};

use crate::entities::{loans, members};
use crate::error::db_err;

use super::ledger::{
    balance_totals, find_member, insert_deposit, insert_installments, member_ledgers, save_refresh,
};

/// Sweep repository.
#[derive(Debug, Clone)]
pub struct SweepRepository {
    db: DatabaseConnection,
    clock: Arc<dyn Clock>,
}

impl SweepRepository {
    /// Creates a new sweep repository.
    #[must_use]
    pub fn new(db: DatabaseConnection, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// Sweeps every active loan of one member, in origination order.
    ///
    /// # Errors
    ///
    /// - `Forbidden` unless the actor may run the sweep
    /// - `MemberNotFound`
    /// - `ConcurrencyConflict` / `Database` if the member's transaction failed
    pub async fn sweep_member(
        &self,
        actor: &Actor,
        number: &MemberNumber,
    ) -> Result<SweepReport, CoreError> {
        authorize(actor, Action::RunSweep)?;

        let plan = self.run_member(number, actor.staff_id).await?;
        let mut report = SweepReport::default();
        report.record(&plan);
        Ok(report)
    }

    /// Sweeps every active member that has an active loan.
    ///
    /// Per-member failures are logged and collected in the report.
    ///
    /// # Errors
    ///
    /// - `Forbidden` unless the actor may run the sweep
    /// - `Database` if the member list cannot be read
    pub async fn sweep_all(&self, actor: &Actor) -> Result<SweepReport, CoreError> {
        authorize(actor, Action::RunSweep)?;

        let numbers: Vec<String> = loans::Entity::find()
            .select_only()
            .column(loans::Column::MemberNumber)
            .distinct()
            .inner_join(members::Entity)
            .filter(loans::Column::Status.eq(LoanStatus::Active.as_str()))
            .filter(members::Column::Status.eq(MemberStatus::Active.as_str()))
            .order_by_asc(loans::Column::MemberNumber)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(db_err)?;

        info!(members = numbers.len(), operator = %actor.staff_id, "sweep started");

        let mut report = SweepReport::default();
        for raw in numbers {
            let Some(number) = MemberNumber::parse(&raw) else {
                continue;
            };
            match self.run_member(&number, actor.staff_id).await {
                Ok(plan) => report.record(&plan),
                Err(err) => {
                    if err.kind() == ErrorKind::ConcurrencyConflict {
                        warn!(member = %number, error = %err, "sweep conflict, will retry next run");
                    } else {
                        error!(member = %number, error = %err, "sweep failed");
                    }
                    report.record_failure(number, err.error_code(), err.to_string());
                }
            }
        }

        info!(
            members = report.members,
            posted = report.posted,
            marked_paid = report.marked_paid,
            skipped_insufficient_funds = report.skipped.insufficient_funds,
            skipped_already_paid = report.skipped.already_paid_this_month,
            failed = report.failed.len(),
            total_debited = %report.total_debited,
            "sweep finished"
        );
        Ok(report)
    }

    async fn run_member(
        &self,
        number: &MemberNumber,
        operator: StaffId,
    ) -> Result<MemberSweepPlan, CoreError> {
        let today = self.clock.today();
        let txn = self.db.begin().await.map_err(db_err)?;

        find_member(&txn, number, true).await?;
        let ledgers = member_ledgers(&txn, number, Some(LoanStatus::Active), true).await?;
        let balance = balance_totals(&txn, number, SavingsType::Voluntary)
            .await?
            .balance();

        let plan = SweepService::plan_member(number, &ledgers, balance, operator, today)?;

        for (ledger, sweep) in ledgers.iter().zip(&plan.loans) {
            match &sweep.decision {
                SweepDecision::Skip(_) => {}
                SweepDecision::MarkPaid(refresh) => {
                    save_refresh(&txn, &ledger.loan, refresh).await?;
                }
                SweepDecision::Post { debit, posting } => {
                    insert_deposit(&txn, debit).await?;
                    insert_installments(&txn, std::slice::from_ref(&posting.installment)).await?;
                    save_refresh(&txn, &ledger.loan, &posting.refresh).await?;
                }
            }
        }

        txn.commit().await.map_err(db_err)?;

        for (ledger, sweep) in ledgers.iter().zip(&plan.loans) {
            log_decision(number, ledger, &sweep.decision);
        }
        Ok(plan)
    }
}

fn log_decision(number: &MemberNumber, ledger: &LoanLedger, decision: &SweepDecision) {
    let loan_id = ledger.loan.id;
    match decision {
        SweepDecision::Skip(reason @ (SkipReason::LoanPaid | SkipReason::LoanMerged)) => {
            debug!(
                member = %number,
                loan_id = %loan_id,
                outcome = "skipped",
                reason = %reason,
                "sweep skipped loan"
            );
        }
        SweepDecision::Skip(reason) => {
            info!(
                member = %number,
                loan_id = %loan_id,
                outcome = "skipped",
                reason = %reason,
                "sweep skipped loan"
            );
        }
        SweepDecision::MarkPaid(refresh) => {
            info!(
                member = %number,
                loan_id = %loan_id,
                outcome = "marked_paid",
                status = %refresh.status,
                "sweep marked loan paid"
            );
        }
        SweepDecision::Post { posting, .. } => {
            info!(
                member = %number,
                loan_id = %loan_id,
                outcome = "posted",
                amount = %posting.installment.amount,
                remaining = %posting.refresh.remaining,
                status = %posting.refresh.status,
                "sweep posted installment"
            );
        }
    }
}
