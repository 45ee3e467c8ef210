//! Sweep state machine.

use chrono::NaiveDate;
use koperasi_shared::types::{MemberNumber, StaffId};
use rust_decimal::Decimal;

use crate::clock::same_month;
use crate::error::CoreError;
use crate::installment::{InstallmentKind, InstallmentService, PostInstallmentInput};
use crate::loan::{LoanLedger, LoanService, LoanStatus};
use crate::savings::SavingsService;
use crate::sweep::types::{LoanSweep, MemberSweepPlan, SkipReason, SweepDecision};

/// Stateless service for the voluntary-savings auto-sweep.
pub struct SweepService;

impl SweepService {
    /// Evaluates one loan against the member's voluntary balance.
    ///
    /// 1. Paid or merged loans are skipped.
    /// 2. A loan whose ledger shows zero remaining is marked paid.
    /// 3. A principal+fee installment dated this month means skip.
    /// 4. A balance below the total due means skip.
    /// 5. Otherwise debit `total_due` and post it as a principal+fee installment.
    pub fn evaluate(
        ledger: &LoanLedger,
        voluntary_balance: Decimal,
        operator: StaffId,
        today: NaiveDate,
    ) -> Result<SweepDecision, CoreError> {
        let loan = &ledger.loan;
        match loan.status {
            LoanStatus::Paid => return Ok(SweepDecision::Skip(SkipReason::LoanPaid)),
            LoanStatus::Merged => return Ok(SweepDecision::Skip(SkipReason::LoanMerged)),
            LoanStatus::Active => {}
        }

        let paid = ledger.paid_count();
        if LoanService::compute_remaining(loan.principal, loan.installment_amount, paid)
            <= Decimal::ZERO
        {
            return Ok(SweepDecision::MarkPaid(LoanService::refresh_status(loan, paid)));
        }

        let due = InstallmentService::amount_due(loan, paid);

        let paid_this_month = ledger
            .installments
            .iter()
            .any(|i| i.kind == InstallmentKind::PrincipalAndFee && same_month(i.date, today));
        if paid_this_month {
            return Ok(SweepDecision::Skip(SkipReason::AlreadyPaidThisMonth));
        }

        if voluntary_balance < due.total_due {
            return Ok(SweepDecision::Skip(SkipReason::InsufficientFunds));
        }

        let posting = InstallmentService::post(
            ledger,
            Some(operator),
            &PostInstallmentInput {
                date: Some(today),
                amount: Some(due.total_due),
                kind: InstallmentKind::PrincipalAndFee,
            },
            today,
        )?;
        let debit = SavingsService::sweep_debit(&loan.member, operator, today, due.total_due);

        Ok(SweepDecision::Post { debit, posting })
    }

    /// Evaluates a member's loans in order, spending the voluntary balance as it goes.
    ///
    /// `ledgers` should be sorted by origination date; each posting reduces
    /// the balance seen by the next loan.
    pub fn plan_member(
        member: &MemberNumber,
        ledgers: &[LoanLedger],
        voluntary_balance: Decimal,
        operator: StaffId,
        today: NaiveDate,
    ) -> Result<MemberSweepPlan, CoreError> {
        let mut balance = voluntary_balance;
        let mut loans = Vec::with_capacity(ledgers.len());

        for ledger in ledgers {
            let decision = Self::evaluate(ledger, balance, operator, today)?;
            if let SweepDecision::Post { posting, .. } = &decision {
                balance -= posting.installment.amount;
            }
            loans.push(LoanSweep {
                loan_id: ledger.loan.id,
                version: ledger.loan.version,
                decision,
            });
        }

        Ok(MemberSweepPlan {
            member: member.clone(),
            loans,
            opening_balance: voluntary_balance,
            closing_balance: balance,
        })
    }
}
