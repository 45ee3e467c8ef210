//! Sweep decision and reporting types.

use std::fmt;

use koperasi_shared::types::{LoanId, MemberNumber};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::installment::Posting;
use crate::loan::LoanRefresh;
use crate::savings::DepositPlan;

/// Why a loan was left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Loan is already paid.
    LoanPaid,
    /// Loan was merged into a newer loan.
    LoanMerged,
    /// A principal+fee installment already exists this calendar month.
    AlreadyPaidThisMonth,
    /// Voluntary balance is below the total due.
    InsufficientFunds,
}

impl SkipReason {
    /// Returns the string representation of the reason.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::LoanPaid => "loan_paid",
            Self::LoanMerged => "loan_merged",
            Self::AlreadyPaidThisMonth => "already_paid_this_month",
            Self::InsufficientFunds => "insufficient_funds",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the sweep decided for one loan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SweepDecision {
    /// Nothing to do.
    Skip(SkipReason),
    /// The ledger shows the loan paid off; persist the refreshed state only.
    MarkPaid(LoanRefresh),
    /// Debit voluntary savings and post an installment, atomically.
    Post {
        /// Voluntary-savings debit and its history entry.
        debit: DepositPlan,
        /// The installment and resulting loan state.
        posting: Posting,
    },
}

/// A decision tagged with its loan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoanSweep {
    /// Loan evaluated.
    pub loan_id: LoanId,
    /// Version read before evaluation.
    pub version: i64,
    /// The decision.
    pub decision: SweepDecision,
}

/// All decisions for one member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberSweepPlan {
    /// Member swept.
    pub member: MemberNumber,
    /// One entry per loan, in evaluation order.
    pub loans: Vec<LoanSweep>,
    /// Voluntary balance before the sweep.
    pub opening_balance: Decimal,
    /// Voluntary balance after every planned debit.
    pub closing_balance: Decimal,
}

/// Skip counters by reason.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SkipCounts {
    /// Loans already paid.
    pub loan_paid: u32,
    /// Loans merged.
    pub loan_merged: u32,
    /// Loans already paid this month.
    pub already_paid_this_month: u32,
    /// Loans without enough voluntary savings.
    pub insufficient_funds: u32,
}

/// A member whose sweep failed and was rolled back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweepFailure {
    /// Member number.
    pub member: MemberNumber,
    /// Machine error code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
}

/// Totals for a sweep run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Members evaluated.
    pub members: u32,
    /// Installments posted.
    pub posted: u32,
    /// Loans found paid off and marked so.
    pub marked_paid: u32,
    /// Loans skipped, by reason.
    pub skipped: SkipCounts,
    /// Sum debited from voluntary savings.
    pub total_debited: Decimal,
    /// Members whose sweep failed.
    pub failed: Vec<SweepFailure>,
}

impl SweepReport {
    /// Adds one committed member plan to the report.
    pub fn record(&mut self, plan: &MemberSweepPlan) {
        self.members += 1;
        for loan in &plan.loans {
            match &loan.decision {
                SweepDecision::Skip(reason) => match reason {
                    SkipReason::LoanPaid => self.skipped.loan_paid += 1,
                    SkipReason::LoanMerged => self.skipped.loan_merged += 1,
                    SkipReason::AlreadyPaidThisMonth => self.skipped.already_paid_this_month += 1,
                    SkipReason::InsufficientFunds => self.skipped.insufficient_funds += 1,
                },
                SweepDecision::MarkPaid(_) => self.marked_paid += 1,
                SweepDecision::Post { posting, .. } => {
                    self.posted += 1;
                    self.total_debited += posting.installment.amount;
                }
            }
        }
    }

    /// Records a member whose sweep failed.
    pub fn record_failure(&mut self, member: MemberNumber, code: &str, message: String) {
        self.members += 1;
        self.failed.push(SweepFailure {
            member,
            code: code.to_string(),
            message,
        });
    }

    /// Folds another report into this one.
    pub fn merge(&mut self, other: Self) {
        self.members += other.members;
        self.posted += other.posted;
        self.marked_paid += other.marked_paid;
        self.skipped.loan_paid += other.skipped.loan_paid;
        self.skipped.loan_merged += other.skipped.loan_merged;
        self.skipped.already_paid_this_month += other.skipped.already_paid_this_month;
        self.skipped.insufficient_funds += other.skipped.insufficient_funds;
        self.total_debited += other.total_debited;
        self.failed.extend(other.failed);
    }
}
