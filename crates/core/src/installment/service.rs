//! Installment posting.

use chrono::NaiveDate;
use koperasi_shared::types::{InstallmentId, StaffId, round_money};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::CoreError;
use crate::installment::types::{
    AmountDue, BatchInstallmentInput, Installment, InstallmentKind, PostInstallmentInput,
};
use crate::loan::{Loan, LoanLedger, LoanRefresh, LoanService};

/// A single installment to append and the loan state after it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Posting {
    /// The new installment.
    pub installment: Installment,
    /// Derived loan state after posting.
    pub refresh: LoanRefresh,
}

/// Installments from a multi-month payment and the loan state after them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchPosting {
    /// New installments, one per month applied.
    pub installments: Vec<Installment>,
    /// Months requested.
    pub requested: u32,
    /// Months actually applied; fewer than requested when the loan was paid off early.
    pub applied: u32,
    /// Derived loan state after the last posting.
    pub refresh: LoanRefresh,
}

/// Stateless service for installment posting.
pub struct InstallmentService;

impl InstallmentService {
    /// Amount due for the next installment after `paid_count` payments.
    ///
    /// The fee is computed on the pre-payment remaining balance. Everything
    /// is zero once the loan is paid off.
    #[must_use]
    pub fn amount_due(loan: &Loan, paid_count: u32) -> AmountDue {
        let remaining =
            LoanService::compute_remaining(loan.principal, loan.installment_amount, paid_count);
        if remaining <= Decimal::ZERO {
            return AmountDue::default();
        }

        let principal_due = loan.installment_amount;
        let fee_due = LoanService::compute_fee(loan, remaining);
        AmountDue {
            principal_due,
            fee_due,
            total_due: principal_due + fee_due,
        }
    }

    /// Validates one installment and computes the loan state after it.
    ///
    /// # Errors
    ///
    /// - `LoanPaid` / `LoanMerged` if the loan no longer accepts payments
    /// - `NonPositiveAmount` if the given (or defaulted) amount is not positive
    pub fn post(
        ledger: &LoanLedger,
        admin: Option<StaffId>,
        input: &PostInstallmentInput,
        today: NaiveDate,
    ) -> Result<Posting, CoreError> {
        let loan = &ledger.loan;
        let paid = ledger.paid_count();
        LoanService::ensure_payable(loan, paid)?;

        let due = Self::amount_due(loan, paid);
        let amount = input.amount.map_or(
            match input.kind {
                InstallmentKind::PrincipalAndFee => due.total_due,
                InstallmentKind::FeeOnly => due.fee_due,
            },
            round_money,
        );
        if amount <= Decimal::ZERO {
            return Err(CoreError::NonPositiveAmount {
                field: "amount",
                value: amount,
            });
        }

        let paid_after = match input.kind {
            InstallmentKind::PrincipalAndFee => paid + 1,
            InstallmentKind::FeeOnly => paid,
        };

        Ok(Posting {
            installment: Installment {
                id: InstallmentId::new(),
                loan_id: loan.id,
                admin_id: admin,
                date: input.date.unwrap_or(today),
                amount,
                kind: input.kind,
            },
            refresh: LoanService::refresh_status(loan, paid_after),
        })
    }

    /// Posts up to `months` principal+fee installments in one go.
    ///
    /// Stops early once the remaining balance reaches zero.
    ///
    /// # Errors
    ///
    /// - `LoanPaid` / `LoanMerged` if the loan no longer accepts payments
    /// - `InvalidMonths` if `months` is zero or exceeds the remaining term
    /// - `NonPositiveAmount` for a non-positive `amount_per_month`
    pub fn post_batch(
        ledger: &LoanLedger,
        admin: Option<StaffId>,
        input: &BatchInstallmentInput,
        today: NaiveDate,
    ) -> Result<BatchPosting, CoreError> {
        let loan = &ledger.loan;
        let paid = ledger.paid_count();
        LoanService::ensure_payable(loan, paid)?;

        let remaining_term = LoanService::remaining_term(loan, paid);
        if input.months == 0 || input.months > remaining_term {
            return Err(CoreError::InvalidMonths {
                requested: input.months,
                remaining_term,
            });
        }
        let amount_per_month = input.amount_per_month.map(round_money);
        if let Some(amount) = amount_per_month {
            if amount <= Decimal::ZERO {
                return Err(CoreError::NonPositiveAmount {
                    field: "amount_per_month",
                    value: amount,
                });
            }
        }

        let date = input.date.unwrap_or(today);
        let mut installments = Vec::new();
        let mut applied = 0;
        while applied < input.months {
            let due = Self::amount_due(loan, paid + applied);
            if due.total_due <= Decimal::ZERO {
                break;
            }
            installments.push(Installment {
                id: InstallmentId::new(),
                loan_id: loan.id,
                admin_id: admin,
                date,
                amount: amount_per_month.unwrap_or(due.total_due),
                kind: InstallmentKind::PrincipalAndFee,
            });
            applied += 1;
        }

        Ok(BatchPosting {
            installments,
            requested: input.months,
            applied,
            refresh: LoanService::refresh_status(loan, paid + applied),
        })
    }
}
