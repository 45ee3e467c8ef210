//! Loan service: balance derivation, fee model, origination and merge.

use chrono::NaiveDate;
use koperasi_shared::types::{LoanId, MemberNumber, StaffId, round_money, round_rupiah};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::CoreError;
use crate::installment::InstallmentService;
use crate::loan::types::{
    CreateLoanInput, FeeCategory, Loan, LoanLedger, LoanOverview, LoanRefresh, LoanStatus,
    LoanSummary, LoanType, MemberLoans,
};
use crate::member::{Member, MemberService};

/// Longest allowed loan term in months.
pub const MAX_TERM_MONTHS: u32 = 36;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// A prior active loan folded into a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MergedLoan {
    /// The prior loan.
    pub id: LoanId,
    /// Its ledger-derived remaining balance at merge time.
    pub carried: Decimal,
    /// Version read before the merge.
    pub version: i64,
}

/// Everything to persist for a new loan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Origination {
    /// The new loan.
    pub loan: Loan,
    /// Sum carried over from merged loans.
    pub carried_over: Decimal,
    /// Prior loans to transition to `Merged`.
    pub merged: Vec<MergedLoan>,
}

/// Stateless service for loan computations.
pub struct LoanService;

impl LoanService {
    /// Remaining principal after `paid_count` principal+fee installments.
    ///
    /// `max(0, principal - paid_count * installment_amount)`
    #[must_use]
    pub fn compute_remaining(principal: Decimal, installment_amount: Decimal, paid_count: u32) -> Decimal {
        let repaid = installment_amount * Decimal::from(paid_count);
        (principal - repaid).max(Decimal::ZERO)
    }

    /// Remaining principal derived from a loan's ledger.
    #[must_use]
    pub fn remaining(ledger: &LoanLedger) -> Decimal {
        Self::compute_remaining(
            ledger.loan.principal,
            ledger.loan.installment_amount,
            ledger.paid_count(),
        )
    }

    /// Monthly fee for a loan given its remaining balance.
    ///
    /// Flat loans charge on the principal, declining loans on `remaining`.
    /// No rate means no fee. Rounded to two places.
    #[must_use]
    pub fn compute_fee(loan: &Loan, remaining: Decimal) -> Decimal {
        let Some(rate) = loan.rate else {
            return Decimal::ZERO;
        };
        let base = match loan.fee_category {
            FeeCategory::Flat => loan.principal,
            FeeCategory::Declining => remaining,
        };
        round_money(base * rate / HUNDRED)
    }

    /// Re-derives remaining, fee and status from the installment count.
    ///
    /// Merged and paid are terminal. Idempotent for a fixed `paid_count`.
    #[must_use]
    pub fn refresh_status(loan: &Loan, paid_count: u32) -> LoanRefresh {
        let remaining =
            Self::compute_remaining(loan.principal, loan.installment_amount, paid_count);
        let fee = Self::compute_fee(loan, remaining);
        let status = match loan.status {
            LoanStatus::Merged => LoanStatus::Merged,
            LoanStatus::Paid => LoanStatus::Paid,
            LoanStatus::Active if remaining <= Decimal::ZERO => LoanStatus::Paid,
            LoanStatus::Active => LoanStatus::Active,
        };

        LoanRefresh {
            remaining,
            fee,
            status,
        }
    }

    /// Months left on the term.
    #[must_use]
    pub const fn remaining_term(loan: &Loan, paid_count: u32) -> u32 {
        loan.term_months.saturating_sub(paid_count)
    }

    /// Refuses postings against merged or paid-off loans.
    ///
    /// A loan whose derived remaining is zero counts as paid even if its
    /// cached status still says active.
    pub fn ensure_payable(loan: &Loan, paid_count: u32) -> Result<(), CoreError> {
        match loan.status {
            LoanStatus::Merged => return Err(CoreError::LoanMerged(loan.id)),
            LoanStatus::Paid => return Err(CoreError::LoanPaid(loan.id)),
            LoanStatus::Active => {}
        }
        if Self::compute_remaining(loan.principal, loan.installment_amount, paid_count)
            <= Decimal::ZERO
        {
            return Err(CoreError::LoanPaid(loan.id));
        }
        Ok(())
    }

    /// Validates a new loan and folds in prior active loans of the same type.
    ///
    /// `prior` may contain any of the member's loans; only active loans of
    /// the same type are merged, each carrying its ledger-derived remaining.
    ///
    /// # Errors
    ///
    /// - `InvalidTerm` if the term is outside 1..=36
    /// - `NonPositiveAmount` for a non-positive principal or installment
    /// - `InvalidRate` for a rate outside 0..=100
    /// - `MemberInactive` for an inactive member
    pub fn originate(
        input: &CreateLoanInput,
        member: &Member,
        admin: StaffId,
        prior: &[LoanLedger],
        today: NaiveDate,
    ) -> Result<Origination, CoreError> {
        if !(1..=MAX_TERM_MONTHS).contains(&input.term_months) {
            return Err(CoreError::InvalidTerm(input.term_months));
        }
        // Validate what will be stored: money and rates keep two places.
        let requested = round_money(input.principal);
        if requested <= Decimal::ZERO {
            return Err(CoreError::NonPositiveAmount {
                field: "principal",
                value: input.principal,
            });
        }
        let installment_amount = round_money(input.installment_amount);
        if installment_amount <= Decimal::ZERO {
            return Err(CoreError::NonPositiveAmount {
                field: "installment_amount",
                value: input.installment_amount,
            });
        }
        let rate = input.rate.map(round_money);
        if let Some(rate) = rate {
            if rate < Decimal::ZERO || rate > HUNDRED {
                return Err(CoreError::InvalidRate(rate));
            }
        }
        MemberService::ensure_active(member)?;

        let merged: Vec<MergedLoan> = prior
            .iter()
            .filter(|l| {
                l.loan.member == member.number
                    && l.loan.loan_type == input.loan_type
                    && l.loan.status == LoanStatus::Active
            })
            .map(|l| MergedLoan {
                id: l.loan.id,
                carried: Self::remaining(l),
                version: l.loan.version,
            })
            .collect();
        let carried_over: Decimal = merged.iter().map(|m| m.carried).sum();

        let principal = round_money(requested + carried_over);
        let fee_amount = rate.map_or(Decimal::ZERO, |rate| round_rupiah(principal * rate / HUNDRED));

        let loan = Loan {
            id: LoanId::new(),
            member: member.number.clone(),
            loan_type: input.loan_type,
            fee_category: input.fee_category,
            admin_id: admin,
            principal,
            installment_amount,
            rate,
            term_months: input.term_months,
            start_date: input.start_date.unwrap_or(today),
            status: LoanStatus::Active,
            remaining: principal,
            fee_amount,
            merged_into: None,
            version: 0,
        };

        Ok(Origination {
            loan,
            carried_over,
            merged,
        })
    }

    /// Builds the read model of a loan from its ledger, ignoring cached columns.
    #[must_use]
    pub fn overview(ledger: &LoanLedger) -> LoanOverview {
        let paid = ledger.paid_count();
        let refresh = Self::refresh_status(&ledger.loan, paid);

        LoanOverview {
            loan: ledger.loan.clone(),
            remaining: refresh.remaining,
            fee: refresh.fee,
            status: refresh.status,
            amount_due: InstallmentService::amount_due(&ledger.loan, paid),
            installments_paid: paid,
            remaining_term: Self::remaining_term(&ledger.loan, paid),
        }
    }

    /// Groups a member's loans into current (active or merged) and settled.
    ///
    /// Each group is ordered by start date, newest first.
    #[must_use]
    pub fn member_loans(member: &MemberNumber, ledgers: &[LoanLedger]) -> MemberLoans {
        let (mut settled, mut current): (Vec<_>, Vec<_>) = ledgers
            .iter()
            .map(Self::overview)
            .partition(|o| o.status == LoanStatus::Paid);
        current.sort_by(|a, b| b.loan.start_date.cmp(&a.loan.start_date));
        settled.sort_by(|a, b| b.loan.start_date.cmp(&a.loan.start_date));

        MemberLoans {
            member: member.clone(),
            current,
            settled,
        }
    }

    /// Sums derived remaining balances of active loans per loan type.
    #[must_use]
    pub fn summarize(member: &MemberNumber, ledgers: &[LoanLedger]) -> LoanSummary {
        let mut summary = LoanSummary {
            member: member.clone(),
            regular: Decimal::ZERO,
            special: Decimal::ZERO,
            goods: Decimal::ZERO,
            total: Decimal::ZERO,
        };

        for ledger in ledgers {
            let refresh = Self::refresh_status(&ledger.loan, ledger.paid_count());
            if refresh.status != LoanStatus::Active {
                continue;
            }
            match ledger.loan.loan_type {
                LoanType::Regular => summary.regular += refresh.remaining,
                LoanType::Special => summary.special += refresh.remaining,
                LoanType::Goods => summary.goods += refresh.remaining,
            }
            summary.total += refresh.remaining;
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::installment::{Installment, InstallmentKind};
    use crate::member::MemberStatus;
    use koperasi_shared::types::InstallmentId;
    use rust_decimal_macros::dec;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 10).unwrap()
    }

    fn member() -> Member {
        Member {
            number: MemberNumber::parse("A-001").unwrap(),
            name: "Siti".to_string(),
            status: MemberStatus::Active,
            joined_on: today(),
            deactivation_reason: None,
            deactivated_on: None,
        }
    }

    fn input(loan_type: LoanType, principal: Decimal) -> CreateLoanInput {
        CreateLoanInput {
            loan_type,
            fee_category: FeeCategory::Flat,
            principal,
            installment_amount: dec!(100000),
            rate: Some(dec!(2)),
            term_months: 12,
            start_date: None,
        }
    }

    fn installments(loan: &Loan, count: usize, kind: InstallmentKind) -> Vec<Installment> {
        (0..count)
            .map(|_| Installment {
                id: InstallmentId::new(),
                loan_id: loan.id,
                admin_id: None,
                date: today(),
                amount: dec!(124000),
                kind,
            })
            .collect()
    }

    fn originate(input: &CreateLoanInput, prior: &[LoanLedger]) -> Origination {
        LoanService::originate(input, &member(), StaffId::new(), prior, today()).unwrap()
    }

    #[test]
    fn test_compute_remaining_floors_at_zero() {
        assert_eq!(
            LoanService::compute_remaining(dec!(1200000), dec!(100000), 3),
            dec!(900000)
        );
        assert_eq!(
            LoanService::compute_remaining(dec!(1200000), dec!(100000), 12),
            dec!(0)
        );
        assert_eq!(
            LoanService::compute_remaining(dec!(1000000), dec!(300000), 4),
            dec!(0)
        );
    }

    #[test]
    fn test_flat_fee_scenario() {
        let loan = originate(&input(LoanType::Regular, dec!(1200000)), &[]).loan;
        let ledger = LoanLedger::new(
            loan.clone(),
            installments(&loan, 3, InstallmentKind::PrincipalAndFee),
        );

        let refresh = LoanService::refresh_status(&loan, ledger.paid_count());
        assert_eq!(refresh.remaining, dec!(900000));
        assert_eq!(refresh.status, LoanStatus::Active);
        assert_eq!(refresh.fee, dec!(24000));
    }

    #[test]
    fn test_declining_fee_uses_remaining() {
        let mut loan_input = input(LoanType::Regular, dec!(1200000));
        loan_input.fee_category = FeeCategory::Declining;
        let loan = originate(&loan_input, &[]).loan;

        assert_eq!(LoanService::compute_fee(&loan, dec!(900000)), dec!(18000));
        assert_eq!(LoanService::compute_fee(&loan, dec!(0)), dec!(0));
    }

    #[test]
    fn test_fee_without_rate_is_zero() {
        let mut loan_input = input(LoanType::Regular, dec!(1200000));
        loan_input.rate = None;
        let loan = originate(&loan_input, &[]).loan;

        assert_eq!(LoanService::compute_fee(&loan, dec!(1200000)), dec!(0));
        assert_eq!(loan.fee_amount, dec!(0));
    }

    #[test]
    fn test_fee_rounds_to_cents() {
        let mut loan_input = input(LoanType::Regular, dec!(1000001));
        loan_input.rate = Some(dec!(1.5));
        let loan = originate(&loan_input, &[]).loan;

        // 1,000,001 * 1.5% = 15,000.015
        assert_eq!(LoanService::compute_fee(&loan, dec!(0)), dec!(15000.02));
        assert_eq!(loan.fee_amount, dec!(15000));
    }

    #[test]
    fn test_paid_after_last_installment() {
        let loan = originate(&input(LoanType::Regular, dec!(1200000)), &[]).loan;

        let refresh = LoanService::refresh_status(&loan, 12);
        assert_eq!(refresh.remaining, dec!(0));
        assert_eq!(refresh.status, LoanStatus::Paid);
        assert!(matches!(
            LoanService::ensure_payable(&loan, 12),
            Err(CoreError::LoanPaid(_))
        ));
    }

    #[test]
    fn test_terminal_statuses_stick() {
        let mut loan = originate(&input(LoanType::Regular, dec!(1200000)), &[]).loan;

        loan.status = LoanStatus::Merged;
        assert_eq!(LoanService::refresh_status(&loan, 0).status, LoanStatus::Merged);
        assert!(matches!(
            LoanService::ensure_payable(&loan, 0),
            Err(CoreError::LoanMerged(_))
        ));

        loan.status = LoanStatus::Paid;
        assert_eq!(LoanService::refresh_status(&loan, 0).status, LoanStatus::Paid);
    }

    #[test]
    fn test_originate_validation() {
        let m = member();
        let cases = [
            (
                CreateLoanInput {
                    term_months: 0,
                    ..input(LoanType::Regular, dec!(1000))
                },
                "INVALID_TERM",
            ),
            (
                CreateLoanInput {
                    term_months: 37,
                    ..input(LoanType::Regular, dec!(1000))
                },
                "INVALID_TERM",
            ),
            (input(LoanType::Regular, dec!(0)), "NON_POSITIVE_AMOUNT"),
            (
                CreateLoanInput {
                    installment_amount: dec!(-1),
                    ..input(LoanType::Regular, dec!(1000))
                },
                "NON_POSITIVE_AMOUNT",
            ),
            (
                CreateLoanInput {
                    rate: Some(dec!(101)),
                    ..input(LoanType::Regular, dec!(1000))
                },
                "INVALID_RATE",
            ),
            (input(LoanType::Regular, dec!(0.004)), "NON_POSITIVE_AMOUNT"),
            (
                CreateLoanInput {
                    installment_amount: dec!(0.004),
                    ..input(LoanType::Regular, dec!(1000))
                },
                "NON_POSITIVE_AMOUNT",
            ),
        ];

        for (case, code) in cases {
            let err = LoanService::originate(&case, &m, StaffId::new(), &[], today()).unwrap_err();
            assert_eq!(err.error_code(), code);
        }
    }

    #[test]
    fn test_rate_is_stored_and_charged_at_two_places() {
        let mut loan_input = input(LoanType::Regular, dec!(1000000));
        loan_input.rate = Some(dec!(1.555));
        let loan = originate(&loan_input, &[]).loan;

        assert_eq!(loan.rate, Some(dec!(1.56)));
        assert_eq!(loan.fee_amount, dec!(15600));
        assert_eq!(LoanService::compute_fee(&loan, dec!(0)), dec!(15600));
    }

    #[test]
    fn test_sub_cent_amounts_round_before_storage() {
        let mut loan_input = input(LoanType::Regular, dec!(1000000.004));
        loan_input.installment_amount = dec!(100000.006);
        let loan = originate(&loan_input, &[]).loan;

        assert_eq!(loan.principal, dec!(1000000.00));
        assert_eq!(loan.installment_amount, dec!(100000.01));
    }

    #[test]
    fn test_originate_rejects_inactive_member() {
        let inactive = Member {
            status: MemberStatus::Inactive,
            ..member()
        };
        let result = LoanService::originate(
            &input(LoanType::Regular, dec!(1000000)),
            &inactive,
            StaffId::new(),
            &[],
            today(),
        );
        assert!(matches!(result, Err(CoreError::MemberInactive(_))));
    }

    #[test]
    fn test_merge_carries_ledger_remaining() {
        let old = originate(&input(LoanType::Regular, dec!(1200000)), &[]).loan;
        // Cached column is stale; the ledger says 4 installments were paid.
        let prior = LoanLedger::new(
            old.clone(),
            installments(&old, 4, InstallmentKind::PrincipalAndFee),
        );
        let other_type = originate(&input(LoanType::Goods, dec!(500000)), &[]).loan;
        let prior_goods = LoanLedger::new(other_type, vec![]);

        let result = originate(
            &input(LoanType::Regular, dec!(1000000)),
            &[prior, prior_goods],
        );

        assert_eq!(result.carried_over, dec!(800000));
        assert_eq!(result.loan.principal, dec!(1800000));
        assert_eq!(result.loan.remaining, dec!(1800000));
        assert_eq!(result.loan.fee_amount, dec!(36000));
        assert_eq!(result.merged.len(), 1);
        assert_eq!(result.merged[0].id, old.id);
        assert_eq!(result.merged[0].carried, dec!(800000));
    }

    #[test]
    fn test_merge_ignores_fee_only_installments() {
        let old = originate(&input(LoanType::Special, dec!(600000)), &[]).loan;
        let prior = LoanLedger::new(old.clone(), installments(&old, 2, InstallmentKind::FeeOnly));

        let result = originate(&input(LoanType::Special, dec!(400000)), &[prior]);
        assert_eq!(result.carried_over, dec!(600000));
        assert_eq!(result.loan.principal, dec!(1000000));
    }

    #[test]
    fn test_summary_and_grouping_use_ledger() {
        let number = member().number;
        let regular = originate(&input(LoanType::Regular, dec!(1200000)), &[]).loan;
        let goods = originate(&input(LoanType::Goods, dec!(300000)), &[]).loan;
        let mut merged = originate(&input(LoanType::Special, dec!(500000)), &[]).loan;
        merged.status = LoanStatus::Merged;

        let ledgers = vec![
            LoanLedger::new(
                regular.clone(),
                installments(&regular, 2, InstallmentKind::PrincipalAndFee),
            ),
            // Paid off by the ledger although the cache says active.
            LoanLedger::new(
                goods.clone(),
                installments(&goods, 3, InstallmentKind::PrincipalAndFee),
            ),
            LoanLedger::new(merged, vec![]),
        ];

        let summary = LoanService::summarize(&number, &ledgers);
        assert_eq!(summary.regular, dec!(1000000));
        assert_eq!(summary.special, dec!(0));
        assert_eq!(summary.goods, dec!(0));
        assert_eq!(summary.total, dec!(1000000));

        let grouped = LoanService::member_loans(&number, &ledgers);
        assert_eq!(grouped.current.len(), 2);
        assert_eq!(grouped.settled.len(), 1);
        assert_eq!(grouped.settled[0].loan.id, goods.id);
        assert_eq!(grouped.settled[0].status, LoanStatus::Paid);
    }

    #[test]
    fn test_overview_amount_due_and_term() {
        let loan = originate(&input(LoanType::Regular, dec!(1200000)), &[]).loan;
        let ledger = LoanLedger::new(
            loan.clone(),
            installments(&loan, 5, InstallmentKind::PrincipalAndFee),
        );

        let overview = LoanService::overview(&ledger);
        assert_eq!(overview.installments_paid, 5);
        assert_eq!(overview.remaining_term, 7);
        assert_eq!(overview.remaining, dec!(700000));
        assert_eq!(overview.amount_due.principal_due, dec!(100000));
        assert_eq!(overview.amount_due.fee_due, dec!(24000));
        assert_eq!(overview.amount_due.total_due, dec!(124000));
    }
}
