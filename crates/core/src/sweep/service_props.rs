//! Property-based tests for SweepService.
//!
//! - Property 1: never debits voluntary savings below zero
//! - Property 2: at most one principal+fee installment per loan per calendar month

use chrono::{Datelike, Duration, NaiveDate};
use koperasi_shared::types::{LoanId, MemberNumber, StaffId};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::service::SweepService;
use super::types::SweepDecision;
use crate::clock::same_month;
use crate::installment::InstallmentKind;
use crate::loan::{FeeCategory, Loan, LoanLedger, LoanStatus, LoanType};

/// Strategy to generate whole-rupiah amounts (1,000 to 5,000,000).
fn rupiah() -> impl Strategy<Value = Decimal> {
    (1i64..5_000i64).prop_map(|k| Decimal::from(k * 1000))
}

fn fee_category() -> impl Strategy<Value = FeeCategory> {
    prop_oneof![Just(FeeCategory::Flat), Just(FeeCategory::Declining)]
}

fn loan(principal: Decimal, installment_amount: Decimal, fee_category: FeeCategory) -> Loan {
    Loan {
        id: LoanId::new(),
        member: MemberNumber::parse("P-01").unwrap(),
        loan_type: LoanType::Regular,
        fee_category,
        admin_id: StaffId::new(),
        principal,
        installment_amount,
        rate: Some(Decimal::TWO),
        term_months: 36,
        start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        status: LoanStatus::Active,
        remaining: principal,
        fee_amount: Decimal::ZERO,
        merged_into: None,
        version: 0,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property 1 and 2: *For any* set of loans, starting balance and sequence
    /// of daily sweep runs, the voluntary balance never goes negative and no
    /// loan receives two principal+fee installments in the same month.
    #[test]
    fn prop_sweep_is_safe_over_many_days(
        loans in prop::collection::vec((rupiah(), rupiah(), fee_category()), 1..4),
        opening in rupiah(),
        top_ups in prop::collection::vec(0i64..200i64, 1..90),
    ) {
        let mut ledgers: Vec<LoanLedger> = loans
            .into_iter()
            .map(|(p, i, f)| LoanLedger::new(loan(p, i, f), vec![]))
            .collect();
        let member = ledgers[0].loan.member.clone();
        let operator = StaffId::new();
        let mut balance = opening;
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();

        for (day, top_up) in top_ups.into_iter().enumerate() {
            let today = start + Duration::days(i64::try_from(day).unwrap() * 3);
            balance += Decimal::from(top_up * 1000);

            let plan = SweepService::plan_member(&member, &ledgers, balance, operator, today).unwrap();
            prop_assert!(plan.closing_balance >= Decimal::ZERO);

            for (ledger, sweep) in ledgers.iter_mut().zip(plan.loans) {
                match sweep.decision {
                    SweepDecision::Post { debit, posting } => {
                        prop_assert_eq!(-debit.transaction.amount, posting.installment.amount);
                        ledger.installments.push(posting.installment);
                        ledger.loan.status = posting.refresh.status;
                    }
                    SweepDecision::MarkPaid(refresh) => ledger.loan.status = refresh.status,
                    SweepDecision::Skip(_) => {}
                }
            }
            balance = plan.closing_balance;
        }

        for ledger in &ledgers {
            let dates: Vec<NaiveDate> = ledger
                .installments
                .iter()
                .filter(|i| i.kind == InstallmentKind::PrincipalAndFee)
                .map(|i| i.date)
                .collect();
            for (i, a) in dates.iter().enumerate() {
                for b in &dates[i + 1..] {
                    prop_assert!(
                        !same_month(*a, *b),
                        "two postings in {}-{}", a.year(), a.month()
                    );
                }
            }
        }
    }
}
