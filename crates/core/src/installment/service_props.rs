//! Property-based tests for InstallmentService.
//!
//! - Property 1: batch posting applies min(months, installments left) and never overpays
//! - Property 2: posting order does not change the derived balance

use chrono::NaiveDate;
use koperasi_shared::types::{LoanId, MemberNumber, StaffId};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::service::InstallmentService;
use super::types::{BatchInstallmentInput, InstallmentKind, PostInstallmentInput};
use crate::loan::{FeeCategory, Loan, LoanLedger, LoanService, LoanStatus, LoanType};

/// Strategy to generate whole-rupiah amounts (1,000 to 20,000,000).
fn rupiah() -> impl Strategy<Value = Decimal> {
    (1i64..20_000i64).prop_map(|k| Decimal::from(k * 1000))
}

fn date() -> impl Strategy<Value = NaiveDate> {
    (1u32..=12, 1u32..=28)
        .prop_map(|(m, d)| NaiveDate::from_ymd_opt(2025, m, d).unwrap())
}

fn loan(principal: Decimal, installment_amount: Decimal, term_months: u32) -> Loan {
    Loan {
        id: LoanId::new(),
        member: MemberNumber::parse("P-01").unwrap(),
        loan_type: LoanType::Goods,
        fee_category: FeeCategory::Declining,
        admin_id: StaffId::new(),
        principal,
        installment_amount,
        rate: Some(Decimal::ONE),
        term_months,
        start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        status: LoanStatus::Active,
        remaining: principal,
        fee_amount: Decimal::ZERO,
        merged_into: None,
        version: 0,
    }
}

/// Installments needed to pay `principal` off.
fn installments_to_pay(principal: Decimal, installment_amount: Decimal) -> u32 {
    let mut count = 0u32;
    while principal - installment_amount * Decimal::from(count) > Decimal::ZERO {
        count += 1;
    }
    count
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property 1: *For any* loan and months within the term, the batch
    /// applies exactly min(months, installments left to pay) and the derived
    /// remaining never goes negative.
    #[test]
    fn prop_batch_applies_until_paid(
        principal in rupiah(),
        installment_amount in rupiah(),
        term in 1u32..=36,
        months_seed in 1u32..=36,
    ) {
        let ledger = LoanLedger::new(loan(principal, installment_amount, term), vec![]);
        let months = months_seed.min(term);

        let batch = InstallmentService::post_batch(
            &ledger,
            None,
            &BatchInstallmentInput { date: None, months, amount_per_month: None },
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
        ).unwrap();

        let expected = months.min(installments_to_pay(principal, installment_amount));
        prop_assert_eq!(batch.applied, expected);
        prop_assert_eq!(batch.installments.len(), expected as usize);
        prop_assert!(batch.refresh.remaining >= Decimal::ZERO);
        prop_assert_eq!(
            batch.refresh.status == LoanStatus::Paid,
            batch.refresh.remaining == Decimal::ZERO
        );
    }

    /// Property 2: *For any* set of posting dates, reversing the order of the
    /// installment history leaves the derived remaining unchanged.
    #[test]
    fn prop_balance_independent_of_order(
        principal in rupiah(),
        installment_amount in rupiah(),
        dates in prop::collection::vec(date(), 1..12),
    ) {
        let mut ledger = LoanLedger::new(loan(principal, installment_amount, 36), vec![]);
        for d in dates {
            let input = PostInstallmentInput {
                date: Some(d),
                amount: None,
                kind: InstallmentKind::PrincipalAndFee,
            };
            let Ok(posting) = InstallmentService::post(&ledger, None, &input, d) else {
                break;
            };
            ledger.installments.push(posting.installment);
            ledger.loan.status = posting.refresh.status;
        }

        let forward = LoanService::remaining(&ledger);
        ledger.installments.reverse();
        prop_assert_eq!(LoanService::remaining(&ledger), forward);
    }
}
