//! Property-based tests for LoanService.
//!
//! - Property 1: remaining balance follows the installment-count formula
//! - Property 2: refresh is idempotent
//! - Property 3: merging conserves the amount owed per loan type

use chrono::NaiveDate;
use koperasi_shared::types::{InstallmentId, MemberNumber, StaffId};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::service::LoanService;
use super::types::{CreateLoanInput, FeeCategory, LoanLedger, LoanStatus, LoanType};
use crate::error::CoreError;
use crate::installment::{Installment, InstallmentKind, InstallmentService, PostInstallmentInput};
use crate::member::{Member, MemberStatus};

/// Strategy to generate whole-rupiah amounts (1,000 to 50,000,000).
fn rupiah() -> impl Strategy<Value = Decimal> {
    (1i64..50_000i64).prop_map(|k| Decimal::from(k * 1000))
}

/// Strategy to generate rates between 0.00% and 5.00%.
fn rate() -> impl Strategy<Value = Option<Decimal>> {
    prop_oneof![
        Just(None),
        (0i64..=500i64).prop_map(|bp| Some(Decimal::new(bp, 2))),
    ]
}

fn fee_category() -> impl Strategy<Value = FeeCategory> {
    prop_oneof![Just(FeeCategory::Flat), Just(FeeCategory::Declining)]
}

fn kind() -> impl Strategy<Value = InstallmentKind> {
    prop_oneof![
        4 => Just(InstallmentKind::PrincipalAndFee),
        1 => Just(InstallmentKind::FeeOnly),
    ]
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 2, 1).unwrap()
}

fn member() -> Member {
    Member {
        number: MemberNumber::parse("P-01").unwrap(),
        name: "Prop".to_string(),
        status: MemberStatus::Active,
        joined_on: today(),
        deactivation_reason: None,
        deactivated_on: None,
    }
}

fn input(
    principal: Decimal,
    installment_amount: Decimal,
    term_months: u32,
    rate: Option<Decimal>,
    fee_category: FeeCategory,
) -> CreateLoanInput {
    CreateLoanInput {
        loan_type: LoanType::Regular,
        fee_category,
        principal,
        installment_amount,
        rate,
        term_months,
        start_date: None,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property 1: *For any* loan and any sequence of postings, the derived
    /// remaining equals max(0, principal - count(principal+fee) * installment),
    /// and postings stop being accepted exactly when it reaches zero.
    #[test]
    fn prop_remaining_follows_count(
        principal in rupiah(),
        installment_amount in rupiah(),
        term in 1u32..=36,
        rate in rate(),
        fee_category in fee_category(),
        kinds in prop::collection::vec(kind(), 0..60),
    ) {
        let origination = LoanService::originate(
            &input(principal, installment_amount, term, rate, fee_category),
            &member(),
            StaffId::new(),
            &[],
            today(),
        ).unwrap();
        let mut ledger = LoanLedger::new(origination.loan, vec![]);

        for kind in kinds {
            let posting = InstallmentService::post(
                &ledger,
                None,
                &PostInstallmentInput { date: None, amount: None, kind },
                today(),
            );
            match posting {
                Ok(posting) => {
                    ledger.installments.push(posting.installment);
                    ledger.loan.status = posting.refresh.status;
                    prop_assert!(posting.refresh.remaining >= Decimal::ZERO);
                }
                Err(CoreError::LoanPaid(_)) => {
                    prop_assert_eq!(ledger.loan.status, LoanStatus::Paid);
                }
                // Fee-only postings on a zero fee have nothing to pay.
                Err(CoreError::NonPositiveAmount { .. }) => {
                    prop_assert_eq!(kind, InstallmentKind::FeeOnly);
                }
                Err(other) => prop_assert!(false, "unexpected error: {other}"),
            }

            let expected = (principal - installment_amount * Decimal::from(ledger.paid_count()))
                .max(Decimal::ZERO);
            prop_assert_eq!(LoanService::remaining(&ledger), expected);
            prop_assert_eq!(
                ledger.loan.status == LoanStatus::Paid,
                expected == Decimal::ZERO
            );
        }
    }

    /// Property 2: *For any* loan state, refreshing twice with no new
    /// installments gives the same result.
    #[test]
    fn prop_refresh_idempotent(
        principal in rupiah(),
        installment_amount in rupiah(),
        rate in rate(),
        fee_category in fee_category(),
        paid in 0u32..40,
    ) {
        let mut loan = LoanService::originate(
            &input(principal, installment_amount, 36, rate, fee_category),
            &member(),
            StaffId::new(),
            &[],
            today(),
        ).unwrap().loan;

        let first = LoanService::refresh_status(&loan, paid);
        loan.status = first.status;
        loan.remaining = first.remaining;
        let second = LoanService::refresh_status(&loan, paid);

        prop_assert_eq!(first, second);
    }

    /// Property 3: *For any* prior active loan of the same type, the new
    /// principal equals the requested principal plus the prior's derived
    /// remaining, so total owed for the type is unchanged by the merge.
    #[test]
    fn prop_merge_conserves_owed(
        prior_principal in rupiah(),
        prior_installment in rupiah(),
        prior_paid in 0usize..12,
        new_principal in rupiah(),
    ) {
        let prior_loan = LoanService::originate(
            &input(prior_principal, prior_installment, 12, None, FeeCategory::Flat),
            &member(),
            StaffId::new(),
            &[],
            today(),
        ).unwrap().loan;
        let installments = (0..prior_paid)
            .map(|_| Installment {
                id: InstallmentId::new(),
                loan_id: prior_loan.id,
                admin_id: None,
                date: today(),
                amount: prior_installment,
                kind: InstallmentKind::PrincipalAndFee,
            })
            .collect();
        let prior = LoanLedger::new(prior_loan, installments);
        let owed_before = LoanService::remaining(&prior) + new_principal;

        let origination = LoanService::originate(
            &input(new_principal, Decimal::from(1000), 12, None, FeeCategory::Flat),
            &member(),
            StaffId::new(),
            std::slice::from_ref(&prior),
            today(),
        ).unwrap();

        prop_assert_eq!(origination.loan.principal, owed_before);
        prop_assert_eq!(origination.merged.len(), 1);
        prop_assert_eq!(origination.merged[0].carried, LoanService::remaining(&prior));
    }
}
