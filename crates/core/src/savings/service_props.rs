//! Property-based tests for the savings ledger.
//!
//! - Property 1: ledger balance equals an independently tracked running total
//! - Property 2: withdrawals above the balance are rejected without effect

use chrono::NaiveDate;
use koperasi_shared::types::{MemberNumber, StaffId};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::service::SavingsService;
use super::types::{BalanceTotals, DepositInput, HistoryEntry, SavingsType, WithdrawalInput};
use crate::error::CoreError;
use crate::member::{Member, MemberStatus};

/// Strategy to generate positive whole-rupiah amounts (1 to 10,000,000).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000i64).prop_map(Decimal::from)
}

/// A requested ledger operation.
#[derive(Debug, Clone)]
enum Op {
    Deposit(Decimal),
    Withdraw(Decimal),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        positive_amount().prop_map(Op::Deposit),
        positive_amount().prop_map(Op::Withdraw),
    ]
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

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property 1: *For any* interleaving of deposits and withdrawals, the
    /// balance folded from history equals the running total, and never goes
    /// negative.
    #[test]
    fn prop_balance_matches_running_total(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let member = member();
        let mut history: Vec<HistoryEntry> = Vec::new();
        let mut running = Decimal::ZERO;

        for op in ops {
            let current = BalanceTotals::from_entries(&history);
            match op {
                Op::Deposit(amount) => {
                    let input = DepositInput {
                        savings_type: SavingsType::Voluntary,
                        date: None,
                        amount,
                        social_fund: Decimal::ZERO,
                    };
                    let plan = SavingsService::deposit(&member, StaffId::new(), &input, true, today())
                        .unwrap();
                    running += amount;
                    history.push(plan.history);
                }
                Op::Withdraw(amount) => {
                    let input = WithdrawalInput { date: None, amount };
                    match SavingsService::withdraw(
                        &member,
                        SavingsType::Voluntary,
                        StaffId::new(),
                        &input,
                        current,
                        today(),
                    ) {
                        Ok(plan) => {
                            running -= amount;
                            history.push(plan.history);
                        }
                        Err(CoreError::InsufficientFunds { .. }) => {
                            prop_assert!(amount > running);
                        }
                        Err(other) => prop_assert!(false, "unexpected error: {other}"),
                    }
                }
            }

            let balance = BalanceTotals::from_entries(&history).balance();
            prop_assert_eq!(balance, running);
            prop_assert!(balance >= Decimal::ZERO);
        }
    }

    /// Property 2: *For any* balance and any amount above it, the withdrawal is
    /// rejected and reports the balance it was checked against.
    #[test]
    fn prop_overdraw_rejected(
        deposits in positive_amount(),
        excess in positive_amount(),
    ) {
        let current = BalanceTotals::new(deposits, Decimal::ZERO);
        let input = WithdrawalInput { date: None, amount: deposits + excess };

        let result = SavingsService::withdraw(
            &member(),
            SavingsType::Voluntary,
            StaffId::new(),
            &input,
            current,
            today(),
        );

        prop_assert!(
            matches!(result, Err(CoreError::InsufficientFunds { available, .. }) if available == deposits),
            "overdraw must be rejected"
        );
    }
}
