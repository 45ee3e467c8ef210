//! Savings ledger rules: deposits, withdrawals, sweep debits and summaries.

use chrono::NaiveDate;
use koperasi_shared::types::{
    HistoryEntryId, MemberNumber, SavingsTransactionId, StaffId, WithdrawalId, round_money,
};
use rust_decimal::Decimal;

use crate::error::CoreError;
use crate::member::{Member, MemberService};
use crate::savings::types::{
    BalanceTotals, DepositInput, HistoryEntry, HistoryKind, SavingsSummary, SavingsTransaction,
    SavingsType, TypeBalance, Withdrawal, WithdrawalInput,
};

/// A savings transaction and its mirrored history entry, persisted together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositPlan {
    /// The transaction row.
    pub transaction: SavingsTransaction,
    /// The ledger-of-record entry.
    pub history: HistoryEntry,
}

/// A withdrawal and its mirrored history entry, persisted together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawalPlan {
    /// The withdrawal row.
    pub withdrawal: Withdrawal,
    /// The ledger-of-record entry.
    pub history: HistoryEntry,
}

/// Stateless service for the savings ledger.
pub struct SavingsService;

impl SavingsService {
    /// Whether a mandatory-periodic deposit on a date needs a social fund amount.
    ///
    /// `has_periodic_deposit_this_month` is whether the member already has a
    /// wajib deposit in the same calendar month as the new one.
    #[must_use]
    pub const fn social_fund_required(
        savings_type: SavingsType,
        has_periodic_deposit_this_month: bool,
    ) -> bool {
        matches!(savings_type, SavingsType::MandatoryPeriodic) && !has_periodic_deposit_this_month
    }

    /// Validates a deposit and builds the rows to persist.
    ///
    /// # Errors
    ///
    /// - `NonPositiveAmount` if `amount <= 0`
    /// - `NegativeSocialFund` if `social_fund < 0`
    /// - `MemberInactive` for an inactive member
    /// - `SocialFundRequired` for the first wajib deposit of the month without a social fund
    pub fn deposit(
        member: &Member,
        admin: StaffId,
        input: &DepositInput,
        has_periodic_deposit_this_month: bool,
        today: NaiveDate,
    ) -> Result<DepositPlan, CoreError> {
        let amount = round_money(input.amount);
        let social_fund = round_money(input.social_fund);
        if amount <= Decimal::ZERO {
            return Err(CoreError::NonPositiveAmount {
                field: "amount",
                value: input.amount,
            });
        }
        if social_fund < Decimal::ZERO {
            return Err(CoreError::NegativeSocialFund(social_fund));
        }
        MemberService::ensure_active(member)?;
        if Self::social_fund_required(input.savings_type, has_periodic_deposit_this_month)
            && social_fund <= Decimal::ZERO
        {
            return Err(CoreError::SocialFundRequired);
        }

        let date = input.date.unwrap_or(today);
        Ok(DepositPlan {
            transaction: SavingsTransaction {
                id: SavingsTransactionId::new(),
                member: member.number.clone(),
                savings_type: input.savings_type,
                admin_id: admin,
                date,
                amount,
                social_fund,
            },
            history: Self::history(
                &member.number,
                input.savings_type,
                date,
                HistoryKind::Deposit,
                amount,
            ),
        })
    }

    /// Validates a withdrawal against the current ledger balance.
    ///
    /// Inactive members may withdraw.
    ///
    /// # Errors
    ///
    /// - `NonPositiveAmount` if `amount <= 0`
    /// - `InsufficientFunds` if `amount` exceeds the balance in `current`
    pub fn withdraw(
        member: &Member,
        savings_type: SavingsType,
        admin: StaffId,
        input: &WithdrawalInput,
        current: BalanceTotals,
        today: NaiveDate,
    ) -> Result<WithdrawalPlan, CoreError> {
        let amount = round_money(input.amount);
        if amount <= Decimal::ZERO {
            return Err(CoreError::NonPositiveAmount {
                field: "amount",
                value: input.amount,
            });
        }
        let available = current.balance();
        if amount > available {
            return Err(CoreError::InsufficientFunds {
                available,
                requested: amount,
            });
        }

        let date = input.date.unwrap_or(today);
        Ok(WithdrawalPlan {
            withdrawal: Withdrawal {
                id: WithdrawalId::new(),
                member: member.number.clone(),
                savings_type,
                admin_id: admin,
                date,
                amount: -amount,
            },
            history: Self::history(
                &member.number,
                savings_type,
                date,
                HistoryKind::Withdrawal,
                amount,
            ),
        })
    }

    /// Builds the voluntary-savings debit that funds a swept installment.
    ///
    /// The caller has already checked `amount` against the balance.
    #[must_use]
    pub fn sweep_debit(
        member: &MemberNumber,
        operator: StaffId,
        date: NaiveDate,
        amount: Decimal,
    ) -> DepositPlan {
        DepositPlan {
            transaction: SavingsTransaction {
                id: SavingsTransactionId::new(),
                member: member.clone(),
                savings_type: SavingsType::Voluntary,
                admin_id: operator,
                date,
                amount: -amount,
                social_fund: Decimal::ZERO,
            },
            history: Self::history(
                member,
                SavingsType::Voluntary,
                date,
                HistoryKind::Withdrawal,
                amount,
            ),
        }
    }

    /// Builds the per-type summary for a member.
    ///
    /// Types missing from `per_type` are reported with zero totals.
    #[must_use]
    pub fn summarize(
        member: &MemberNumber,
        per_type: &[(SavingsType, BalanceTotals)],
        social_fund_total: Decimal,
    ) -> SavingsSummary {
        let balances: Vec<TypeBalance> = SavingsType::ALL
            .iter()
            .map(|&savings_type| {
                let totals = per_type
                    .iter()
                    .filter(|(t, _)| *t == savings_type)
                    .fold(BalanceTotals::default(), |acc, (_, t)| acc.combine(t));
                TypeBalance {
                    savings_type,
                    deposits: totals.deposits,
                    withdrawals: totals.withdrawals,
                    balance: totals.balance(),
                }
            })
            .collect();
        let total_balance = balances.iter().map(|b| b.balance).sum();

        SavingsSummary {
            member: member.clone(),
            balances,
            total_balance,
            social_fund_total,
        }
    }

    fn history(
        member: &MemberNumber,
        savings_type: SavingsType,
        date: NaiveDate,
        kind: HistoryKind,
        amount: Decimal,
    ) -> HistoryEntry {
        HistoryEntry {
            id: HistoryEntryId::new(),
            member: member.clone(),
            savings_type,
            date,
            kind,
            amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::member::MemberStatus;
    use rust_decimal_macros::dec;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 10).unwrap()
    }

    fn member(status: MemberStatus) -> Member {
        Member {
            number: MemberNumber::parse("A-001").unwrap(),
            name: "Siti".to_string(),
            status,
            joined_on: today(),
            deactivation_reason: None,
            deactivated_on: None,
        }
    }

    fn deposit_input(savings_type: SavingsType, amount: Decimal, social_fund: Decimal) -> DepositInput {
        DepositInput {
            savings_type,
            date: None,
            amount,
            social_fund,
        }
    }

    #[test]
    fn test_deposit_mirrors_history() {
        let admin = StaffId::new();
        let plan = SavingsService::deposit(
            &member(MemberStatus::Active),
            admin,
            &deposit_input(SavingsType::Voluntary, dec!(150000), dec!(0)),
            false,
            today(),
        )
        .unwrap();

        assert_eq!(plan.transaction.amount, dec!(150000));
        assert_eq!(plan.transaction.admin_id, admin);
        assert_eq!(plan.transaction.date, today());
        assert_eq!(plan.history.kind, HistoryKind::Deposit);
        assert_eq!(plan.history.amount, dec!(150000));
        assert_eq!(plan.history.savings_type, SavingsType::Voluntary);
    }

    #[test]
    fn test_deposit_rejects_non_positive() {
        for amount in [dec!(0), dec!(-10)] {
            let result = SavingsService::deposit(
                &member(MemberStatus::Active),
                StaffId::new(),
                &deposit_input(SavingsType::Voluntary, amount, dec!(0)),
                false,
                today(),
            );
            assert!(matches!(result, Err(CoreError::NonPositiveAmount { .. })));
        }
    }

    #[test]
    fn test_sub_cent_amounts_are_rejected_after_rounding() {
        let deposit = SavingsService::deposit(
            &member(MemberStatus::Active),
            StaffId::new(),
            &deposit_input(SavingsType::Voluntary, dec!(0.004), dec!(0)),
            false,
            today(),
        );
        assert!(matches!(deposit, Err(CoreError::NonPositiveAmount { .. })));

        let withdrawal = SavingsService::withdraw(
            &member(MemberStatus::Active),
            SavingsType::Voluntary,
            StaffId::new(),
            &WithdrawalInput {
                date: None,
                amount: dec!(0.004),
            },
            BalanceTotals::new(dec!(1000), dec!(0)),
            today(),
        );
        assert!(matches!(withdrawal, Err(CoreError::NonPositiveAmount { .. })));
    }

    #[test]
    fn test_deposit_stores_cents() {
        let plan = SavingsService::deposit(
            &member(MemberStatus::Active),
            StaffId::new(),
            &deposit_input(SavingsType::Voluntary, dec!(1500.126), dec!(0)),
            false,
            today(),
        )
        .unwrap();
        assert_eq!(plan.transaction.amount, dec!(1500.13));
        assert_eq!(plan.history.amount, dec!(1500.13));
    }

    #[test]
    fn test_deposit_rejects_inactive_member() {
        let result = SavingsService::deposit(
            &member(MemberStatus::Inactive),
            StaffId::new(),
            &deposit_input(SavingsType::Voluntary, dec!(1000), dec!(0)),
            false,
            today(),
        );
        assert!(matches!(result, Err(CoreError::MemberInactive(_))));
    }

    #[test]
    fn test_first_wajib_of_month_needs_social_fund() {
        let m = member(MemberStatus::Active);
        let without = deposit_input(SavingsType::MandatoryPeriodic, dec!(50000), dec!(0));
        let with = deposit_input(SavingsType::MandatoryPeriodic, dec!(50000), dec!(5000));

        assert!(matches!(
            SavingsService::deposit(&m, StaffId::new(), &without, false, today()),
            Err(CoreError::SocialFundRequired)
        ));
        assert!(SavingsService::deposit(&m, StaffId::new(), &with, false, today()).is_ok());
        // Second wajib deposit of the month needs none.
        assert!(SavingsService::deposit(&m, StaffId::new(), &without, true, today()).is_ok());
        // Other types never need one.
        let pokok = deposit_input(SavingsType::MandatoryPrincipal, dec!(100000), dec!(0));
        assert!(SavingsService::deposit(&m, StaffId::new(), &pokok, false, today()).is_ok());
    }

    #[test]
    fn test_negative_social_fund_rejected() {
        let result = SavingsService::deposit(
            &member(MemberStatus::Active),
            StaffId::new(),
            &deposit_input(SavingsType::Voluntary, dec!(1000), dec!(-1)),
            true,
            today(),
        );
        assert!(matches!(result, Err(CoreError::NegativeSocialFund(_))));
    }

    #[test]
    fn test_withdraw_up_to_balance() {
        let current = BalanceTotals::new(dec!(100000), dec!(40000));
        let input = WithdrawalInput {
            date: None,
            amount: dec!(60000),
        };

        let plan = SavingsService::withdraw(
            &member(MemberStatus::Active),
            SavingsType::Voluntary,
            StaffId::new(),
            &input,
            current,
            today(),
        )
        .unwrap();

        assert_eq!(plan.withdrawal.amount, dec!(-60000));
        assert_eq!(plan.history.kind, HistoryKind::Withdrawal);
        assert_eq!(plan.history.amount, dec!(60000));
        let after = current.with(plan.history.kind, plan.history.amount);
        assert_eq!(after.balance(), dec!(0));
    }

    #[test]
    fn test_withdraw_more_than_balance() {
        let result = SavingsService::withdraw(
            &member(MemberStatus::Active),
            SavingsType::Voluntary,
            StaffId::new(),
            &WithdrawalInput {
                date: None,
                amount: dec!(60001),
            },
            BalanceTotals::new(dec!(60000), dec!(0)),
            today(),
        );
        assert!(matches!(
            result,
            Err(CoreError::InsufficientFunds { available, requested })
                if available == dec!(60000) && requested == dec!(60001)
        ));
    }

    #[test]
    fn test_inactive_member_may_withdraw() {
        let result = SavingsService::withdraw(
            &member(MemberStatus::Inactive),
            SavingsType::MandatoryPrincipal,
            StaffId::new(),
            &WithdrawalInput {
                date: None,
                amount: dec!(100000),
            },
            BalanceTotals::new(dec!(100000), dec!(0)),
            today(),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_sweep_debit_is_negative_voluntary() {
        let number = MemberNumber::parse("A-001").unwrap();
        let plan = SavingsService::sweep_debit(&number, StaffId::new(), today(), dec!(124000));

        assert_eq!(plan.transaction.amount, dec!(-124000));
        assert_eq!(plan.transaction.savings_type, SavingsType::Voluntary);
        assert_eq!(plan.history.kind, HistoryKind::Withdrawal);
        assert_eq!(plan.history.amount, dec!(124000));
    }

    #[test]
    fn test_summarize_fills_missing_types() {
        let number = MemberNumber::parse("A-001").unwrap();
        let summary = SavingsService::summarize(
            &number,
            &[
                (SavingsType::Voluntary, BalanceTotals::new(dec!(300000), dec!(100000))),
                (SavingsType::MandatoryPrincipal, BalanceTotals::new(dec!(100000), dec!(0))),
            ],
            dec!(15000),
        );

        assert_eq!(summary.balances.len(), 3);
        assert_eq!(summary.balances[0].balance, dec!(100000));
        assert_eq!(summary.balances[1].balance, dec!(0));
        assert_eq!(summary.balances[2].balance, dec!(200000));
        assert_eq!(summary.total_balance, dec!(300000));
        assert_eq!(summary.social_fund_total, dec!(15000));
    }

    #[test]
    fn test_corrections_do_not_move_balance() {
        let totals = BalanceTotals::default()
            .with(HistoryKind::Deposit, dec!(1000))
            .with(HistoryKind::Correction, dec!(999))
            .with(HistoryKind::Withdrawal, dec!(400));
        assert_eq!(totals.balance(), dec!(600));
    }
}
