//! Savings domain types.

use std::fmt;

use chrono::NaiveDate;
use koperasi_shared::types::{
    HistoryEntryId, MemberNumber, SavingsTransactionId, StaffId, WithdrawalId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Savings account type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SavingsType {
    /// Simpanan pokok: one-off mandatory contribution at enrollment.
    #[serde(rename = "pokok")]
    MandatoryPrincipal,
    /// Simpanan wajib: mandatory periodic contribution.
    #[serde(rename = "wajib")]
    MandatoryPeriodic,
    /// Simpanan sukarela: voluntary savings, the source for auto-sweep.
    #[serde(rename = "sukarela")]
    Voluntary,
}

impl SavingsType {
    /// All savings types in display order.
    pub const ALL: [Self; 3] = [
        Self::MandatoryPrincipal,
        Self::MandatoryPeriodic,
        Self::Voluntary,
    ];

    /// Returns the string representation of the savings type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MandatoryPrincipal => "pokok",
            Self::MandatoryPeriodic => "wajib",
            Self::Voluntary => "sukarela",
        }
    }

    /// Parses a savings type from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pokok" => Some(Self::MandatoryPrincipal),
            "wajib" => Some(Self::MandatoryPeriodic),
            "sukarela" => Some(Self::Voluntary),
            _ => None,
        }
    }
}

impl fmt::Display for SavingsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of a savings history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HistoryKind {
    /// Money in.
    #[serde(rename = "setor")]
    Deposit,
    /// Money out.
    #[serde(rename = "tarik")]
    Withdrawal,
    /// Manual correction; not part of the balance formula.
    #[serde(rename = "koreksi")]
    Correction,
}

impl HistoryKind {
    /// Returns the string representation of the kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Deposit => "setor",
            Self::Withdrawal => "tarik",
            Self::Correction => "koreksi",
        }
    }

    /// Parses a kind from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "setor" => Some(Self::Deposit),
            "tarik" => Some(Self::Withdrawal),
            "koreksi" => Some(Self::Correction),
            _ => None,
        }
    }
}

impl fmt::Display for HistoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of the savings ledger of record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Entry ID.
    pub id: HistoryEntryId,
    /// Owning member.
    pub member: MemberNumber,
    /// Savings type.
    pub savings_type: SavingsType,
    /// Value date.
    pub date: NaiveDate,
    /// Entry kind.
    pub kind: HistoryKind,
    /// Unsigned magnitude.
    pub amount: Decimal,
}

/// A deposit, or a sweep debit when `amount` is negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavingsTransaction {
    /// Transaction ID.
    pub id: SavingsTransactionId,
    /// Owning member.
    pub member: MemberNumber,
    /// Savings type.
    pub savings_type: SavingsType,
    /// Administering staff.
    pub admin_id: StaffId,
    /// Value date.
    pub date: NaiveDate,
    /// Signed amount: positive deposit, negative debit.
    pub amount: Decimal,
    /// Social fund (dana sosial) paid alongside.
    pub social_fund: Decimal,
}

/// A withdrawal (penarikan).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Withdrawal {
    /// Withdrawal ID.
    pub id: WithdrawalId,
    /// Owning member.
    pub member: MemberNumber,
    /// Savings type.
    pub savings_type: SavingsType,
    /// Administering staff.
    pub admin_id: StaffId,
    /// Value date.
    pub date: NaiveDate,
    /// Signed amount, always negative.
    pub amount: Decimal,
}

/// Input for a deposit.
#[derive(Debug, Clone, Deserialize)]
pub struct DepositInput {
    /// Savings type.
    pub savings_type: SavingsType,
    /// Value date; defaults to today.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Amount deposited.
    pub amount: Decimal,
    /// Social fund paid alongside.
    #[serde(default)]
    pub social_fund: Decimal,
}

/// Input for a withdrawal.
#[derive(Debug, Clone, Deserialize)]
pub struct WithdrawalInput {
    /// Value date; defaults to today.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Amount withdrawn, as a positive number.
    pub amount: Decimal,
}

/// Deposit and withdrawal sums for one (member, savings type) pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceTotals {
    /// Sum of deposit entries.
    pub deposits: Decimal,
    /// Sum of withdrawal entries.
    pub withdrawals: Decimal,
}

impl BalanceTotals {
    /// Creates totals from the two sums.
    #[must_use]
    pub const fn new(deposits: Decimal, withdrawals: Decimal) -> Self {
        Self {
            deposits,
            withdrawals,
        }
    }

    /// Folds history entries into totals. Corrections are ignored.
    #[must_use]
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a HistoryEntry>) -> Self {
        entries
            .into_iter()
            .fold(Self::default(), |acc, entry| acc.with(entry.kind, entry.amount))
    }

    /// Adds one entry of `kind` to the totals.
    #[must_use]
    pub fn with(self, kind: HistoryKind, amount: Decimal) -> Self {
        match kind {
            HistoryKind::Deposit => Self::new(self.deposits + amount, self.withdrawals),
            HistoryKind::Withdrawal => Self::new(self.deposits, self.withdrawals + amount),
            HistoryKind::Correction => self,
        }
    }

    /// Sums two sets of totals.
    #[must_use]
    pub fn combine(self, other: &Self) -> Self {
        Self::new(
            self.deposits + other.deposits,
            self.withdrawals + other.withdrawals,
        )
    }

    /// The balance: deposits minus withdrawals.
    #[must_use]
    pub fn balance(&self) -> Decimal {
        self.deposits - self.withdrawals
    }
}

/// Balance of one savings type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TypeBalance {
    /// Savings type.
    pub savings_type: SavingsType,
    /// Sum of deposits.
    pub deposits: Decimal,
    /// Sum of withdrawals.
    pub withdrawals: Decimal,
    /// Deposits minus withdrawals.
    pub balance: Decimal,
}

/// Per-type savings overview for one member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavingsSummary {
    /// Owning member.
    pub member: MemberNumber,
    /// One line per savings type, in [`SavingsType::ALL`] order.
    pub balances: Vec<TypeBalance>,
    /// Sum of all balances.
    pub total_balance: Decimal,
    /// Sum of social fund paid with deposits.
    pub social_fund_total: Decimal,
}
