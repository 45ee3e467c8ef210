//! Loan domain types.

use std::fmt;

use chrono::NaiveDate;
use koperasi_shared::types::{LoanId, MemberNumber, StaffId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::installment::{AmountDue, Installment, InstallmentKind};

/// Loan product category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LoanType {
    /// Regular cash loan.
    #[serde(rename = "reguler")]
    Regular,
    /// Special-purpose loan.
    #[serde(rename = "khusus")]
    Special,
    /// Goods financing.
    #[serde(rename = "barang")]
    Goods,
}

impl LoanType {
    /// Returns the string representation of the loan type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Regular => "reguler",
            Self::Special => "khusus",
            Self::Goods => "barang",
        }
    }

    /// Parses a loan type from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "reguler" => Some(Self::Regular),
            "khusus" => Some(Self::Special),
            "barang" => Some(Self::Goods),
            _ => None,
        }
    }
}

impl fmt::Display for LoanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the monthly fee (jasa) is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeeCategory {
    /// Rate applied to the original principal every month.
    #[serde(rename = "flat")]
    Flat,
    /// Rate applied to the remaining balance ("turunan").
    #[serde(rename = "turunan")]
    Declining,
}

impl FeeCategory {
    /// Returns the string representation of the fee category.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Flat => "flat",
            Self::Declining => "turunan",
        }
    }

    /// Parses a fee category from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "flat" => Some(Self::Flat),
            "turunan" => Some(Self::Declining),
            _ => None,
        }
    }
}

impl fmt::Display for FeeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Loan lifecycle status.
///
/// `Merged` and `Paid` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoanStatus {
    /// Open and accepting installments.
    #[serde(rename = "aktif")]
    Active,
    /// Remaining balance carried into a newer loan of the same type.
    #[serde(rename = "digabung")]
    Merged,
    /// Fully repaid.
    #[serde(rename = "lunas")]
    Paid,
}

impl LoanStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "aktif",
            Self::Merged => "digabung",
            Self::Paid => "lunas",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "aktif" => Some(Self::Active),
            "digabung" => Some(Self::Merged),
            "lunas" => Some(Self::Paid),
            _ => None,
        }
    }

    /// Returns true for states that accept no further postings.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Merged | Self::Paid)
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A loan as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    /// Loan ID.
    pub id: LoanId,
    /// Borrowing member.
    pub member: MemberNumber,
    /// Product category.
    pub loan_type: LoanType,
    /// Fee computation mode.
    pub fee_category: FeeCategory,
    /// Issuing staff.
    pub admin_id: StaffId,
    /// Principal, including any balance carried over by a merge.
    pub principal: Decimal,
    /// Principal repaid per principal+fee installment.
    pub installment_amount: Decimal,
    /// Monthly fee rate in percent; `None` means no fee.
    pub rate: Option<Decimal>,
    /// Term in months (1..=36).
    pub term_months: u32,
    /// Origination date.
    pub start_date: NaiveDate,
    /// Cached status.
    pub status: LoanStatus,
    /// Cached remaining balance.
    pub remaining: Decimal,
    /// Whole-rupiah fee snapshot taken at origination.
    pub fee_amount: Decimal,
    /// Loan this one was merged into, when `status` is `Merged`.
    pub merged_into: Option<LoanId>,
    /// Optimistic concurrency version.
    pub version: i64,
}

/// A loan together with its full installment history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoanLedger {
    /// The loan row.
    pub loan: Loan,
    /// Every installment posted against the loan, in any order.
    pub installments: Vec<Installment>,
}

impl LoanLedger {
    /// Creates a ledger view.
    #[must_use]
    pub const fn new(loan: Loan, installments: Vec<Installment>) -> Self {
        Self { loan, installments }
    }

    /// Number of principal+fee installments posted.
    #[must_use]
    pub fn paid_count(&self) -> u32 {
        let count = self
            .installments
            .iter()
            .filter(|i| i.kind == InstallmentKind::PrincipalAndFee)
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }
}

/// Input for originating a loan.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateLoanInput {
    /// Product category.
    pub loan_type: LoanType,
    /// Fee computation mode.
    pub fee_category: FeeCategory,
    /// Principal requested.
    pub principal: Decimal,
    /// Principal repaid per installment.
    pub installment_amount: Decimal,
    /// Monthly fee rate in percent.
    #[serde(default)]
    pub rate: Option<Decimal>,
    /// Term in months.
    pub term_months: u32,
    /// Origination date; defaults to today.
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
}

/// Result of re-deriving a loan's balance from its ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoanRefresh {
    /// Remaining principal, floored at zero.
    pub remaining: Decimal,
    /// Monthly fee on the current remaining balance.
    pub fee: Decimal,
    /// Derived status.
    pub status: LoanStatus,
}

/// Read model of one loan, derived from its installment ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoanOverview {
    /// The stored loan row.
    pub loan: Loan,
    /// Derived remaining balance.
    pub remaining: Decimal,
    /// Derived monthly fee.
    pub fee: Decimal,
    /// Derived status.
    pub status: LoanStatus,
    /// What the next installment would be.
    pub amount_due: AmountDue,
    /// Principal+fee installments posted.
    pub installments_paid: u32,
    /// Months left on the term.
    pub remaining_term: u32,
}

/// A member's loans grouped for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberLoans {
    /// Owning member.
    pub member: MemberNumber,
    /// Active loans plus merged ones, flagged by their status.
    pub current: Vec<LoanOverview>,
    /// Paid loans.
    pub settled: Vec<LoanOverview>,
}

/// Outstanding balances of a member's active loans per loan type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoanSummary {
    /// Owning member.
    pub member: MemberNumber,
    /// Remaining on regular loans.
    pub regular: Decimal,
    /// Remaining on special loans.
    pub special: Decimal,
    /// Remaining on goods loans.
    pub goods: Decimal,
    /// Sum of the three.
    pub total: Decimal,
}
