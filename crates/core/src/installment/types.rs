//! Installment domain types.

use std::fmt;

use chrono::NaiveDate;
use koperasi_shared::types::{InstallmentId, LoanId, StaffId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// What an installment pays for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstallmentKind {
    /// Principal plus fee ("cicilan"); reduces the remaining balance.
    #[serde(rename = "cicilan")]
    PrincipalAndFee,
    /// Fee only ("jasa"); leaves the remaining balance unchanged.
    #[serde(rename = "jasa")]
    FeeOnly,
}

impl InstallmentKind {
    /// Returns the string representation of the kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PrincipalAndFee => "cicilan",
            Self::FeeOnly => "jasa",
        }
    }

    /// Parses a kind from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "cicilan" => Some(Self::PrincipalAndFee),
            "jasa" => Some(Self::FeeOnly),
            _ => None,
        }
    }
}

impl fmt::Display for InstallmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One posted payment against a loan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Installment {
    /// Installment ID.
    pub id: InstallmentId,
    /// Loan paid.
    pub loan_id: LoanId,
    /// Administering staff; `None` once the staff record is deleted.
    pub admin_id: Option<StaffId>,
    /// Payment date.
    pub date: NaiveDate,
    /// Amount paid.
    pub amount: Decimal,
    /// Payment kind.
    pub kind: InstallmentKind,
}

/// Amount due for the next installment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmountDue {
    /// Principal portion.
    pub principal_due: Decimal,
    /// Fee portion.
    pub fee_due: Decimal,
    /// Sum of both.
    pub total_due: Decimal,
}

/// Input for a single manual installment.
#[derive(Debug, Clone, Deserialize)]
pub struct PostInstallmentInput {
    /// Payment date; defaults to today.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Amount paid; defaults to what is due for `kind`.
    #[serde(default)]
    pub amount: Option<Decimal>,
    /// Payment kind.
    pub kind: InstallmentKind,
}

/// Input for paying several months at once.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchInstallmentInput {
    /// Payment date; defaults to today.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Months to pay.
    pub months: u32,
    /// Amount recorded per month; defaults to each month's total due.
    #[serde(default)]
    pub amount_per_month: Option<Decimal>,
}
