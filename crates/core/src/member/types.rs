//! Member domain types.

use std::fmt;

use chrono::NaiveDate;
use koperasi_shared::types::MemberNumber;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Membership status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemberStatus {
    /// Active member; may take loans and make deposits.
    #[serde(rename = "aktif")]
    Active,
    /// Deactivated member; may still withdraw.
    #[serde(rename = "nonaktif")]
    Inactive,
}

impl MemberStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "aktif",
            Self::Inactive => "nonaktif",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "aktif" => Some(Self::Active),
            "nonaktif" => Some(Self::Inactive),
            _ => None,
        }
    }
}

impl fmt::Display for MemberStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cooperative member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// Unique member number.
    pub number: MemberNumber,
    /// Full name.
    pub name: String,
    /// Current status.
    pub status: MemberStatus,
    /// Enrollment date.
    pub joined_on: NaiveDate,
    /// Why the member was deactivated.
    pub deactivation_reason: Option<String>,
    /// When the member was deactivated.
    pub deactivated_on: Option<NaiveDate>,
}

impl Member {
    /// Returns true if the member is active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == MemberStatus::Active
    }
}

/// Input for registering a member.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterMemberInput {
    /// Member number, trimmed before use.
    pub number: String,
    /// Full name, trimmed before use.
    pub name: String,
    /// Enrollment date; defaults to today.
    #[serde(default)]
    pub joined_on: Option<NaiveDate>,
}

/// Ledger-derived savings totals for a member across every savings type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MemberTotals {
    /// Sum of deposits.
    pub total_deposits: Decimal,
    /// Sum of withdrawals, as a positive magnitude.
    pub total_withdrawals: Decimal,
    /// Deposits minus withdrawals.
    pub balance: Decimal,
}
