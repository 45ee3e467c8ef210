//! Member registry rules.

use chrono::NaiveDate;
use koperasi_shared::types::MemberNumber;

use crate::error::CoreError;
use crate::member::types::{Member, MemberStatus, MemberTotals, RegisterMemberInput};
use crate::savings::BalanceTotals;

/// Deactivation to persist for a member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deactivation {
    /// Trimmed reason.
    pub reason: String,
    /// Effective date.
    pub date: NaiveDate,
}

/// Stateless service for member registry rules.
pub struct MemberService;

impl MemberService {
    /// Validates a registration and builds the new member.
    ///
    /// `already_exists` is whether the trimmed number is already registered.
    pub fn register(
        input: &RegisterMemberInput,
        already_exists: bool,
        today: NaiveDate,
    ) -> Result<Member, CoreError> {
        let number =
            MemberNumber::parse(&input.number).ok_or(CoreError::MissingField("member number"))?;
        let name = input.name.trim();
        if name.is_empty() {
            return Err(CoreError::MissingField("name"));
        }
        if already_exists {
            return Err(CoreError::DuplicateMember(number.into_inner()));
        }

        Ok(Member {
            number,
            name: name.to_string(),
            status: MemberStatus::Active,
            joined_on: input.joined_on.unwrap_or(today),
            deactivation_reason: None,
            deactivated_on: None,
        })
    }

    /// Validates a deactivation request.
    pub fn deactivate(
        member: &Member,
        reason: &str,
        date: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Result<Deactivation, CoreError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(CoreError::MissingField("deactivation reason"));
        }
        if !member.is_active() {
            return Err(CoreError::MemberAlreadyInactive(member.number.to_string()));
        }

        Ok(Deactivation {
            reason: reason.to_string(),
            date: date.unwrap_or(today),
        })
    }

    /// Refuses deletion while any financial record references the member.
    pub fn ensure_deletable(member: &Member, record_count: u64) -> Result<(), CoreError> {
        if record_count > 0 {
            return Err(CoreError::MemberHasRecords(member.number.to_string()));
        }
        Ok(())
    }

    /// Refuses new loans and deposits for inactive members.
    pub fn ensure_active(member: &Member) -> Result<(), CoreError> {
        if member.is_active() {
            Ok(())
        } else {
            Err(CoreError::MemberInactive(member.number.to_string()))
        }
    }

    /// Folds per-type balances into the member's overall totals.
    #[must_use]
    pub fn totals<'a>(per_type: impl IntoIterator<Item = &'a BalanceTotals>) -> MemberTotals {
        let combined = per_type
            .into_iter()
            .fold(BalanceTotals::default(), |acc, t| acc.combine(t));

        MemberTotals {
            total_deposits: combined.deposits,
            total_withdrawals: combined.withdrawals,
            balance: combined.balance(),
        }
    }
}
