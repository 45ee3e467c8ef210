//! Staff roles and the single permission table.
//!
//! Every mutating repository operation calls [`authorize`] before touching the
//! store. Reads are open to any authenticated staff member.

use std::fmt;

use koperasi_shared::types::StaffId;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Staff role as supplied by the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System administrator.
    Admin,
    /// Chair of the cooperative.
    Ketua,
    /// Secretary.
    Sekretaris,
    /// Treasurer.
    Bendahara,
}

impl Role {
    /// Parse a role from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Some(Self::Admin),
            "ketua" => Some(Self::Ketua),
            "sekretaris" => Some(Self::Sekretaris),
            "bendahara" => Some(Self::Bendahara),
            _ => None,
        }
    }

    /// Returns the string representation of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Ketua => "ketua",
            Self::Sekretaris => "sekretaris",
            Self::Bendahara => "bendahara",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mutating actions gated by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Register, deactivate or delete members.
    ManageMembers,
    /// Originate a loan (including merges).
    CreateLoan,
    /// Post manual installments.
    PostInstallment,
    /// Record a savings deposit.
    RecordDeposit,
    /// Record a savings withdrawal.
    RecordWithdrawal,
    /// Run the voluntary-savings auto-sweep.
    RunSweep,
    /// Create or delete staff records.
    ManageStaff,
}

impl Action {
    /// Returns the string representation of the action.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ManageMembers => "manage_members",
            Self::CreateLoan => "create_loan",
            Self::PostInstallment => "post_installment",
            Self::RecordDeposit => "record_deposit",
            Self::RecordWithdrawal => "record_withdrawal",
            Self::RunSweep => "run_sweep",
            Self::ManageStaff => "manage_staff",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns true if `role` may perform `action`.
#[must_use]
pub const fn can(role: Role, action: Action) -> bool {
    use Role::{Admin, Bendahara, Ketua};

    match action {
        Action::ManageMembers => true,
        Action::CreateLoan | Action::PostInstallment | Action::RunSweep => {
            matches!(role, Admin | Ketua | Bendahara)
        }
        Action::RecordDeposit | Action::RecordWithdrawal => matches!(role, Ketua | Bendahara),
        Action::ManageStaff => matches!(role, Admin | Ketua),
    }
}

/// The staff member performing an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    /// Staff ID recorded as the administering staff.
    pub staff_id: StaffId,
    /// Role used for permission checks.
    pub role: Role,
}

impl Actor {
    /// Creates an actor.
    #[must_use]
    pub const fn new(staff_id: StaffId, role: Role) -> Self {
        Self { staff_id, role }
    }

    /// Builds an actor from an identity-provider role string.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::UnknownRole` for roles outside the four known ones.
    pub fn from_claims(staff_id: StaffId, role: &str) -> Result<Self, CoreError> {
        Role::parse(role)
            .map(|role| Self::new(staff_id, role))
            .ok_or_else(|| CoreError::UnknownRole(role.to_string()))
    }
}

/// Checks the permission table for `actor`.
///
/// # Errors
///
/// Returns `CoreError::Forbidden` if the actor's role may not perform `action`.
pub const fn authorize(actor: &Actor, action: Action) -> Result<(), CoreError> {
    if can(actor.role, action) {
        Ok(())
    } else {
        Err(CoreError::Forbidden {
            role: actor.role,
            action,
        })
    }
}
