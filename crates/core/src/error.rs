//! Error taxonomy shared by every koperasi operation.
//!
//! Each variant belongs to exactly one [`ErrorKind`]; the kind decides the
//! HTTP status and whether the caller may retry.

use koperasi_shared::types::{LoanId, StaffId};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::policy::{Action, Role};

/// Coarse classification of a [`CoreError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input shape or range. Nothing was mutated.
    Validation,
    /// Operation not valid for the entity's current state. Nothing was mutated.
    State,
    /// Not enough savings balance. Nothing was mutated.
    InsufficientFunds,
    /// Lost a race with another writer. Retry the whole operation.
    ConcurrencyConflict,
    /// Referenced member, loan or staff does not exist.
    NotFound,
    /// The acting role may not perform the action.
    Forbidden,
    /// Store or runtime failure.
    Infrastructure,
}

/// Errors that can occur in koperasi operations.
#[derive(Debug, Error)]
pub enum CoreError {
    // ========== Validation Errors ==========
    /// A required text field was blank after trimming.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// A money amount that must be positive was zero or negative.
    #[error("{field} must be positive, got {value}")]
    NonPositiveAmount {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected value.
        value: Decimal,
    },

    /// Social fund contribution cannot be negative.
    #[error("social fund cannot be negative, got {0}")]
    NegativeSocialFund(Decimal),

    /// Loan term outside 1..=36 months.
    #[error("term must be between 1 and 36 months, got {0}")]
    InvalidTerm(u32),

    /// Fee rate outside 0..=100 percent.
    #[error("rate must be between 0 and 100 percent, got {0}")]
    InvalidRate(Decimal),

    /// Requested installment months are zero or exceed the remaining term.
    #[error("cannot post {requested} month(s): remaining term is {remaining_term}")]
    InvalidMonths {
        /// Months requested by the caller.
        requested: u32,
        /// Months left on the loan term.
        remaining_term: u32,
    },

    /// Member number already registered.
    #[error("member {0} already exists")]
    DuplicateMember(String),

    /// First mandatory-periodic deposit of the month needs a social fund amount.
    #[error("social fund is required for the first wajib deposit of the month")]
    SocialFundRequired,

    /// Input that could not be parsed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    // ========== State Errors ==========
    /// Loan is paid off; no further postings accepted.
    #[error("loan {0} is already paid")]
    LoanPaid(LoanId),

    /// Loan was merged into a newer loan and is no longer payable.
    #[error("loan {0} was merged into another loan")]
    LoanMerged(LoanId),

    /// Member is inactive.
    #[error("member {0} is inactive")]
    MemberInactive(String),

    /// Member was already deactivated.
    #[error("member {0} is already inactive")]
    MemberAlreadyInactive(String),

    /// Member still has financial records and cannot be deleted.
    #[error("member {0} still has loans or savings records")]
    MemberHasRecords(String),

    /// Staff member is referenced by loans or savings records and cannot be deleted.
    #[error("staff {0} is referenced by loans or savings records")]
    StaffInUse(StaffId),

    // ========== Funds Errors ==========
    /// Withdrawal exceeds the ledger balance.
    #[error("insufficient funds: balance {available}, requested {requested}")]
    InsufficientFunds {
        /// Balance at authorization time.
        available: Decimal,
        /// Amount requested.
        requested: Decimal,
    },

    // ========== Concurrency Errors ==========
    /// Concurrent modification detected.
    #[error("concurrent modification of {0}, please retry")]
    ConcurrencyConflict(String),

    // ========== Not Found Errors ==========
    /// Member not found.
    #[error("member not found: {0}")]
    MemberNotFound(String),

    /// Loan not found.
    #[error("loan not found: {0}")]
    LoanNotFound(LoanId),

    /// Staff not found.
    #[error("staff not found: {0}")]
    StaffNotFound(StaffId),

    // ========== Authorization Errors ==========
    /// Role may not perform the action.
    #[error("role {role} may not {action}")]
    Forbidden {
        /// Acting role.
        role: Role,
        /// Attempted action.
        action: Action,
    },

    /// Identity carried a role string this system does not know.
    #[error("unknown role: {0}")]
    UnknownRole(String),

    // ========== Infrastructure Errors ==========
    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Returns the taxonomy kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingField(_)
            | Self::NonPositiveAmount { .. }
            | Self::NegativeSocialFund(_)
            | Self::InvalidTerm(_)
            | Self::InvalidRate(_)
            | Self::InvalidMonths { .. }
            | Self::DuplicateMember(_)
            | Self::SocialFundRequired
            | Self::InvalidInput(_) => ErrorKind::Validation,

            Self::LoanPaid(_)
            | Self::LoanMerged(_)
            | Self::MemberInactive(_)
            | Self::MemberAlreadyInactive(_)
            | Self::MemberHasRecords(_)
            | Self::StaffInUse(_) => ErrorKind::State,

            Self::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,

            Self::ConcurrencyConflict(_) => ErrorKind::ConcurrencyConflict,

            Self::MemberNotFound(_) | Self::LoanNotFound(_) | Self::StaffNotFound(_) => {
                ErrorKind::NotFound
            }

            Self::Forbidden { .. } | Self::UnknownRole(_) => ErrorKind::Forbidden,

            Self::Database(_) | Self::Internal(_) => ErrorKind::Infrastructure,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::MissingField(_) => "MISSING_FIELD",
            Self::NonPositiveAmount { .. } => "NON_POSITIVE_AMOUNT",
            Self::NegativeSocialFund(_) => "NEGATIVE_SOCIAL_FUND",
            Self::InvalidTerm(_) => "INVALID_TERM",
            Self::InvalidRate(_) => "INVALID_RATE",
            Self::InvalidMonths { .. } => "INVALID_MONTHS",
            Self::DuplicateMember(_) => "DUPLICATE_MEMBER",
            Self::SocialFundRequired => "SOCIAL_FUND_REQUIRED",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::LoanPaid(_) => "LOAN_PAID",
            Self::LoanMerged(_) => "LOAN_MERGED",
            Self::MemberInactive(_) => "MEMBER_INACTIVE",
            Self::MemberAlreadyInactive(_) => "MEMBER_ALREADY_INACTIVE",
            Self::MemberHasRecords(_) => "MEMBER_HAS_RECORDS",
            Self::StaffInUse(_) => "STAFF_IN_USE",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::ConcurrencyConflict(_) => "CONCURRENCY_CONFLICT",
            Self::MemberNotFound(_) => "MEMBER_NOT_FOUND",
            Self::LoanNotFound(_) => "LOAN_NOT_FOUND",
            Self::StaffNotFound(_) => "STAFF_NOT_FOUND",
            Self::Forbidden { .. } => "FORBIDDEN",
            Self::UnknownRole(_) => "UNKNOWN_ROLE",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::Validation => 400,
            ErrorKind::Forbidden => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::ConcurrencyConflict => 409,
            ErrorKind::State | ErrorKind::InsufficientFunds => 422,
            ErrorKind::Infrastructure => 500,
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::ConcurrencyConflict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(CoreError::InvalidTerm(40), ErrorKind::Validation, 400)]
    #[case(CoreError::SocialFundRequired, ErrorKind::Validation, 400)]
    #[case(CoreError::LoanPaid(LoanId::new()), ErrorKind::State, 422)]
    #[case(CoreError::StaffInUse(StaffId::new()), ErrorKind::State, 422)]
    #[case(
        CoreError::InsufficientFunds { available: dec!(50000), requested: dec!(60000) },
        ErrorKind::InsufficientFunds,
        422
    )]
    #[case(CoreError::ConcurrencyConflict("loan".into()), ErrorKind::ConcurrencyConflict, 409)]
    #[case(CoreError::MemberNotFound("A-1".into()), ErrorKind::NotFound, 404)]
    #[case(
        CoreError::Forbidden { role: Role::Sekretaris, action: Action::CreateLoan },
        ErrorKind::Forbidden,
        403
    )]
    #[case(CoreError::Database("down".into()), ErrorKind::Infrastructure, 500)]
    fn test_kind_and_status(
        #[case] error: CoreError,
        #[case] kind: ErrorKind,
        #[case] status: u16,
    ) {
        assert_eq!(error.kind(), kind);
        assert_eq!(error.http_status_code(), status);
    }

    #[test]
    fn test_only_conflicts_are_retryable() {
        assert!(CoreError::ConcurrencyConflict("loan".into()).is_retryable());
        assert!(!CoreError::LoanPaid(LoanId::new()).is_retryable());
        assert!(!CoreError::Database("timeout".into()).is_retryable());
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(CoreError::SocialFundRequired.error_code(), "SOCIAL_FUND_REQUIRED");
        assert_eq!(
            CoreError::InvalidMonths { requested: 5, remaining_term: 2 }.error_code(),
            "INVALID_MONTHS"
        );
        assert_eq!(
            CoreError::MemberHasRecords("A-1".into()).error_code(),
            "MEMBER_HAS_RECORDS"
        );
    }

    #[test]
    fn test_forbidden_message() {
        let err = CoreError::Forbidden {
            role: Role::Sekretaris,
            action: Action::RecordDeposit,
        };
        assert_eq!(err.to_string(), "role sekretaris may not record_deposit");
    }
}
