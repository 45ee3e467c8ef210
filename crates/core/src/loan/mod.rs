//! Loan record and fee model (pinjaman).
//!
//! The remaining balance and status stored on a loan row are a cache. The
//! authoritative values are always re-derived from the count of posted
//! principal+fee installments via [`LoanService::compute_remaining`] and
//! [`LoanService::refresh_status`].

pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use service::{LoanService, MergedLoan, Origination};
pub use types::{
    CreateLoanInput, FeeCategory, Loan, LoanLedger, LoanOverview, LoanRefresh, LoanStatus,
    LoanSummary, LoanType, MemberLoans,
};
