//! Installment engine (angsuran).
//!
//! Installments are append-only. Only the count of principal+fee installments
//! moves a loan's remaining balance; dates matter for display and for the
//! sweep's once-per-month guard.

pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use service::{BatchPosting, InstallmentService, Posting};
pub use types::{
    AmountDue, BatchInstallmentInput, Installment, InstallmentKind, PostInstallmentInput,
};
