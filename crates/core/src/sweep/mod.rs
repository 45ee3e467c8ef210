//! Auto-sweep: pay due installments from voluntary savings.
//!
//! Evaluated per loan at most once per calendar month. "Insufficient funds"
//! and "already paid this month" are expected outcomes, not errors.

pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use service::SweepService;
pub use types::{LoanSweep, MemberSweepPlan, SkipCounts, SkipReason, SweepDecision, SweepFailure, SweepReport};
