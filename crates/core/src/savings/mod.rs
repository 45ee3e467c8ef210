//! Savings ledger (simpanan, penarikan and their history).
//!
//! The history log is the ledger of record: a balance is always the sum of
//! deposit entries minus the sum of withdrawal entries for one
//! (member, savings type) pair. Nothing caches it.

pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use service::{DepositPlan, SavingsService, WithdrawalPlan};
pub use types::{
    BalanceTotals, DepositInput, HistoryEntry, HistoryKind, SavingsSummary, SavingsTransaction,
    SavingsType, TypeBalance, Withdrawal, WithdrawalInput,
};
