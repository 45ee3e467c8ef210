//! Core business logic for the koperasi back office.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Repositories load ledger state, hand it to the services here, and persist the
//! plans they return. Nothing in this crate reads the system clock directly or
//! touches a store.
//!
//! # Modules
//!
//! - `member` - Member registry rules and aggregate totals
//! - `savings` - Append-only savings ledger (simpanan/penarikan)
//! - `loan` - Loan record, remaining balance and fee (jasa) model
//! - `installment` - Installment (angsuran) posting
//! - `sweep` - Auto-debit of voluntary savings into loan installments
//! - `policy` - Role/action permission table
//! - `clock` - Injected "today"

pub mod clock;
pub mod error;
pub mod installment;
pub mod loan;
pub mod member;
pub mod policy;
pub mod savings;
pub mod sweep;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{CoreError, ErrorKind};
pub use policy::{Action, Actor, Role, authorize, can};
