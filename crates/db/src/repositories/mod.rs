//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.
//! Every repository returns `koperasi_core::CoreError`.

mod convert;
mod ledger;
pub mod loan;
pub mod member;
pub mod savings;
pub mod staff;
pub mod sweep;

pub use loan::LoanRepository;
pub use member::{MemberFilter, MemberRepository};
pub use savings::SavingsRepository;
pub use staff::{CreateStaffInput, StaffRepository};
pub use sweep::SweepRepository;
