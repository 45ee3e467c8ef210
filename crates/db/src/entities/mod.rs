//! `SeaORM` entities.
//!
//! Enum-like columns (status, type, kind) are stored as `VARCHAR` and
//! converted to core enums in `repositories::convert`.

pub mod installments;
pub mod loans;
pub mod members;
pub mod savings_history;
pub mod savings_transactions;
pub mod staff;
pub mod withdrawals;

pub mod prelude {
    //! Entity re-exports.

    pub use super::installments::Entity as Installments;
    pub use super::loans::Entity as Loans;
    pub use super::members::Entity as Members;
    pub use super::savings_history::Entity as SavingsHistory;
    pub use super::savings_transactions::Entity as SavingsTransactions;
    pub use super::staff::Entity as Staff;
    pub use super::withdrawals::Entity as Withdrawals;
}
