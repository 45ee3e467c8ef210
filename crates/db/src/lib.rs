//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - Database migrations
//! - Repositories that run the core services inside locked transactions
//!
//! Every mutating repository method follows the same shape: check the
//! permission table, open a transaction, lock the member and/or loan rows,
//! load ledger state, let `koperasi-core` decide, persist the returned plan,
//! commit. Nothing is written if any step fails.

pub mod entities;
mod error;
pub mod migration;
pub mod repositories;

pub use repositories::{
    CreateStaffInput, LoanRepository, MemberFilter, MemberRepository, SavingsRepository,
    StaffRepository, SweepRepository,
};

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Establishes a connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}

/// Establishes a pooled connection with explicit pool bounds.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect_with_pool(
    database_url: &str,
    max_connections: u32,
    min_connections: u32,
) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(database_url.to_owned());
    options
        .max_connections(max_connections)
        .min_connections(min_connections)
        .sqlx_logging(false);
    Database::connect(options).await
}
