//! Mapping of store errors into the core taxonomy.

use koperasi_core::CoreError;
use sea_orm::{DbErr, RuntimeErr};

/// Postgres `serialization_failure`.
const SERIALIZATION_FAILURE: &str = "40001";
/// Postgres `deadlock_detected`.
const DEADLOCK_DETECTED: &str = "40P01";

/// Converts a `DbErr` into a `CoreError`.
///
/// Serialization failures and deadlocks become `ConcurrencyConflict` so the
/// caller retries the whole operation; everything else is `Database`.
pub(crate) fn db_err(err: DbErr) -> CoreError {
    match sqlstate(&err).as_deref() {
        Some(SERIALIZATION_FAILURE | DEADLOCK_DETECTED) => {
            CoreError::ConcurrencyConflict(err.to_string())
        }
        _ => CoreError::Database(err.to_string()),
    }
}

/// Returns true if `err` is a foreign key violation.
pub(crate) fn is_foreign_key_violation(err: &DbErr) -> bool {
    matches!(
        err.sql_err(),
        Some(sea_orm::SqlErr::ForeignKeyConstraintViolation(_))
    )
}

/// Returns true if `err` is a unique constraint violation.
pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(
        err.sql_err(),
        Some(sea_orm::SqlErr::UniqueConstraintViolation(_))
    )
}

fn sqlstate(err: &DbErr) -> Option<String> {
    match err {
        DbErr::Conn(RuntimeErr::SqlxError(e))
        | DbErr::Exec(RuntimeErr::SqlxError(e))
        | DbErr::Query(RuntimeErr::SqlxError(e)) => e
            .as_database_error()
            .and_then(|d| d.code())
            .map(std::borrow::Cow::into_owned),
        _ => None,
    }
}
