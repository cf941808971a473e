//! Database repository implementations
//!
//! Per-aggregate SeaORM repositories + unified RepositoryProvider.

pub mod repository_provider;
pub mod service_repository;
pub mod subscription_repository;

pub use repository_provider::SeaOrmRepositoryProvider;

use sea_orm::{DbErr, RuntimeErr, SqlErr};

use crate::domain::DomainError;

/// Wrap an unclassified database failure. The detail stays in the message for
/// logging; the HTTP layer never echoes it.
pub(crate) fn storage_err(op: &'static str, e: DbErr) -> DomainError {
    DomainError::Storage(format!("{}: {}", op, e))
}

/// SQLite extended codes for a foreign key failure. `ON DELETE RESTRICT`
/// fires as a trigger constraint (1811); deferred or `NO ACTION` checks
/// report 787. `DbErr::sql_err()` only knows the latter.
const SQLITE_FOREIGN_KEY_CODES: [&str; 2] = ["787", "1811"];

/// Whether `e` is a foreign key violation on any supported backend.
pub(crate) fn is_foreign_key_violation(e: &DbErr) -> bool {
    if matches!(e.sql_err(), Some(SqlErr::ForeignKeyConstraintViolation(_))) {
        return true;
    }
    match e {
        DbErr::Exec(RuntimeErr::SqlxError(sea_orm::sqlx::Error::Database(db)))
        | DbErr::Query(RuntimeErr::SqlxError(sea_orm::sqlx::Error::Database(db))) => {
            db.code()
                .is_some_and(|code| SQLITE_FOREIGN_KEY_CODES.iter().any(|c| *c == code))
                || db.message().contains("FOREIGN KEY constraint failed")
        }
        _ => false,
    }
}
