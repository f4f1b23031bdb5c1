//! Mapping from `sqlx` errors to `DomainError`.

use spinandsell_core::error::DomainError;

pub(crate) fn db_error(err: sqlx::Error) -> DomainError {
    tracing::error!(error = %err, "database error");
    DomainError::Infrastructure(err.to_string())
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|e| e.is_unique_violation())
}

pub(crate) fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|e| e.is_foreign_key_violation())
}

/// Name of the constraint a database error violated, if Postgres reported one.
pub(crate) fn violated_constraint(err: &sqlx::Error) -> Option<&str> {
    err.as_database_error().and_then(|e| e.constraint())
}
