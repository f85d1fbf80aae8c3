use sea_orm::{DbErr, RuntimeErr};
use thiserror::Error;

use crate::config::ConfigError;
use crate::dto::reset_report::DependentRows;

/// Errors surfaced by the maintenance operations
#[derive(Error, Debug)]
pub enum MaintenanceError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] DbErr),

    #[error("Console error: {0}")]
    Console(#[from] std::io::Error),

    /// Inactive-round bids did not split cleanly into preserved and purgeable.
    #[error(
        "Bid totals are inconsistent: {total} inactive bids but {preserved} preserved + {purgeable} purgeable"
    )]
    InconsistentTotals {
        total: i64,
        preserved: i64,
        purgeable: i64,
    },

    #[error("{remaining} purgeable bids remain after the delete; transaction rolled back")]
    ResidualPurgeable { remaining: i64 },

    #[error("Round reset blocked by dependent rows ({0}); cascade was not confirmed")]
    BlockedByDependents(DependentRows),

    #[error("Round identifier sequence did not reset: test insert returned id {observed}")]
    SequenceNotReset { observed: i32 },

    #[error("No identifier sequence is attached to round.id")]
    SequenceMissing,
}

pub type MaintenanceResult<T> = Result<T, MaintenanceError>;

/// Check a storage error for a Postgres foreign-key violation (23503).
pub fn is_referential_violation(err: &DbErr) -> bool {
    if matches!(
        err.sql_err(),
        Some(sea_orm::SqlErr::ForeignKeyConstraintViolation(_))
    ) {
        return true;
    }

    let runtime = match err {
        DbErr::Exec(runtime) | DbErr::Query(runtime) => runtime,
        _ => return false,
    };

    match runtime {
        RuntimeErr::SqlxError(sqlx_err) => sqlx_err
            .as_database_error()
            .and_then(|db_err| db_err.code())
            .map(|code| code == "23503")
            .unwrap_or(false),
        _ => false,
    }
}
