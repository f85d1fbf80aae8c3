//! Round resetter
//!
//! Empties the round table and restarts its identifier sequence at 1. Only
//! meant for bring-up and teardown, never while an auction is running.
//!
//! Postgres refuses `TRUNCATE` on any table that other tables reference by
//! foreign key, whether or not rows exist, so the reset deletes the rows and
//! restarts the sequence explicitly. A sentinel insert afterwards checks the
//! next identifier really is 1.

use std::io::Write;

use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};
use tracing::{error, info, warn};

use crate::console::{ConfirmationSource, Prompt};
use crate::dto::reset_report::{CascadeCounts, ResetOutcome, ResetPreview};
use crate::error::{is_referential_violation, MaintenanceError, MaintenanceResult};
use crate::maintenance::{report, store};

async fn round_sequence(db: &DatabaseConnection) -> MaintenanceResult<String> {
    store::round_sequence_name(db)
        .await?
        .ok_or(MaintenanceError::SequenceMissing)
}

/// Gather what the operator must see before anything changes
pub async fn inspect(db: &DatabaseConnection) -> MaintenanceResult<ResetPreview> {
    let sequence = round_sequence(db).await?;

    Ok(ResetPreview {
        round_count: store::count_rounds(db).await?,
        sequence: store::sequence_state(db, &sequence).await?,
        dependents: store::count_dependent_rows(db).await?,
    })
}

/// What the transaction removed, before the sequence state is re-read
enum Cleared {
    EmptyTable,
    Rounds {
        deleted: u64,
        cascade: Option<CascadeCounts>,
    },
}

/// Remove all rounds in one transaction, then restart the identifier sequence.
///
/// With no rounds only the sequence is restarted. Otherwise the rounds are
/// deleted; if dependents block that, `cascade` decides between clearing
/// them too and aborting with the blocking tables listed. An abort leaves
/// every table and the sequence untouched.
pub async fn reset_round_identity(
    db: &DatabaseConnection,
    cascade: bool,
) -> MaintenanceResult<ResetOutcome> {
    let sequence = round_sequence(db).await?;
    let txn = db.begin().await?;

    let cleared = match clear_within(&txn, cascade).await {
        Ok(cleared) => {
            txn.commit().await?;
            cleared
        }
        Err(e) => {
            warn!(error = %e, "Round reset failed, rolling back");
            rollback(txn).await;
            return Err(e);
        }
    };

    // setval ignores rollback, so it only runs once the deletes are durable.
    // If it fails here the table is already empty and a rerun restarts it.
    store::restart_sequence(db, &sequence).await?;

    let state = store::sequence_state(db, &sequence).await?;
    Ok(match cleared {
        Cleared::EmptyTable => ResetOutcome::SequenceRestarted { sequence: state },
        Cleared::Rounds { deleted, cascade } => ResetOutcome::Reset {
            rounds_deleted: deleted,
            cascade,
            sequence: state,
        },
    })
}

async fn rollback(txn: DatabaseTransaction) {
    if let Err(rollback_err) = txn.rollback().await {
        error!(error = %rollback_err, "Rollback also failed");
    }
}

async fn clear_within(txn: &DatabaseTransaction, cascade: bool) -> MaintenanceResult<Cleared> {
    if store::count_rounds(txn).await? == 0 {
        info!("Round table is empty, only restarting the sequence");
        return Ok(Cleared::EmptyTable);
    }

    // Savepoint so a refused delete does not poison the outer transaction
    let attempt = txn.begin().await?;
    let (deleted, cascade_counts) = match store::delete_all_rounds(&attempt).await {
        Ok(deleted) => {
            attempt.commit().await?;
            (deleted, None)
        }
        Err(e) if is_referential_violation(&e) => {
            attempt.rollback().await?;
            if !cascade {
                let dependents = store::count_dependent_rows(txn).await?;
                return Err(MaintenanceError::BlockedByDependents(dependents));
            }

            info!("Rounds are referenced, clearing dependents first");
            let counts = store::clear_round_dependents(txn).await?;
            let deleted = store::delete_all_rounds(txn).await?;
            (deleted, Some(counts))
        }
        Err(e) => {
            attempt.rollback().await?;
            return Err(e.into());
        }
    };

    info!(rounds_deleted = deleted, cascaded = cascade_counts.is_some(), "Round table cleared");

    Ok(Cleared::Rounds {
        deleted,
        cascade: cascade_counts,
    })
}

/// Insert a sentinel round, expect identifier 1, then remove it and restart
/// the sequence again. Returns the identifier observed.
pub async fn verify_sequence_restart(db: &DatabaseConnection) -> MaintenanceResult<i32> {
    let sequence = round_sequence(db).await?;
    let txn = db.begin().await?;

    match sentinel_within(&txn).await {
        Ok(observed) => {
            txn.commit().await?;
            store::restart_sequence(db, &sequence).await?;
            info!("Sentinel insert received identifier 1, sequence verified");
            Ok(observed)
        }
        Err(e) => {
            rollback(txn).await;
            Err(e)
        }
    }
}

async fn sentinel_within(txn: &DatabaseTransaction) -> MaintenanceResult<i32> {
    let observed = store::insert_sentinel_round(txn).await?;
    if observed != 1 {
        error!(observed, "Sentinel round did not receive identifier 1");
        return Err(MaintenanceError::SequenceNotReset { observed });
    }

    store::delete_round(txn, observed).await?;
    Ok(observed)
}

/// Run the reset for explicit confirmation signals.
///
/// Without `confirmation` nothing is touched. Otherwise the table is reset
/// and the sentinel smoke test must then see identifier 1.
pub async fn reset(
    db: &DatabaseConnection,
    confirmation: bool,
    cascade_confirmation: bool,
) -> MaintenanceResult<ResetOutcome> {
    if !confirmation {
        info!("Round reset declined by operator");
        return Ok(ResetOutcome::Cancelled);
    }

    let outcome = reset_round_identity(db, cascade_confirmation).await?;
    verify_sequence_restart(db).await?;
    Ok(outcome)
}

/// The `reset-rounds` command: inspect, ask, reset, smoke test, report.
pub async fn run_reset_rounds<W: Write>(
    db: &DatabaseConnection,
    console: &mut dyn ConfirmationSource,
    out: &mut W,
) -> MaintenanceResult<ResetOutcome> {
    let preview = inspect(db).await?;
    write!(out, "{}", report::render_reset_preview(&preview))?;
    out.flush()?;

    // An empty table only needs its sequence restarted, nothing to confirm
    let confirmation = preview.round_count == 0
        || console.confirm(
            Prompt::Proceed,
            "Are you sure you want to delete all round data?",
        )?;
    let cascade_confirmation = confirmation
        && !preview.dependents.is_empty()
        && console.confirm(
            Prompt::Cascade,
            "Continue anyway? Referencing rows will be removed with the rounds (cascade)",
        )?;

    if confirmation {
        writeln!(out, "\nResetting round table...")?;
    }
    let outcome = match reset(db, confirmation, cascade_confirmation).await {
        Ok(outcome) => outcome,
        Err(MaintenanceError::BlockedByDependents(dependents)) => {
            writeln!(out, "Reset aborted, these rows still reference rounds:")?;
            write!(out, "{}", report::render_dependents(&dependents))?;
            return Err(MaintenanceError::BlockedByDependents(dependents));
        }
        Err(MaintenanceError::SequenceNotReset { observed }) => {
            writeln!(
                out,
                "Sequence did NOT reset: test insert got ID {observed} instead of 1"
            )?;
            return Err(MaintenanceError::SequenceNotReset { observed });
        }
        Err(e) => return Err(e),
    };
    write!(out, "{}", report::render_reset_outcome(&outcome))?;
    if outcome == ResetOutcome::Cancelled {
        return Ok(outcome);
    }

    writeln!(out, "Test insert got ID: 1")?;
    writeln!(out, "Test record cleaned up, sequence reset to 1")?;
    writeln!(
        out,
        "Records in round table: {}",
        store::count_rounds(db).await?
    )?;
    writeln!(out, "Round table reset complete! Next inserted round will have ID = 1")?;

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::rounds;
    use chrono::NaiveDate;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value};
    use std::collections::BTreeMap;

    fn sequence_name_row() -> BTreeMap<&'static str, Value> {
        BTreeMap::from([(
            "sequence_name",
            Some("public.round_id_seq".to_string()).into(),
        )])
    }

    fn sentinel(id: i32) -> rounds::Model {
        rounds::Model {
            id,
            position: store::SENTINEL_POSITION.to_string(),
            is_active: true,
            status: store::SENTINEL_STATUS.to_string(),
            start_time: NaiveDate::from_ymd_opt(2025, 8, 1)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
            duration: 300,
        }
    }

    #[tokio::test]
    async fn test_reset_without_confirmation_touches_nothing() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let outcome = reset(&db, false, true).await.unwrap();
        assert_eq!(outcome, ResetOutcome::Cancelled);

        assert!(db.into_transaction_log().is_empty());
    }

    #[tokio::test]
    async fn test_missing_sequence_is_reported() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![BTreeMap::from([(
                "sequence_name",
                Value::from(Option::<String>::None),
            )])]])
            .into_connection();

        let err = reset_round_identity(&db, false).await.unwrap_err();
        assert!(matches!(err, MaintenanceError::SequenceMissing));
    }

    #[tokio::test]
    async fn test_sentinel_with_wrong_id_fails() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![sequence_name_row()]])
            .append_query_results([vec![sentinel(48)]])
            .into_connection();

        let err = verify_sequence_restart(&db).await.unwrap_err();
        assert!(matches!(
            err,
            MaintenanceError::SequenceNotReset { observed: 48 }
        ));
    }

    #[tokio::test]
    async fn test_sentinel_with_first_id_is_removed() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![sequence_name_row()]])
            .append_query_results([vec![sentinel(1)]])
            .append_exec_results([
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
            ])
            .into_connection();

        assert_eq!(verify_sequence_restart(&db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_sequence_restarts_after_commit() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![sequence_name_row()]])
            .append_query_results([vec![BTreeMap::from([("num_items", Value::from(0i64))])]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .append_query_results([vec![BTreeMap::from([
                ("last_value", Value::from(1i64)),
                ("is_called", false.into()),
            ])]])
            .into_connection();

        let outcome = reset_round_identity(&db, false).await.unwrap();
        assert!(matches!(outcome, ResetOutcome::SequenceRestarted { .. }));

        let log = db.into_transaction_log();
        let statements: Vec<Vec<String>> = log
            .iter()
            .map(|txn| txn.statements().iter().map(|stmt| stmt.sql.clone()).collect())
            .collect();

        let committed = statements
            .iter()
            .position(|stmts| stmts.iter().any(|sql| sql == "COMMIT"))
            .unwrap();
        let restarted = statements
            .iter()
            .position(|stmts| stmts.iter().any(|sql| sql.contains("setval")))
            .unwrap();
        assert!(restarted > committed);
        assert!(!statements[restarted].iter().any(|sql| sql == "BEGIN"));
    }
}
