//! Purge executor
//!
//! Removes losing bids from inactive rounds once the operator has agreed.
//! Stages: idle -> confirmed -> in-progress -> verified | rolled-back.

use std::io::Write;

use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::console::{ConfirmationSource, Prompt};
use crate::error::{MaintenanceError, MaintenanceResult};
use crate::maintenance::{classifier, report, store};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurgeStage {
    Idle,
    Confirmed,
    InProgress,
    Verified,
    RolledBack,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PurgeOutcome {
    /// No losing bids on inactive rounds
    NothingToPurge,
    /// Operator declined
    Cancelled,
    Purged { deleted: u64 },
}

fn advance(stage: &mut PurgeStage, next: PurgeStage) {
    debug!(from = ?stage, to = ?next, "Purge stage transition");
    *stage = next;
}

/// Run the purge for an explicit confirmation signal.
///
/// Without confirmation nothing is touched. With it, the delete runs in
/// its own transaction via [`delete_purgeable_bids`].
pub async fn purge(db: &DatabaseConnection, confirmation: bool) -> MaintenanceResult<PurgeOutcome> {
    let mut stage = PurgeStage::Idle;

    if !confirmation {
        info!("Purge declined by operator");
        return Ok(PurgeOutcome::Cancelled);
    }
    advance(&mut stage, PurgeStage::Confirmed);

    advance(&mut stage, PurgeStage::InProgress);
    match delete_purgeable_bids(db).await {
        Ok(deleted) => {
            advance(&mut stage, PurgeStage::Verified);
            Ok(PurgeOutcome::Purged { deleted })
        }
        Err(e) => {
            advance(&mut stage, PurgeStage::RolledBack);
            Err(e)
        }
    }
}

/// Delete every purgeable bid in one transaction and return how many went.
///
/// The totals are re-checked inside the transaction since any earlier
/// report may be stale. After the delete the purgeable predicate must match
/// nothing; otherwise the transaction is rolled back.
pub async fn delete_purgeable_bids(db: &DatabaseConnection) -> MaintenanceResult<u64> {
    let txn = db.begin().await?;

    match delete_within(&txn).await {
        Ok(deleted) => {
            txn.commit().await?;
            info!(deleted, "Purged losing bids from inactive rounds");
            Ok(deleted)
        }
        Err(e) => {
            error!(error = %e, "Purge failed, rolling back");
            if let Err(rollback_err) = txn.rollback().await {
                error!(error = %rollback_err, "Rollback after failed purge also failed");
            }
            Err(e)
        }
    }
}

async fn delete_within(txn: &DatabaseTransaction) -> MaintenanceResult<u64> {
    let totals = store::inactive_bid_totals(txn).await?;
    if !totals.is_consistent() {
        return Err(MaintenanceError::InconsistentTotals {
            total: totals.total,
            preserved: totals.preserved,
            purgeable: totals.purgeable,
        });
    }

    let deleted = store::delete_purgeable(txn).await?;

    let remaining = store::count_purgeable(txn).await?;
    if remaining != 0 {
        return Err(MaintenanceError::ResidualPurgeable { remaining });
    }

    Ok(deleted)
}

/// The `purge` command: classify, preview, ask, delete, verify.
pub async fn run_purge<W: Write>(
    db: &DatabaseConnection,
    console: &mut dyn ConfirmationSource,
    out: &mut W,
) -> MaintenanceResult<PurgeOutcome> {
    writeln!(out, "=== CLEANING UP STALE BIDS ===")?;

    let classification = classifier::classify(db).await?;
    if !classification.totals_consistent {
        writeln!(out, "{}", report::render_classification(&classification))?;
        let totals = classification.totals();
        return Err(MaintenanceError::InconsistentTotals {
            total: totals.total,
            preserved: totals.preserved,
            purgeable: totals.purgeable,
        });
    }

    if classification.purgeable_bids == 0 {
        writeln!(out, "No stale bids found - database is clean!")?;
        return Ok(PurgeOutcome::NothingToPurge);
    }

    let stale = store::purgeable_bids(db, None).await?;
    writeln!(out, "{}", report::render_purge_preview(&stale))?;
    writeln!(
        out,
        "{} winning bids stay as bid history.",
        classification.preserved_bids
    )?;
    writeln!(
        out,
        "This cleanup prevents old bids from showing in new round interfaces."
    )?;
    out.flush()?;

    let confirmation = console.confirm(Prompt::Proceed, "\nProceed with cleanup?")?;
    let outcome = purge(db, confirmation).await?;

    match outcome {
        PurgeOutcome::Cancelled => {
            writeln!(out, "Cleanup cancelled.")?;
        }
        PurgeOutcome::Purged { deleted } => {
            writeln!(out, "Successfully deleted {deleted} stale bids!")?;
            let remaining = store::count_purgeable(db).await?;
            writeln!(
                out,
                "Verification: {remaining} stale bids remaining"
            )?;
        }
        PurgeOutcome::NothingToPurge => {}
    }

    Ok(outcome)
}
