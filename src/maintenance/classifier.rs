//! Bid classifier
//!
//! Read-only pass over bids attached to inactive rounds. Each bid is either
//! winning (its player went to the bidding team, kept as history) or losing
//! (player unallocated or allocated elsewhere, safe to purge).

use sea_orm::{AccessMode, DatabaseConnection, IsolationLevel, TransactionTrait};
use tracing::{info, warn};

use crate::dto::classification_report::{ClassificationReport, PURGEABLE_SAMPLE_LIMIT};
use crate::error::MaintenanceResult;
use crate::maintenance::store;

/// Build the classification report.
///
/// All queries run in one read-only repeatable-read transaction so the
/// counts and the listings describe the same snapshot. Any storage error
/// fails the whole report.
pub async fn classify(db: &DatabaseConnection) -> MaintenanceResult<ClassificationReport> {
    let txn = db
        .begin_with_config(
            Some(IsolationLevel::RepeatableRead),
            Some(AccessMode::ReadOnly),
        )
        .await?;

    let totals = store::inactive_bid_totals(&txn).await?;
    let preserved_listing = store::preserved_bids(&txn).await?;
    let purgeable_sample = store::purgeable_bids(&txn, Some(PURGEABLE_SAMPLE_LIMIT)).await?;

    txn.commit().await?;

    let report = ClassificationReport::new(totals, preserved_listing, purgeable_sample);

    info!(
        total = report.total_inactive_bids,
        preserved = report.preserved_bids,
        purgeable = report.purgeable_bids,
        "Classified inactive-round bids"
    );
    if !report.totals_consistent {
        warn!(
            total = report.total_inactive_bids,
            preserved = report.preserved_bids,
            purgeable = report.purgeable_bids,
            "Inactive-round bid totals do not add up"
        );
    }

    Ok(report)
}
