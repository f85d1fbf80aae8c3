//! Report formatting
//!
//! Pure rendering of the classification and reset reports for the operator
//! console. Nothing here touches the database.

use std::fmt::Write as _;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::dto::classification_report::{ClassificationReport, PurgeableBid};
use crate::dto::reset_report::{CascadeCounts, DependentRows, ResetOutcome, ResetPreview};

pub const CURRENCY_SYMBOL: &str = "£";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Render an amount with thousands separators, e.g. `£1,250,000`
pub fn format_amount(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if amount < 0 {
        format!("-{CURRENCY_SYMBOL}{grouped}")
    } else {
        format!("{CURRENCY_SYMBOL}{grouped}")
    }
}

pub fn format_timestamp(timestamp: &NaiveDateTime) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

/// Machine-readable alternate sink
pub fn render_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(value)
}

fn team_label(team_name: Option<&str>) -> &str {
    team_name.unwrap_or("<unknown team>")
}

/// Full text form of a classification report
pub fn render_classification(report: &ClassificationReport) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "=== BID HISTORY PRESERVATION ANALYSIS ===");
    let _ = writeln!(out);
    let _ = writeln!(out, "Current bid breakdown:");
    let _ = writeln!(
        out,
        "   Total bids from inactive rounds: {}",
        report.total_inactive_bids
    );
    let _ = writeln!(
        out,
        "   Bids to be PRESERVED: {} (winning bids)",
        report.preserved_bids
    );
    let _ = writeln!(
        out,
        "   Bids to be CLEANED: {} (losing bids)",
        report.purgeable_bids
    );
    if report.totals_consistent {
        let _ = writeln!(
            out,
            "   Totals match: {} = {} + {}",
            report.total_inactive_bids, report.preserved_bids, report.purgeable_bids
        );
    } else {
        let _ = writeln!(
            out,
            "   TOTALS MISMATCH: {} != {} + {} (do not purge until this is explained)",
            report.total_inactive_bids, report.preserved_bids, report.purgeable_bids
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "WINNING BIDS TO BE PRESERVED (bid history):");
    if report.preserved_listing.is_empty() {
        let _ = writeln!(out, "   (No winning bids found)");
    }
    let mut current_position: Option<&str> = None;
    let mut current_team: Option<&str> = None;
    for bid in &report.preserved_listing {
        if current_position != Some(bid.position.as_str()) {
            let _ = writeln!(out, "\n  {} Position:", bid.position);
            current_position = Some(bid.position.as_str());
            current_team = None;
        }
        if current_team != Some(bid.team_name.as_str()) {
            let _ = writeln!(out, "   Team '{}':", bid.team_name);
            current_team = Some(bid.team_name.as_str());
        }
        let _ = writeln!(
            out,
            "     - Won '{}' ({}) for {} in Round {} at {}",
            bid.player_name,
            bid.position,
            format_amount(bid.amount),
            bid.round_id,
            format_timestamp(&bid.timestamp)
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "LOSING BIDS TO BE CLEANED (examples):");
    if report.purgeable_sample.is_empty() {
        let _ = writeln!(out, "   (No losing bids found)");
    }
    for bid in &report.purgeable_sample {
        let _ = writeln!(
            out,
            "   - Team '{}' bid {} on '{}' ({}, Round {}) - {}",
            team_label(bid.team_name.as_deref()),
            format_amount(bid.amount),
            bid.player_name,
            bid.position,
            bid.round_id,
            bid.reason
        );
    }
    if report.purgeable_bids > report.purgeable_sample.len() as i64 {
        let _ = writeln!(
            out,
            "   ... and {} more",
            report.purgeable_bids - report.purgeable_sample.len() as i64
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "BID HISTORY ACCESSIBILITY AFTER CLEANUP:");
    let _ = writeln!(
        out,
        "   Teams CAN view their successful bids: {} bids preserved",
        report.preserved_bids
    );
    let _ = writeln!(
        out,
        "   Teams CANNOT view their unsuccessful bids: {} bids removed",
        report.purgeable_bids
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "RECOMMENDATION:");
    if report.purgeable_bids > 0 {
        let _ = writeln!(
            out,
            "   Consider archiving all bids to a bid history table before cleanup to keep the complete auction record"
        );
    } else {
        let _ = writeln!(
            out,
            "   Current cleanup approach is safe - no historical data loss concerns"
        );
    }

    out
}

/// Every purgeable bid, grouped by round position, followed by the deletion criteria
pub fn render_purge_preview(bids: &[PurgeableBid]) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "Found {} stale bids from inactive rounds:",
        bids.len()
    );

    let mut current_position: Option<&str> = None;
    for bid in bids {
        if current_position != Some(bid.position.as_str()) {
            let _ = writeln!(out, "\n  {} Position:", bid.position);
            current_position = Some(bid.position.as_str());
        }
        let _ = writeln!(
            out,
            "    - Bid {}: Team '{}' bid {} on '{}' (Round {}, {})",
            bid.bid_id,
            team_label(bid.team_name.as_deref()),
            format_amount(bid.amount),
            bid.player_name,
            bid.round_id,
            bid.reason
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "This will delete {} stale bids.", bids.len());
    let _ = writeln!(out, "These are bids from inactive rounds where:");
    let _ = writeln!(out, "  - Player is not allocated to anyone, OR");
    let _ = writeln!(
        out,
        "  - Player is allocated to a different team than the bidder"
    );

    out
}

pub fn render_dependents(dependents: &DependentRows) -> String {
    let mut out = String::new();
    for (table, count) in &dependents.0 {
        let _ = writeln!(out, "   - {table} rows with round_id: {count}");
    }
    out
}

pub fn render_reset_preview(preview: &ResetPreview) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "=== RESETTING ROUND TABLE ===");
    let _ = writeln!(out, "Current records in round table: {}", preview.round_count);
    let _ = writeln!(
        out,
        "Current sequence value: {} (is_called: {})",
        preview.sequence.last_value, preview.sequence.is_called
    );

    if !preview.dependents.is_empty() {
        let _ = writeln!(
            out,
            "WARNING: Found {} records in other tables referencing rounds!",
            preview.dependents.total()
        );
        out.push_str(&render_dependents(&preview.dependents));
        let _ = writeln!(
            out,
            "   These block the reset unless they are removed with it (cascade)."
        );
    }

    out
}

fn render_cascade(counts: &CascadeCounts) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "   Deleted {} team tiebreaker records",
        counts.team_tiebreakers_deleted
    );
    let _ = writeln!(
        out,
        "   Deleted {} tiebreaker records",
        counts.tiebreakers_deleted
    );
    let _ = writeln!(out, "   Deleted {} bids referencing rounds", counts.bids_deleted);
    let _ = writeln!(
        out,
        "   Updated {} players to remove round references",
        counts.players_detached
    );
    out
}

pub fn render_reset_outcome(outcome: &ResetOutcome) -> String {
    let mut out = String::new();

    match outcome {
        ResetOutcome::Cancelled => {
            let _ = writeln!(out, "Reset cancelled.");
        }
        ResetOutcome::SequenceRestarted { sequence } => {
            let _ = writeln!(out, "Table is empty, sequence restarted.");
            let _ = writeln!(
                out,
                "Sequence reset to: {} (is_called: {})",
                sequence.last_value, sequence.is_called
            );
        }
        ResetOutcome::Reset {
            rounds_deleted,
            cascade,
            sequence,
        } => {
            if let Some(counts) = cascade {
                out.push_str(&render_cascade(counts));
            }
            let _ = writeln!(out, "Deleted {rounds_deleted} rounds.");
            let _ = writeln!(
                out,
                "Sequence reset to: {} (is_called: {})",
                sequence.last_value, sequence.is_called
            );
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::classification_report::{BidTotals, PreservedBid, PurgeReason};
    use crate::dto::reset_report::SequenceState;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 8, 1)
            .unwrap()
            .and_hms_opt(hour, 30, 0)
            .unwrap()
    }

    fn preserved(team: &str, player: &str, position: &str, amount: i64) -> PreservedBid {
        PreservedBid {
            bid_id: 1,
            team_name: team.to_string(),
            player_name: player.to_string(),
            amount,
            position: position.to_string(),
            round_id: 3,
            timestamp: at(12),
        }
    }

    fn purgeable(id: i32, position: &str, reason: PurgeReason) -> PurgeableBid {
        PurgeableBid {
            bid_id: id,
            team_name: Some("Rovers".to_string()),
            player_name: "Keeper".to_string(),
            amount: 90,
            position: position.to_string(),
            round_id: 3,
            timestamp: at(13),
            reason,
        }
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0), "£0");
        assert_eq!(format_amount(100), "£100");
        assert_eq!(format_amount(1000), "£1,000");
        assert_eq!(format_amount(15000), "£15,000");
        assert_eq!(format_amount(1234567), "£1,234,567");
        assert_eq!(format_amount(-2500), "-£2,500");
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(&at(9)), "2025-08-01 09:30:00");
    }

    #[test]
    fn test_classification_groups_by_position_then_team() {
        let report = ClassificationReport::new(
            BidTotals {
                total: 4,
                preserved: 3,
                purgeable: 1,
            },
            vec![
                preserved("Athletic", "Striker", "CF", 1500),
                preserved("United", "Winger", "CF", 900),
                preserved("United", "Keeper", "GK", 100),
            ],
            vec![purgeable(9, "GK", PurgeReason::NotAllocated)],
        );

        let text = render_classification(&report);

        assert!(text.contains("Total bids from inactive rounds: 4"));
        assert!(text.contains("Totals match: 4 = 3 + 1"));
        assert_eq!(text.matches("Team 'United':").count(), 2);
        assert!(text.contains("Won 'Striker' (CF) for £1,500 in Round 3 at 2025-08-01 12:30:00"));
        assert!(text.contains("bid £90 on 'Keeper' (GK, Round 3) - player not allocated"));
        assert!(text.contains("Consider archiving"));

        let cf = text.find("CF Position:").unwrap();
        let gk = text.find("GK Position:").unwrap();
        assert!(cf < gk);
    }

    #[test]
    fn test_classification_flags_mismatch() {
        let report = ClassificationReport::new(
            BidTotals {
                total: 3,
                preserved: 1,
                purgeable: 1,
            },
            Vec::new(),
            Vec::new(),
        );

        let text = render_classification(&report);
        assert!(text.contains("TOTALS MISMATCH: 3 != 1 + 1"));
        assert!(text.contains("(No winning bids found)"));
        assert!(text.contains("... and 1 more"));
    }

    #[test]
    fn test_clean_report_recommends_nothing() {
        let report = ClassificationReport::new(
            BidTotals {
                total: 0,
                preserved: 0,
                purgeable: 0,
            },
            Vec::new(),
            Vec::new(),
        );
        let text = render_classification(&report);
        assert!(text.contains("no historical data loss concerns"));
        assert!(text.contains("(No losing bids found)"));
    }

    #[test]
    fn test_purge_preview_lists_every_bid() {
        let bids = vec![
            purgeable(4, "CF", PurgeReason::AllocatedElsewhere { team_id: 2 }),
            purgeable(5, "GK", PurgeReason::NotAllocated),
            purgeable(6, "GK", PurgeReason::NotAllocated),
        ];

        let text = render_purge_preview(&bids);
        assert!(text.starts_with("Found 3 stale bids"));
        assert!(text.contains("Bid 4: Team 'Rovers' bid £90 on 'Keeper' (Round 3, player went to team 2)"));
        assert_eq!(text.matches("GK Position:").count(), 1);
        assert!(text.contains("This will delete 3 stale bids."));
    }

    #[test]
    fn test_reset_preview_lists_dependents() {
        let preview = ResetPreview {
            round_count: 1,
            sequence: SequenceState {
                last_value: 47,
                is_called: true,
            },
            dependents: DependentRows(BTreeMap::from([
                ("bid".to_string(), 3),
                ("player".to_string(), 0),
                ("tiebreaker".to_string(), 0),
            ])),
        };

        let text = render_reset_preview(&preview);
        assert!(text.contains("Current records in round table: 1"));
        assert!(text.contains("Current sequence value: 47 (is_called: true)"));
        assert!(text.contains("Found 3 records in other tables"));
        assert!(text.contains("   - bid rows with round_id: 3"));
    }

    #[test]
    fn test_reset_outcome_text() {
        let outcome = ResetOutcome::Reset {
            rounds_deleted: 2,
            cascade: Some(CascadeCounts {
                bids_deleted: 3,
                ..Default::default()
            }),
            sequence: SequenceState {
                last_value: 1,
                is_called: false,
            },
        };
        let text = render_reset_outcome(&outcome);
        assert!(text.contains("Deleted 3 bids referencing rounds"));
        assert!(text.contains("Deleted 2 rounds."));
        assert!(text.contains("Sequence reset to: 1 (is_called: false)"));

        assert_eq!(render_reset_outcome(&ResetOutcome::Cancelled), "Reset cancelled.\n");
    }

    #[test]
    fn test_render_json_round_trips_fields() {
        let report = ClassificationReport::new(
            BidTotals {
                total: 1,
                preserved: 0,
                purgeable: 1,
            },
            Vec::new(),
            vec![purgeable(2, "GK", PurgeReason::AllocatedElsewhere { team_id: 5 })],
        );
        let json = render_json(&report).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["totals_consistent"], true);
        assert_eq!(value["purgeable_sample"][0]["reason"]["kind"], "allocated_elsewhere");
        assert_eq!(value["purgeable_sample"][0]["reason"]["team_id"], 5);
    }
}
