use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Counts over bids attached to inactive rounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidTotals {
    pub total: i64,
    pub preserved: i64,
    pub purgeable: i64,
}

impl BidTotals {
    /// Every inactive-round bid must land in exactly one of the two sets
    pub fn is_consistent(&self) -> bool {
        self.total == self.preserved + self.purgeable
    }
}

/// Why a bid is losing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PurgeReason {
    NotAllocated,
    AllocatedElsewhere { team_id: i32 },
}

impl PurgeReason {
    /// Derive the reason from the target player's assigned team
    pub fn from_assigned_team(player_team_id: Option<i32>) -> Self {
        match player_team_id {
            None => PurgeReason::NotAllocated,
            Some(team_id) => PurgeReason::AllocatedElsewhere { team_id },
        }
    }
}

impl fmt::Display for PurgeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PurgeReason::NotAllocated => write!(f, "player not allocated"),
            PurgeReason::AllocatedElsewhere { team_id } => {
                write!(f, "player went to team {team_id}")
            }
        }
    }
}

/// A winning bid kept as auction history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreservedBid {
    pub bid_id: i32,
    pub team_name: String,
    pub player_name: String,
    pub amount: i64,
    pub position: String,
    pub round_id: i32,
    pub timestamp: NaiveDateTime,
}

/// A losing bid that cleanup would remove
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurgeableBid {
    pub bid_id: i32,
    /// None only if the bidding team row has gone missing
    pub team_name: Option<String>,
    pub player_name: String,
    pub amount: i64,
    pub position: String,
    pub round_id: i32,
    pub timestamp: NaiveDateTime,
    pub reason: PurgeReason,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub total_inactive_bids: i64,
    pub preserved_bids: i64,
    pub purgeable_bids: i64,
    /// Ordered by round position, team name, then bid timestamp
    pub preserved_listing: Vec<PreservedBid>,
    /// At most [`PURGEABLE_SAMPLE_LIMIT`] entries
    pub purgeable_sample: Vec<PurgeableBid>,
    pub totals_consistent: bool,
}

pub const PURGEABLE_SAMPLE_LIMIT: u64 = 10;

impl ClassificationReport {
    pub fn new(
        totals: BidTotals,
        preserved_listing: Vec<PreservedBid>,
        purgeable_sample: Vec<PurgeableBid>,
    ) -> Self {
        Self {
            total_inactive_bids: totals.total,
            preserved_bids: totals.preserved,
            purgeable_bids: totals.purgeable,
            preserved_listing,
            purgeable_sample,
            totals_consistent: totals.is_consistent(),
        }
    }

    pub fn totals(&self) -> BidTotals {
        BidTotals {
            total: self.total_inactive_bids,
            preserved: self.preserved_bids,
            purgeable: self.purgeable_bids,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_totals_consistency() {
        let totals = BidTotals {
            total: 3,
            preserved: 1,
            purgeable: 2,
        };
        assert!(totals.is_consistent());

        let totals = BidTotals {
            total: 4,
            preserved: 1,
            purgeable: 2,
        };
        assert!(!totals.is_consistent());
    }

    #[test]
    fn test_purge_reason_display() {
        assert_eq!(
            PurgeReason::from_assigned_team(None).to_string(),
            "player not allocated"
        );
        assert_eq!(
            PurgeReason::from_assigned_team(Some(7)).to_string(),
            "player went to team 7"
        );
    }

    #[test]
    fn test_report_marks_inconsistent_totals() {
        let report = ClassificationReport::new(
            BidTotals {
                total: 2,
                preserved: 0,
                purgeable: 1,
            },
            Vec::new(),
            Vec::new(),
        );
        assert!(!report.totals_consistent);
        assert_eq!(report.totals().total, 2);
    }
}
