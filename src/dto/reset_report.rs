use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Rows in other tables whose round reference is set, keyed by table name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependentRows(pub BTreeMap<String, u64>);

impl DependentRows {
    pub fn total(&self) -> u64 {
        self.0.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn get(&self, table: &str) -> u64 {
        self.0.get(table).copied().unwrap_or(0)
    }

    /// Non-zero entries only
    pub fn blocking(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(table, count)| (table.as_str(), *count))
    }
}

impl fmt::Display for DependentRows {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .blocking()
            .map(|(table, count)| format!("{table}: {count}"))
            .collect();
        if parts.is_empty() {
            write!(f, "none")
        } else {
            write!(f, "{}", parts.join(", "))
        }
    }
}

/// `last_value` / `is_called` of the round identifier sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceState {
    pub last_value: i64,
    pub is_called: bool,
}

impl SequenceState {
    /// Identifier the next insert will receive
    pub fn next_value(&self) -> i64 {
        if self.is_called {
            self.last_value + 1
        } else {
            self.last_value
        }
    }
}

/// What the operator sees before a reset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetPreview {
    pub round_count: u64,
    pub sequence: SequenceState,
    pub dependents: DependentRows,
}

/// Rows removed or detached while cascading through dependents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadeCounts {
    pub team_tiebreakers_deleted: u64,
    pub tiebreakers_deleted: u64,
    pub bids_deleted: u64,
    pub players_detached: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ResetOutcome {
    /// Operator declined; nothing changed
    Cancelled,
    /// Round table was already empty, only the sequence was restarted
    SequenceRestarted { sequence: SequenceState },
    Reset {
        rounds_deleted: u64,
        cascade: Option<CascadeCounts>,
        sequence: SequenceState,
    },
}
