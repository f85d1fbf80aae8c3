pub mod classifier;
pub mod purge;
pub mod report;
pub mod round_reset;
pub mod store;

pub use classifier::classify;
pub use purge::{delete_purgeable_bids, purge, run_purge, PurgeOutcome, PurgeStage};
pub use round_reset::{
    inspect, reset, reset_round_identity, run_reset_rounds, verify_sequence_restart,
};
pub use store::count_dependent_rows;
