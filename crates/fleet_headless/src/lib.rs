//! Headless match runner for AI testing and CI verification.
//!
//! Plays complete matches without graphics:
//!
//! - **Match runs**: an autopilot drives the human seat against the configured
//!   opponents, with JSON snapshots streamed to stdout
//! - **Batch runs**: many seeds in parallel, aggregated into a JSON report
//! - **Determinism checks**: identical configs must end with identical hashes
//!
//! # Example
//!
//! ```bash
//! # Play the 1v1 preset with a snapshot every second of game time
//! cargo run -p fleet_headless -- run --config skirmish_1v1 --snapshot-interval 60
//!
//! # Verify determinism
//! cargo run -p fleet_headless -- verify --config free_for_all --seed 7 --runs 5
//! ```

pub mod batch;
pub mod match_config;
pub mod runner;

pub use match_config::{AutopilotConfig, MatchConfig, MatchConfigError};
pub use runner::{run_match, Autopilot, MatchOutcome, MatchRunner, MatchSummary};
