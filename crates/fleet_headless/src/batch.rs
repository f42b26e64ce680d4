//! Batch match runner.
//!
//! Runs many seeds of one match config in parallel using rayon and
//! aggregates the outcomes.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::match_config::MatchConfig;
use crate::runner::{run_match, MatchOutcome, MatchSummary};

/// Configuration for a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Match to run; its seed is replaced per game.
    pub base: MatchConfig,
    /// Number of matches to run.
    pub match_count: u32,
    /// Maximum parallel matches (0 = use rayon default).
    pub parallel_matches: u32,
    /// Seed of the first match; later matches count up from it.
    pub seed_start: u64,
    /// Output directory for results.
    pub output_dir: PathBuf,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            base: MatchConfig::default(),
            match_count: 20,
            parallel_matches: 0,
            seed_start: 0,
            output_dir: PathBuf::from("results"),
        }
    }
}

impl BatchConfig {
    /// Batch of `match_count` runs of `base`.
    #[must_use]
    pub fn new(base: MatchConfig, match_count: u32) -> Self {
        Self {
            base,
            match_count,
            ..Default::default()
        }
    }

    /// Set output directory.
    #[must_use]
    pub fn with_output(mut self, dir: PathBuf) -> Self {
        self.output_dir = dir;
        self
    }

    /// Set seed start.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed_start = seed;
        self
    }

    /// Set thread count.
    #[must_use]
    pub fn with_parallelism(mut self, threads: u32) -> Self {
        self.parallel_matches = threads;
        self
    }
}

/// Failure of a single match in a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchError {
    /// Match index.
    pub match_index: u32,
    /// Seed used.
    pub seed: u64,
    /// Error message.
    pub message: String,
}

/// Aggregate over a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Matches that finished.
    pub total_matches: u32,
    /// Human victories.
    pub victories: u32,
    /// Human defeats.
    pub defeats: u32,
    /// Matches that hit the tick limit.
    pub draws: u32,
    /// Mean match length.
    pub avg_ticks: f64,
    /// Mean ships built, keyed by team.
    pub avg_ships_built: BTreeMap<u8, f64>,
}

impl BatchSummary {
    /// Aggregate a set of match results.
    #[must_use]
    pub fn from_matches(matches: &[MatchSummary]) -> Self {
        if matches.is_empty() {
            return Self::default();
        }

        let mut summary = Self {
            total_matches: u32::try_from(matches.len()).unwrap_or(u32::MAX),
            ..Default::default()
        };
        let mut tick_sum = 0u64;
        let mut built: BTreeMap<u8, u64> = BTreeMap::new();
        for m in matches {
            match m.outcome {
                MatchOutcome::Victory => summary.victories += 1,
                MatchOutcome::Defeat => summary.defeats += 1,
                MatchOutcome::Draw => summary.draws += 1,
            }
            tick_sum += m.ticks;
            for (team, stats) in &m.teams {
                *built.entry(*team).or_default() += u64::from(stats.ships_built);
            }
        }

        let n = matches.len() as f64;
        summary.avg_ticks = tick_sum as f64 / n;
        summary.avg_ships_built = built.into_iter().map(|(t, b)| (t, b as f64 / n)).collect();
        summary
    }
}

/// Results from a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Configuration used.
    pub config: BatchConfig,
    /// Individual match results, in seed order.
    pub matches: Vec<MatchSummary>,
    /// Aggregate summary.
    pub summary: BatchSummary,
    /// Total runtime.
    pub duration_seconds: f64,
    /// Errors encountered.
    pub errors: Vec<BatchError>,
}

impl BatchResults {
    /// Save results to a JSON file.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Load results from a JSON file.
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }
}

/// Run a batch of matches.
pub fn run_batch(config: BatchConfig) -> BatchResults {
    let start = Instant::now();
    info!(
        "Starting batch run: {} matches of '{}'",
        config.match_count, config.base.name
    );

    if config.parallel_matches > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallel_matches as usize)
            .build_global()
            .ok(); // Ignore if already set
    }

    let results: Vec<Result<MatchSummary, BatchError>> = (0..config.match_count)
        .into_par_iter()
        .map(|i| {
            let seed = config.seed_start.wrapping_add(u64::from(i));
            let match_config = config.base.clone().with_seed(seed);
            match run_match(match_config) {
                Ok(summary) => {
                    debug!(seed, outcome = ?summary.outcome, "Match done");
                    Ok(summary)
                }
                Err(e) => {
                    warn!("Match {} failed: {}", i, e);
                    Err(BatchError {
                        match_index: i,
                        seed,
                        message: e.to_string(),
                    })
                }
            }
        })
        .collect();

    let (matches, errors): (Vec<_>, Vec<_>) = results.into_iter().partition(Result::is_ok);
    let matches: Vec<MatchSummary> = matches.into_iter().filter_map(Result::ok).collect();
    let errors: Vec<BatchError> = errors.into_iter().filter_map(Result::err).collect();

    let summary = BatchSummary::from_matches(&matches);
    let duration_seconds = start.elapsed().as_secs_f64();

    info!(
        "Batch complete: {} matches in {:.1}s ({:.1} matches/sec)",
        matches.len(),
        duration_seconds,
        matches.len() as f64 / duration_seconds.max(f64::EPSILON)
    );

    BatchResults {
        config,
        matches,
        summary,
        duration_seconds,
        errors,
    }
}

/// Run the same match `runs` times and check every final hash agrees.
pub fn verify_determinism(config: &MatchConfig, runs: u32) -> bool {
    let hashes: Vec<Option<u64>> = (0..runs)
        .into_par_iter()
        .map(|_| run_match(config.clone()).ok().map(|s| s.final_hash))
        .collect();

    let Some(first) = hashes.first().copied().flatten() else {
        return false;
    };
    let deterministic = hashes.iter().all(|h| *h == Some(first));
    if deterministic {
        info!("Determinism verified: {} runs, hash {:016x}", runs, first);
    } else {
        warn!("Determinism FAILED: hashes {:?}", hashes);
    }
    deterministic
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn quick_config() -> MatchConfig {
        MatchConfig::skirmish_1v1().with_max_ticks(400)
    }

    #[test]
    fn test_small_batch() {
        let results = run_batch(BatchConfig::new(quick_config(), 4).with_seed(10));

        assert_eq!(results.matches.len(), 4);
        assert!(results.errors.is_empty());
        assert_eq!(results.summary.total_matches, 4);
        assert_eq!(results.summary.draws, 4);
        let seeds: Vec<u64> = results.matches.iter().map(|m| m.seed).collect();
        assert_eq!(seeds, vec![10, 11, 12, 13]);
    }

    #[test]
    fn test_invalid_world_is_reported_per_match() {
        let mut base = quick_config();
        base.world.opponents.clear();
        let results = run_batch(BatchConfig::new(base, 2));

        assert!(results.matches.is_empty());
        assert_eq!(results.errors.len(), 2);
        assert_eq!(results.summary, BatchSummary::default());
    }

    #[test]
    fn test_verify_determinism() {
        assert!(verify_determinism(&quick_config().with_seed(3), 3));
    }

    #[test]
    fn test_results_save_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("batch.json");
        let results = run_batch(BatchConfig::new(quick_config(), 2));

        results.save(&path).unwrap();
        let loaded = BatchResults::load(&path).unwrap();

        assert_eq!(loaded.matches, results.matches);
        assert_eq!(loaded.summary.total_matches, 2);
    }
}
