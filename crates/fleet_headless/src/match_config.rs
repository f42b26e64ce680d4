//! Match configuration loading.
//!
//! A match config names the world to generate, how the simulation is stepped,
//! and how the human seat is driven when nobody is at the keyboard.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use fleet_core::ai::AiLevel;
use fleet_core::config::WorldConfig;
use fleet_core::ship::ShipType;

/// Error type for match config operations.
#[derive(Error, Debug)]
pub enum MatchConfigError {
    /// File not found.
    #[error("Match config file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read match config file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse match config: {0}")]
    ParseError(#[from] ron::error::SpannedError),
}

/// Scripted play for the human seat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutopilotConfig {
    /// Whether the human seat plays at all.
    pub enabled: bool,
    /// Workers to keep before spending on warships.
    pub worker_target: u32,
    /// Warships built in rotation once the worker target is met.
    pub build_order: Vec<ShipType>,
    /// Time between decision passes.
    pub decision_interval_ms: u32,
    /// Time between attack waves.
    pub attack_interval_ms: u32,
    /// Idle warships needed before a wave launches.
    pub min_attack_fleet: usize,
}

impl Default for AutopilotConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            worker_target: 6,
            build_order: vec![
                ShipType::Interceptor,
                ShipType::Corvette,
                ShipType::Bomber,
                ShipType::Frigate,
            ],
            decision_interval_ms: 1_000,
            attack_interval_ms: 45_000,
            min_attack_fleet: 8,
        }
    }
}

/// A complete match configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Match name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// World generation parameters.
    pub world: WorldConfig,
    /// Simulation milliseconds per tick.
    pub step_ms: u32,
    /// Ticks before the match is called a draw.
    pub max_ticks: u64,
    /// Emit a snapshot every N ticks (0 = never).
    pub snapshot_interval: u64,
    /// Human seat behaviour.
    pub autopilot: AutopilotConfig,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self::skirmish_1v1()
    }
}

impl MatchConfig {
    /// Load a config from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, MatchConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(MatchConfigError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        let config: MatchConfig = ron::from_str(&contents)?;
        Ok(config)
    }

    /// Load from a RON string.
    pub fn from_ron_str(ron: &str) -> Result<Self, MatchConfigError> {
        let config: MatchConfig = ron::from_str(ron)?;
        Ok(config)
    }

    /// Resolve a preset name, falling back to a RON file path.
    pub fn resolve(name_or_path: &str) -> Result<Self, MatchConfigError> {
        match name_or_path {
            "skirmish_1v1" => Ok(Self::skirmish_1v1()),
            "free_for_all" => Ok(Self::free_for_all()),
            "spectate" => Ok(Self::spectate()),
            path => Self::load(path),
        }
    }

    /// One Normal opponent, ten minutes at 60 ticks per second.
    #[must_use]
    pub fn skirmish_1v1() -> Self {
        Self {
            name: "Skirmish 1v1".to_string(),
            description: "Autopilot against a single Normal opponent".to_string(),
            world: WorldConfig::new(0, vec![AiLevel::Normal]),
            step_ms: 16,
            max_ticks: 36_000,
            snapshot_interval: 0,
            autopilot: AutopilotConfig::default(),
        }
    }

    /// Three opponents of rising difficulty.
    #[must_use]
    pub fn free_for_all() -> Self {
        Self {
            name: "Free for all".to_string(),
            description: "Autopilot against Easy, Hard and Expert opponents".to_string(),
            world: WorldConfig::new(0, vec![AiLevel::Easy, AiLevel::Hard, AiLevel::Expert]),
            max_ticks: 72_000,
            ..Self::skirmish_1v1()
        }
    }

    /// The human seat stays idle; watch the opponents play.
    #[must_use]
    pub fn spectate() -> Self {
        Self {
            name: "Spectate".to_string(),
            description: "Idle human seat against two Hard opponents".to_string(),
            world: WorldConfig::new(0, vec![AiLevel::Hard, AiLevel::Hard]),
            autopilot: AutopilotConfig {
                enabled: false,
                ..AutopilotConfig::default()
            },
            ..Self::skirmish_1v1()
        }
    }

    /// Override the world seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.world.seed = seed;
        self
    }

    /// Override the tick limit.
    #[must_use]
    pub fn with_max_ticks(mut self, max_ticks: u64) -> Self {
        self.max_ticks = max_ticks;
        self
    }
}
