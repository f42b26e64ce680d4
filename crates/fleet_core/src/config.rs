//! Match setup.

use serde::{Deserialize, Serialize};

use crate::ai::AiLevel;
use crate::error::{GameError, Result};

/// Resources each side starts with.
pub const STARTING_RESOURCES: i32 = 500;
/// Most computer opponents a match supports.
pub const MAX_OPPONENTS: usize = 3;

/// Parameters a world is generated from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Seed for map generation and every in-match random choice.
    pub seed: u64,
    /// One entry per computer opponent, in team order.
    pub opponents: Vec<AiLevel>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            opponents: vec![AiLevel::Normal],
        }
    }
}

impl WorldConfig {
    /// Config with a seed and opponent list.
    #[must_use]
    pub fn new(seed: u64, opponents: Vec<AiLevel>) -> Self {
        Self { seed, opponents }
    }

    /// Check the opponent count.
    pub fn validate(&self) -> Result<()> {
        if self.opponents.is_empty() || self.opponents.len() > MAX_OPPONENTS {
            return Err(GameError::InvalidConfig(format!(
                "expected 1..={MAX_OPPONENTS} opponents, got {}",
                self.opponents.len()
            )));
        }
        Ok(())
    }
}
