//! Error types for the game simulation.
//!
//! Nothing inside a tick can fail. Errors only describe why a command at the
//! public surface was declined; the world is left untouched in that case.

use thiserror::Error;

use crate::asteroid::AsteroidId;
use crate::ship::{ShipId, ShipType};

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for world construction and ship lookups.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GameError {
    /// Ship handle does not resolve to a ship in the world.
    #[error("Ship not found: {0}")]
    ShipNotFound(ShipId),

    /// Asteroid index is out of range.
    #[error("Asteroid not found: {0:?}")]
    AsteroidNotFound(AsteroidId),

    /// World configuration is invalid.
    #[error("Invalid world configuration: {0}")]
    InvalidConfig(String),

    /// Invalid game state.
    #[error("Invalid game state: {0}")]
    InvalidState(String),
}

/// Why a build order was declined.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BuildError {
    /// Not enough banked resources.
    #[error("Need {required} resources (have {available}).")]
    InsufficientResources {
        /// Cost of the order.
        required: i32,
        /// Resources on hand.
        available: i32,
    },

    /// The producer's queue is at capacity.
    #[error("Build queue is full (max {max} items).")]
    QueueFull {
        /// Queue capacity.
        max: usize,
    },

    /// Live plus queued ships would exceed the fleet cap.
    #[error("{ship_type} fleet cap reached ({cap}).")]
    FleetCapReached {
        /// Requested type.
        ship_type: ShipType,
        /// Cap for that type.
        cap: u32,
    },

    /// The producer's catalog does not include the type.
    #[error("{producer} cannot build {ship_type}.")]
    NotInCatalog {
        /// Producing ship type.
        producer: ShipType,
        /// Requested type.
        ship_type: ShipType,
    },

    /// The producer is missing, dead, or owned by someone else.
    #[error("Producer {0} is not available.")]
    ProducerUnavailable(ShipId),
}

/// Why a research command was declined.
///
/// The `Display` text is shown to the player verbatim.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ResearchError {
    /// The type has no upgrade track.
    #[error("{0} cannot be upgraded.")]
    NotUpgradeable(ShipType),

    /// Starting research on a maxed type.
    #[error("{0} already at max upgrade (Mk.III).")]
    AlreadyMaxed(ShipType),

    /// Queueing research on a maxed type.
    #[error("{0} is already at max upgrade (Mk.III).")]
    QueueMaxed(ShipType),

    /// Another order is active.
    #[error("Research lab is busy — wait for current research.")]
    LabBusy,

    /// Queueing while nothing is active.
    #[error("Research lab is idle — start a research directly.")]
    LabIdle,

    /// Not enough banked resources.
    #[error("Need {required} resources (have {available}).")]
    InsufficientResources {
        /// Cost of the order.
        required: i32,
        /// Resources on hand.
        available: i32,
    },

    /// The type is the active order.
    #[error("{0} is currently being researched.")]
    CurrentlyResearching(ShipType),

    /// The type is already queued.
    #[error("{0} is already in the research queue.")]
    AlreadyQueued(ShipType),

    /// The pending queue is at capacity.
    #[error("Research queue is full (max 2 items).")]
    QueueFull,

    /// Cancelling a type that is not queued.
    #[error("{0} is not in the research queue.")]
    NotQueued(ShipType),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_research_messages_are_player_facing() {
        assert_eq!(
            ResearchError::NotUpgradeable(ShipType::Mothership).to_string(),
            "Mothership cannot be upgraded."
        );
        assert_eq!(
            ResearchError::AlreadyMaxed(ShipType::Frigate).to_string(),
            "Frigate already at max upgrade (Mk.III)."
        );
        assert_eq!(
            ResearchError::InsufficientResources {
                required: 300,
                available: 120
            }
            .to_string(),
            "Need 300 resources (have 120)."
        );
        assert_eq!(
            ResearchError::QueueFull.to_string(),
            "Research queue is full (max 2 items)."
        );
        assert_eq!(
            ResearchError::NotQueued(ShipType::Bomber).to_string(),
            "Bomber is not in the research queue."
        );
    }

    #[test]
    fn test_build_error_display() {
        let err = BuildError::FleetCapReached {
            ship_type: ShipType::Battlecruiser,
            cap: 3,
        };
        assert_eq!(err.to_string(), "Battlecruiser fleet cap reached (3).");
    }
}
