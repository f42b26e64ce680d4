//! # Fleet Core
//!
//! Deterministic simulation core for Fleet Command, a space RTS in which a
//! human side and up to three computer opponents mine asteroids, build
//! fleets, research upgrades and try to destroy each other's motherships.
//!
//! This crate contains **only** simulation logic:
//! - No rendering
//! - No IO
//! - No wall-clock reads (time advances only through `update(delta_ms)`)
//! - No floating-point math inside the tick (uses fixed-point)
//! - One seeded RNG owned by the world
//!
//! The same seed and the same sequence of commands and deltas always
//! produce the same [`GameWorld::state_hash`].
//!
//! ## Crate Structure
//!
//! - [`ship`] - Ship types, stat tables and per-ship state
//! - [`asteroid`] - Mineable resource nodes
//! - [`behavior`] - Movement, pursuit and the mining loop
//! - [`visibility`] - Per-team fog of war
//! - [`combat`] - Damage resolution and effect records
//! - [`repair`] - Docking and self-repair
//! - [`production`] - Build queues and fleet caps
//! - [`research`] - Upgrade ledger and retrofits
//! - [`ai`] - Computer opponents
//! - [`world`] - The tick orchestrator
//! - [`commands`] - Player command surface
//! - [`snapshot`] - Read-only views for renderers

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod ai;
pub mod asteroid;
pub mod behavior;
pub mod combat;
pub mod commands;
pub mod config;
pub mod error;
pub mod event_log;
pub mod map_generation;
pub mod math;
pub mod production;
pub mod repair;
pub mod research;
pub mod rng;
pub mod ship;
pub mod snapshot;
pub mod visibility;
pub mod world;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::ai::{AiCommand, AiLevel, EnemyController};
    pub use crate::asteroid::{Asteroid, AsteroidId};
    pub use crate::combat::{CombatEffect, CombatWeights, EffectKind, Kill};
    pub use crate::config::{WorldConfig, STARTING_RESOURCES};
    pub use crate::error::{BuildError, GameError, ResearchError, Result};
    pub use crate::event_log::{EventLog, LogEntry};
    pub use crate::math::{Fixed, Vec2Fixed};
    pub use crate::production::{BuildOrder, BuildQueue};
    pub use crate::research::{ResearchManager, ResearchOrder};
    pub use crate::ship::{MinerPhase, Ship, ShipId, ShipType, TeamId};
    pub use crate::snapshot::WorldSnapshot;
    pub use crate::world::{GamePhase, GameWorld, ShipStorage, TickEvents, WorldBuilder};
}
