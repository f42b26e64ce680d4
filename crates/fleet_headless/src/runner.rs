//! Match runner and the human-seat autopilot.
//!
//! The runner owns one [`GameWorld`], steps it with a fixed delta, lets the
//! autopilot issue orders through the same public commands a player would use,
//! and collects per-team counters into a [`MatchSummary`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use fleet_core::asteroid::find_nearest_live;
use fleet_core::error::{BuildError, GameError};
use fleet_core::map_generation::{MAP_HEIGHT, MAP_WIDTH};
use fleet_core::math::Vec2Fixed;
use fleet_core::ship::{MinerPhase, ShipId, ShipType, TeamId};
use fleet_core::snapshot::WorldSnapshot;
use fleet_core::world::{GamePhase, GameWorld, TickEvents};

use crate::match_config::{AutopilotConfig, MatchConfig};

/// Resources held back before the autopilot spends on research.
const RESEARCH_RESERVE: i32 = 1_500;

/// How a match ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchOutcome {
    /// Every opponent mothership destroyed.
    Victory,
    /// The human mothership destroyed.
    Defeat,
    /// Tick limit reached.
    Draw,
}

/// Per-team counters for one match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamSummary {
    /// Banked resources at the end.
    pub resources: i32,
    /// Live ships at the end.
    pub live_ships: u32,
    /// Ships spawned by production.
    pub ships_built: u32,
    /// Ships removed after being destroyed.
    pub ships_lost: u32,
}

/// Result of a single match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSummary {
    /// Match name from the config.
    pub name: String,
    /// World seed.
    pub seed: u64,
    /// Ticks simulated.
    pub ticks: u64,
    /// Simulation time.
    pub elapsed_ms: u64,
    /// How the match ended.
    pub outcome: MatchOutcome,
    /// Final state hash.
    pub final_hash: u64,
    /// Keyed by team number.
    pub teams: BTreeMap<u8, TeamSummary>,
    /// Research levels completed by the human side.
    pub research_completed: u32,
}

/// Scripted player for the human seat.
///
/// Decisions are made from what the human side can see: idle workers are sent
/// to the nearest live asteroid, the worker target is filled before warships,
/// warships rotate through the build order, and once enough idle warships
/// gather they attack the nearest visible hostile or sweep toward the enemy
/// half of the map.
#[derive(Debug, Clone)]
pub struct Autopilot {
    config: AutopilotConfig,
    decision_timer_ms: u32,
    attack_timer_ms: u32,
    build_cursor: usize,
}

impl Autopilot {
    /// Create an autopilot.
    #[must_use]
    pub fn new(config: AutopilotConfig) -> Self {
        Self {
            config,
            decision_timer_ms: 0,
            attack_timer_ms: 0,
            build_cursor: 0,
        }
    }

    /// Advance timers and, when due, issue orders.
    pub fn act(&mut self, world: &mut GameWorld, delta_ms: u32) {
        if !self.config.enabled || world.phase() != GamePhase::Playing {
            return;
        }

        self.attack_timer_ms = self.attack_timer_ms.saturating_add(delta_ms);
        self.decision_timer_ms = self.decision_timer_ms.saturating_add(delta_ms);
        if self.decision_timer_ms < self.config.decision_interval_ms {
            return;
        }
        self.decision_timer_ms = 0;

        self.dispatch_idle_workers(world);
        self.build(world);
        self.research(world);
        if self.attack_timer_ms >= self.config.attack_interval_ms && self.launch_wave(world) {
            self.attack_timer_ms = 0;
        }
    }

    fn dispatch_idle_workers(&self, world: &mut GameWorld) {
        let orders: Vec<_> = world
            .ships()
            .live_of_team(TeamId::HUMAN)
            .into_iter()
            .filter(|s| s.miner_phase() == Some(MinerPhase::Idle))
            .filter_map(|s| find_nearest_live(world.asteroids(), s.position).map(|a| (s.id, a)))
            .collect();

        for (worker, asteroid) in orders {
            if let Err(e) = world.assign_miners(&[worker], asteroid) {
                debug!(%worker, error = %e, "Autopilot could not dispatch worker");
            }
        }
    }

    fn build(&mut self, world: &mut GameWorld) {
        let workers = world.ships().count_live(TeamId::HUMAN, ShipType::Worker);
        let wanted = if workers < self.config.worker_target || self.config.build_order.is_empty() {
            ShipType::Worker
        } else {
            self.config.build_order[self.build_cursor % self.config.build_order.len()]
        };

        match world.queue_build_ship(wanted) {
            Ok(()) => {
                if wanted != ShipType::Worker {
                    self.build_cursor += 1;
                }
            }
            // Never going to succeed now; move on to the next entry
            Err(BuildError::FleetCapReached { .. } | BuildError::NotInCatalog { .. }) => {
                self.build_cursor += 1;
            }
            Err(e) => debug!(ship_type = ?wanted, error = %e, "Autopilot build deferred"),
        }
    }

    fn research(&self, world: &mut GameWorld) {
        if world.research().active().is_some() || world.player_resources() < RESEARCH_RESERVE {
            return;
        }
        let candidate = std::iter::once(ShipType::Worker)
            .chain(self.config.build_order.iter().copied())
            .filter(|t| world.research().can_research(*t))
            .min_by_key(|t| world.research().level(*t));
        if let Some(ship_type) = candidate {
            if let Err(e) = world.try_start_research(ship_type) {
                debug!(?ship_type, error = %e, "Autopilot research deferred");
            }
        }
    }

    /// Returns whether a wave was sent.
    fn launch_wave(&self, world: &mut GameWorld) -> bool {
        let fleet: Vec<ShipId> = world
            .ships()
            .live_of_team(TeamId::HUMAN)
            .into_iter()
            .filter(|s| s.ship_type.is_combat() && s.attack_target.is_none())
            .map(|s| s.id)
            .collect();
        if fleet.is_empty() || fleet.len() < self.config.min_attack_fleet {
            return false;
        }

        let Some(anchor) = world.ship(fleet[0]).map(|s| s.position) else {
            return false;
        };
        let target = world
            .visibility()
            .visible_to(TeamId::HUMAN)
            .into_iter()
            .filter_map(|id| world.ship(id))
            .filter(|s| s.team.is_hostile_to(TeamId::HUMAN) && s.is_alive())
            .min_by_key(|s| (s.position.distance_squared(anchor), s.id))
            .map(|s| s.id);

        match target {
            Some(target) => match world.assign_attack_target(&fleet, target) {
                Ok(count) => {
                    debug!(count, %target, "Autopilot attack wave");
                    true
                }
                Err(e) => {
                    debug!(error = %e, "Autopilot attack rejected");
                    false
                }
            },
            None => {
                let sweep = Vec2Fixed::from_ints(MAP_WIDTH * 3 / 4, MAP_HEIGHT / 2);
                let moved = fleet
                    .iter()
                    .filter(|id| world.set_destination(**id, sweep).is_ok())
                    .count();
                debug!(moved, "Autopilot sweeping for targets");
                moved > 0
            }
        }
    }
}

/// Runs one match to completion.
#[derive(Debug, Clone)]
pub struct MatchRunner {
    config: MatchConfig,
    world: GameWorld,
    autopilot: Autopilot,
    teams: BTreeMap<u8, TeamSummary>,
    research_completed: u32,
}

impl MatchRunner {
    /// Generate the world for `config`.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidConfig`] when the world config is invalid.
    pub fn new(config: MatchConfig) -> Result<Self, GameError> {
        let world = GameWorld::new(&config.world)?;
        let mut teams = BTreeMap::new();
        teams.insert(TeamId::HUMAN.0, TeamSummary::default());
        for enemy in world.enemies() {
            teams.insert(enemy.team.0, TeamSummary::default());
        }
        Ok(Self {
            autopilot: Autopilot::new(config.autopilot.clone()),
            config,
            world,
            teams,
            research_completed: 0,
        })
    }

    /// The world being run.
    #[must_use]
    pub const fn world(&self) -> &GameWorld {
        &self.world
    }

    /// Advance one tick. Returns `false` once the match is over.
    pub fn step(&mut self) -> bool {
        if self.world.phase() != GamePhase::Playing || self.world.tick() >= self.config.max_ticks {
            return false;
        }
        self.autopilot.act(&mut self.world, self.config.step_ms);
        let events = self.world.update(self.config.step_ms);
        self.record(&events);
        true
    }

    fn record(&mut self, events: &TickEvents) {
        for build in &events.builds_completed {
            let entry = self.teams.entry(build.team.0).or_default();
            entry.ships_built += u32::try_from(build.ships.len()).unwrap_or(u32::MAX);
        }
        for kill in &events.kills {
            self.teams.entry(kill.victim_team.0).or_default().ships_lost += 1;
        }
        if events.research_completed.is_some() {
            self.research_completed += 1;
        }
    }

    /// Run until the match ends or the tick limit is hit.
    ///
    /// `on_snapshot` is called every `snapshot_interval` ticks.
    pub fn run<F>(mut self, mut on_snapshot: F) -> MatchSummary
    where
        F: FnMut(&WorldSnapshot),
    {
        info!(
            name = %self.config.name,
            seed = self.config.world.seed,
            opponents = self.config.world.opponents.len(),
            "Starting match"
        );

        let interval = self.config.snapshot_interval;
        while self.step() {
            if interval > 0 && self.world.tick() % interval == 0 {
                on_snapshot(&self.world.snapshot());
            }
        }

        let summary = self.summarize();
        info!(
            ticks = summary.ticks,
            outcome = ?summary.outcome,
            hash = %format!("{:016x}", summary.final_hash),
            "Match finished"
        );
        summary
    }

    fn summarize(mut self) -> MatchSummary {
        let outcome = match self.world.phase() {
            GamePhase::Victory => MatchOutcome::Victory,
            GamePhase::GameOver => MatchOutcome::Defeat,
            GamePhase::Playing | GamePhase::Paused => MatchOutcome::Draw,
        };
        for (team, summary) in &mut self.teams {
            let team = TeamId(*team);
            summary.resources = self.world.resources_of(team);
            summary.live_ships =
                u32::try_from(self.world.ships().live_of_team(team).len()).unwrap_or(u32::MAX);
        }
        MatchSummary {
            name: self.config.name,
            seed: self.config.world.seed,
            ticks: self.world.tick(),
            elapsed_ms: self.world.elapsed_ms(),
            outcome,
            final_hash: self.world.state_hash(),
            teams: self.teams,
            research_completed: self.research_completed,
        }
    }
}

/// Run a match without snapshots.
///
/// # Errors
///
/// Returns [`GameError::InvalidConfig`] when the world config is invalid.
pub fn run_match(config: MatchConfig) -> Result<MatchSummary, GameError> {
    Ok(MatchRunner::new(config)?.run(|_| {}))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_core::ai::AiLevel;
    use fleet_core::config::WorldConfig;
    use fleet_test_utils::fixtures::{mining_world, pos};

    fn short_match(seed: u64) -> MatchConfig {
        MatchConfig {
            world: WorldConfig::new(seed, vec![AiLevel::Hard]),
            ..MatchConfig::skirmish_1v1()
        }
        .with_max_ticks(1_500)
    }

    #[test]
    fn test_run_stops_at_tick_limit() {
        let summary = run_match(short_match(5)).unwrap();
        assert_eq!(summary.outcome, MatchOutcome::Draw);
        assert_eq!(summary.ticks, 1_500);
        assert_eq!(summary.elapsed_ms, 1_500 * 16);
        assert_eq!(summary.teams.len(), 2);
    }

    #[test]
    fn test_same_seed_same_summary() {
        let a = run_match(short_match(21)).unwrap();
        let b = run_match(short_match(21)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_snapshot_interval() {
        let config = MatchConfig {
            snapshot_interval: 100,
            ..short_match(3)
        };
        let mut ticks = Vec::new();
        MatchRunner::new(config).unwrap().run(|s| ticks.push(s.tick));
        assert_eq!(ticks.len(), 15);
        assert_eq!(ticks[0], 100);
    }

    #[test]
    fn test_invalid_world_rejected() {
        let config = MatchConfig {
            world: WorldConfig::new(1, vec![]),
            ..MatchConfig::skirmish_1v1()
        };
        assert!(matches!(run_match(config), Err(GameError::InvalidConfig(_))));
    }

    #[test]
    fn test_autopilot_dispatches_idle_workers() {
        let mut world = mining_world(5_000);
        let worker = world.spawn_ship(TeamId::HUMAN, ShipType::Worker, pos(1_100, 2_000));
        world.assign_attack_target(&[worker], world.enemies()[0].mothership).unwrap();
        assert_eq!(world.ship(worker).and_then(|s| s.miner_phase()), Some(MinerPhase::Idle));

        let mut autopilot = Autopilot::new(AutopilotConfig {
            decision_interval_ms: 0,
            ..AutopilotConfig::default()
        });
        autopilot.act(&mut world, 16);

        assert_eq!(world.ship(worker).and_then(|s| s.miner_phase()), Some(MinerPhase::Mining));
    }

    #[test]
    fn test_autopilot_fills_worker_target_first() {
        let mut world = mining_world(5_000);
        let mut autopilot = Autopilot::new(AutopilotConfig {
            decision_interval_ms: 0,
            ..AutopilotConfig::default()
        });
        let before = world.player_resources();

        autopilot.act(&mut world, 16);

        assert_eq!(world.player_resources(), before - ShipType::Worker.build_cost());
    }

    #[test]
    fn test_disabled_autopilot_is_idle() {
        let mut world = mining_world(5_000);
        let before = world.player_resources();
        let mut autopilot = Autopilot::new(AutopilotConfig {
            enabled: false,
            decision_interval_ms: 0,
            ..AutopilotConfig::default()
        });
        autopilot.act(&mut world, 16);
        assert_eq!(world.player_resources(), before);
    }
}
