//! The simulation orchestrator.
//!
//! [`GameWorld`] owns every piece of match state and advances it one tick
//! at a time. Systems run in a fixed order each tick:
//!
//! 1. **Visibility** - rebuild each team's visible set
//! 2. **Ships** - movement, pursuit and the mining loop
//! 3. **Economy** - sweep human miner deposits
//! 4. **Production** - advance every build queue and spawn finished ships
//! 5. **Research** - advance the lab and retrofit on completion
//! 6. **AI** - each live opponent sweeps its deposits and issues intents
//! 7. **Combat** - resolve exchanges, emit effect records
//! 8. **Effects** - age and cull effect records
//! 9. **Repairs** - docking and self-repair
//! 10. **Pruning** - null dangling targets, drop dead non-capital ships
//! 11. **Win check** - defeat when the human mothership dies, victory when
//!     every opponent mothership has
//!
//! Ship ids are processed in sorted order everywhere so that a seed and a
//! sequence of deltas fully determine the outcome.

use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::ai::{AiCommand, AiLevel, AiShip, AiView, EnemyController};
use crate::asteroid::{find_nearest_live, Asteroid, AsteroidId};
use crate::behavior;
use crate::combat::{self, CombatEffect, CombatWeights, Kill};
use crate::config::{WorldConfig, STARTING_RESOURCES};
use crate::error::{BuildError, Result};
use crate::event_log::EventLog;
use crate::map_generation;
use crate::math::Vec2Fixed;
use crate::production::{spawn_positions, validate_build, BuildBudget, BuildOrder, BuildQueue};
use crate::repair::{self, Docking};
use crate::research::{self, level_label, ResearchManager, ResearchOrder};
use crate::rng::SimRng;
use crate::ship::{Ship, ShipId, ShipType, TeamId};
use crate::visibility::Visibility;

/// Minimum time between two docking log lines.
const DOCKING_LOG_INTERVAL_MS: u32 = 10_000;

/// Storage for all ships with deterministic iteration.
#[derive(Debug, Clone, Default)]
pub struct ShipStorage {
    ships: HashMap<ShipId, Ship>,
    next_id: u64,
}

impl ShipStorage {
    /// Create empty storage. The first id handed out is 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ships: HashMap::new(),
            next_id: 1,
        }
    }

    /// Create a ship with base stats and return its id.
    pub fn spawn(&mut self, ship_type: ShipType, team: TeamId, position: Vec2Fixed) -> ShipId {
        let id = ShipId(self.next_id.max(1));
        self.next_id = id.0 + 1;
        self.ships.insert(id, Ship::new(id, ship_type, team, position));
        id
    }

    /// Remove a ship by id.
    pub fn remove(&mut self, id: ShipId) -> Option<Ship> {
        self.ships.remove(&id)
    }

    /// Get a ship by id.
    #[must_use]
    pub fn get(&self, id: ShipId) -> Option<&Ship> {
        self.ships.get(&id)
    }

    /// Get a mutable reference to a ship by id.
    pub fn get_mut(&mut self, id: ShipId) -> Option<&mut Ship> {
        self.ships.get_mut(&id)
    }

    /// Check if a ship exists.
    #[must_use]
    pub fn contains(&self, id: ShipId) -> bool {
        self.ships.contains_key(&id)
    }

    /// Number of stored ships, dead motherships included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ships.len()
    }

    /// Check if storage is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ships.is_empty()
    }

    /// Sorted ship ids for deterministic iteration.
    #[must_use]
    pub fn sorted_ids(&self) -> Vec<ShipId> {
        let mut ids: Vec<_> = self.ships.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Iterate over all ships (not in deterministic order).
    pub fn iter(&self) -> impl Iterator<Item = &Ship> {
        self.ships.values()
    }

    /// Live ships of a team, in id order.
    #[must_use]
    pub fn live_of_team(&self, team: TeamId) -> Vec<&Ship> {
        let mut ships: Vec<&Ship> = self
            .ships
            .values()
            .filter(|s| s.team == team && s.is_alive())
            .collect();
        ships.sort_unstable_by_key(|s| s.id);
        ships
    }

    /// Live ships of a given team and type.
    #[must_use]
    pub fn count_live(&self, team: TeamId, ship_type: ShipType) -> u32 {
        self.ships
            .values()
            .filter(|s| s.team == team && s.ship_type == ship_type && s.is_alive())
            .count() as u32
    }
}

/// Match state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GamePhase {
    /// Ticks advance the world.
    Playing,
    /// Ticks are ignored until resumed.
    Paused,
    /// The human mothership was destroyed.
    GameOver,
    /// Every opponent mothership was destroyed.
    Victory,
}

/// A finished build order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedBuild {
    /// Owning team.
    pub team: TeamId,
    /// Ship that built it.
    pub producer: ShipId,
    /// Type built.
    pub ship_type: ShipType,
    /// Ships spawned.
    pub ships: Vec<ShipId>,
}

/// Events generated during a tick.
///
/// These can be used by a front end to trigger sounds, animations or UI
/// updates without diffing the world.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickEvents {
    /// Ships spawned this tick.
    pub spawned: Vec<ShipId>,
    /// Ships removed this tick.
    pub destroyed: Vec<ShipId>,
    /// Kills landed by combat this tick.
    pub kills: Vec<Kill>,
    /// Build orders completed this tick.
    pub builds_completed: Vec<CompletedBuild>,
    /// Research order completed this tick.
    pub research_completed: Option<ResearchOrder>,
    /// New phase, if the match ended this tick.
    pub phase_changed: Option<GamePhase>,
}

/// Where mined resources ended up, for conservation checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct MiningLedger {
    /// Resources credited to team counters.
    pub deposited: i64,
    /// Cargo destroyed together with its worker.
    pub lost: i64,
}

/// The complete state of one match.
#[derive(Debug, Clone)]
pub struct GameWorld {
    pub(crate) phase: GamePhase,
    pub(crate) tick: u64,
    pub(crate) elapsed_ms: u64,
    pub(crate) rng: SimRng,
    pub(crate) ships: ShipStorage,
    pub(crate) asteroids: Vec<Asteroid>,
    pub(crate) effects: Vec<CombatEffect>,
    pub(crate) player_mothership: ShipId,
    pub(crate) player_resources: i32,
    pub(crate) enemies: Vec<EnemyController>,
    pub(crate) research: ResearchManager,
    pub(crate) visibility: Visibility,
    pub(crate) event_log: EventLog,
    pub(crate) combat_weights: CombatWeights,
    pub(crate) ledger: MiningLedger,
    pub(crate) ai_enabled: bool,
    docking_log_timer_ms: u32,
}

impl GameWorld {
    /// Generate a match from a config.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidConfig`](crate::error::GameError::InvalidConfig)
    /// when the opponent count is outside `1..=3`.
    ///
    /// # Example
    ///
    /// ```
    /// use fleet_core::prelude::*;
    ///
    /// let mut world = GameWorld::new(&WorldConfig::default()).unwrap();
    /// world.update(16);
    /// assert_eq!(world.tick(), 1);
    /// assert_eq!(world.phase(), GamePhase::Playing);
    /// ```
    pub fn new(config: &WorldConfig) -> Result<Self> {
        config.validate()?;

        let mut rng = SimRng::seeded(config.seed);
        let layout = map_generation::generate(config.opponents.len(), &mut rng);

        let mut world = Self::empty(rng);
        world.player_mothership =
            world
                .ships
                .spawn(ShipType::Mothership, TeamId::HUMAN, layout.human.mothership);
        for &pos in &layout.human.workers {
            world.ships.spawn(ShipType::Worker, TeamId::HUMAN, pos);
        }

        for (index, (&level, side)) in config.opponents.iter().zip(&layout.opponents).enumerate() {
            let team = TeamId(index as u8 + 1);
            let mothership = world
                .ships
                .spawn(ShipType::Mothership, team, side.mothership);
            for &pos in &side.workers {
                world.ships.spawn(ShipType::Worker, team, pos);
            }
            world.enemies.push(EnemyController::new(
                team,
                level,
                mothership,
                STARTING_RESOURCES,
            ));
            world.log(format!("Enemy {}: {level} AI", index + 1));
        }

        for (position, capacity) in layout.asteroids {
            world.add_asteroid(position, capacity);
        }

        info!(
            seed = config.seed,
            opponents = config.opponents.len(),
            asteroids = world.asteroids.len(),
            "World generated"
        );
        world.log_start();
        Ok(world)
    }

    fn empty(rng: SimRng) -> Self {
        Self {
            phase: GamePhase::Playing,
            tick: 0,
            elapsed_ms: 0,
            rng,
            ships: ShipStorage::new(),
            asteroids: Vec::new(),
            effects: Vec::new(),
            player_mothership: ShipId::default(),
            player_resources: STARTING_RESOURCES,
            enemies: Vec::new(),
            research: ResearchManager::new(),
            visibility: Visibility::default(),
            event_log: EventLog::new(),
            combat_weights: CombatWeights::default(),
            ledger: MiningLedger::default(),
            ai_enabled: true,
            docking_log_timer_ms: 0,
        }
    }

    fn log_start(&mut self) {
        self.log(format!(
            "Game started — {} opponent(s). Mine asteroids!",
            self.enemies.len()
        ));
        self.log(format!("Starting resources: {}", self.player_resources));
    }

    /// Append a line to the event log.
    pub(crate) fn log(&mut self, message: impl Into<String>) {
        let message = message.into();
        info!(target: "fleet_core::events", time_ms = self.elapsed_ms, "{message}");
        self.event_log.push(self.elapsed_ms, message);
    }

    // ── Accessors ────────────────────────────────────────────────────────

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Ticks processed while playing.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Simulation time accumulated while playing.
    #[must_use]
    pub const fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    /// All ships.
    #[must_use]
    pub const fn ships(&self) -> &ShipStorage {
        &self.ships
    }

    /// Look up a ship.
    #[must_use]
    pub fn ship(&self, id: ShipId) -> Option<&Ship> {
        self.ships.get(id)
    }

    /// The asteroid field. Depleted asteroids stay in place.
    #[must_use]
    pub fn asteroids(&self) -> &[Asteroid] {
        &self.asteroids
    }

    /// Live effect records.
    #[must_use]
    pub fn effects(&self) -> &[CombatEffect] {
        &self.effects
    }

    /// The human mothership.
    #[must_use]
    pub const fn player_mothership(&self) -> ShipId {
        self.player_mothership
    }

    /// Human resource counter.
    #[must_use]
    pub const fn player_resources(&self) -> i32 {
        self.player_resources
    }

    /// Computer opponents, in team order.
    #[must_use]
    pub fn enemies(&self) -> &[EnemyController] {
        &self.enemies
    }

    /// Resource counter of any team.
    #[must_use]
    pub fn resources_of(&self, team: TeamId) -> i32 {
        if team.is_human() {
            self.player_resources
        } else {
            self.enemies
                .iter()
                .find(|e| e.team == team)
                .map_or(0, |e| e.resources)
        }
    }

    fn resources_mut(&mut self, team: TeamId) -> Option<&mut i32> {
        if team.is_human() {
            Some(&mut self.player_resources)
        } else {
            self.enemies
                .iter_mut()
                .find(|e| e.team == team)
                .map(|e| &mut e.resources)
        }
    }

    /// The human research ledger.
    #[must_use]
    pub const fn research(&self) -> &ResearchManager {
        &self.research
    }

    /// Visible sets computed at the start of the last tick.
    #[must_use]
    pub const fn visibility(&self) -> &Visibility {
        &self.visibility
    }

    /// The rolling event log.
    #[must_use]
    pub const fn event_log(&self) -> &EventLog {
        &self.event_log
    }

    /// Where mined resources went.
    #[must_use]
    pub const fn mining_ledger(&self) -> MiningLedger {
        self.ledger
    }

    /// Override the combat balance weights.
    pub fn set_combat_weights(&mut self, weights: CombatWeights) {
        self.combat_weights = weights;
    }

    fn is_alive(&self, id: ShipId) -> bool {
        self.ships.get(id).is_some_and(Ship::is_alive)
    }

    // ── Spawning ─────────────────────────────────────────────────────────

    /// Place a ship directly, bypassing production.
    ///
    /// Human ships get the current research level applied; workers head for
    /// the nearest live asteroid.
    pub fn spawn_ship(&mut self, team: TeamId, ship_type: ShipType, position: Vec2Fixed) -> ShipId {
        let id = self.ships.spawn(ship_type, team, position);
        let level = if team.is_human() {
            self.research.level(ship_type)
        } else {
            0
        };
        let nearest = find_nearest_live(&self.asteroids, position);
        if let Some(ship) = self.ships.get_mut(id) {
            if level > 0 {
                research::apply_to_new_ship(ship, level);
            }
            if let (Some(miner), Some(asteroid)) = (ship.miner.as_mut(), nearest) {
                miner.assign(asteroid);
            }
        }
        id
    }

    /// Add an asteroid with `capacity` resources.
    pub fn add_asteroid(&mut self, position: Vec2Fixed, capacity: i32) -> AsteroidId {
        let id = AsteroidId(self.asteroids.len());
        self.asteroids.push(Asteroid::new(id, position, capacity.max(0)));
        id
    }

    // ── Tick ─────────────────────────────────────────────────────────────

    /// Advance the world by `delta_ms` of simulation time.
    ///
    /// Does nothing unless the phase is [`GamePhase::Playing`].
    pub fn update(&mut self, delta_ms: u32) -> TickEvents {
        let mut events = TickEvents::default();
        if self.phase != GamePhase::Playing {
            return events;
        }
        self.tick += 1;
        self.elapsed_ms += u64::from(delta_ms);

        let human_capital = self
            .is_alive(self.player_mothership)
            .then_some(self.player_mothership);
        self.visibility = Visibility::compute(&self.ships, human_capital);

        behavior::update_ships(
            &mut self.ships,
            &mut self.asteroids,
            &self.visibility,
            delta_ms,
        );

        let deposited = self.collect_deposits(TeamId::HUMAN);
        self.player_resources += deposited;

        self.advance_production(delta_ms, &mut events);
        self.advance_research(delta_ms, &mut events);

        if self.ai_enabled {
            self.run_ai(delta_ms);
        }

        let kills = combat::resolve_combat(
            &mut self.ships,
            &self.visibility,
            &self.combat_weights,
            &mut self.effects,
            &mut self.rng,
        );
        self.record_kills(&kills);
        events.kills = kills;

        combat::tick_effects(&mut self.effects, delta_ms);

        let dockings = repair::resolve_repairs(&mut self.ships, delta_ms);
        self.log_dockings(&dockings, delta_ms);

        self.prune(&mut events);
        self.check_outcome(&mut events);

        trace!(tick = self.tick, ships = self.ships.len(), "Tick complete");
        events
    }

    /// Credit pending deposits of `team`'s workers and send them back out.
    fn collect_deposits(&mut self, team: TeamId) -> i32 {
        let mut total = 0;
        for id in self.ships.sorted_ids() {
            let Some(ship) = self.ships.get_mut(id) else {
                continue;
            };
            if ship.team != team || !ship.is_alive() {
                continue;
            }
            let amount = ship.take_pending_deposit();
            if amount == 0 {
                continue;
            }
            total += amount;
            let position = ship.position;
            if let Some(asteroid) = find_nearest_live(&self.asteroids, position) {
                if let Some(miner) = ship.miner.as_mut() {
                    miner.assign(asteroid);
                }
            }
        }
        self.ledger.deposited += i64::from(total);
        total
    }

    fn advance_production(&mut self, delta_ms: u32, events: &mut TickEvents) {
        for producer in self.ships.sorted_ids() {
            let Some(ship) = self.ships.get_mut(producer) else {
                continue;
            };
            if !ship.is_alive() {
                continue;
            }
            let Some(order) = ship.build_queue.as_mut().and_then(|q| q.advance(delta_ms)) else {
                continue;
            };
            let (producer_type, position, team) = (ship.ship_type, ship.position, ship.team);

            let count = order.ship_type.squadron_size();
            let positions = spawn_positions(producer_type, position, count, &mut self.rng);
            let spawned: Vec<ShipId> = positions
                .into_iter()
                .map(|p| self.spawn_ship(team, order.ship_type, p))
                .collect();

            self.log_build_complete(team, producer_type, order, count);
            events.spawned.extend(&spawned);
            events.builds_completed.push(CompletedBuild {
                team,
                producer,
                ship_type: order.ship_type,
                ships: spawned,
            });
        }
    }

    fn log_build_complete(
        &mut self,
        team: TeamId,
        producer_type: ShipType,
        order: BuildOrder,
        count: u32,
    ) {
        let ship_type = order.ship_type;
        let message = if !team.is_human() {
            let level = self
                .enemies
                .iter()
                .find(|e| e.team == team)
                .map_or(AiLevel::Normal, |e| e.level);
            let times = if count > 1 { format!(" ×{count}") } else { String::new() };
            format!("Enemy {} ({level}) built {ship_type}{times}", team.0)
        } else if producer_type == ShipType::Carrier {
            let times = if count > 1 { format!(" ×{count}") } else { String::new() };
            format!("Carrier built {ship_type}!{times}")
        } else if count > 1 {
            format!("{ship_type} built! Squadron of {count}")
        } else {
            format!("{ship_type} built!")
        };
        self.log(message);
    }

    fn advance_research(&mut self, delta_ms: u32, events: &mut TickEvents) {
        let Some(done) = self.research.tick(delta_ms) else {
            return;
        };

        let mut upgraded = 0;
        for ship in self.ships.sorted_ids() {
            if let Some(ship) = self.ships.get_mut(ship) {
                if ship.is_alive() && ship.team.is_human() && ship.ship_type == done.ship_type {
                    research::retrofit(ship, done.level);
                    upgraded += 1;
                }
            }
        }

        let suffix = match upgraded {
            0 => String::new(),
            1 => "  (1 ship upgraded)".to_string(),
            n => format!("  ({n} ships upgraded)"),
        };
        self.log(format!(
            "Research complete! {} → {}{suffix}",
            done.ship_type,
            level_label(done.level)
        ));
        if let Some(next) = self.research.active().copied() {
            self.log(format!(
                "Researching {} → {}... (from queue)",
                next.ship_type,
                level_label(next.level)
            ));
        }
        events.research_completed = Some(done);
    }

    // ── AI ───────────────────────────────────────────────────────────────

    fn run_ai(&mut self, delta_ms: u32) {
        for index in 0..self.enemies.len() {
            let (team, mothership) = (self.enemies[index].team, self.enemies[index].mothership);
            if !self.is_alive(mothership) {
                continue;
            }

            let gained = self.collect_deposits(team);
            self.enemies[index].resources += gained;

            let human_capital = self
                .is_alive(self.player_mothership)
                .then_some(self.player_mothership);
            let view = ai_view(
                &self.ships,
                &self.visibility,
                &self.asteroids,
                team,
                mothership,
                human_capital,
            );
            let commands = self.enemies[index].update(delta_ms, &view, &mut self.rng);
            for command in commands {
                self.apply_ai_command(index, command);
            }
        }
    }

    fn apply_ai_command(&mut self, index: usize, command: AiCommand) {
        let Some(controller) = self.enemies.get(index) else {
            return;
        };
        let (team, mothership, queue_limit) = (
            controller.team,
            controller.mothership,
            controller.level.tuning().build_queue_max,
        );

        match command {
            AiCommand::Mine { miner, asteroid } => {
                if let Some(ship) = self.owned_live_mut(miner, team) {
                    if let Some(state) = ship.miner.as_mut() {
                        state.assign(asteroid);
                        ship.destination = None;
                    }
                }
            }
            AiCommand::Build(ship_type) => {
                if let Err(err) = self.enqueue_build(mothership, ship_type, queue_limit) {
                    trace!(team = team.0, %ship_type, %err, "AI build rejected");
                }
            }
            AiCommand::Attack { ship, target } => {
                if !self.is_alive(target) {
                    return;
                }
                let Some(attacker) = self.owned_live_mut(ship, team) else {
                    return;
                };
                attacker.attack_target = Some(target);
                attacker.destination = None;
                if let Some(target) = self.ships.get_mut(target) {
                    target.is_targeted = true;
                }
            }
            AiCommand::MoveTo { ship, destination } => {
                if let Some(ship) = self.owned_live_mut(ship, team) {
                    ship.set_destination(destination);
                    ship.attack_target = None;
                }
            }
        }
    }

    pub(crate) fn owned_live_mut(&mut self, id: ShipId, team: TeamId) -> Option<&mut Ship> {
        self.ships
            .get_mut(id)
            .filter(|s| s.team == team && s.is_alive())
    }

    // ── Production requests ──────────────────────────────────────────────

    /// Orders of `ship_type` queued across all of `team`'s live producers.
    fn queued_orders(&self, team: TeamId, ship_type: ShipType) -> u32 {
        self.ships
            .iter()
            .filter(|s| s.team == team && s.is_alive())
            .filter_map(|s| s.build_queue.as_ref())
            .map(|q| q.count_of(ship_type))
            .sum()
    }

    /// Validate, charge and enqueue a build order at `producer`.
    pub(crate) fn enqueue_build(
        &mut self,
        producer: ShipId,
        ship_type: ShipType,
        queue_limit: usize,
    ) -> std::result::Result<(), BuildError> {
        let ship = self
            .ships
            .get(producer)
            .filter(|s| s.is_alive())
            .ok_or(BuildError::ProducerUnavailable(producer))?;
        let (team, producer_type) = (ship.team, ship.ship_type);
        if !producer_type.can_build(ship_type) {
            return Err(BuildError::NotInCatalog {
                producer: producer_type,
                ship_type,
            });
        }

        let budget = BuildBudget {
            resources: self.resources_of(team),
            queue_len: ship.build_queue.as_ref().map_or(0, BuildQueue::len),
            queue_limit,
            live: self.ships.count_live(team, ship_type),
            queued_orders: self.queued_orders(team, ship_type),
        };
        validate_build(ship_type, budget)?;

        self.ships
            .get_mut(producer)
            .and_then(|s| s.build_queue.as_mut())
            .ok_or(BuildError::ProducerUnavailable(producer))?
            .push(BuildOrder::new(ship_type))?;
        if let Some(resources) = self.resources_mut(team) {
            *resources -= ship_type.build_cost();
        }
        debug!(team = team.0, %producer, %ship_type, "Build queued");
        Ok(())
    }

    // ── Combat bookkeeping ───────────────────────────────────────────────

    fn record_kills(&mut self, kills: &[Kill]) {
        for kill in kills {
            let by_human = self
                .ships
                .get(kill.attacker)
                .is_some_and(|s| s.team.is_human());
            if by_human && !kill.victim_team.is_human() {
                self.log(format!("Enemy {} destroyed!", kill.victim_type));
            }
            debug!(
                attacker = %kill.attacker,
                victim = %kill.victim,
                victim_type = %kill.victim_type,
                "Ship destroyed"
            );
        }
    }

    fn log_dockings(&mut self, dockings: &[Docking], delta_ms: u32) {
        self.docking_log_timer_ms = self.docking_log_timer_ms.saturating_add(delta_ms);
        for docking in dockings {
            if self.docking_log_timer_ms < DOCKING_LOG_INTERVAL_MS {
                return;
            }
            let Some(ship) = self.ships.get(docking.ship) else {
                continue;
            };
            if ship.team.is_human() {
                let ship_type = ship.ship_type;
                self.log(format!("{ship_type} docking for repairs"));
                self.docking_log_timer_ms = 0;
            }
        }
    }

    /// Null dangling targets and drop dead ships. Dead motherships stay as
    /// defeat markers.
    fn prune(&mut self, events: &mut TickEvents) {
        let ids = self.ships.sorted_ids();
        let live: HashSet<ShipId> = ids.iter().copied().filter(|&id| self.is_alive(id)).collect();

        let mut targeted = HashSet::new();
        for &id in &ids {
            if let Some(ship) = self.ships.get_mut(id) {
                if ship.attack_target.is_some_and(|t| !live.contains(&t)) {
                    ship.attack_target = None;
                }
                if ship.is_alive() {
                    targeted.extend(ship.attack_target);
                }
            }
        }

        for id in ids {
            let Some(ship) = self.ships.get_mut(id) else {
                continue;
            };
            ship.is_targeted = targeted.contains(&id);
            if ship.is_alive() || ship.ship_type == ShipType::Mothership {
                continue;
            }
            if let Some(wreck) = self.ships.remove(id) {
                if let Some(miner) = wreck.miner {
                    self.ledger.lost += i64::from(miner.cargo + miner.pending_deposit);
                }
                events.destroyed.push(id);
            }
        }
    }

    fn check_outcome(&mut self, events: &mut TickEvents) {
        if !self.is_alive(self.player_mothership) {
            self.phase = GamePhase::GameOver;
            self.log("DEFEAT! Your mothership has been destroyed!");
        } else if !self.enemies.is_empty()
            && self.enemies.iter().all(|e| !self.is_alive(e.mothership))
        {
            self.phase = GamePhase::Victory;
            self.log("VICTORY! All enemy motherships destroyed!");
        } else {
            return;
        }
        info!(tick = self.tick, phase = ?self.phase, "Match over");
        events.phase_changed = Some(self.phase);
    }

    // ── Diagnostics ──────────────────────────────────────────────────────

    /// Hash of the full simulation state.
    ///
    /// Two worlds built from the same seed and fed the same commands and
    /// deltas hash identically.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.tick.hash(&mut hasher);
        self.elapsed_ms.hash(&mut hasher);
        self.phase.hash(&mut hasher);
        self.player_resources.hash(&mut hasher);
        self.enemies.hash(&mut hasher);
        self.research.hash(&mut hasher);

        let ids = self.ships.sorted_ids();
        ids.len().hash(&mut hasher);
        for id in ids {
            if let Some(ship) = self.ships.get(id) {
                ship.hash(&mut hasher);
            }
        }

        self.asteroids.hash(&mut hasher);
        self.effects.len().hash(&mut hasher);

        hasher.finish()
    }
}

/// Build the filtered view an opponent decides from.
fn ai_view<'a>(
    ships: &ShipStorage,
    visibility: &Visibility,
    asteroids: &'a [Asteroid],
    team: TeamId,
    mothership: ShipId,
    human_mothership: Option<ShipId>,
) -> AiView<'a> {
    let summarize = |s: &Ship| AiShip {
        id: s.id,
        ship_type: s.ship_type,
        position: s.position,
        miner_phase: s.miner_phase(),
        has_target: s.attack_target.is_some(),
    };
    let own = ships.live_of_team(team).into_iter().map(summarize).collect();
    let visible_hostiles = visibility
        .visible_to(team)
        .into_iter()
        .filter_map(|id| ships.get(id))
        .filter(|s| s.is_alive() && s.team.is_hostile_to(team))
        .map(summarize)
        .collect();
    let queue_len = ships
        .get(mothership)
        .and_then(|s| s.build_queue.as_ref())
        .map_or(0, BuildQueue::len);

    AiView {
        own,
        visible_hostiles,
        human_mothership,
        asteroids,
        queue_len,
    }
}

/// Sandbox world construction for tests and tools.
///
/// Unlike [`GameWorld::new`] nothing is generated: motherships go exactly
/// where they are placed, no starting workers or asteroids are added, and
/// zero opponents is allowed (victory is then never declared).
#[derive(Debug, Clone)]
pub struct WorldBuilder {
    seed: u64,
    human_mothership: Vec2Fixed,
    human_resources: i32,
    opponents: Vec<(AiLevel, Vec2Fixed)>,
    opponent_resources: i32,
    asteroids: Vec<(Vec2Fixed, i32)>,
    ai_enabled: bool,
}

impl Default for WorldBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl WorldBuilder {
    /// Start from an empty map with the human mothership at (1000, 2000).
    #[must_use]
    pub fn new() -> Self {
        Self {
            seed: 0,
            human_mothership: Vec2Fixed::from_ints(1_000, 2_000),
            human_resources: STARTING_RESOURCES,
            opponents: Vec::new(),
            opponent_resources: STARTING_RESOURCES,
            asteroids: Vec::new(),
            ai_enabled: true,
        }
    }

    /// Seed for in-match random choices.
    #[must_use]
    pub const fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Place the human mothership.
    #[must_use]
    pub const fn human_mothership(mut self, position: Vec2Fixed) -> Self {
        self.human_mothership = position;
        self
    }

    /// Human starting resources.
    #[must_use]
    pub const fn human_resources(mut self, resources: i32) -> Self {
        self.human_resources = resources;
        self
    }

    /// Add an opponent with its mothership at `position`.
    #[must_use]
    pub fn opponent(mut self, level: AiLevel, position: Vec2Fixed) -> Self {
        self.opponents.push((level, position));
        self
    }

    /// Starting resources of every opponent.
    #[must_use]
    pub const fn opponent_resources(mut self, resources: i32) -> Self {
        self.opponent_resources = resources;
        self
    }

    /// Add an asteroid.
    #[must_use]
    pub fn asteroid(mut self, position: Vec2Fixed, capacity: i32) -> Self {
        self.asteroids.push((position, capacity));
        self
    }

    /// Whether opponents run their controllers.
    #[must_use]
    pub const fn ai_enabled(mut self, enabled: bool) -> Self {
        self.ai_enabled = enabled;
        self
    }

    /// Build the world. The human mothership is ship 1; opponent motherships
    /// follow in the order they were added.
    #[must_use]
    pub fn build(self) -> GameWorld {
        let mut world = GameWorld::empty(SimRng::seeded(self.seed));
        world.ai_enabled = self.ai_enabled;
        world.player_resources = self.human_resources;
        world.player_mothership =
            world
                .ships
                .spawn(ShipType::Mothership, TeamId::HUMAN, self.human_mothership);

        for (index, (level, position)) in self.opponents.into_iter().enumerate() {
            let team = TeamId(index as u8 + 1);
            let mothership = world.ships.spawn(ShipType::Mothership, team, position);
            world.enemies.push(EnemyController::new(
                team,
                level,
                mothership,
                self.opponent_resources,
            ));
        }
        for (position, capacity) in self.asteroids {
            world.add_asteroid(position, capacity);
        }
        world.log_start();
        world
    }
}
