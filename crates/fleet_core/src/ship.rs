//! Ship catalog and the universal ship entity.
//!
//! Every unit in the game is a [`Ship`]. Per-type differences live in the
//! [`ShipStats`] table and in a handful of optional sub-states (miner cargo,
//! build queue, probe movement counter) instead of a type hierarchy.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::asteroid::AsteroidId;
use crate::map_generation::map_bounds;
use crate::math::{milli, Fixed, Vec2Fixed};
use crate::production::BuildQueue;

/// Stable handle to a ship.
///
/// Ids are handed out monotonically and never reused, so a handle to a
/// pruned ship simply fails to resolve instead of aliasing a newer one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct ShipId(pub u64);

impl fmt::Display for ShipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Team identifier. Team 0 is the human side, 1..=3 are computer slots.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct TeamId(pub u8);

impl TeamId {
    /// The human-controlled team.
    pub const HUMAN: Self = Self(0);

    /// Whether this is the human side.
    #[must_use]
    pub const fn is_human(self) -> bool {
        self.0 == 0
    }

    /// Whether two teams are hostile. Computer teams share a coalition.
    #[must_use]
    pub const fn is_hostile_to(self, other: Self) -> bool {
        self.is_human() != other.is_human()
    }
}

/// Fixed ship-type catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ShipType {
    /// Capital command ship. One per side, never rebuilt.
    Mothership,
    /// Miner.
    Worker,
    /// Fast light fighter.
    Interceptor,
    /// Anti-capital fighter.
    Bomber,
    /// Light escort.
    Corvette,
    /// Anti-fighter escort.
    Frigate,
    /// Heavy warship.
    Destroyer,
    /// Heavy cruiser and dock station.
    Battlecruiser,
    /// Slow offload point for miners.
    ResourceCollector,
    /// Mobile dock, offload point and fighter factory.
    Carrier,
    /// Long-sighted scout.
    Probe,
}

/// Static per-type balance values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShipStats {
    /// Resource cost of one build order.
    pub build_cost: i32,
    /// Build time in milliseconds.
    pub build_time_ms: u32,
    /// Base hull points.
    pub max_hp: i32,
    /// Base damage per tick, in thousandths.
    pub damage_milli: i32,
    /// Base speed in world units per tick, in thousandths.
    pub speed_milli: i32,
    /// Weapon range in world units (0 = unarmed).
    pub attack_range: i32,
    /// Sensor radius in world units.
    pub vision_radius: i32,
    /// Maximum live + queued ships of this type per team.
    pub fleet_cap: u32,
    /// Ships spawned per completed build order.
    pub squadron_size: u32,
}

const fn stats(
    build_cost: i32,
    build_time_ms: u32,
    max_hp: i32,
    damage_milli: i32,
    speed_milli: i32,
    attack_range: i32,
    vision_radius: i32,
    fleet_cap: u32,
    squadron_size: u32,
) -> ShipStats {
    ShipStats {
        build_cost,
        build_time_ms,
        max_hp,
        damage_milli,
        speed_milli,
        attack_range,
        vision_radius,
        fleet_cap,
        squadron_size,
    }
}

impl ShipType {
    /// Every ship type, in catalog order.
    pub const ALL: [Self; 11] = [
        Self::Mothership,
        Self::Worker,
        Self::Interceptor,
        Self::Bomber,
        Self::Corvette,
        Self::Frigate,
        Self::Destroyer,
        Self::Battlecruiser,
        Self::ResourceCollector,
        Self::Carrier,
        Self::Probe,
    ];

    /// Types a carrier can build.
    pub const CARRIER_CATALOG: [Self; 4] =
        [Self::Interceptor, Self::Bomber, Self::Corvette, Self::Worker];

    /// Light fighters the AI fills its fleet with.
    pub const LIGHT_COMBAT: [Self; 3] = [Self::Interceptor, Self::Bomber, Self::Corvette];

    /// Balance table entry for this type.
    #[must_use]
    pub const fn stats(self) -> ShipStats {
        //                    cost   time    hp     dmg   speed range vision cap squad
        match self {
            Self::Mothership => stats(0, 0, 25_000, 1_000, 500, 80, 600, 1, 1),
            Self::Worker => stats(50, 5_000, 100, 0, 1_500, 0, 200, 20, 1),
            Self::Interceptor => stats(150, 6_000, 200, 300, 3_500, 40, 300, 30, 5),
            Self::Bomber => stats(200, 10_000, 220, 500, 2_500, 60, 250, 30, 5),
            Self::Corvette => stats(300, 12_000, 260, 400, 3_000, 55, 300, 18, 3),
            Self::Frigate => stats(500, 15_000, 500, 700, 1_800, 70, 350, 10, 1),
            Self::Destroyer => stats(800, 30_000, 3_000, 1_200, 1_300, 90, 400, 6, 1),
            Self::Battlecruiser => stats(1_500, 45_000, 10_000, 2_500, 1_000, 120, 450, 3, 1),
            Self::ResourceCollector => stats(400, 12_000, 600, 0, 1_200, 0, 250, 4, 1),
            Self::Carrier => stats(1_200, 40_000, 4_000, 800, 900, 70, 450, 3, 1),
            Self::Probe => stats(75, 4_000, 60, 0, 4_000, 0, 600, 5, 1),
        }
    }

    /// Resource cost of one build order.
    #[must_use]
    pub const fn build_cost(self) -> i32 {
        self.stats().build_cost
    }

    /// Ships spawned per build order.
    #[must_use]
    pub const fn squadron_size(self) -> u32 {
        self.stats().squadron_size
    }

    /// Weapon range as fixed-point.
    #[must_use]
    pub fn attack_range(self) -> Fixed {
        Fixed::from_num(self.stats().attack_range)
    }

    /// Sensor radius as fixed-point.
    #[must_use]
    pub fn vision_radius(self) -> Fixed {
        Fixed::from_num(self.stats().vision_radius)
    }

    /// Miners and collectors: never fire and are not opportunistic targets.
    #[must_use]
    pub const fn is_economic(self) -> bool {
        matches!(self, Self::Worker | Self::ResourceCollector)
    }

    /// Ship types the AI counts as its fighting fleet.
    #[must_use]
    pub const fn is_combat(self) -> bool {
        matches!(
            self,
            Self::Interceptor
                | Self::Bomber
                | Self::Corvette
                | Self::Frigate
                | Self::Destroyer
                | Self::Battlecruiser
        )
    }

    /// Whether the type carries a weapon at all.
    #[must_use]
    pub const fn is_armed(self) -> bool {
        let s = self.stats();
        s.damage_milli > 0 && s.attack_range > 0 && !self.is_economic()
    }

    /// Light ships repair while parked next to a dock station.
    #[must_use]
    pub const fn docks_for_repair(self) -> bool {
        matches!(
            self,
            Self::Interceptor | Self::Bomber | Self::Worker | Self::Corvette
        )
    }

    /// Ships that repair docked light craft.
    #[must_use]
    pub const fn is_dock_station(self) -> bool {
        matches!(self, Self::Mothership | Self::Battlecruiser | Self::Carrier)
    }

    /// Capital-scale hulls with slow passive repair.
    #[must_use]
    pub const fn self_repairs(self) -> bool {
        matches!(
            self,
            Self::Mothership
                | Self::Frigate
                | Self::Destroyer
                | Self::Battlecruiser
                | Self::ResourceCollector
                | Self::Carrier
        )
    }

    /// Radius within which a miner can unload at this ship, if it accepts cargo.
    #[must_use]
    pub fn offload_range(self) -> Option<Fixed> {
        match self {
            Self::Mothership => Some(Fixed::from_num(50)),
            Self::ResourceCollector => Some(Fixed::from_num(60)),
            Self::Carrier => Some(Fixed::from_num(80)),
            _ => None,
        }
    }

    /// Whether the research lab can upgrade this type.
    #[must_use]
    pub const fn is_researchable(self) -> bool {
        !matches!(
            self,
            Self::Mothership | Self::ResourceCollector | Self::Probe
        )
    }

    /// Whether ships of this type own a build queue.
    #[must_use]
    pub const fn is_producer(self) -> bool {
        matches!(self, Self::Mothership | Self::Carrier)
    }

    /// Whether `self` (as a producer) can build `other`.
    #[must_use]
    pub fn can_build(self, other: Self) -> bool {
        match self {
            Self::Mothership => other != Self::Mothership,
            Self::Carrier => Self::CARRIER_CATALOG.contains(&other),
            _ => false,
        }
    }
}

impl fmt::Display for ShipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Mothership => "Mothership",
            Self::Worker => "Worker",
            Self::Interceptor => "Interceptor",
            Self::Bomber => "Bomber",
            Self::Corvette => "Corvette",
            Self::Frigate => "Frigate",
            Self::Destroyer => "Destroyer",
            Self::Battlecruiser => "Battlecruiser",
            Self::ResourceCollector => "ResourceCollector",
            Self::Carrier => "Carrier",
            Self::Probe => "Probe",
        };
        f.write_str(name)
    }
}

/// Cargo a worker can carry per trip.
pub const CARGO_CAPACITY: i32 = 100;
/// Time spent at the asteroid before a load is extracted.
pub const MINING_DELAY_MS: u32 = 4000;
/// Time spent at the offload point before cargo is credited.
pub const OFFLOAD_DELAY_MS: u32 = 4000;
/// Distance at which a worker counts as parked at its asteroid.
pub const MINING_REACH: i32 = 30;
/// Destination changes a probe accepts before it powers down its engines.
pub const PROBE_MAX_MOVES: u8 = 3;

/// Which leg of the mining loop a worker is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MinerPhase {
    /// No mining order.
    #[default]
    Idle,
    /// Travelling to, or extracting from, the target asteroid.
    Mining,
    /// Carrying cargo back to an offload point.
    Returning,
}

/// Worker-only state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct MinerState {
    /// Current leg of the mining loop.
    pub phase: MinerPhase,
    /// Asteroid being mined.
    pub target_asteroid: Option<AsteroidId>,
    /// Resources on board.
    pub cargo: i32,
    /// Time parked at the asteroid.
    pub mining_timer_ms: u32,
    /// Time parked at the offload point.
    pub offload_timer_ms: u32,
    /// Whether the worker is inside offload range this tick.
    pub offloading: bool,
    /// Delivered cargo waiting to be credited to the team.
    pub pending_deposit: i32,
}

impl MinerState {
    /// Send the worker to `asteroid`, keeping any cargo already on board.
    pub fn assign(&mut self, asteroid: AsteroidId) {
        self.target_asteroid = Some(asteroid);
        self.phase = MinerPhase::Mining;
        self.mining_timer_ms = 0;
    }

    /// Drop the mining order.
    pub fn stop(&mut self) {
        self.phase = MinerPhase::Idle;
        self.mining_timer_ms = 0;
        self.offload_timer_ms = 0;
        self.offloading = false;
    }

    /// Fraction of the current extraction or offload delay completed.
    #[must_use]
    pub fn progress(&self) -> f32 {
        match self.phase {
            MinerPhase::Mining => self.mining_timer_ms as f32 / MINING_DELAY_MS as f32,
            MinerPhase::Returning if self.offloading => {
                self.offload_timer_ms as f32 / OFFLOAD_DELAY_MS as f32
            }
            _ => 0.0,
        }
    }
}

/// Probe-only state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ProbeState {
    /// Destination changes issued so far.
    pub moves: u8,
}

/// The universal entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ship {
    /// Stable handle.
    pub id: ShipId,
    /// Catalog entry.
    pub ship_type: ShipType,
    /// Owning team.
    pub team: TeamId,
    /// World position.
    pub position: Vec2Fixed,
    /// Current hull points. Always within `0..=max_hp`.
    pub hp: Fixed,
    /// Maximum hull points after upgrades.
    pub max_hp: Fixed,
    /// Damage per tick after upgrades.
    pub damage: Fixed,
    /// World units per tick after upgrades.
    pub speed: Fixed,
    /// Research level this hull was built or retrofitted to (0..=3).
    pub upgrade_level: u8,
    /// Selected by the human player.
    pub selected: bool,
    /// Currently the subject of an attack order.
    pub is_targeted: bool,
    /// Docked for repairs this tick.
    pub is_docking: bool,
    /// Received a miner offload this tick.
    pub is_receiving: bool,
    /// Movement order.
    pub destination: Option<Vec2Fixed>,
    /// Attack order. Non-owning; cleared when the target dies or is lost.
    pub attack_target: Option<ShipId>,
    /// Worker cargo and mining loop.
    pub miner: Option<MinerState>,
    /// Production queue for motherships and carriers.
    pub build_queue: Option<BuildQueue>,
    /// Probe movement counter.
    pub probe: Option<ProbeState>,
}

impl Ship {
    /// Create a ship with base stats at full health.
    #[must_use]
    pub fn new(id: ShipId, ship_type: ShipType, team: TeamId, position: Vec2Fixed) -> Self {
        let stats = ship_type.stats();
        let max_hp = Fixed::from_num(stats.max_hp);
        Self {
            id,
            ship_type,
            team,
            position,
            hp: max_hp,
            max_hp,
            damage: milli(stats.damage_milli),
            speed: milli(stats.speed_milli),
            upgrade_level: 0,
            selected: false,
            is_targeted: false,
            is_docking: false,
            is_receiving: false,
            destination: None,
            attack_target: None,
            miner: (ship_type == ShipType::Worker).then(MinerState::default),
            build_queue: ship_type.is_producer().then(BuildQueue::new),
            probe: (ship_type == ShipType::Probe).then(ProbeState::default),
        }
    }

    /// A ship is alive while it has hull left.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.hp > Fixed::ZERO
    }

    /// Remaining hull as a fraction of maximum.
    #[must_use]
    pub fn hp_fraction(&self) -> Fixed {
        if self.max_hp > Fixed::ZERO {
            self.hp / self.max_hp
        } else {
            Fixed::ZERO
        }
    }

    /// Apply damage, clamping at zero. Returns true if this killed the ship.
    pub fn apply_damage(&mut self, amount: Fixed) -> bool {
        if !self.is_alive() || amount <= Fixed::ZERO {
            return false;
        }
        self.hp = (self.hp - amount).max(Fixed::ZERO);
        !self.is_alive()
    }

    /// Restore hull, clamping at maximum. Dead ships stay dead.
    pub fn heal(&mut self, amount: Fixed) {
        if self.is_alive() && amount > Fixed::ZERO {
            self.hp = (self.hp + amount).min(self.max_hp);
        }
    }

    /// Assign a movement order, clamped to the map.
    ///
    /// Probes count their orders and cut their engines once the allowance
    /// is exceeded; they still hold position as a sensor.
    pub fn set_destination(&mut self, destination: Vec2Fixed) {
        let (min, max) = map_bounds();
        self.destination = Some(destination.clamp(min, max));
        if let Some(probe) = self.probe.as_mut() {
            probe.moves = probe.moves.saturating_add(1);
            if probe.moves > PROBE_MAX_MOVES {
                self.speed = Fixed::ZERO;
            }
        }
    }

    /// Cargo waiting to be credited, taken out of the ship.
    pub fn take_pending_deposit(&mut self) -> i32 {
        self.miner
            .as_mut()
            .map_or(0, |miner| std::mem::take(&mut miner.pending_deposit))
    }

    /// Miner phase, if this is a worker.
    #[must_use]
    pub fn miner_phase(&self) -> Option<MinerPhase> {
        self.miner.as_ref().map(|m| m.phase)
    }
}
