//! Computer opponents.
//!
//! Each opponent runs an [`EnemyController`] that reads a filtered
//! [`AiView`] of the world (own ships plus whatever its team can see) and
//! answers with [`AiCommand`] intents. The world validates and applies the
//! intents, so a controller can never act on information or resources it
//! does not have. Difficulty only changes cadence and thresholds.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::asteroid::{find_nearest_live, Asteroid, AsteroidId};
use crate::map_generation::{MAP_HEIGHT, MAP_WIDTH};
use crate::math::Vec2Fixed;
use crate::rng::SimRng;
use crate::ship::{MinerPhase, ShipId, ShipType, TeamId};

/// Opponent difficulty tier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum AiLevel {
    /// Slow, light fighters only.
    Easy,
    /// The default opponent.
    #[default]
    Normal,
    /// Uses collectors and raids the human economy.
    Hard,
    /// Fast cadence and a heavy fleet.
    Expert,
}

impl AiLevel {
    /// Every tier, easiest first.
    pub const ALL: [Self; 4] = [Self::Easy, Self::Normal, Self::Hard, Self::Expert];

    /// Tuning table for this tier.
    #[must_use]
    pub const fn tuning(self) -> AiTuning {
        match self {
            Self::Easy => AiTuning {
                target_miners: 3,
                build_queue_max: 2,
                build_interval_ms: 12_000,
                wave_interval_ms: 90_000,
                min_fleet_to_attack: 8,
                combat_build_threshold: 600,
                uses_collectors: false,
                targets_economy: false,
                target_probes: 1,
            },
            Self::Normal => AiTuning {
                target_miners: 5,
                build_queue_max: 3,
                build_interval_ms: 8_000,
                wave_interval_ms: 60_000,
                min_fleet_to_attack: 5,
                combat_build_threshold: 400,
                uses_collectors: false,
                targets_economy: false,
                target_probes: 1,
            },
            Self::Hard => AiTuning {
                target_miners: 7,
                build_queue_max: 4,
                build_interval_ms: 5_000,
                wave_interval_ms: 40_000,
                min_fleet_to_attack: 4,
                combat_build_threshold: 300,
                uses_collectors: true,
                targets_economy: true,
                target_probes: 2,
            },
            Self::Expert => AiTuning {
                target_miners: 10,
                build_queue_max: 5,
                build_interval_ms: 3_000,
                wave_interval_ms: 25_000,
                min_fleet_to_attack: 3,
                combat_build_threshold: 200,
                uses_collectors: true,
                targets_economy: true,
                target_probes: 3,
            },
        }
    }
}

impl fmt::Display for AiLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Easy => "Easy",
            Self::Normal => "Normal",
            Self::Hard => "Hard",
            Self::Expert => "Expert",
        };
        f.write_str(name)
    }
}

/// Per-tier cadence and thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AiTuning {
    /// Workers to keep alive.
    pub target_miners: u32,
    /// Build queue limit for the controller's mothership.
    pub build_queue_max: usize,
    /// Time between build decisions.
    pub build_interval_ms: u32,
    /// Time between attack waves.
    pub wave_interval_ms: u32,
    /// Combat ships required before a wave launches.
    pub min_fleet_to_attack: usize,
    /// Banked resources required before combat ships are built.
    pub combat_build_threshold: i32,
    /// Whether resource collectors are built.
    pub uses_collectors: bool,
    /// Whether waves sometimes go after workers and collectors.
    pub targets_economy: bool,
    /// Probes to keep alive.
    pub target_probes: u32,
}

/// A ship as a controller sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AiShip {
    /// Handle.
    pub id: ShipId,
    /// Type.
    pub ship_type: ShipType,
    /// Position at the time the view was taken.
    pub position: Vec2Fixed,
    /// Worker phase, for workers.
    pub miner_phase: Option<MinerPhase>,
    /// Whether the ship already has an attack order.
    pub has_target: bool,
}

/// Everything a controller may read in one tick.
#[derive(Debug, Clone)]
pub struct AiView<'a> {
    /// Live ships of the controller's team.
    pub own: Vec<AiShip>,
    /// Live human ships in the team's visible set.
    pub visible_hostiles: Vec<AiShip>,
    /// The human mothership, while alive.
    pub human_mothership: Option<ShipId>,
    /// Asteroid field.
    pub asteroids: &'a [Asteroid],
    /// Orders in the controller's mothership queue.
    pub queue_len: usize,
}

/// An intent issued by a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiCommand {
    /// Send a worker to an asteroid.
    Mine {
        /// Worker.
        miner: ShipId,
        /// Asteroid to mine.
        asteroid: AsteroidId,
    },
    /// Queue a build at the controller's mothership.
    Build(ShipType),
    /// Order a ship to attack.
    Attack {
        /// Attacker.
        ship: ShipId,
        /// Target.
        target: ShipId,
    },
    /// Send a ship to a point.
    MoveTo {
        /// Ship to move.
        ship: ShipId,
        /// Destination.
        destination: Vec2Fixed,
    },
}

/// One computer opponent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnemyController {
    /// Team the controller plays.
    pub team: TeamId,
    /// Difficulty tier.
    pub level: AiLevel,
    /// The controller's mothership.
    pub mothership: ShipId,
    /// Banked resources.
    pub resources: i32,
    build_timer_ms: u32,
    wave_timer_ms: u32,
}

impl EnemyController {
    /// Create a controller for `team`.
    #[must_use]
    pub const fn new(team: TeamId, level: AiLevel, mothership: ShipId, resources: i32) -> Self {
        Self {
            team,
            level,
            mothership,
            resources,
            build_timer_ms: 0,
            wave_timer_ms: 0,
        }
    }

    /// Zero-based opponent index (team 1 is index 0).
    #[must_use]
    pub const fn index(&self) -> usize {
        self.team.0.saturating_sub(1) as usize
    }

    /// Short player-facing label, e.g. `Enemy 2`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("Enemy {}", self.index() + 1)
    }

    /// Run one tick of decisions.
    pub fn update(&mut self, delta_ms: u32, view: &AiView<'_>, rng: &mut SimRng) -> Vec<AiCommand> {
        let tuning = self.level.tuning();
        let mut commands = assign_idle_miners(view);

        self.build_timer_ms = self.build_timer_ms.saturating_add(delta_ms);
        if self.build_timer_ms >= tuning.build_interval_ms {
            self.build_timer_ms = 0;
            if let Some(ship_type) = self.choose_build(view, &tuning, rng) {
                debug!(team = self.team.0, %ship_type, "AI build decision");
                commands.push(AiCommand::Build(ship_type));
            }
        }

        self.wave_timer_ms = self.wave_timer_ms.saturating_add(delta_ms);
        if self.wave_timer_ms >= tuning.wave_interval_ms {
            self.wave_timer_ms = 0;
            let wave = plan_wave(view, &tuning, rng);
            debug!(team = self.team.0, orders = wave.len(), "AI wave");
            commands.extend(wave);
        }

        commands
    }

    fn choose_build(
        &self,
        view: &AiView<'_>,
        tuning: &AiTuning,
        rng: &mut SimRng,
    ) -> Option<ShipType> {
        if view.queue_len >= tuning.build_queue_max {
            return None;
        }

        let count = |t: ShipType| view.own.iter().filter(|s| s.ship_type == t).count() as u32;
        let miners = count(ShipType::Worker);
        let probes = count(ShipType::Probe);
        let collectors = count(ShipType::ResourceCollector);
        let combat = view.own.iter().filter(|s| s.ship_type.is_combat()).count() as u32;
        let affordable = |t: ShipType| self.resources >= t.build_cost();

        if miners < tuning.target_miners && affordable(ShipType::Worker) {
            return Some(ShipType::Worker);
        }
        if probes < tuning.target_probes && miners >= 1 && affordable(ShipType::Probe) {
            return Some(ShipType::Probe);
        }
        if tuning.uses_collectors
            && collectors < 1 + miners / 5
            && affordable(ShipType::ResourceCollector)
        {
            return Some(ShipType::ResourceCollector);
        }
        if miners >= 2 && self.resources >= tuning.combat_build_threshold {
            let choice = self.pick_combat_ship(combat, rng);
            return affordable(choice).then_some(choice);
        }
        None
    }

    fn pick_combat_ship(&self, combat: u32, rng: &mut SimRng) -> ShipType {
        let resources = self.resources;
        let heavy = match self.level {
            AiLevel::Easy => None,
            AiLevel::Normal => (combat > 6 && rng.one_in(3)).then_some(ShipType::Frigate),
            AiLevel::Hard => {
                if combat > 8 && resources > 800 && rng.one_in(3) {
                    Some(ShipType::Destroyer)
                } else if combat > 6 && rng.one_in(2) {
                    Some(ShipType::Frigate)
                } else {
                    None
                }
            }
            AiLevel::Expert => {
                if combat > 12 && resources > 1_500 && rng.one_in(4) {
                    Some(ShipType::Battlecruiser)
                } else if combat > 8 && resources > 800 && rng.one_in(3) {
                    Some(ShipType::Destroyer)
                } else if combat > 4 && resources > 500 && rng.one_in(2) {
                    Some(ShipType::Frigate)
                } else {
                    None
                }
            }
        };
        heavy.unwrap_or_else(|| {
            rng.pick(&ShipType::LIGHT_COMBAT)
                .copied()
                .unwrap_or(ShipType::Interceptor)
        })
    }
}

fn assign_idle_miners(view: &AiView<'_>) -> Vec<AiCommand> {
    view.own
        .iter()
        .filter(|s| s.miner_phase == Some(MinerPhase::Idle) && !s.has_target)
        .filter_map(|s| {
            find_nearest_live(view.asteroids, s.position).map(|asteroid| AiCommand::Mine {
                miner: s.id,
                asteroid,
            })
        })
        .collect()
}

fn plan_wave(view: &AiView<'_>, tuning: &AiTuning, rng: &mut SimRng) -> Vec<AiCommand> {
    let Some(human_mothership) = view.human_mothership else {
        return Vec::new();
    };

    let hostiles_besides_capital: Vec<&AiShip> = view
        .visible_hostiles
        .iter()
        .filter(|s| s.ship_type != ShipType::Mothership)
        .collect();

    let mut commands = Vec::new();
    let probes: Vec<ShipId> = view
        .own
        .iter()
        .filter(|s| s.ship_type == ShipType::Probe)
        .map(|s| s.id)
        .collect();
    if !probes.is_empty() && hostiles_besides_capital.is_empty() {
        commands.extend(scout(&probes, true, rng));
    }

    let fleet: Vec<ShipId> = view
        .own
        .iter()
        .filter(|s| s.ship_type.is_combat())
        .map(|s| s.id)
        .collect();
    if fleet.len() < tuning.min_fleet_to_attack {
        return commands;
    }
    if hostiles_besides_capital.is_empty() {
        commands.extend(scout(&fleet, false, rng));
        return commands;
    }

    let economic: Vec<ShipId> = view
        .visible_hostiles
        .iter()
        .filter(|s| s.ship_type.is_economic())
        .map(|s| s.id)
        .collect();
    let fighting: Vec<ShipId> = hostiles_besides_capital
        .iter()
        .filter(|s| !s.ship_type.is_economic())
        .map(|s| s.id)
        .collect();

    for ship in fleet {
        let raid = (tuning.targets_economy && rng.one_in(3))
            .then(|| rng.pick(&economic).copied())
            .flatten();
        let target = raid
            .or_else(|| rng.pick(&fighting).copied())
            .unwrap_or(human_mothership);
        commands.push(AiCommand::Attack { ship, target });
    }
    commands
}

const PROBE_GRID_X: [i32; 3] = [1_500, 3_000, 4_500];
const PROBE_GRID_Y: [i32; 3] = [1_000, 2_000, 3_000];

/// Spread ships over a search grid.
///
/// Probes cover the middle of the map; fighters sweep the western third,
/// where the human side starts.
fn scout(ships: &[ShipId], probes: bool, rng: &mut SimRng) -> Vec<AiCommand> {
    ships
        .iter()
        .enumerate()
        .map(|(i, &ship)| {
            let (x, y) = if probes {
                (
                    PROBE_GRID_X[i % 3] + rng.range_i32(-100, 100),
                    PROBE_GRID_Y[(i / 3) % 3] + rng.range_i32(-100, 100),
                )
            } else {
                let column = (i % 3) as i32;
                let row = ((i / 3) % 3) as i32;
                (
                    column * (MAP_WIDTH / 3) + rng.range_i32(-200, 200),
                    MAP_HEIGHT * row / 3 + rng.range_i32(-200, 200),
                )
            };
            AiCommand::MoveTo {
                ship,
                destination: Vec2Fixed::from_ints(x.clamp(0, MAP_WIDTH), y.clamp(0, MAP_HEIGHT)),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ai_ship(id: u64, ship_type: ShipType) -> AiShip {
        AiShip {
            id: ShipId(id),
            ship_type,
            position: Vec2Fixed::from_ints(5_000, 2_000),
            miner_phase: (ship_type == ShipType::Worker).then_some(MinerPhase::Mining),
            has_target: false,
        }
    }

    fn view(own: Vec<AiShip>, hostiles: Vec<AiShip>, asteroids: &[Asteroid]) -> AiView<'_> {
        AiView {
            own,
            visible_hostiles: hostiles,
            human_mothership: Some(ShipId(1)),
            asteroids,
            queue_len: 0,
        }
    }

    #[test]
    fn test_tier_table_is_monotonic() {
        for pair in AiLevel::ALL.windows(2) {
            let (a, b) = (pair[0].tuning(), pair[1].tuning());
            assert!(a.target_miners < b.target_miners);
            assert!(a.build_interval_ms > b.build_interval_ms);
            assert!(a.wave_interval_ms > b.wave_interval_ms);
        }
    }

    #[test]
    fn test_idle_miners_get_nearest_asteroid() {
        let asteroids = [
            Asteroid::new(AsteroidId(0), Vec2Fixed::from_ints(0, 0), 1_000),
            Asteroid::new(AsteroidId(1), Vec2Fixed::from_ints(5_100, 2_000), 1_000),
        ];
        let mut worker = ai_ship(7, ShipType::Worker);
        worker.miner_phase = Some(MinerPhase::Idle);
        let v = view(vec![worker], vec![], &asteroids);

        let commands = assign_idle_miners(&v);
        assert_eq!(
            commands,
            vec![AiCommand::Mine {
                miner: ShipId(7),
                asteroid: AsteroidId(1)
            }]
        );
    }

    #[test]
    fn test_builds_workers_first() {
        let mut ai = EnemyController::new(TeamId(1), AiLevel::Expert, ShipId(2), 500);
        let mut rng = SimRng::seeded(1);
        let v = view(vec![ai_ship(3, ShipType::Worker)], vec![], &[]);
        let commands = ai.update(3_000, &v, &mut rng);
        assert!(commands.contains(&AiCommand::Build(ShipType::Worker)));
    }

    #[test]
    fn test_build_waits_for_interval() {
        let mut ai = EnemyController::new(TeamId(1), AiLevel::Easy, ShipId(2), 500);
        let mut rng = SimRng::seeded(1);
        let v = view(vec![], vec![], &[]);
        assert!(ai.update(11_999, &v, &mut rng).is_empty());
        assert_eq!(ai.update(1, &v, &mut rng), vec![AiCommand::Build(ShipType::Worker)]);
    }

    #[test]
    fn test_full_queue_blocks_builds() {
        let ai = EnemyController::new(TeamId(1), AiLevel::Normal, ShipId(2), 5_000);
        let mut rng = SimRng::seeded(1);
        let mut v = view(vec![], vec![], &[]);
        v.queue_len = 3;
        assert_eq!(ai.choose_build(&v, &AiLevel::Normal.tuning(), &mut rng), None);
    }

    #[test]
    fn test_easy_builds_only_light_combat() {
        let ai = EnemyController::new(TeamId(1), AiLevel::Easy, ShipId(2), 5_000);
        let mut rng = SimRng::seeded(11);
        for _ in 0..50 {
            let pick = ai.pick_combat_ship(40, &mut rng);
            assert!(ShipType::LIGHT_COMBAT.contains(&pick));
        }
    }

    #[test]
    fn test_combat_waits_for_threshold() {
        let ai = EnemyController::new(TeamId(1), AiLevel::Normal, ShipId(2), 399);
        let mut rng = SimRng::seeded(1);
        let own: Vec<AiShip> = (0..5)
            .map(|i| ai_ship(10 + i, ShipType::Worker))
            .chain([ai_ship(20, ShipType::Probe)])
            .collect();
        let v = view(own, vec![], &[]);
        assert_eq!(ai.choose_build(&v, &AiLevel::Normal.tuning(), &mut rng), None);
    }

    #[test]
    fn test_wave_targets_visible_ships_only() {
        let own: Vec<AiShip> = (0..5).map(|i| ai_ship(10 + i, ShipType::Frigate)).collect();
        let hostiles = vec![ai_ship(1, ShipType::Mothership), ai_ship(50, ShipType::Corvette)];
        let v = view(own, hostiles, &[]);
        let mut rng = SimRng::seeded(5);

        let commands = plan_wave(&v, &AiLevel::Normal.tuning(), &mut rng);
        assert_eq!(commands.len(), 5);
        for c in commands {
            assert!(matches!(c, AiCommand::Attack { target: ShipId(50), .. }));
        }
    }

    #[test]
    fn test_small_fleet_does_not_attack() {
        let own: Vec<AiShip> = (0..2).map(|i| ai_ship(10 + i, ShipType::Frigate)).collect();
        let hostiles = vec![ai_ship(50, ShipType::Corvette)];
        let v = view(own, hostiles, &[]);
        let mut rng = SimRng::seeded(5);
        assert!(plan_wave(&v, &AiLevel::Easy.tuning(), &mut rng).is_empty());
    }

    #[test]
    fn test_fleet_scouts_when_nothing_visible() {
        let own: Vec<AiShip> = (0..4).map(|i| ai_ship(10 + i, ShipType::Interceptor)).collect();
        let v = view(own, vec![ai_ship(1, ShipType::Mothership)], &[]);
        let mut rng = SimRng::seeded(5);
        let commands = plan_wave(&v, &AiLevel::Hard.tuning(), &mut rng);
        assert_eq!(commands.len(), 4);
        for c in commands {
            let AiCommand::MoveTo { destination, .. } = c else {
                panic!("expected scouting move, got {c:?}");
            };
            let (x, y) = destination.to_f32();
            assert!((0.0..=6_000.0).contains(&x));
            assert!((0.0..=4_000.0).contains(&y));
        }
    }

    #[test]
    fn test_no_wave_once_human_mothership_is_gone() {
        let own: Vec<AiShip> = (0..10).map(|i| ai_ship(10 + i, ShipType::Frigate)).collect();
        let mut v = view(own, vec![ai_ship(50, ShipType::Corvette)], &[]);
        v.human_mothership = None;
        let mut rng = SimRng::seeded(5);
        assert!(plan_wave(&v, &AiLevel::Expert.tuning(), &mut rng).is_empty());
    }
}
