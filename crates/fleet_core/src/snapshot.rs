//! Read-only world views for renderers and tools.
//!
//! Snapshots convert fixed-point state to `f32` and flatten handles to plain
//! integers. They carry no authority: nothing a consumer does to a snapshot
//! reaches the simulation.

use serde::Serialize;

use crate::combat::EffectKind;
use crate::event_log::LogEntry;
use crate::research::level_label;
use crate::ship::{MinerPhase, Ship, ShipType, TeamId};
use crate::world::{GamePhase, GameWorld};

/// Mining loop state of a worker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MinerView {
    /// Loop phase.
    pub phase: MinerPhase,
    /// Cargo carried.
    pub cargo: i32,
    /// Extraction or offload progress in `0..=1`.
    pub progress: f32,
}

/// Production state of a mothership or carrier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductionView {
    /// Order in progress.
    pub current: Option<ShipType>,
    /// Progress of the current order in `0..=1`.
    pub progress: f32,
    /// Every order, current first.
    pub queue: Vec<ShipType>,
}

/// One ship.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShipView {
    /// Handle.
    pub id: u64,
    /// Catalog entry.
    pub ship_type: ShipType,
    /// Owning team.
    pub team: u8,
    /// World x.
    pub x: f32,
    /// World y.
    pub y: f32,
    /// Current hull points.
    pub hp: f32,
    /// Maximum hull points.
    pub max_hp: f32,
    /// Research level of the hull.
    pub upgrade_level: u8,
    /// Hull points above zero.
    pub alive: bool,
    /// Selected by the player.
    pub selected: bool,
    /// Subject of an attack order.
    pub is_targeted: bool,
    /// Docked for repairs this tick.
    pub is_docking: bool,
    /// Received an offload this tick.
    pub is_receiving: bool,
    /// Attack order target.
    pub attack_target: Option<u64>,
    /// Whether the human side can currently see this ship.
    pub visible_to_player: bool,
    /// Worker state.
    pub miner: Option<MinerView>,
    /// Producer state.
    pub production: Option<ProductionView>,
}

/// One asteroid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AsteroidView {
    /// Handle.
    pub id: usize,
    /// World x.
    pub x: f32,
    /// World y.
    pub y: f32,
    /// Resource units left.
    pub remaining: i32,
    /// Resource units at creation.
    pub capacity: i32,
    /// Size tier for sprite selection.
    pub tier: u8,
}

/// One transient effect.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectView {
    /// Visual style.
    pub kind: EffectKind,
    /// Shooter position.
    pub from: (f32, f32),
    /// Impact position.
    pub to: (f32, f32),
    /// Normalized age in `0..=1`.
    pub age: f32,
}

/// A team's resource counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamResources {
    /// Owning team.
    pub team: u8,
    /// Banked resources.
    pub resources: i32,
}

/// Human research ledger.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResearchView {
    /// Active type and the label of the level it targets.
    pub active: Option<(ShipType, &'static str)>,
    /// Progress of the active order in `0..=1`.
    pub progress: f32,
    /// Pre-paid types, in start order.
    pub queued: Vec<ShipType>,
    /// Level label of every researchable type.
    pub levels: Vec<(ShipType, &'static str)>,
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorldSnapshot {
    /// Ticks processed.
    pub tick: u64,
    /// Simulation time.
    pub elapsed_ms: u64,
    /// Match phase.
    pub phase: GamePhase,
    /// Every stored ship, in id order.
    pub ships: Vec<ShipView>,
    /// The asteroid field.
    pub asteroids: Vec<AsteroidView>,
    /// Live effects.
    pub effects: Vec<EffectView>,
    /// Human first, then opponents in team order.
    pub resources: Vec<TeamResources>,
    /// Human research ledger.
    pub research: ResearchView,
    /// Newest first.
    pub log: Vec<LogEntry>,
}

impl WorldSnapshot {
    /// Ships the human side can see.
    pub fn visible_ships(&self) -> impl Iterator<Item = &ShipView> {
        self.ships.iter().filter(|s| s.visible_to_player)
    }
}

fn ship_view(world: &GameWorld, ship: &Ship) -> ShipView {
    let (x, y) = ship.position.to_f32();
    let miner = ship.miner.as_ref().map(|m| MinerView {
        phase: m.phase,
        cargo: m.cargo,
        progress: m.progress(),
    });
    let production = ship.build_queue.as_ref().map(|q| ProductionView {
        current: q.current().map(|o| o.ship_type),
        progress: q.current().map_or(0.0, |o| o.progress()),
        queue: q.iter().map(|o| o.ship_type).collect(),
    });

    ShipView {
        id: ship.id.0,
        ship_type: ship.ship_type,
        team: ship.team.0,
        x,
        y,
        hp: ship.hp.to_num(),
        max_hp: ship.max_hp.to_num(),
        upgrade_level: ship.upgrade_level,
        alive: ship.is_alive(),
        selected: ship.selected,
        is_targeted: ship.is_targeted,
        is_docking: ship.is_docking,
        is_receiving: ship.is_receiving,
        attack_target: ship.attack_target.map(|t| t.0),
        visible_to_player: world.visibility().is_visible(ship.id, TeamId::HUMAN),
        miner,
        production,
    }
}

impl GameWorld {
    /// Capture a read-only view of the world.
    #[must_use]
    pub fn snapshot(&self) -> WorldSnapshot {
        let ships = self
            .ships()
            .sorted_ids()
            .into_iter()
            .filter_map(|id| self.ship(id))
            .map(|ship| ship_view(self, ship))
            .collect();

        let asteroids = self
            .asteroids()
            .iter()
            .map(|a| {
                let (x, y) = a.position.to_f32();
                AsteroidView {
                    id: a.id.0,
                    x,
                    y,
                    remaining: a.remaining,
                    capacity: a.capacity,
                    tier: a.tier(),
                }
            })
            .collect();

        let effects = self
            .effects()
            .iter()
            .map(|e| EffectView {
                kind: e.kind,
                from: e.from.to_f32(),
                to: e.to.to_f32(),
                age: e.age(),
            })
            .collect();

        let resources = std::iter::once(TeamResources {
            team: TeamId::HUMAN.0,
            resources: self.player_resources(),
        })
        .chain(self.enemies().iter().map(|e| TeamResources {
            team: e.team.0,
            resources: e.resources,
        }))
        .collect();

        let research = self.research();
        let research = ResearchView {
            active: research
                .active()
                .map(|a| (a.ship_type, level_label(a.level))),
            progress: research.active().map_or(0.0, |a| a.progress()),
            queued: research.queued().collect(),
            levels: ShipType::ALL
                .iter()
                .filter(|t| t.is_researchable())
                .map(|&t| (t, level_label(research.level(t))))
                .collect(),
        };

        WorldSnapshot {
            tick: self.tick(),
            elapsed_ms: self.elapsed_ms(),
            phase: self.phase(),
            ships,
            asteroids,
            effects,
            resources,
            research,
            log: self.event_log().iter().cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::ai::AiLevel;
    use crate::math::Vec2Fixed;
    use crate::ship::{ShipType, TeamId};
    use crate::world::WorldBuilder;

    #[test]
    fn test_snapshot_hides_unseen_enemies() {
        let mut world = WorldBuilder::new()
            .opponent(AiLevel::Easy, Vec2Fixed::from_ints(5_000, 2_000))
            .ai_enabled(false)
            .build();
        world.spawn_ship(TeamId(1), ShipType::Interceptor, Vec2Fixed::from_ints(1_100, 2_000));
        world.update(16);

        let snapshot = world.snapshot();
        let visible: Vec<_> = snapshot.visible_ships().map(|s| (s.team, s.ship_type)).collect();
        assert!(visible.contains(&(0, ShipType::Mothership)));
        assert!(visible.contains(&(1, ShipType::Interceptor)));
        assert!(!visible.contains(&(1, ShipType::Mothership)));
        assert_eq!(snapshot.resources.len(), 2);
    }

    #[test]
    fn test_snapshot_serializes() {
        let world = WorldBuilder::new()
            .asteroid(Vec2Fixed::from_ints(1_300, 2_000), 2_000)
            .build();
        let json = serde_json::to_string(&world.snapshot()).unwrap();
        assert!(json.contains("\"phase\":\"Playing\""));
        assert!(json.contains("\"remaining\":2000"));
    }
}
