//! Test fixtures and helpers.
//!
//! Pre-built worlds and value helpers for consistent testing.

use fixed::types::I32F32;
use fleet_core::ai::AiLevel;
use fleet_core::config::WorldConfig;
use fleet_core::math::Vec2Fixed;
use fleet_core::ship::{ShipId, ShipType, TeamId};
use fleet_core::world::{GameWorld, WorldBuilder};

/// Delta used by fixtures that step at roughly 60 ticks per second.
pub const FRAME_MS: u32 = 16;

/// Human mothership position in sandbox fixtures.
pub const HUMAN_BASE: (i32, i32) = (1_000, 2_000);

/// Opponent mothership position in sandbox fixtures.
pub const ENEMY_BASE: (i32, i32) = (5_000, 2_000);

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Note: In real simulation code, never use floats.
/// This is only for convenient test setup.
#[must_use]
pub fn fixed_f(n: f64) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a position from integer coordinates.
#[must_use]
pub fn pos(x: i32, y: i32) -> Vec2Fixed {
    Vec2Fixed::from_ints(x, y)
}

/// Sandbox with both motherships placed far apart and the AI switched off.
///
/// Nothing moves unless the test orders it to.
#[must_use]
pub fn duel_world() -> GameWorld {
    WorldBuilder::new()
        .human_mothership(pos(HUMAN_BASE.0, HUMAN_BASE.1))
        .opponent(AiLevel::Normal, pos(ENEMY_BASE.0, ENEMY_BASE.1))
        .ai_enabled(false)
        .build()
}

/// Sandbox with a single asteroid 200 units east of the human mothership.
#[must_use]
pub fn mining_world(capacity: i32) -> GameWorld {
    WorldBuilder::new()
        .human_mothership(pos(HUMAN_BASE.0, HUMAN_BASE.1))
        .opponent(AiLevel::Normal, pos(ENEMY_BASE.0, ENEMY_BASE.1))
        .asteroid(pos(HUMAN_BASE.0 + 200, HUMAN_BASE.1), capacity)
        .ai_enabled(false)
        .build()
}

/// A generated match.
///
/// # Panics
///
/// Panics if `opponents` is outside `1..=3`.
#[must_use]
pub fn skirmish_world(seed: u64, opponents: &[AiLevel]) -> GameWorld {
    GameWorld::new(&WorldConfig::new(seed, opponents.to_vec()))
        .expect("fixture opponent count must be valid")
}

/// Spawn `count` ships of one type in a vertical line starting at `origin`.
pub fn spawn_line(
    world: &mut GameWorld,
    team: TeamId,
    ship_type: ShipType,
    origin: (i32, i32),
    count: usize,
) -> Vec<ShipId> {
    (0..count)
        .map(|i| world.spawn_ship(team, ship_type, pos(origin.0, origin.1 + 20 * i as i32)))
        .collect()
}

/// Advance a world by `ticks` frames of [`FRAME_MS`].
pub fn run_frames(world: &mut GameWorld, ticks: u64) {
    for _ in 0..ticks {
        world.update(FRAME_MS);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duel_world_has_two_motherships() {
        let world = duel_world();
        assert_eq!(world.ships().len(), 2);
        assert_eq!(world.enemies().len(), 1);
    }

    #[test]
    fn test_spawn_line_spacing() {
        let mut world = duel_world();
        let ids = spawn_line(&mut world, TeamId::HUMAN, ShipType::Corvette, (1_500, 1_000), 3);
        assert_eq!(ids.len(), 3);
        let last = world.ship(ids[2]).expect("spawned");
        assert_eq!(last.position, pos(1_500, 1_040));
    }
}
