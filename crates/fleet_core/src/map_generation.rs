//! Procedural match layout.
//!
//! Generates:
//! - the human mothership in the western zone
//! - one mothership per opponent in the eastern zone, spread vertically
//! - three starting workers around every mothership
//! - a starter cluster of asteroids near each mothership plus a scattered field
//!
//! All draws come from the world's [`SimRng`], so a seed reproduces the map.

use crate::math::{Fixed, Vec2Fixed};
use crate::rng::SimRng;

/// Map width in world units.
pub const MAP_WIDTH: i32 = 6_000;
/// Map height in world units.
pub const MAP_HEIGHT: i32 = 4_000;
/// Workers each side starts with.
pub const STARTING_MINERS: usize = 3;
/// Smallest asteroid capacity (inclusive).
pub const ASTEROID_MIN_RESOURCES: i32 = 1_500;
/// Largest asteroid capacity (exclusive).
pub const ASTEROID_MAX_RESOURCES: i32 = 20_000;

const MOTHERSHIP_SEPARATION: i32 = 600;
const SPAWN_ATTEMPTS: usize = 10;
const WORKER_SCATTER: i32 = 80;
const STARTER_ASTEROIDS: usize = 3;
const STARTER_RADIUS_MIN: i32 = 180;
const STARTER_RADIUS_MAX: i32 = 350;
const FIELD_ASTEROIDS_MIN: i32 = 24;
const FIELD_ASTEROIDS_EXTRA: i32 = 12;
const FIELD_CLEARANCE: i32 = 150;

/// A side's starting position and escort.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SideLayout {
    /// Mothership position.
    pub mothership: Vec2Fixed,
    /// Starting worker positions.
    pub workers: Vec<Vec2Fixed>,
}

/// A generated match layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapLayout {
    /// The human side.
    pub human: SideLayout,
    /// One entry per opponent, in team order.
    pub opponents: Vec<SideLayout>,
    /// Asteroid positions and capacities.
    pub asteroids: Vec<(Vec2Fixed, i32)>,
}

impl MapLayout {
    /// Every mothership position, human first.
    pub fn motherships(&self) -> impl Iterator<Item = Vec2Fixed> + '_ {
        std::iter::once(self.human.mothership).chain(self.opponents.iter().map(|o| o.mothership))
    }
}

/// Map bounds as a pair of corners.
#[must_use]
pub fn map_bounds() -> (Vec2Fixed, Vec2Fixed) {
    (Vec2Fixed::ZERO, Vec2Fixed::from_ints(MAP_WIDTH, MAP_HEIGHT))
}

/// Pick a spawn point in `[x_min, x_max) x [y_min, y_max)` at least
/// [`MOTHERSHIP_SEPARATION`] from every existing point, falling back to the
/// zone centre.
fn spawn_point(
    rng: &mut SimRng,
    (x_min, x_max): (i32, i32),
    (y_min, y_max): (i32, i32),
    existing: &[Vec2Fixed],
) -> Vec2Fixed {
    let separation = Fixed::from_num(MOTHERSHIP_SEPARATION);
    let separation_sq = separation * separation;
    for _ in 0..SPAWN_ATTEMPTS {
        let candidate = Vec2Fixed::from_ints(
            rng.range_i32(x_min, x_max),
            rng.range_i32(y_min, y_max),
        );
        if existing
            .iter()
            .all(|p| p.distance_squared(candidate) >= separation_sq)
        {
            return candidate;
        }
    }
    let two = Fixed::from_num(2);
    Vec2Fixed::new(
        Fixed::from_num(x_min + x_max) / two,
        Fixed::from_num(y_min + y_max) / two,
    )
}

fn side(rng: &mut SimRng, mothership: Vec2Fixed) -> SideLayout {
    let workers = (0..STARTING_MINERS)
        .map(|_| rng.offset_around(mothership, Fixed::from_num(WORKER_SCATTER)))
        .collect();
    SideLayout {
        mothership,
        workers,
    }
}

/// Vertical band for opponent `index` of `count`.
fn opponent_band(rng: &mut SimRng, index: usize, count: usize) -> (i32, i32) {
    let height = MAP_HEIGHT;
    let base = if count <= 1 {
        height / 2
    } else {
        height / 10 + (height * 8 / 10) * index as i32 / (count as i32 - 1)
    };
    let jitter_span = height * 15 / 100;
    let center = (base + rng.range_i32(-jitter_span, jitter_span + 1)).clamp(300, height - 300);
    (center - 100, center + 100)
}

fn asteroid_capacity(rng: &mut SimRng) -> i32 {
    rng.range_i32(ASTEROID_MIN_RESOURCES, ASTEROID_MAX_RESOURCES)
}

/// Generate a layout for `opponents` computer sides.
pub fn generate(opponents: usize, rng: &mut SimRng) -> MapLayout {
    let mut placed = Vec::with_capacity(opponents + 1);

    let human_pos = spawn_point(
        rng,
        (200, MAP_WIDTH * 3 / 10),
        (200, MAP_HEIGHT - 200),
        &placed,
    );
    placed.push(human_pos);
    let human = side(rng, human_pos);

    let mut sides = Vec::with_capacity(opponents);
    for index in 0..opponents {
        let band = opponent_band(rng, index, opponents);
        let pos = spawn_point(rng, (MAP_WIDTH * 7 / 10, MAP_WIDTH - 200), band, &placed);
        placed.push(pos);
        sides.push(side(rng, pos));
    }

    let (min, max) = map_bounds();
    let mut asteroids = Vec::new();
    for &center in &placed {
        for _ in 0..STARTER_ASTEROIDS {
            let radius = rng.range_fixed(
                Fixed::from_num(STARTER_RADIUS_MIN),
                Fixed::from_num(STARTER_RADIUS_MAX),
            );
            let position = (center + rng.unit_direction().scale(radius)).clamp(min, max);
            asteroids.push((position, asteroid_capacity(rng)));
        }
    }

    let clearance = Fixed::from_num(FIELD_CLEARANCE);
    let clearance_sq = clearance * clearance;
    let field = FIELD_ASTEROIDS_MIN + rng.range_i32(0, FIELD_ASTEROIDS_EXTRA);
    for _ in 0..field {
        let position = Vec2Fixed::from_ints(
            rng.range_i32(200, MAP_WIDTH - 200),
            rng.range_i32(100, MAP_HEIGHT - 100),
        );
        let capacity = asteroid_capacity(rng);
        if placed
            .iter()
            .all(|m| m.distance_squared(position) >= clearance_sq)
        {
            asteroids.push((position, capacity));
        }
    }

    MapLayout {
        human,
        opponents: sides,
        asteroids,
    }
}
