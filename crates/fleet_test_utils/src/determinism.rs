//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the simulation produces identical
//! results given identical inputs.
//!
//! # Testing Strategy
//!
//! A seed plus a sequence of commands and deltas must fully determine a
//! match. Sources of non-determinism include:
//!
//! - **Floating-point math**: We use fixed-point arithmetic via
//!   [`fleet_core::math::Fixed`] inside the tick.
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   Ships are always processed in sorted id order.
//!
//! - **System randomness**: Every random choice draws from the world's
//!   seeded [`fleet_core::rng::SimRng`].

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use fleet_core::world::GameWorld;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for deterministic simulation).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the simulation was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the simulation produced different hashes across runs.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            panic!(
                "Simulation is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                self.unique_hashes().len(),
                self.hashes
            );
        }
    }
}

/// Run a simulation multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run the simulation
/// * `ticks` - Number of ticks to simulate per run
/// * `setup` - Function to create initial simulation state
/// * `step` - Function to advance simulation by one tick
/// * `hash` - Function to compute state hash
///
/// # Example
///
/// ```
/// use fleet_test_utils::determinism::verify_determinism;
/// use fleet_test_utils::fixtures::duel_world;
///
/// let result = verify_determinism(
///     3,
///     100,
///     duel_world,
///     |world| {
///         world.update(16);
///     },
///     |world| world.state_hash(),
/// );
/// result.assert_deterministic();
/// ```
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..ticks {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Run a world twice with a fixed delta and compare final hashes.
pub fn verify_world_determinism<F>(setup_fn: F, num_ticks: u64, delta_ms: u32) -> bool
where
    F: Fn() -> GameWorld,
{
    verify_determinism(
        2,
        num_ticks,
        &setup_fn,
        |world| {
            world.update(delta_ms);
        },
        GameWorld::state_hash,
    )
    .is_deterministic
}

/// Run worlds on separate threads and collect final hashes.
///
/// Catches non-determinism that only shows up under different memory
/// layouts or hasher seeds.
pub fn run_parallel_worlds<F>(setup_fn: F, num_worlds: usize, num_ticks: u64, delta_ms: u32) -> Vec<u64>
where
    F: Fn() -> GameWorld + Sync,
{
    thread::scope(|s| {
        let handles: Vec<_> = (0..num_worlds)
            .map(|_| {
                s.spawn(|| {
                    let mut world = setup_fn();
                    for _ in 0..num_ticks {
                        world.update(delta_ms);
                    }
                    world.state_hash()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("simulation thread panicked"))
            .collect()
    })
}

/// Compare two runs tick-by-tick, finding the first divergence.
///
/// # Returns
///
/// `None` if the runs stay identical, `Some(tick)` for the first tick at
/// which they differ.
pub fn find_first_divergence<F>(setup_fn: F, num_ticks: u64, delta_ms: u32) -> Option<u64>
where
    F: Fn() -> GameWorld,
{
    let mut a = setup_fn();
    let mut b = setup_fn();

    if a.state_hash() != b.state_hash() {
        return Some(0);
    }

    for tick in 1..=num_ticks {
        a.update(delta_ms);
        b.update(delta_ms);

        if a.state_hash() != b.state_hash() {
            return Some(tick);
        }
    }

    None
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for simulation inputs.
pub mod strategies {
    use proptest::prelude::*;

    use fleet_core::ai::AiLevel;
    use fleet_core::map_generation::{MAP_HEIGHT, MAP_WIDTH};
    use fleet_core::math::{Fixed, Vec2Fixed};
    use fleet_core::ship::ShipType;

    /// Any world seed.
    pub fn arb_seed() -> impl Strategy<Value = u64> {
        any::<u64>()
    }

    /// Frame deltas between 1 ms and 100 ms.
    pub fn arb_delta_ms() -> impl Strategy<Value = u32> {
        1u32..=100u32
    }

    /// Any ship type.
    pub fn arb_ship_type() -> impl Strategy<Value = ShipType> {
        proptest::sample::select(ShipType::ALL.to_vec())
    }

    /// Any armed ship type other than the mothership.
    pub fn arb_combat_type() -> impl Strategy<Value = ShipType> {
        proptest::sample::select(
            ShipType::ALL
                .iter()
                .copied()
                .filter(|t| t.is_armed() && *t != ShipType::Mothership)
                .collect::<Vec<_>>(),
        )
    }

    /// Any type with an upgrade track.
    pub fn arb_researchable_type() -> impl Strategy<Value = ShipType> {
        proptest::sample::select(
            ShipType::ALL
                .iter()
                .copied()
                .filter(|t| t.is_researchable())
                .collect::<Vec<_>>(),
        )
    }

    /// Any difficulty tier.
    pub fn arb_ai_level() -> impl Strategy<Value = AiLevel> {
        proptest::sample::select(AiLevel::ALL.to_vec())
    }

    /// A valid opponent list (one to three entries).
    pub fn arb_opponents() -> impl Strategy<Value = Vec<AiLevel>> {
        proptest::collection::vec(arb_ai_level(), 1..=3)
    }

    /// A position inside the map.
    pub fn arb_position() -> impl Strategy<Value = Vec2Fixed> {
        (0..MAP_WIDTH, 0..MAP_HEIGHT).prop_map(|(x, y)| Vec2Fixed::from_ints(x, y))
    }

    /// Damage or heal amounts between 0 and 2000 hull points.
    pub fn arb_amount() -> impl Strategy<Value = Fixed> {
        (0i32..2_000i32).prop_map(Fixed::from_num)
    }

    /// A sequence of signed hull changes: positive heals, negative damages.
    pub fn arb_hull_changes(max_len: usize) -> impl Strategy<Value = Vec<i32>> {
        proptest::collection::vec(-2_000i32..2_000i32, 0..max_len)
    }
}
