//! Simulation benchmarks for fleet_core.
//!
//! Run with: `cargo bench -p fleet_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use fleet_core::ai::AiLevel;
use fleet_core::config::WorldConfig;
use fleet_core::math::Vec2Fixed;
use fleet_core::ship::{ShipType, TeamId};
use fleet_core::world::{GameWorld, WorldBuilder};

fn three_opponent_world() -> GameWorld {
    let config = WorldConfig::new(
        7,
        vec![AiLevel::Normal, AiLevel::Hard, AiLevel::Expert],
    );
    let mut world = GameWorld::new(&config).expect("valid config");
    // Warm up so fleets and mining loops are in flight
    for _ in 0..2_000 {
        world.update(50);
    }
    world
}

fn brawl_world() -> GameWorld {
    let mut world = WorldBuilder::new()
        .opponent(AiLevel::Normal, Vec2Fixed::from_ints(5_000, 2_000))
        .ai_enabled(false)
        .build();
    for i in 0..60 {
        let y = 1_000 + 30 * i;
        world.spawn_ship(TeamId::HUMAN, ShipType::Corvette, Vec2Fixed::from_ints(3_000, y));
        world.spawn_ship(TeamId(1), ShipType::Interceptor, Vec2Fixed::from_ints(3_040, y));
    }
    world
}

/// Tick throughput of busy worlds.
pub fn simulation_benchmark(c: &mut Criterion) {
    let warmed = three_opponent_world();
    c.bench_function("tick_three_opponents", |b| {
        b.iter_batched(
            || warmed.clone(),
            |mut world| {
                for _ in 0..100 {
                    black_box(world.update(16));
                }
            },
            BatchSize::LargeInput,
        )
    });

    let brawl = brawl_world();
    c.bench_function("tick_brawl_120_ships", |b| {
        b.iter_batched(
            || brawl.clone(),
            |mut world| black_box(world.update(16)),
            BatchSize::SmallInput,
        )
    });

    c.bench_function("generate_world", |b| {
        let config = WorldConfig::new(99, vec![AiLevel::Normal; 3]);
        b.iter(|| black_box(GameWorld::new(&config)))
    });

    c.bench_function("state_hash", |b| b.iter(|| black_box(warmed.state_hash())));
}

criterion_group!(benches, simulation_benchmark);
criterion_main!(benches);
