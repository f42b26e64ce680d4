//! End-to-end behaviour of the simulation through its public surface.

use fleet_core::prelude::*;
use fleet_core::map_generation::MAP_WIDTH;
use fleet_core::world::WorldBuilder;
use fleet_test_utils::fixtures::{
    duel_world, fixed, mining_world, pos, run_frames, skirmish_world, spawn_line,
};

fn close(a: Fixed, b: Fixed) -> bool {
    (a - b).abs() < fixed(1) / fixed(1_000)
}

// =============================================================================
// Economy
// =============================================================================

mod economy {
    use super::*;

    /// A worker fills up, flies home, unloads 100 and heads straight back out.
    #[test]
    fn test_mining_round_trip() {
        let mut world = mining_world(5_000);
        let worker = world.spawn_ship(TeamId::HUMAN, ShipType::Worker, pos(1_200, 2_000));
        let start = world.player_resources();

        let mut ticks = 0;
        while world.player_resources() == start && ticks < 1_000 {
            world.update(100);
            ticks += 1;
        }

        assert_eq!(world.player_resources(), start + 100, "no deposit after {ticks} ticks");
        assert_eq!(world.asteroids()[0].remaining, 4_900);
        let ship = world.ship(worker).expect("worker survives");
        let miner = ship.miner.as_ref().expect("worker state");
        assert_eq!(miner.phase, MinerPhase::Mining);
        assert_eq!(miner.target_asteroid, Some(AsteroidId(0)));
        assert_eq!(miner.cargo, 0);
    }

    /// Resources leave asteroids only into cargo, counters, or destroyed hulls.
    #[test]
    fn test_mined_resources_are_conserved() {
        let mut world = skirmish_world(42, &[AiLevel::Expert, AiLevel::Hard]);
        let capacity: i64 = world.asteroids().iter().map(|a| i64::from(a.capacity)).sum();
        let mut previous: Vec<i32> = world.asteroids().iter().map(|a| a.remaining).collect();

        for _ in 0..1_500 {
            world.update(100);
            for (asteroid, before) in world.asteroids().iter().zip(&mut previous) {
                assert!(asteroid.remaining <= *before, "asteroid regenerated");
                assert!(asteroid.remaining >= 0);
                *before = asteroid.remaining;
            }
        }

        let remaining: i64 = world.asteroids().iter().map(|a| i64::from(a.remaining)).sum();
        let carried: i64 = world
            .ships()
            .iter()
            .filter_map(|s| s.miner.as_ref())
            .map(|m| i64::from(m.cargo + m.pending_deposit))
            .sum();
        let ledger = world.mining_ledger();
        assert_eq!(capacity - remaining, ledger.deposited + carried + ledger.lost);
        assert!(ledger.deposited > 0, "opponents should have mined something");
    }

    #[test]
    fn test_build_rejected_at_40_resources() {
        let mut poor = WorldBuilder::new().human_resources(40).build();
        assert!(!poor.try_build_ship(ShipType::Worker));
        assert_eq!(poor.player_resources(), 40);
        assert_eq!(
            poor.queue_build_ship(ShipType::Worker),
            Err(BuildError::InsufficientResources {
                required: 50,
                available: 40
            })
        );

        let mut world = duel_world();
        assert!(world.try_build_ship(ShipType::Worker));
        assert_eq!(world.player_resources(), STARTING_RESOURCES - 50);
    }

    #[test]
    fn test_fleet_cap_rejects_without_charge() {
        let mut world = WorldBuilder::new()
            .human_resources(100_000)
            .build();
        for _ in 0..3 {
            world.queue_build_ship(ShipType::Battlecruiser).expect("under cap");
        }
        let before = world.player_resources();

        let err = world.queue_build_ship(ShipType::Battlecruiser).unwrap_err();

        assert_eq!(
            err,
            BuildError::FleetCapReached {
                ship_type: ShipType::Battlecruiser,
                cap: 3
            }
        );
        assert_eq!(world.player_resources(), before);
    }

    #[test]
    fn test_queue_full_rejects_sixth_order() {
        let mut world = WorldBuilder::new()
            .human_resources(100_000)
            .build();
        for _ in 0..5 {
            world.queue_build_ship(ShipType::Worker).expect("queue has room");
        }
        assert_eq!(
            world.queue_build_ship(ShipType::Worker),
            Err(BuildError::QueueFull { max: 5 })
        );
    }

    #[test]
    fn test_new_worker_heads_for_nearest_asteroid() {
        let mut world = mining_world(3_000);
        world.queue_build_ship(ShipType::Worker).expect("affordable");

        let mut spawned = Vec::new();
        for _ in 0..6 {
            spawned.extend(world.update(1_000).spawned);
        }

        assert_eq!(spawned.len(), 1);
        let ship = world.ship(spawned[0]).expect("spawned");
        assert_eq!(ship.miner_phase(), Some(MinerPhase::Mining));
    }
}

// =============================================================================
// Combat and visibility
// =============================================================================

mod combat {
    use super::*;

    #[test]
    fn test_interceptor_vs_bomber_strong_multiplier() {
        let mut world = duel_world();
        let interceptor = world.spawn_ship(TeamId::HUMAN, ShipType::Interceptor, pos(3_000, 1_000));
        let bomber = world.spawn_ship(TeamId(1), ShipType::Bomber, pos(3_030, 1_000));
        world.assign_attack_target(&[interceptor], bomber).expect("valid target");
        let damage = world.ship(interceptor).expect("alive").damage;

        world.update(16);

        let bomber = world.ship(bomber).expect("still alive");
        let expected = damage * Fixed::from_num(1.75);
        let taken = bomber.max_hp - bomber.hp;
        assert!(close(taken, expected), "took {taken}");
    }

    #[test]
    fn test_fog_of_war_boundary() {
        let mut world = duel_world();
        let scout = world.spawn_ship(TeamId::HUMAN, ShipType::Interceptor, pos(3_000, 1_000));
        let seen = world.spawn_ship(TeamId(1), ShipType::Probe, pos(3_300, 1_000));
        let hidden = world.spawn_ship(TeamId(1), ShipType::Probe, pos(3_000, 1_301));

        world.update(16);

        let vis = world.visibility();
        assert!(vis.is_visible(scout, TeamId::HUMAN));
        assert!(vis.is_visible(seen, TeamId::HUMAN));
        assert!(!vis.is_visible(hidden, TeamId::HUMAN));
        // Opponents always know where the human mothership is
        assert!(vis.is_visible(world.player_mothership(), TeamId(1)));
    }

    #[test]
    fn test_target_nulled_when_it_dies() {
        let mut world = duel_world();
        let hunter = world.spawn_ship(TeamId::HUMAN, ShipType::Battlecruiser, pos(3_000, 1_000));
        let prey = world.spawn_ship(TeamId(1), ShipType::Probe, pos(3_050, 1_000));
        world.assign_attack_target(&[hunter], prey).expect("valid target");

        let mut destroyed = Vec::new();
        for _ in 0..100 {
            destroyed.extend(world.update(16).destroyed);
            if world.ship(prey).is_none() {
                break;
            }
        }

        assert_eq!(destroyed, vec![prey]);
        assert!(world.ship(hunter).expect("alive").attack_target.is_none());
        assert!(world.event_log().contains("Enemy Probe destroyed!"));
    }

    #[test]
    fn test_effects_expire() {
        let mut world = duel_world();
        let a = world.spawn_ship(TeamId::HUMAN, ShipType::Corvette, pos(3_000, 1_000));
        let b = world.spawn_ship(TeamId(1), ShipType::Destroyer, pos(3_040, 1_000));
        world.assign_attack_target(&[a], b).expect("valid target");

        world.update(16);
        assert!(!world.effects().is_empty());

        // Break off; once out of range no new effects spawn and the old ones age out
        world.set_destination(a, pos(1_500, 1_000)).expect("alive");
        for _ in 0..60 {
            world.update(16);
        }
        assert!(world.effects().is_empty());
    }
}

// =============================================================================
// Research
// =============================================================================

mod research {
    use super::*;

    #[test]
    fn test_queue_auto_advances_in_same_tick() {
        let mut world = WorldBuilder::new()
            .human_resources(5_000)
            .build();
        world.try_start_research(ShipType::Worker).expect("lab idle");
        world
            .try_enqueue_research(ShipType::Interceptor)
            .expect("queue has room");

        let events = world.update(10_000);

        assert_eq!(events.research_completed.map(|o| o.ship_type), Some(ShipType::Worker));
        let active = world.research().active().expect("next order started");
        assert_eq!(active.ship_type, ShipType::Interceptor);
        assert_eq!(active.elapsed_ms, 0);
        assert_eq!(world.research().level(ShipType::Worker), 1);
        assert!(world.event_log().contains("Researching Interceptor → Mk.I... (from queue)"));
    }

    #[test]
    fn test_completion_retrofits_live_ships() {
        let mut world = WorldBuilder::new()
            .human_resources(5_000)
            .build();
        let a = world.spawn_ship(TeamId::HUMAN, ShipType::Worker, pos(800, 800));
        let b = world.spawn_ship(TeamId::HUMAN, ShipType::Worker, pos(820, 800));
        world.try_start_research(ShipType::Worker).expect("lab idle");

        world.update(10_000);

        for id in [a, b] {
            let ship = world.ship(id).expect("alive");
            assert_eq!(ship.upgrade_level, 1);
            assert!(close(ship.max_hp, fixed(120)));
        }
        assert!(world.event_log().contains("Research complete! Worker → Mk.I  (2 ships upgraded)"));

        // Ships built afterwards start at the new level
        let fresh = world.spawn_ship(TeamId::HUMAN, ShipType::Worker, pos(800, 900));
        assert_eq!(world.ship(fresh).expect("alive").upgrade_level, 1);
    }

    #[test]
    fn test_dequeue_refunds_exactly() {
        let mut world = WorldBuilder::new()
            .human_resources(2_000)
            .build();
        world.try_start_research(ShipType::Worker).expect("lab idle");
        let before = world.player_resources();
        world.try_enqueue_research(ShipType::Frigate).expect("affordable");
        assert_eq!(world.player_resources(), before - 600);
        world.try_dequeue_research(ShipType::Frigate).expect("queued");
        assert_eq!(world.player_resources(), before);
        assert_eq!(
            world.try_dequeue_research(ShipType::Frigate).unwrap_err().to_string(),
            "Frigate is not in the research queue."
        );
    }
}

// =============================================================================
// Match flow
// =============================================================================

mod match_flow {
    use super::*;

    #[test]
    fn test_generated_world_stays_on_map() {
        let mut world = skirmish_world(3, &[AiLevel::Normal]);
        run_frames(&mut world, 500);
        for ship in world.ships().iter() {
            let (x, _) = ship.position.to_f32();
            assert!(x > -100.0 && x < MAP_WIDTH as f32 + 100.0);
        }
    }

    #[test]
    fn test_phase_change_is_reported_once() {
        let mut world = duel_world();
        let enemy_ms = world.enemies()[0].mothership;
        let fleet = spawn_line(&mut world, TeamId::HUMAN, ShipType::Battlecruiser, (4_950, 1_980), 3);
        world.assign_attack_target(&fleet, enemy_ms).expect("valid target");
        let mut changes = Vec::new();
        for _ in 0..20_000 {
            let events = world.update(16);
            changes.extend(events.phase_changed);
            if world.phase() != GamePhase::Playing {
                break;
            }
        }
        assert_eq!(changes, vec![GamePhase::Victory]);
        assert!(world.ship(enemy_ms).is_some_and(|s| !s.is_alive()));
        assert!(world.event_log().contains("VICTORY!"));
    }

    #[test]
    fn test_snapshot_reports_all_teams() {
        let world = skirmish_world(8, &[AiLevel::Easy, AiLevel::Normal, AiLevel::Hard]);
        let snapshot = world.snapshot();
        assert_eq!(snapshot.resources.len(), 4);
        assert_eq!(snapshot.phase, GamePhase::Playing);
        assert_eq!(snapshot.log.first().map(|e| e.message.as_str()), Some("Starting resources: 500"));
    }
}
