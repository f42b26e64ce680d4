//! Per-ship state machines: movement, pursuit and the mining loop.
//!
//! Ships read a summary of every ship taken at the start of the pass, so
//! pursuit targets and offload points are seen at their start-of-tick
//! positions regardless of update order.

use std::collections::HashMap;

use crate::asteroid::Asteroid;
use crate::math::{milli, Fixed, Vec2Fixed};
use crate::ship::{
    MinerPhase, MinerState, Ship, ShipId, ShipType, TeamId, CARGO_CAPACITY, MINING_DELAY_MS,
    MINING_REACH, OFFLOAD_DELAY_MS,
};
use crate::visibility::Visibility;
use crate::world::ShipStorage;

/// Fraction of weapon range a pursuing ship closes to before holding.
const PURSUIT_HOLD_MILLI: i32 = 850;

#[derive(Debug, Clone, Copy)]
struct ShipSummary {
    id: ShipId,
    team: TeamId,
    ship_type: ShipType,
    position: Vec2Fixed,
    alive: bool,
}

struct TickContext<'a> {
    summaries: &'a HashMap<ShipId, ShipSummary>,
    offload_points: &'a [ShipSummary],
    visibility: &'a Visibility,
    delta_ms: u32,
}

/// Advance every live ship by one tick.
///
/// Returns the ids of ships that received a miner offload this tick.
pub fn update_ships(
    ships: &mut ShipStorage,
    asteroids: &mut [Asteroid],
    visibility: &Visibility,
    delta_ms: u32,
) -> Vec<ShipId> {
    let ids = ships.sorted_ids();
    let mut summaries = HashMap::with_capacity(ids.len());
    let mut offload_points = Vec::new();
    for &id in &ids {
        let Some(ship) = ships.get_mut(id) else {
            continue;
        };
        ship.is_receiving = false;
        let summary = ShipSummary {
            id,
            team: ship.team,
            ship_type: ship.ship_type,
            position: ship.position,
            alive: ship.is_alive(),
        };
        if summary.alive && ship.ship_type.offload_range().is_some() {
            offload_points.push(summary);
        }
        summaries.insert(id, summary);
    }

    let ctx = TickContext {
        summaries: &summaries,
        offload_points: &offload_points,
        visibility,
        delta_ms,
    };

    let mut receivers = Vec::new();
    for id in ids {
        let Some(ship) = ships.get_mut(id) else {
            continue;
        };
        if !ship.is_alive() {
            continue;
        }
        if ship.ship_type == ShipType::Worker {
            if let Some(receiver) = update_worker(ship, asteroids, &ctx) {
                receivers.push(receiver);
            }
        } else {
            update_pursuit_or_move(ship, &ctx);
        }
    }

    for &id in &receivers {
        if let Some(receiver) = ships.get_mut(id) {
            receiver.is_receiving = true;
        }
    }
    receivers
}

/// Step toward the destination, clearing it on arrival.
pub fn move_toward_destination(ship: &mut Ship) {
    let Some(destination) = ship.destination else {
        return;
    };
    let (position, arrived) = ship.position.step_toward(destination, ship.speed);
    ship.position = position;
    if arrived {
        ship.destination = None;
    }
}

fn update_pursuit_or_move(ship: &mut Ship, ctx: &TickContext<'_>) {
    if let Some(target_id) = ship.attack_target {
        let target = ctx
            .summaries
            .get(&target_id)
            .filter(|t| t.alive && ctx.visibility.is_visible(target_id, ship.team));
        match target {
            Some(target) => {
                let hold = ship.ship_type.attack_range() * milli(PURSUIT_HOLD_MILLI);
                if ship.position.distance_squared(target.position) > hold * hold {
                    ship.position = ship.position.step_toward(target.position, ship.speed).0;
                }
                return;
            }
            None => ship.attack_target = None,
        }
    }
    move_toward_destination(ship);
}

fn update_worker(
    ship: &mut Ship,
    asteroids: &mut [Asteroid],
    ctx: &TickContext<'_>,
) -> Option<ShipId> {
    if ship.attack_target.is_some() {
        update_pursuit_or_move(ship, ctx);
        return None;
    }
    let Some(mut miner) = ship.miner.take() else {
        move_toward_destination(ship);
        return None;
    };

    let receiver = match miner.phase {
        MinerPhase::Idle => {
            move_toward_destination(ship);
            None
        }
        MinerPhase::Mining => {
            mine(ship, &mut miner, asteroids, ctx.delta_ms);
            None
        }
        MinerPhase::Returning => return_cargo(ship, &mut miner, ctx),
    };

    ship.miner = Some(miner);
    receiver
}

fn mine(ship: &mut Ship, miner: &mut MinerState, asteroids: &mut [Asteroid], delta_ms: u32) {
    let asteroid = miner
        .target_asteroid
        .and_then(|id| asteroids.get_mut(id.0))
        .filter(|a| a.is_alive());
    let Some(asteroid) = asteroid else {
        miner.target_asteroid = None;
        miner.stop();
        ship.destination = None;
        return;
    };

    let reach = Fixed::from_num(MINING_REACH);
    if ship.position.distance_squared(asteroid.position) > reach * reach {
        miner.mining_timer_ms = 0;
        ship.destination = Some(asteroid.position);
        move_toward_destination(ship);
        return;
    }

    ship.destination = None;
    miner.mining_timer_ms = miner.mining_timer_ms.saturating_add(delta_ms);
    if miner.mining_timer_ms < MINING_DELAY_MS {
        return;
    }

    miner.mining_timer_ms = 0;
    miner.cargo += asteroid.extract(CARGO_CAPACITY - miner.cargo);
    if miner.cargo >= CARGO_CAPACITY || !asteroid.is_alive() {
        miner.phase = MinerPhase::Returning;
        miner.offload_timer_ms = 0;
        miner.offloading = false;
    }
}

/// Nearest collector or carrier if it beats the mothership, else the mothership.
fn find_offload_point(
    team: TeamId,
    from: Vec2Fixed,
    points: &[ShipSummary],
) -> Option<ShipSummary> {
    let own = || points.iter().filter(move |p| p.team == team);
    let mothership = own().find(|p| p.ship_type == ShipType::Mothership).copied();
    let nearest_mobile = own()
        .filter(|p| p.ship_type != ShipType::Mothership)
        .min_by_key(|p| (p.position.distance_squared(from), p.id))
        .copied();

    match (mothership, nearest_mobile) {
        (Some(m), Some(c)) => {
            if c.position.distance_squared(from) < m.position.distance_squared(from) {
                Some(c)
            } else {
                Some(m)
            }
        }
        (m, c) => m.or(c),
    }
}

fn return_cargo(
    ship: &mut Ship,
    miner: &mut MinerState,
    ctx: &TickContext<'_>,
) -> Option<ShipId> {
    let Some(point) = find_offload_point(ship.team, ship.position, ctx.offload_points) else {
        miner.offload_timer_ms = 0;
        miner.offloading = false;
        return None;
    };

    ship.destination = Some(point.position);
    move_toward_destination(ship);

    let range = point.ship_type.offload_range().unwrap_or(Fixed::ZERO);
    if ship.position.distance_squared(point.position) >= range * range {
        miner.offload_timer_ms = 0;
        miner.offloading = false;
        return None;
    }

    miner.offloading = true;
    miner.offload_timer_ms = miner.offload_timer_ms.saturating_add(ctx.delta_ms);
    if miner.offload_timer_ms < OFFLOAD_DELAY_MS {
        return None;
    }

    miner.offload_timer_ms = 0;
    miner.offloading = false;
    miner.phase = MinerPhase::Idle;
    miner.pending_deposit += std::mem::take(&mut miner.cargo);
    ship.destination = None;
    Some(point.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asteroid::AsteroidId;

    fn pos(x: i32, y: i32) -> Vec2Fixed {
        Vec2Fixed::from_ints(x, y)
    }

    fn tick(ships: &mut ShipStorage, asteroids: &mut [Asteroid], delta_ms: u32) -> Vec<ShipId> {
        let vis = Visibility::compute(ships, None);
        update_ships(ships, asteroids, &vis, delta_ms)
    }

    #[test]
    fn test_move_toward_destination_clears_on_arrival() {
        let mut ships = ShipStorage::new();
        let id = ships.spawn(ShipType::Frigate, TeamId::HUMAN, pos(0, 0));
        ships.get_mut(id).unwrap().destination = Some(pos(1, 0));
        tick(&mut ships, &mut [], 16);
        let ship = ships.get(id).unwrap();
        assert_eq!(ship.position, pos(1, 0));
        assert!(ship.destination.is_none());
    }

    #[test]
    fn test_pursuit_holds_inside_range() {
        let mut ships = ShipStorage::new();
        let hunter = ships.spawn(ShipType::Frigate, TeamId::HUMAN, pos(0, 0));
        let prey = ships.spawn(ShipType::Frigate, TeamId(1), pos(200, 0));
        ships.get_mut(hunter).unwrap().attack_target = Some(prey);

        tick(&mut ships, &mut [], 16);
        let x = ships.get(hunter).unwrap().position.x;
        assert!(x > Fixed::ZERO);

        // Inside 0.85 x 70 = 59.5 the hunter stops closing
        ships.get_mut(hunter).unwrap().position = pos(150, 0);
        tick(&mut ships, &mut [], 16);
        assert_eq!(ships.get(hunter).unwrap().position, pos(150, 0));
    }

    #[test]
    fn test_pursuit_of_dead_target_clears_order() {
        let mut ships = ShipStorage::new();
        let hunter = ships.spawn(ShipType::Frigate, TeamId::HUMAN, pos(0, 0));
        let prey = ships.spawn(ShipType::Frigate, TeamId(1), pos(100, 0));
        ships.get_mut(hunter).unwrap().attack_target = Some(prey);
        ships.get_mut(prey).unwrap().hp = Fixed::ZERO;

        tick(&mut ships, &mut [], 16);
        assert!(ships.get(hunter).unwrap().attack_target.is_none());
    }

    #[test]
    fn test_mining_timer_resets_out_of_reach() {
        let mut ships = ShipStorage::new();
        let worker = ships.spawn(ShipType::Worker, TeamId::HUMAN, pos(0, 0));
        let mut asteroids = [Asteroid::new(AsteroidId(0), pos(500, 0), 1_000)];
        ships.get_mut(worker).unwrap().miner.as_mut().unwrap().assign(AsteroidId(0));

        tick(&mut ships, &mut asteroids, 1_000);
        let miner = ships.get(worker).unwrap().miner.clone().unwrap();
        assert_eq!(miner.mining_timer_ms, 0);
        assert!(ships.get(worker).unwrap().position.x > Fixed::ZERO);
    }

    #[test]
    fn test_mining_extracts_after_delay() {
        let mut ships = ShipStorage::new();
        ships.spawn(ShipType::Mothership, TeamId::HUMAN, pos(1_000, 0));
        let worker = ships.spawn(ShipType::Worker, TeamId::HUMAN, pos(10, 0));
        let mut asteroids = [Asteroid::new(AsteroidId(0), pos(0, 0), 1_000)];
        ships.get_mut(worker).unwrap().miner.as_mut().unwrap().assign(AsteroidId(0));

        tick(&mut ships, &mut asteroids, 3_999);
        assert_eq!(asteroids[0].remaining, 1_000);
        tick(&mut ships, &mut asteroids, 1);
        assert_eq!(asteroids[0].remaining, 900);

        let miner = ships.get(worker).unwrap().miner.clone().unwrap();
        assert_eq!(miner.cargo, 100);
        assert_eq!(miner.phase, MinerPhase::Returning);
    }

    #[test]
    fn test_depleted_asteroid_stops_worker() {
        let mut ships = ShipStorage::new();
        let worker = ships.spawn(ShipType::Worker, TeamId::HUMAN, pos(0, 0));
        let mut asteroids = [Asteroid::new(AsteroidId(0), pos(500, 0), 10)];
        ships.get_mut(worker).unwrap().miner.as_mut().unwrap().assign(AsteroidId(0));
        asteroids[0].extract(10);

        tick(&mut ships, &mut asteroids, 16);
        let ship = ships.get(worker).unwrap();
        assert_eq!(ship.miner_phase(), Some(MinerPhase::Idle));
        assert!(ship.destination.is_none());
    }

    #[test]
    fn test_offload_prefers_closer_collector() {
        let mut ships = ShipStorage::new();
        ships.spawn(ShipType::Mothership, TeamId::HUMAN, pos(1_000, 0));
        let collector = ships.spawn(ShipType::ResourceCollector, TeamId::HUMAN, pos(20, 0));
        let worker = ships.spawn(ShipType::Worker, TeamId::HUMAN, pos(0, 0));
        {
            let miner = ships.get_mut(worker).unwrap().miner.as_mut().unwrap();
            miner.phase = MinerPhase::Returning;
            miner.cargo = 100;
        }

        let receivers = tick(&mut ships, &mut [], 4_000);

        assert_eq!(receivers, vec![collector]);
        assert!(ships.get(collector).unwrap().is_receiving);
        let miner = ships.get(worker).unwrap().miner.clone().unwrap();
        assert_eq!(miner.pending_deposit, 100);
        assert_eq!(miner.cargo, 0);
        assert_eq!(miner.phase, MinerPhase::Idle);
    }

    #[test]
    fn test_leaving_offload_range_resets_timer() {
        let mut ships = ShipStorage::new();
        ships.spawn(ShipType::Mothership, TeamId::HUMAN, pos(0, 0));
        let worker = ships.spawn(ShipType::Worker, TeamId::HUMAN, pos(10, 0));
        {
            let ship = ships.get_mut(worker).unwrap();
            let miner = ship.miner.as_mut().unwrap();
            miner.phase = MinerPhase::Returning;
            miner.cargo = 100;
        }
        tick(&mut ships, &mut [], 2_000);
        assert_eq!(ships.get(worker).unwrap().miner.clone().unwrap().offload_timer_ms, 2_000);

        // Pushed far away: timer resets on the next tick
        ships.get_mut(worker).unwrap().position = pos(500, 0);
        tick(&mut ships, &mut [], 16);
        assert_eq!(ships.get(worker).unwrap().miner.clone().unwrap().offload_timer_ms, 0);
    }

    #[test]
    fn test_offload_point_ignores_other_teams() {
        let points = [
            ShipSummary {
                id: ShipId(1),
                team: TeamId(1),
                ship_type: ShipType::Carrier,
                position: pos(5, 0),
                alive: true,
            },
            ShipSummary {
                id: ShipId(2),
                team: TeamId::HUMAN,
                ship_type: ShipType::Mothership,
                position: pos(500, 0),
                alive: true,
            },
        ];
        let point = find_offload_point(TeamId::HUMAN, pos(0, 0), &points).unwrap();
        assert_eq!(point.id, ShipId(2));
    }
}
