//! Docking and passive repair.

use crate::math::{Fixed, Vec2Fixed};
use crate::ship::{ShipId, TeamId};
use crate::world::ShipStorage;

/// Distance within which a light ship counts as docked.
pub const DOCK_RANGE: i32 = 60;
/// Hull restored per second while docked.
pub const DOCK_REPAIR_PER_SEC: i32 = 15;
/// Hull restored per second by capital self-repair.
pub const SELF_REPAIR_PER_SEC: i32 = 10;

/// A light ship repaired at a dock station this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Docking {
    /// Repaired ship.
    pub ship: ShipId,
    /// Station it is docked at.
    pub station: ShipId,
}

struct Station {
    id: ShipId,
    team: TeamId,
    position: Vec2Fixed,
}

/// Run docking and self-repair for one tick. Returns this tick's dockings.
///
/// Docking flags are recomputed from scratch so they only ever describe
/// the current tick.
pub fn resolve_repairs(ships: &mut ShipStorage, delta_ms: u32) -> Vec<Docking> {
    let dt = Fixed::from_num(delta_ms) / Fixed::from_num(1000);
    let dock_heal = Fixed::from_num(DOCK_REPAIR_PER_SEC) * dt;
    let self_heal = Fixed::from_num(SELF_REPAIR_PER_SEC) * dt;
    let range_sq = Fixed::from_num(DOCK_RANGE * DOCK_RANGE);

    let ids = ships.sorted_ids();
    let mut stations = Vec::new();
    for &id in &ids {
        if let Some(ship) = ships.get_mut(id) {
            ship.is_docking = false;
            if ship.is_alive() && ship.ship_type.is_dock_station() {
                stations.push(Station {
                    id,
                    team: ship.team,
                    position: ship.position,
                });
            }
        }
    }

    let mut dockings = Vec::new();
    for &id in &ids {
        let Some(ship) = ships.get_mut(id) else {
            continue;
        };
        if !ship.is_alive() || ship.hp >= ship.max_hp {
            continue;
        }

        if ship.ship_type.docks_for_repair() {
            let nearest = stations
                .iter()
                .filter(|s| s.team == ship.team)
                .min_by_key(|s| (s.position.distance_squared(ship.position), s.id));
            if let Some(station) = nearest {
                if station.position.distance_squared(ship.position) <= range_sq {
                    ship.heal(dock_heal);
                    ship.is_docking = true;
                    dockings.push(Docking {
                        ship: id,
                        station: station.id,
                    });
                }
            }
        }

        if ship.ship_type.self_repairs() {
            ship.heal(self_heal);
        }
    }

    for docking in &dockings {
        if let Some(station) = ships.get_mut(docking.station) {
            station.is_docking = true;
        }
    }

    dockings
}
