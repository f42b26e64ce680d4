//! Fog of war.
//!
//! Rebuilt from scratch every tick: a team sees all of its own live ships
//! plus any foreign live ship inside the vision radius of at least one of
//! its ships. Computer teams additionally always see the human mothership.

use std::collections::{BTreeMap, HashSet};

use crate::math::Vec2Fixed;
use crate::ship::{ShipId, ShipType, TeamId};
use crate::world::ShipStorage;

/// Per-team visible ship sets for the current tick.
#[derive(Debug, Clone, Default)]
pub struct Visibility {
    visible: BTreeMap<TeamId, HashSet<ShipId>>,
}

struct Observer {
    team: TeamId,
    position: Vec2Fixed,
    radius_sq: crate::math::Fixed,
}

impl Visibility {
    /// Compute visibility for every team that has at least one live ship.
    #[must_use]
    pub fn compute(ships: &ShipStorage, human_mothership: Option<ShipId>) -> Self {
        let mut visible: BTreeMap<TeamId, HashSet<ShipId>> = BTreeMap::new();
        let mut observers = Vec::new();
        let mut live = Vec::new();

        for id in ships.sorted_ids() {
            let Some(ship) = ships.get(id) else {
                continue;
            };
            if !ship.is_alive() {
                continue;
            }
            let radius = ship.ship_type.vision_radius();
            observers.push(Observer {
                team: ship.team,
                position: ship.position,
                radius_sq: radius * radius,
            });
            live.push((id, ship.team, ship.position));
            visible.entry(ship.team).or_default().insert(id);
        }

        let teams: Vec<TeamId> = visible.keys().copied().collect();
        for team in teams {
            let team_observers: Vec<&Observer> =
                observers.iter().filter(|o| o.team == team).collect();
            let set = visible.entry(team).or_default();
            for &(id, owner, position) in &live {
                if owner == team {
                    continue;
                }
                let seen = team_observers
                    .iter()
                    .any(|o| o.position.distance_squared(position) <= o.radius_sq);
                if seen {
                    set.insert(id);
                }
            }
        }

        if let Some(capital) = human_mothership.and_then(|id| ships.get(id)) {
            if capital.is_alive() && capital.ship_type == ShipType::Mothership {
                for (team, set) in &mut visible {
                    if !team.is_human() {
                        set.insert(capital.id);
                    }
                }
            }
        }

        Self { visible }
    }

    /// Whether `ship` is in `team`'s visible set this tick.
    #[must_use]
    pub fn is_visible(&self, ship: ShipId, team: TeamId) -> bool {
        self.visible
            .get(&team)
            .is_some_and(|set| set.contains(&ship))
    }

    /// Visible ship ids for a team, sorted for deterministic iteration.
    #[must_use]
    pub fn visible_to(&self, team: TeamId) -> Vec<ShipId> {
        let mut ids: Vec<ShipId> = self
            .visible
            .get(&team)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        ids.sort_unstable();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Fixed;

    fn pos(x: i32, y: i32) -> Vec2Fixed {
        Vec2Fixed::from_ints(x, y)
    }

    #[test]
    fn test_own_ships_always_visible() {
        let mut ships = ShipStorage::new();
        let a = ships.spawn(ShipType::Worker, TeamId::HUMAN, pos(0, 0));
        let b = ships.spawn(ShipType::Worker, TeamId::HUMAN, pos(5_000, 3_000));
        let vis = Visibility::compute(&ships, None);
        assert!(vis.is_visible(a, TeamId::HUMAN));
        assert!(vis.is_visible(b, TeamId::HUMAN));
    }

    #[test]
    fn test_vision_radius_boundary() {
        // Worker vision radius is 200
        let mut ships = ShipStorage::new();
        ships.spawn(ShipType::Worker, TeamId::HUMAN, pos(0, 0));
        let inside = ships.spawn(ShipType::Probe, TeamId(1), pos(200, 0));
        let outside = ships.spawn(ShipType::Probe, TeamId(1), pos(0, 0));
        if let Some(s) = ships.get_mut(outside) {
            s.position = Vec2Fixed::new(Fixed::ZERO, Fixed::from_num(200) + Fixed::DELTA);
        }
        let vis = Visibility::compute(&ships, None);
        assert!(vis.is_visible(inside, TeamId::HUMAN));
        assert!(!vis.is_visible(outside, TeamId::HUMAN));
    }

    #[test]
    fn test_dead_ships_are_invisible() {
        let mut ships = ShipStorage::new();
        ships.spawn(ShipType::Destroyer, TeamId::HUMAN, pos(0, 0));
        let dead = ships.spawn(ShipType::Interceptor, TeamId(1), pos(10, 0));
        if let Some(s) = ships.get_mut(dead) {
            s.hp = Fixed::ZERO;
        }
        let vis = Visibility::compute(&ships, None);
        assert!(!vis.is_visible(dead, TeamId::HUMAN));
        assert!(!vis.is_visible(dead, TeamId(1)));
    }

    #[test]
    fn test_human_mothership_always_visible_to_ai() {
        let mut ships = ShipStorage::new();
        let capital = ships.spawn(ShipType::Mothership, TeamId::HUMAN, pos(200, 200));
        let escort = ships.spawn(ShipType::Frigate, TeamId::HUMAN, pos(300, 200));
        ships.spawn(ShipType::Mothership, TeamId(1), pos(5_500, 3_500));
        let vis = Visibility::compute(&ships, Some(capital));
        assert!(vis.is_visible(capital, TeamId(1)));
        assert!(!vis.is_visible(escort, TeamId(1)));
    }

    #[test]
    fn test_visible_to_is_sorted() {
        let mut ships = ShipStorage::new();
        for x in 0..5 {
            ships.spawn(ShipType::Worker, TeamId::HUMAN, pos(x * 10, 0));
        }
        let ids = Visibility::compute(&ships, None).visible_to(TeamId::HUMAN);
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }
}
