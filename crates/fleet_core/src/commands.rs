//! Player command surface.
//!
//! Commands are plain state changes applied between ticks; they take effect
//! on the next [`GameWorld::update`]. Rejections are returned as typed
//! errors whose `Display` text is the player-facing message.

use tracing::debug;

use crate::asteroid::AsteroidId;
use crate::error::{BuildError, GameError, ResearchError, Result};
use crate::math::Vec2Fixed;
use crate::production::BuildQueue;
use crate::research::level_label;
use crate::ship::{ShipId, ShipType, TeamId};
use crate::world::{GamePhase, GameWorld};

impl GameWorld {
    // ── Production ───────────────────────────────────────────────────────

    /// Queue a ship at the human mothership, charging its cost.
    ///
    /// # Example
    ///
    /// ```
    /// use fleet_core::prelude::*;
    ///
    /// let mut world = WorldBuilder::new().human_resources(100).build();
    /// assert!(world.queue_build_ship(ShipType::Worker).is_ok());
    /// assert_eq!(world.player_resources(), 50);
    /// assert!(world.queue_build_ship(ShipType::Interceptor).is_err());
    /// ```
    pub fn queue_build_ship(&mut self, ship_type: ShipType) -> std::result::Result<(), BuildError> {
        let mothership = self.player_mothership;
        self.enqueue_build(mothership, ship_type, BuildQueue::DEFAULT_MAX_QUEUE_SIZE)?;
        self.log(format!(
            "Building {ship_type}... Cost: {} resources",
            ship_type.build_cost()
        ));
        Ok(())
    }

    /// [`queue_build_ship`](Self::queue_build_ship) reporting only success.
    pub fn try_build_ship(&mut self, ship_type: ShipType) -> bool {
        match self.queue_build_ship(ship_type) {
            Ok(()) => true,
            Err(err) => {
                debug!(%ship_type, %err, "Build rejected");
                false
            }
        }
    }

    /// Queue a ship at a human carrier.
    pub fn queue_build_from_carrier(
        &mut self,
        carrier: ShipId,
        ship_type: ShipType,
    ) -> std::result::Result<(), BuildError> {
        let owned = self
            .ships
            .get(carrier)
            .is_some_and(|s| s.team.is_human() && s.ship_type == ShipType::Carrier);
        if !owned {
            return Err(BuildError::ProducerUnavailable(carrier));
        }
        self.enqueue_build(carrier, ship_type, BuildQueue::DEFAULT_MAX_QUEUE_SIZE)?;
        self.log(format!(
            "Carrier building {ship_type}...  Cost: {} resources",
            ship_type.build_cost()
        ));
        Ok(())
    }

    /// [`queue_build_from_carrier`](Self::queue_build_from_carrier) reporting
    /// only success.
    pub fn try_build_from_carrier(&mut self, carrier: ShipId, ship_type: ShipType) -> bool {
        match self.queue_build_from_carrier(carrier, ship_type) {
            Ok(()) => true,
            Err(err) => {
                debug!(%carrier, %ship_type, %err, "Carrier build rejected");
                false
            }
        }
    }

    // ── Research ─────────────────────────────────────────────────────────

    /// Start researching the next level of a type on an idle lab.
    pub fn try_start_research(
        &mut self,
        ship_type: ShipType,
    ) -> std::result::Result<(), ResearchError> {
        let cost = self.research.cost_for(ship_type).unwrap_or(0);
        let order = self
            .research
            .try_start(ship_type, &mut self.player_resources)?;
        self.log(format!(
            "Researching {ship_type} → {}... Cost: {cost} res",
            level_label(order.level)
        ));
        Ok(())
    }

    /// Pre-pay the next level of a type behind the active research.
    pub fn try_enqueue_research(
        &mut self,
        ship_type: ShipType,
    ) -> std::result::Result<(), ResearchError> {
        let before = self.player_resources;
        self.research
            .try_enqueue(ship_type, &mut self.player_resources)?;
        let level = self.research.level(ship_type) + 1;
        self.log(format!(
            "Queued {ship_type} → {}... Cost: {} res",
            level_label(level),
            before - self.player_resources
        ));
        Ok(())
    }

    /// Cancel a queued research and refund what it cost.
    pub fn try_dequeue_research(
        &mut self,
        ship_type: ShipType,
    ) -> std::result::Result<(), ResearchError> {
        let refund = self
            .research
            .try_dequeue(ship_type, &mut self.player_resources)?;
        debug!(%ship_type, refund, "Research dequeued");
        self.log(format!("Removed {ship_type} from research queue (refunded)"));
        Ok(())
    }

    // ── Orders ───────────────────────────────────────────────────────────

    /// Order human ships to attack `target`.
    ///
    /// Each live ordered ship drops its movement and mining orders. Returns
    /// how many ships took the order.
    ///
    /// # Errors
    ///
    /// [`GameError::ShipNotFound`] if the target is missing or dead,
    /// [`GameError::InvalidState`] if it belongs to the human side.
    pub fn assign_attack_target(&mut self, ships: &[ShipId], target: ShipId) -> Result<usize> {
        let target_ship = self
            .ships
            .get(target)
            .filter(|s| s.is_alive())
            .ok_or(GameError::ShipNotFound(target))?;
        if target_ship.team.is_human() {
            return Err(GameError::InvalidState(format!(
                "cannot attack friendly ship {target}"
            )));
        }
        let target_type = target_ship.ship_type;

        let mut ordered = 0;
        for &id in ships {
            if id == target {
                continue;
            }
            let Some(ship) = self.owned_live_mut(id, TeamId::HUMAN) else {
                continue;
            };
            ship.destination = None;
            if let Some(miner) = ship.miner.as_mut() {
                miner.stop();
            }
            ship.attack_target = Some(target);
            ordered += 1;
        }

        if ordered > 0 {
            if let Some(target) = self.ships.get_mut(target) {
                target.is_targeted = true;
            }
            self.log(format!("{ordered} ship(s) ordered to attack {target_type}!"));
        }
        Ok(ordered)
    }

    /// Send human workers to mine an asteroid. Returns how many took the
    /// order.
    ///
    /// # Errors
    ///
    /// [`GameError::AsteroidNotFound`] if no such asteroid exists.
    pub fn assign_miners(&mut self, miners: &[ShipId], asteroid: AsteroidId) -> Result<usize> {
        if asteroid.0 >= self.asteroids.len() {
            return Err(GameError::AsteroidNotFound(asteroid));
        }

        let mut assigned = 0;
        for &id in miners {
            let Some(ship) = self.owned_live_mut(id, TeamId::HUMAN) else {
                continue;
            };
            let Some(miner) = ship.miner.as_mut() else {
                continue;
            };
            miner.assign(asteroid);
            ship.attack_target = None;
            ship.destination = None;
            assigned += 1;
        }

        if assigned > 0 {
            self.log(format!("{assigned} miner(s) → asteroid"));
        }
        Ok(assigned)
    }

    /// Move a human ship. Workers abandon their mining loop.
    ///
    /// # Errors
    ///
    /// [`GameError::ShipNotFound`] if the ship is missing, dead, or not
    /// human-owned.
    pub fn set_destination(&mut self, ship: ShipId, destination: Vec2Fixed) -> Result<()> {
        let entry = self
            .owned_live_mut(ship, TeamId::HUMAN)
            .ok_or(GameError::ShipNotFound(ship))?;
        entry.set_destination(destination);
        entry.attack_target = None;
        if let Some(miner) = entry.miner.as_mut() {
            miner.stop();
        }
        Ok(())
    }

    /// Mark exactly `ids` (human, live) as selected.
    pub fn set_selected(&mut self, ids: &[ShipId]) {
        for id in self.ships.sorted_ids() {
            if let Some(ship) = self.ships.get_mut(id) {
                ship.selected = ship.team.is_human() && ship.is_alive() && ids.contains(&id);
            }
        }
    }

    /// Human ships currently selected, in id order.
    #[must_use]
    pub fn selected(&self) -> Vec<ShipId> {
        self.ships
            .sorted_ids()
            .into_iter()
            .filter(|&id| self.ships.get(id).is_some_and(|s| s.selected))
            .collect()
    }

    // ── Phase ────────────────────────────────────────────────────────────

    /// Pause a running match.
    pub fn pause(&mut self) {
        if self.phase == GamePhase::Playing {
            self.phase = GamePhase::Paused;
        }
    }

    /// Resume a paused match.
    pub fn resume(&mut self) {
        if self.phase == GamePhase::Paused {
            self.phase = GamePhase::Playing;
        }
    }

    /// Toggle between playing and paused. Finished matches stay finished.
    pub fn toggle_pause(&mut self) {
        match self.phase {
            GamePhase::Playing => self.pause(),
            GamePhase::Paused => self.resume(),
            GamePhase::GameOver | GamePhase::Victory => {}
        }
    }
}
