//! Research ledger and upgrade application.
//!
//! The human side researches per-type upgrades (Mk.I to Mk.III). One order is
//! active at a time and up to two more can be pre-paid in a queue.
//!
//! Upgrades reach ships through two distinct operations:
//! - [`apply_to_new_ship`] sets absolute multipliers on a fresh hull at full HP.
//! - [`retrofit`] scales a live hull by the ratio between its old and new
//!   level, keeping its current HP fraction.

use std::collections::VecDeque;

use crate::error::ResearchError;
use crate::math::{milli, Fixed};
use crate::ship::{Ship, ShipType};

/// Highest upgrade level.
pub const MAX_UPGRADE_LEVEL: u8 = 3;

/// Pending research slots behind the active order.
pub const RESEARCH_QUEUE_CAPACITY: usize = 2;

/// Cost and duration of the next level, by type and current level.
fn research_entry(ship_type: ShipType, current_level: u8) -> Option<(i32, u32)> {
    let table: [(i32, u32); 3] = match ship_type {
        ShipType::Worker => [(200, 10_000), (500, 20_000), (800, 30_000)],
        ShipType::Interceptor | ShipType::Bomber => {
            [(300, 12_000), (700, 25_000), (1_000, 35_000)]
        }
        ShipType::Corvette => [(400, 15_000), (900, 30_000), (1_200, 45_000)],
        ShipType::Frigate => [(600, 20_000), (1_200, 40_000), (1_500, 60_000)],
        ShipType::Destroyer => [(900, 30_000), (2_000, 60_000), (2_500, 90_000)],
        ShipType::Battlecruiser => [(1_500, 40_000), (2_500, 70_000), (5_000, 100_000)],
        ShipType::Carrier => [(1_000, 25_000), (2_000, 50_000), (3_500, 80_000)],
        ShipType::Mothership | ShipType::ResourceCollector | ShipType::Probe => return None,
    };
    table.get(usize::from(current_level)).copied()
}

/// Display label for an upgrade level.
#[must_use]
pub const fn level_label(level: u8) -> &'static str {
    match level {
        0 => "Base",
        1 => "Mk.I",
        2 => "Mk.II",
        _ => "Mk.III",
    }
}

/// Cumulative hull multiplier: +20% per level.
#[must_use]
pub fn hull_multiplier(level: u8) -> Fixed {
    milli(1_000 + 200 * i32::from(level))
}

/// Cumulative damage multiplier: +10% per level.
#[must_use]
pub fn damage_multiplier(level: u8) -> Fixed {
    milli(1_000 + 100 * i32::from(level))
}

/// Cumulative speed multiplier: +12% with diminishing returns per level.
#[must_use]
pub fn speed_multiplier(level: u8) -> Fixed {
    let mut m = Fixed::from_num(1);
    if level >= 1 {
        m *= milli(1_120);
    }
    if level >= 2 {
        m *= milli(1_102);
    }
    if level >= 3 {
        m *= milli(1_084);
    }
    m
}

/// Set a freshly spawned ship's stats from base values for `level`, at full HP.
pub fn apply_to_new_ship(ship: &mut Ship, level: u8) {
    let stats = ship.ship_type.stats();
    ship.max_hp = Fixed::from_num(stats.max_hp) * hull_multiplier(level);
    ship.hp = ship.max_hp;
    ship.damage = milli(stats.damage_milli) * damage_multiplier(level);
    ship.speed = milli(stats.speed_milli) * speed_multiplier(level);
    ship.upgrade_level = level;
}

/// Upgrade a live ship from its current level to `to_level`.
///
/// Scales each stat by `new / old` cumulative multiplier and keeps the HP
/// fraction, so a damaged hull stays proportionally damaged.
pub fn retrofit(ship: &mut Ship, to_level: u8) {
    let from = ship.upgrade_level;
    if from >= to_level {
        return;
    }

    let fraction = ship.hp_fraction();
    ship.max_hp = ship.max_hp * hull_multiplier(to_level) / hull_multiplier(from);
    ship.hp = (ship.max_hp * fraction).min(ship.max_hp);
    ship.damage = ship.damage * damage_multiplier(to_level) / damage_multiplier(from);
    ship.speed = ship.speed * speed_multiplier(to_level) / speed_multiplier(from);
    ship.upgrade_level = to_level;
}

/// An upgrade in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResearchOrder {
    /// Type being upgraded.
    pub ship_type: ShipType,
    /// Level reached on completion.
    pub level: u8,
    /// Total duration in milliseconds.
    pub total_ms: u32,
    /// Time accumulated so far.
    pub elapsed_ms: u32,
}

impl ResearchOrder {
    /// Whether enough time has accumulated.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.elapsed_ms >= self.total_ms
    }

    /// Completion fraction in `0.0..=1.0`.
    #[must_use]
    pub fn progress(&self) -> f32 {
        if self.total_ms == 0 {
            return 1.0;
        }
        (self.elapsed_ms as f32 / self.total_ms as f32).min(1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct QueuedResearch {
    ship_type: ShipType,
    charged: i32,
}

/// Per-player upgrade ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ResearchManager {
    levels: [u8; ShipType::ALL.len()],
    active: Option<ResearchOrder>,
    queue: VecDeque<QueuedResearch>,
}

impl ResearchManager {
    /// Create a ledger with every type at base level.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current level of a type.
    #[must_use]
    pub fn level(&self, ship_type: ShipType) -> u8 {
        self.levels[ship_type as usize]
    }

    /// Cost of the next level, if one exists.
    #[must_use]
    pub fn cost_for(&self, ship_type: ShipType) -> Option<i32> {
        research_entry(ship_type, self.level(ship_type)).map(|(cost, _)| cost)
    }

    /// Whether another level can still be researched.
    #[must_use]
    pub fn can_research(&self, ship_type: ShipType) -> bool {
        ship_type.is_researchable() && self.level(ship_type) < MAX_UPGRADE_LEVEL
    }

    /// The active order.
    #[must_use]
    pub const fn active(&self) -> Option<&ResearchOrder> {
        self.active.as_ref()
    }

    /// Queued types, in start order.
    pub fn queued(&self) -> impl Iterator<Item = ShipType> + '_ {
        self.queue.iter().map(|q| q.ship_type)
    }

    /// Whether a type is the active order.
    #[must_use]
    pub fn is_researching(&self, ship_type: ShipType) -> bool {
        self.active.is_some_and(|a| a.ship_type == ship_type)
    }

    /// Whether a type is waiting in the queue.
    #[must_use]
    pub fn is_queued(&self, ship_type: ShipType) -> bool {
        self.queue.iter().any(|q| q.ship_type == ship_type)
    }

    fn order_for(&self, ship_type: ShipType) -> Option<ResearchOrder> {
        let level = self.level(ship_type);
        research_entry(ship_type, level).map(|(_, total_ms)| ResearchOrder {
            ship_type,
            level: level + 1,
            total_ms,
            elapsed_ms: 0,
        })
    }

    /// Start researching a type. The lab must be idle.
    pub fn try_start(
        &mut self,
        ship_type: ShipType,
        resources: &mut i32,
    ) -> Result<ResearchOrder, ResearchError> {
        if !ship_type.is_researchable() {
            return Err(ResearchError::NotUpgradeable(ship_type));
        }
        if !self.can_research(ship_type) {
            return Err(ResearchError::AlreadyMaxed(ship_type));
        }
        if self.active.is_some() {
            return Err(ResearchError::LabBusy);
        }

        let cost = self.cost_for(ship_type).unwrap_or(0);
        if *resources < cost {
            return Err(ResearchError::InsufficientResources {
                required: cost,
                available: *resources,
            });
        }

        let order = self
            .order_for(ship_type)
            .ok_or(ResearchError::AlreadyMaxed(ship_type))?;
        *resources -= cost;
        self.active = Some(order);
        Ok(order)
    }

    /// Pre-pay an upgrade behind the active order.
    pub fn try_enqueue(
        &mut self,
        ship_type: ShipType,
        resources: &mut i32,
    ) -> Result<(), ResearchError> {
        if !ship_type.is_researchable() {
            return Err(ResearchError::NotUpgradeable(ship_type));
        }
        if !self.can_research(ship_type) {
            return Err(ResearchError::QueueMaxed(ship_type));
        }
        if self.active.is_none() {
            return Err(ResearchError::LabIdle);
        }
        if self.is_researching(ship_type) {
            return Err(ResearchError::CurrentlyResearching(ship_type));
        }
        if self.is_queued(ship_type) {
            return Err(ResearchError::AlreadyQueued(ship_type));
        }
        if self.queue.len() >= RESEARCH_QUEUE_CAPACITY {
            return Err(ResearchError::QueueFull);
        }

        let cost = self.cost_for(ship_type).unwrap_or(0);
        if *resources < cost {
            return Err(ResearchError::InsufficientResources {
                required: cost,
                available: *resources,
            });
        }

        *resources -= cost;
        self.queue.push_back(QueuedResearch {
            ship_type,
            charged: cost,
        });
        Ok(())
    }

    /// Cancel a queued upgrade and refund exactly what was charged.
    pub fn try_dequeue(
        &mut self,
        ship_type: ShipType,
        resources: &mut i32,
    ) -> Result<i32, ResearchError> {
        let idx = self
            .queue
            .iter()
            .position(|q| q.ship_type == ship_type)
            .ok_or(ResearchError::NotQueued(ship_type))?;
        let refund = self.queue.remove(idx).map_or(0, |q| q.charged);
        *resources += refund;
        Ok(refund)
    }

    fn start_next_queued(&mut self) {
        while let Some(next) = self.queue.pop_front() {
            if let Some(order) = self.order_for(next.ship_type) {
                self.active = Some(order);
                return;
            }
        }
    }

    /// Advance the active order.
    ///
    /// An idle lab pulls the next queued order without advancing it. On
    /// completion the level is recorded and the next queued order starts
    /// in the same call with zero elapsed time. Returns the completed order.
    pub fn tick(&mut self, delta_ms: u32) -> Option<ResearchOrder> {
        let Some(active) = self.active.as_mut() else {
            self.start_next_queued();
            return None;
        };

        active.elapsed_ms = active.elapsed_ms.saturating_add(delta_ms);
        if !active.is_complete() {
            return None;
        }

        let completed = *active;
        self.levels[completed.ship_type as usize] = completed.level;
        self.active = None;
        self.start_next_queued();
        Some(completed)
    }
}
