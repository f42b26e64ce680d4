//! Production queues and spawn placement.
//!
//! Motherships and carriers each own a FIFO [`BuildQueue`]. Only the front
//! order accumulates time; when it completes it is popped and its ships are
//! placed around the producer by [`spawn_positions`].

use std::collections::VecDeque;

use crate::error::BuildError;
use crate::math::{Fixed, Vec2Fixed};
use crate::rng::SimRng;
use crate::ship::ShipType;

/// Spacing between wedge rows and columns.
const WEDGE_SPACING: i32 = 15;

/// A pending production item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BuildOrder {
    /// Requested type.
    pub ship_type: ShipType,
    /// Total build time in milliseconds.
    pub total_ms: u32,
    /// Time accumulated so far.
    pub elapsed_ms: u32,
}

impl BuildOrder {
    /// Create an order with the catalog build time.
    #[must_use]
    pub const fn new(ship_type: ShipType) -> Self {
        Self {
            ship_type,
            total_ms: ship_type.stats().build_time_ms,
            elapsed_ms: 0,
        }
    }

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

/// FIFO production queue owned by a mothership or carrier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BuildQueue {
    items: VecDeque<BuildOrder>,
    max_size: usize,
}

impl Default for BuildQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl BuildQueue {
    /// Default maximum queue size.
    pub const DEFAULT_MAX_QUEUE_SIZE: usize = 5;

    /// Create an empty queue with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_size(Self::DEFAULT_MAX_QUEUE_SIZE)
    }

    /// Create an empty queue with a custom capacity.
    #[must_use]
    pub fn with_max_size(max_size: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(max_size),
            max_size,
        }
    }

    /// Number of orders waiting, including the one in progress.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Queue capacity.
    #[must_use]
    pub const fn max_size(&self) -> usize {
        self.max_size
    }

    /// The order currently being built.
    #[must_use]
    pub fn current(&self) -> Option<&BuildOrder> {
        self.items.front()
    }

    /// Iterate over orders, front first.
    pub fn iter(&self) -> impl Iterator<Item = &BuildOrder> {
        self.items.iter()
    }

    /// Number of queued orders of a type.
    #[must_use]
    pub fn count_of(&self, ship_type: ShipType) -> u32 {
        self.items
            .iter()
            .filter(|o| o.ship_type == ship_type)
            .count() as u32
    }

    /// Append an order. Fails if the queue is at capacity.
    pub fn push(&mut self, order: BuildOrder) -> Result<(), BuildError> {
        if self.items.len() >= self.max_size {
            return Err(BuildError::QueueFull {
                max: self.max_size,
            });
        }
        self.items.push_back(order);
        Ok(())
    }

    /// Advance the front order by `delta_ms`; pop and return it on completion.
    pub fn advance(&mut self, delta_ms: u32) -> Option<BuildOrder> {
        let front = self.items.front_mut()?;
        front.elapsed_ms = front.elapsed_ms.saturating_add(delta_ms);
        if front.is_complete() {
            self.items.pop_front()
        } else {
            None
        }
    }
}

/// Snapshot of a team's standing used to validate a build request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildBudget {
    /// Banked resources.
    pub resources: i32,
    /// Orders already in the producer's queue.
    pub queue_len: usize,
    /// Queue limit for this requester.
    pub queue_limit: usize,
    /// Live ships of the requested type on the team.
    pub live: u32,
    /// Orders of the requested type queued across the team's producers.
    pub queued_orders: u32,
}

/// Check cost, queue length and fleet cap, in that order.
pub fn validate_build(ship_type: ShipType, budget: BuildBudget) -> Result<(), BuildError> {
    let cost = ship_type.build_cost();
    if budget.resources < cost {
        return Err(BuildError::InsufficientResources {
            required: cost,
            available: budget.resources,
        });
    }
    if budget.queue_len >= budget.queue_limit {
        return Err(BuildError::QueueFull {
            max: budget.queue_limit,
        });
    }

    let spawn = ship_type.squadron_size();
    let cap = ship_type.stats().fleet_cap;
    if budget.live + budget.queued_orders * spawn + spawn > cap {
        return Err(BuildError::FleetCapReached { ship_type, cap });
    }
    Ok(())
}

/// Offsets of a squadron wedge relative to its tip, pointing north.
///
/// Row `r` holds `min(r + 1, remaining)` ships; rows trail south of the tip.
#[must_use]
pub fn wedge_offsets(count: u32) -> Vec<Vec2Fixed> {
    let spacing = Fixed::from_num(WEDGE_SPACING);
    let mut offsets = Vec::with_capacity(count as usize);
    let mut row: u32 = 0;
    while (offsets.len() as u32) < count {
        let in_row = (row + 1).min(count - offsets.len() as u32);
        let rear = Fixed::from_num(row) * spacing;
        for i in 0..in_row {
            let lateral = if in_row == 1 {
                Fixed::ZERO
            } else {
                let half_row = Fixed::from_num(row) / Fixed::from_num(2);
                (Fixed::from_num(i * row) / Fixed::from_num(in_row - 1) - half_row) * spacing
            };
            // right = (-1, 0), forward = (0, -1): lateral * right - rear * forward
            offsets.push(Vec2Fixed::new(-lateral, rear));
        }
        row += 1;
    }
    offsets
}

/// World positions for the ships of a completed order.
///
/// Squadrons form a wedge above the producer; single ships appear at a
/// random offset around it.
pub fn spawn_positions(
    producer: ShipType,
    producer_pos: Vec2Fixed,
    count: u32,
    rng: &mut SimRng,
) -> Vec<Vec2Fixed> {
    let (wedge_lead, scatter) = match producer {
        ShipType::Carrier => (80, 60),
        _ => (160, 80),
    };

    if count > 1 {
        let tip = producer_pos - Vec2Fixed::from_ints(0, wedge_lead);
        wedge_offsets(count)
            .into_iter()
            .map(|offset| tip + offset)
            .collect()
    } else {
        vec![rng.offset_around(producer_pos, Fixed::from_num(scatter))]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn budget(resources: i32) -> BuildBudget {
        BuildBudget {
            resources,
            queue_len: 0,
            queue_limit: BuildQueue::DEFAULT_MAX_QUEUE_SIZE,
            live: 0,
            queued_orders: 0,
        }
    }

    #[test]
    fn test_queue_fifo_and_completion() {
        let mut queue = BuildQueue::new();
        queue.push(BuildOrder::new(ShipType::Worker)).unwrap();
        queue.push(BuildOrder::new(ShipType::Probe)).unwrap();

        assert!(queue.advance(4_999).is_none());
        let done = queue.advance(1).unwrap();
        assert_eq!(done.ship_type, ShipType::Worker);
        assert_eq!(queue.current().unwrap().ship_type, ShipType::Probe);
        assert_eq!(queue.current().unwrap().elapsed_ms, 0);
    }

    #[test]
    fn test_queue_full() {
        let mut queue = BuildQueue::with_max_size(2);
        queue.push(BuildOrder::new(ShipType::Worker)).unwrap();
        queue.push(BuildOrder::new(ShipType::Worker)).unwrap();
        assert_eq!(
            queue.push(BuildOrder::new(ShipType::Worker)),
            Err(BuildError::QueueFull { max: 2 })
        );
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_order_progress() {
        let mut order = BuildOrder::new(ShipType::Worker);
        order.elapsed_ms = 2_500;
        assert!((order.progress() - 0.5).abs() < f32::EPSILON);
        order.elapsed_ms = 9_000;
        assert!((order.progress() - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_validate_rejects_insufficient_resources() {
        assert_eq!(
            validate_build(ShipType::Worker, budget(40)),
            Err(BuildError::InsufficientResources {
                required: 50,
                available: 40
            })
        );
        assert!(validate_build(ShipType::Worker, budget(50)).is_ok());
    }

    #[test]
    fn test_validate_counts_squadrons_against_cap() {
        // Interceptor cap 30, squadron of 5: 20 live + 1 queued order = 25, +5 = 30 fits
        let mut b = budget(10_000);
        b.live = 20;
        b.queued_orders = 1;
        assert!(validate_build(ShipType::Interceptor, b).is_ok());

        b.live = 21;
        assert_eq!(
            validate_build(ShipType::Interceptor, b),
            Err(BuildError::FleetCapReached {
                ship_type: ShipType::Interceptor,
                cap: 30
            })
        );
    }

    #[test]
    fn test_validate_respects_queue_limit() {
        let mut b = budget(10_000);
        b.queue_len = 3;
        b.queue_limit = 3;
        assert_eq!(
            validate_build(ShipType::Worker, b),
            Err(BuildError::QueueFull { max: 3 })
        );
    }

    #[test]
    fn test_wedge_offsets_shape() {
        let offsets = wedge_offsets(5);
        assert_eq!(offsets.len(), 5);
        // Tip
        assert_eq!(offsets[0], Vec2Fixed::ZERO);
        // Second row: two ships 7.5 either side, 15 behind
        let half = Fixed::from_num(15) / Fixed::from_num(2);
        assert_eq!(offsets[1], Vec2Fixed::new(half, Fixed::from_num(15)));
        assert_eq!(offsets[2], Vec2Fixed::new(-half, Fixed::from_num(15)));
        // Third row holds the remaining two at the row edges
        assert_eq!(offsets[3], Vec2Fixed::from_ints(15, 30));
        assert_eq!(offsets[4], Vec2Fixed::from_ints(-15, 30));
    }

    #[test]
    fn test_wedge_positions_are_distinct() {
        let offsets = wedge_offsets(5);
        for (i, a) in offsets.iter().enumerate() {
            for b in &offsets[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_squadron_spawns_above_producer() {
        let mut rng = SimRng::seeded(3);
        let base = Vec2Fixed::from_ints(1000, 1000);
        let positions = spawn_positions(ShipType::Mothership, base, 3, &mut rng);
        assert_eq!(positions[0], Vec2Fixed::from_ints(1000, 840));

        let from_carrier = spawn_positions(ShipType::Carrier, base, 5, &mut rng);
        assert_eq!(from_carrier[0], Vec2Fixed::from_ints(1000, 920));
    }

    #[test]
    fn test_single_spawn_scatters_near_producer() {
        let mut rng = SimRng::seeded(9);
        let base = Vec2Fixed::from_ints(1000, 1000);
        let positions = spawn_positions(ShipType::Mothership, base, 1, &mut rng);
        assert_eq!(positions.len(), 1);
        assert!(positions[0].distance(base) <= Fixed::from_num(121));
    }
}
