//! Depletable resource nodes.

use serde::{Deserialize, Serialize};

use crate::math::Vec2Fixed;

/// Index of an asteroid in the world's asteroid list.
///
/// Asteroids are never removed, so indices stay valid for the whole match.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct AsteroidId(pub usize);

/// An asteroid that workers mine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Asteroid {
    /// Handle of this asteroid.
    pub id: AsteroidId,
    /// World position.
    pub position: Vec2Fixed,
    /// Resource units left.
    pub remaining: i32,
    /// Resource units at creation.
    pub capacity: i32,
}

impl Asteroid {
    /// Create a full asteroid.
    #[must_use]
    pub const fn new(id: AsteroidId, position: Vec2Fixed, capacity: i32) -> Self {
        Self {
            id,
            position,
            remaining: capacity,
            capacity,
        }
    }

    /// An asteroid is alive while it still holds resources.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.remaining > 0
    }

    /// Extract up to `requested` units. Returns the amount actually taken.
    pub fn extract(&mut self, requested: i32) -> i32 {
        let taken = requested.clamp(0, self.remaining);
        self.remaining -= taken;
        taken
    }

    /// Visual size tier (0..=3) derived from starting capacity.
    #[must_use]
    pub const fn tier(&self) -> u8 {
        match self.capacity {
            c if c < 5_000 => 0,
            c if c < 10_000 => 1,
            c if c < 15_000 => 2,
            _ => 3,
        }
    }
}

/// Nearest live asteroid to `from`, ties broken by lowest id.
#[must_use]
pub fn find_nearest_live(asteroids: &[Asteroid], from: Vec2Fixed) -> Option<AsteroidId> {
    asteroids
        .iter()
        .filter(|a| a.is_alive())
        .min_by_key(|a| (a.position.distance_squared(from), a.id))
        .map(|a| a.id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(x: i32, y: i32) -> Vec2Fixed {
        Vec2Fixed::from_ints(x, y)
    }

    #[test]
    fn test_extract_is_bounded() {
        let mut a = Asteroid::new(AsteroidId(0), pos(0, 0), 150);
        assert_eq!(a.extract(100), 100);
        assert_eq!(a.extract(100), 50);
        assert_eq!(a.extract(100), 0);
        assert!(!a.is_alive());
    }

    #[test]
    fn test_extract_negative_request_takes_nothing() {
        let mut a = Asteroid::new(AsteroidId(0), pos(0, 0), 150);
        assert_eq!(a.extract(-20), 0);
        assert_eq!(a.remaining, 150);
    }

    #[test]
    fn test_find_nearest_skips_depleted() {
        let mut near = Asteroid::new(AsteroidId(0), pos(10, 0), 100);
        near.extract(100);
        let far = Asteroid::new(AsteroidId(1), pos(500, 0), 100);
        let asteroids = [near, far];
        assert_eq!(find_nearest_live(&asteroids, pos(0, 0)), Some(AsteroidId(1)));
    }

    #[test]
    fn test_find_nearest_none_when_all_depleted() {
        let mut a = Asteroid::new(AsteroidId(0), pos(10, 0), 10);
        a.extract(10);
        assert_eq!(find_nearest_live(&[a], pos(0, 0)), None);
    }

    #[test]
    fn test_tier_by_capacity() {
        assert_eq!(Asteroid::new(AsteroidId(0), pos(0, 0), 1_500).tier(), 0);
        assert_eq!(Asteroid::new(AsteroidId(0), pos(0, 0), 12_000).tier(), 2);
        assert_eq!(Asteroid::new(AsteroidId(0), pos(0, 0), 19_999).tier(), 3);
    }
}
