//! Fixed-point math utilities for deterministic simulation.
//!
//! All game simulation uses fixed-point arithmetic so that the same seed
//! and the same sequence of deltas produce bit-identical worlds on every
//! platform. Balance tables are written as integers or per-mille values
//! and converted through [`milli`].

use fixed::types::I32F32;

/// Fixed-point number type for all simulation math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
/// Range: approximately -2,147,483,648 to 2,147,483,647
/// Precision: approximately 0.00000000023
pub type Fixed = I32F32;

/// Convert a per-mille integer into a fixed-point value (`milli(1750) == 1.75`).
#[must_use]
pub fn milli(value: i32) -> Fixed {
    Fixed::from_num(value) / Fixed::from_num(1000)
}

/// Fixed-point 2D vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Vec2Fixed {
    /// X coordinate.
    pub x: Fixed,
    /// Y coordinate.
    pub y: Fixed,
}

impl Vec2Fixed {
    /// Create a new fixed-point vector.
    #[must_use]
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }

    /// Create a vector from integer world coordinates.
    #[must_use]
    pub fn from_ints(x: i32, y: i32) -> Self {
        Self::new(Fixed::from_num(x), Fixed::from_num(y))
    }

    /// Zero vector.
    pub const ZERO: Self = Self {
        x: Fixed::ZERO,
        y: Fixed::ZERO,
    };

    /// Calculate squared distance (avoids sqrt for comparisons).
    ///
    /// Saturates at `Fixed::MAX` for points more than ~46k units apart.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> Fixed {
        let dx = self.x.saturating_sub(other.x);
        let dy = self.y.saturating_sub(other.y);
        dx.saturating_mul(dx).saturating_add(dy.saturating_mul(dy))
    }

    /// Euclidean distance between two points.
    #[must_use]
    pub fn distance(self, other: Self) -> Fixed {
        fixed_sqrt(self.distance_squared(other))
    }

    /// Length of the vector.
    #[must_use]
    pub fn length(self) -> Fixed {
        fixed_sqrt(self.dot(self))
    }

    /// Dot product of two vectors.
    #[must_use]
    pub fn dot(self, other: Self) -> Fixed {
        self.x
            .saturating_mul(other.x)
            .saturating_add(self.y.saturating_mul(other.y))
    }

    /// Multiply both components by a scalar.
    #[must_use]
    pub fn scale(self, factor: Fixed) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    /// Normalize vector using fixed-point math.
    #[must_use]
    pub fn normalize(self) -> Self {
        let len = self.length();
        if len == Fixed::ZERO {
            return Self::ZERO;
        }

        Self::new(self.x / len, self.y / len)
    }

    /// Move at most `step` units from `self` toward `target`.
    ///
    /// Returns the new position and whether the target was reached. The
    /// target is reached (and snapped to) when it is closer than `step`.
    #[must_use]
    pub fn step_toward(self, target: Self, step: Fixed) -> (Self, bool) {
        let delta = target - self;
        let dist = delta.length();
        if dist < step || dist == Fixed::ZERO {
            return (target, true);
        }

        let moved = Self::new(
            self.x + delta.x * step / dist,
            self.y + delta.y * step / dist,
        );
        (moved, false)
    }

    /// Clamp both components into the rectangle `[min, max]`.
    #[must_use]
    pub fn clamp(self, min: Self, max: Self) -> Self {
        Self::new(self.x.clamp(min.x, max.x), self.y.clamp(min.y, max.y))
    }

    /// Lossy conversion for renderers and JSON output.
    #[must_use]
    pub fn to_f32(self) -> (f32, f32) {
        (self.x.to_num::<f32>(), self.y.to_num::<f32>())
    }
}

/// Computes the square root of a non-negative fixed-point number.
///
/// Works on the raw bits: for a value `b / 2^32` the root is
/// `isqrt(b << 32) / 2^32`, so the result is exact to the last bit.
#[must_use]
pub fn fixed_sqrt(value: Fixed) -> Fixed {
    if value <= Fixed::ZERO {
        return Fixed::ZERO;
    }

    let scaled = (value.to_bits() as u128) << 32;
    Fixed::from_bits(isqrt(scaled) as i64)
}

fn isqrt(n: u128) -> u128 {
    if n < 2 {
        return n;
    }

    let shift = (128 - n.leading_zeros()) / 2 + 1;
    let mut x = 1u128 << shift;
    loop {
        let y = (x + n / x) / 2;
        if y >= x {
            return x;
        }
        x = y;
    }
}

impl std::ops::Add for Vec2Fixed {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl std::ops::Sub for Vec2Fixed {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec2_distance_squared() {
        let a = Vec2Fixed::from_ints(3, 0);
        let b = Vec2Fixed::from_ints(0, 4);
        // 3² + 4² = 25
        assert_eq!(a.distance_squared(b), Fixed::from_num(25));
        assert_eq!(a.distance(b), Fixed::from_num(5));
    }

    #[test]
    fn test_distance_saturates_for_far_points() {
        let far = Vec2Fixed::from_ints(200_000, 200_000);
        assert_eq!(Vec2Fixed::ZERO.distance_squared(far), Fixed::MAX);
        assert_eq!(far.length(), fixed_sqrt(Fixed::MAX));
    }

    #[test]
    fn test_fixed_determinism() {
        let a = Fixed::from_num(1) / Fixed::from_num(3);
        let b = Fixed::from_num(1) / Fixed::from_num(3);
        assert_eq!(a * Fixed::from_num(7), b * Fixed::from_num(7));
    }

    #[test]
    fn test_milli_conversion() {
        assert_eq!(milli(1750), Fixed::from_num(7) / Fixed::from_num(4));
        assert_eq!(milli(500), Fixed::from_num(1) / Fixed::from_num(2));
        assert_eq!(milli(0), Fixed::ZERO);
    }

    #[test]
    fn test_sqrt_perfect_squares() {
        for n in [0, 1, 4, 9, 144, 10_000, 36_000_000] {
            let root = fixed_sqrt(Fixed::from_num(n));
            assert_eq!(root * root, Fixed::from_num(n), "sqrt({n})");
        }
    }

    #[test]
    fn test_vec2_normalize() {
        let norm = Vec2Fixed::from_ints(3, 4).normalize();
        let epsilon = Fixed::from_num(1) / Fixed::from_num(100_000);
        assert!((norm.x - milli(600)).abs() < epsilon);
        assert!((norm.y - milli(800)).abs() < epsilon);
    }

    #[test]
    fn test_step_toward_moves_by_step() {
        let start = Vec2Fixed::ZERO;
        let (pos, arrived) = start.step_toward(Vec2Fixed::from_ints(10, 0), Fixed::from_num(2));
        assert!(!arrived);
        assert_eq!(pos, Vec2Fixed::from_ints(2, 0));
    }

    #[test]
    fn test_step_toward_snaps_when_close() {
        let start = Vec2Fixed::ZERO;
        let target = Vec2Fixed::from_ints(1, 1);
        let (pos, arrived) = start.step_toward(target, Fixed::from_num(2));
        assert!(arrived);
        assert_eq!(pos, target);
    }

    #[test]
    fn test_clamp() {
        let v = Vec2Fixed::from_ints(-5, 7000);
        let clamped = v.clamp(Vec2Fixed::ZERO, Vec2Fixed::from_ints(6000, 4000));
        assert_eq!(clamped, Vec2Fixed::from_ints(0, 4000));
    }
}
