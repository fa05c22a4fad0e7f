//! Geometry and time helpers shared across the waypoint, flight-plan and
//! transform modules.
//!
//! Legs are straight-line segments in a single Cartesian frame; there is
//! no pathfinding or obstacle avoidance here, only distance, linear
//! interpolation and duration rounding.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

/// A point in the shared 3-D Cartesian frame. Immutable once assigned.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

impl Sub for Position {
    type Output = Position;

    fn sub(self, rhs: Position) -> Position {
        Position::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Add for Position {
    type Output = Position;

    fn add(self, rhs: Position) -> Position {
        Position::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

/// Euclidean distance between two positions.
pub fn distance(a: Position, b: Position) -> f64 {
    let d = a - b;
    (d.x * d.x + d.y * d.y + d.z * d.z).sqrt()
}

/// Componentwise linear interpolation: `a + r * (b - a)`, `r` typically
/// in `[0, 1]` but not clamped so callers may deliberately overshoot.
pub fn interpolate(a: Position, b: Position, r: f64) -> Position {
    Position::new(
        a.x + r * (b.x - a.x),
        a.y + r * (b.y - a.y),
        a.z + r * (b.z - a.z),
    )
}

/// Strips sub-second fractions from a duration given in seconds, using
/// half-up rounding. Used whenever a computed duration (e.g. `distance /
/// speed`) is compared against a slot width or threshold expressed in
/// whole seconds.
pub fn round_to_seconds(seconds: f64) -> i64 {
    seconds.round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_axis_aligned() {
        let a = Position::new(0.0, 0.0, 0.0);
        let b = Position::new(0.0, 0.0, 1000.0);
        assert_eq!(distance(a, b), 1000.0);
    }

    #[test]
    fn interpolate_midpoint() {
        let a = Position::new(0.0, 0.0, 0.0);
        let b = Position::new(0.0, 0.0, 1000.0);
        let mid = interpolate(a, b, 0.5);
        assert_eq!(mid, Position::new(0.0, 0.0, 500.0));
    }

    #[test]
    fn interpolate_ratio_zero_and_one() {
        let a = Position::new(1.0, 2.0, 3.0);
        let b = Position::new(4.0, 5.0, 6.0);
        assert_eq!(interpolate(a, b, 0.0), a);
        assert_eq!(interpolate(a, b, 1.0), b);
    }

    #[test]
    fn round_to_seconds_half_up() {
        assert_eq!(round_to_seconds(1.4), 1);
        assert_eq!(round_to_seconds(1.5), 2);
        assert_eq!(round_to_seconds(99.999), 100);
    }
}
