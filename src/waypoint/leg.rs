//! [`LegWaypoint`]: a straight-line segment flown at the active bot
//! model's cruise speed.

use super::{new_waypoint_id, WaypointId};
use crate::geometry::{distance, round_to_seconds, Position};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegWaypoint {
    pub id: WaypointId,
    pub from: Position,
    pub to: Position,
    pub generated: bool,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl LegWaypoint {
    pub fn new(from: Position, to: Position) -> Self {
        Self {
            id: new_waypoint_id(),
            from,
            to,
            generated: false,
            start_time: None,
            end_time: None,
        }
    }

    pub fn generated(from: Position, to: Position) -> Self {
        let mut leg = Self::new(from, to);
        leg.generated = true;
        leg
    }

    /// Straight-line length of the leg.
    pub fn distance(&self) -> f64 {
        distance(self.from, self.to)
    }

    /// Whole-second flight time at the given speed (distance units per
    /// second).
    pub fn duration_seconds(&self, speed: f64) -> i64 {
        round_to_seconds(self.distance() / speed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_seconds_is_distance_over_speed() {
        let leg = LegWaypoint::new(Position::new(0.0, 0.0, 0.0), Position::new(0.0, 0.0, 200.0));
        assert_eq!(leg.duration_seconds(1.0), 200);
        assert_eq!(leg.duration_seconds(2.0), 100);
    }
}
