//! Position back-fill — `add_positions_to_action_waypoints`.

use crate::error::ValidationError;
use crate::flight_plan::FlightPlan;
use crate::geometry::Position;
use crate::tower::Tower;
use crate::waypoint::Waypoint;

/// For every action waypoint, walks backward to the nearest leg and
/// copies that leg's `to` position into the action's `position`. If no
/// preceding leg exists, uses the starting tower's position. Re-runs
/// `validate` afterward since a caller typically invokes this right
/// before binding resources.
pub fn add_positions_to_action_waypoints(
    plan: &mut FlightPlan,
    starting_tower: &Tower,
    finishing_tower: &Tower,
) -> Result<(), ValidationError> {
    let mut last_leg_to: Option<Position> = None;

    for w in &mut plan.waypoints {
        match w {
            Waypoint::Leg(l) => last_leg_to = Some(l.to),
            Waypoint::Action(a) => {
                a.position = Some(last_leg_to.unwrap_or_else(|| starting_tower.position()));
            }
        }
    }

    plan.validate(starting_tower, finishing_tower)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Position;
    use crate::waypoint::{ActionWaypoint, LegWaypoint};

    #[test]
    fn action_before_any_leg_takes_the_starting_tower_position() {
        let a = Tower::new("A", Position::new(0.0, 0.0, 0.0), 60, 60, 1, 1, 1, 1);
        let b = Tower::new("B", Position::new(0.0, 0.0, 1000.0), 60, 60, 1, 1, 1, 1);
        let mut plan = FlightPlan::new(
            vec![
                Waypoint::Action(ActionWaypoint::new("waiting", 10)),
                Waypoint::Leg(LegWaypoint::new(a.position(), b.position())),
            ],
            "A",
            "B",
        );
        add_positions_to_action_waypoints(&mut plan, &a, &b).unwrap();
        assert_eq!(
            plan.waypoints[0].as_action().unwrap().position,
            Some(a.position())
        );
    }

    #[test]
    fn action_after_a_leg_takes_that_legs_destination() {
        let a = Tower::new("A", Position::new(0.0, 0.0, 0.0), 60, 60, 1, 1, 1, 1);
        let mid = Position::new(0.0, 0.0, 500.0);
        let b = Tower::new("B", Position::new(0.0, 0.0, 1000.0), 60, 60, 1, 1, 1, 1);
        let mut plan = FlightPlan::new(
            vec![
                Waypoint::Leg(LegWaypoint::new(a.position(), mid)),
                Waypoint::Action(ActionWaypoint::new("being_recharged", 600)),
                Waypoint::Leg(LegWaypoint::new(mid, b.position())),
            ],
            "A",
            "B",
        );
        add_positions_to_action_waypoints(&mut plan, &a, &b).unwrap();
        assert_eq!(plan.waypoints[1].as_action().unwrap().position, Some(mid));
    }
}
