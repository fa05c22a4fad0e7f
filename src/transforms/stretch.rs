//! Stretching — `stretch_flight_plan`.
//!
//! Inserts (or extends) a short vertical hop plus a waiting pause at
//! either end of an already-anchored plan, so its start/end can be
//! nudged to align with a tower's slot grid without touching the real
//! mission legs.

use crate::flight_plan::FlightPlan;
use crate::geometry::{distance, round_to_seconds, Position};
use crate::sched_warn;
use crate::tower::Tower;
use crate::transforms::positions::add_positions_to_action_waypoints;
use crate::transforms::anchor::approximate_from_launch;
use crate::waypoint::action::TOKEN_WAITING;
use crate::waypoint::{ActionWaypoint, LegWaypoint, Waypoint};
use chrono::Duration;

const MAX_HOP_METERS: i64 = 22;

/// Smallest integer hop height (meters) such that climbing from `from`
/// to a point `h` meters above it, then continuing to `to`, takes at
/// least `original_leg_seconds + needed_seconds` — i.e. geometry alone
/// can supply the requested delay. Falls back to `MAX_HOP_METERS` if no
/// height in range suffices; the caller then tops up with waiting time.
fn search_hop_height(from: Position, to: Position, speed: f64, original_leg_seconds: i64, needed_seconds: i64) -> i64 {
    for h in 1..=MAX_HOP_METERS {
        let elevated = Position::new(from.x, from.y, from.z + h as f64);
        let up_leg = round_to_seconds(distance(from, elevated) / speed);
        let modified_leg = round_to_seconds(distance(elevated, to) / speed);
        if up_leg + modified_leg >= original_leg_seconds + needed_seconds {
            return h;
        }
    }
    MAX_HOP_METERS
}

fn is_stretched_at_start(plan: &FlightPlan) -> bool {
    plan.waypoints.len() >= 2
        && plan.waypoints[0].generated()
        && plan.waypoints[0].is_leg()
        && plan.waypoints[1].generated()
        && plan.waypoints[1]
            .as_action()
            .map(|a| a.is_waiting())
            .unwrap_or(false)
}

fn is_stretched_at_end(plan: &FlightPlan) -> bool {
    let n = plan.waypoints.len();
    n >= 2
        && plan.waypoints[n - 1].generated()
        && plan.waypoints[n - 1].is_leg()
        && plan.waypoints[n - 2].generated()
        && plan.waypoints[n - 2]
            .as_action()
            .map(|a| a.is_waiting())
            .unwrap_or(false)
}

fn stretch_start(plan: &mut FlightPlan, delta_seconds: i64, speed: f64) {
    if delta_seconds <= 0 {
        return;
    }

    if is_stretched_at_start(plan) {
        if let Some(a) = plan.waypoints[1].as_action_mut() {
            a.duration_seconds += delta_seconds;
        }
        return;
    }

    let Some(first_leg) = plan.waypoints.first().and_then(|w| w.as_leg()) else {
        return;
    };
    let (from, to) = (first_leg.from, first_leg.to);
    let original_leg_seconds = first_leg.duration_seconds(speed);

    let h = search_hop_height(from, to, speed, original_leg_seconds, delta_seconds);
    let elevated = Position::new(from.x, from.y, from.z + h as f64);
    let up_leg = LegWaypoint::generated(from, elevated);
    let up_leg_seconds = up_leg.duration_seconds(speed);
    let modified_leg = LegWaypoint::generated(elevated, to);
    let modified_leg_seconds = modified_leg.duration_seconds(speed);

    let geometry_extra = up_leg_seconds + modified_leg_seconds - original_leg_seconds;
    let waiting_seconds = (delta_seconds - geometry_extra).max(0);

    plan.waypoints.remove(0);
    plan.waypoints.insert(0, Waypoint::Leg(modified_leg));
    plan.waypoints.insert(
        0,
        Waypoint::Action(ActionWaypoint::generated_of(TOKEN_WAITING, waiting_seconds)),
    );
    plan.waypoints.insert(0, Waypoint::Leg(up_leg));
}

fn stretch_end(plan: &mut FlightPlan, delta_seconds: i64, speed: f64) {
    if delta_seconds <= 0 {
        return;
    }

    if is_stretched_at_end(plan) {
        let n = plan.waypoints.len();
        if let Some(a) = plan.waypoints[n - 2].as_action_mut() {
            a.duration_seconds += delta_seconds;
        }
        return;
    }

    let Some(last_leg) = plan.waypoints.last().and_then(|w| w.as_leg()) else {
        return;
    };
    let (from, to) = (last_leg.from, last_leg.to);
    let original_leg_seconds = last_leg.duration_seconds(speed);

    // Symmetric to the start case: the hop happens just before landing,
    // so the "elevated" detour point sits above the destination.
    let h = search_hop_height(to, from, speed, original_leg_seconds, delta_seconds);
    let elevated = Position::new(to.x, to.y, to.z + h as f64);
    let modified_leg = LegWaypoint::generated(from, elevated);
    let modified_leg_seconds = modified_leg.duration_seconds(speed);
    let down_leg = LegWaypoint::generated(elevated, to);
    let down_leg_seconds = down_leg.duration_seconds(speed);

    let geometry_extra = modified_leg_seconds + down_leg_seconds - original_leg_seconds;
    let waiting_seconds = (delta_seconds - geometry_extra).max(0);

    plan.waypoints.pop();
    plan.waypoints.push(Waypoint::Leg(modified_leg));
    plan.waypoints.push(Waypoint::Action(ActionWaypoint::generated_of(
        TOKEN_WAITING,
        waiting_seconds,
    )));
    plan.waypoints.push(Waypoint::Leg(down_leg));
}

/// Adds `start_delta`/`end_delta` seconds to the plan's overall
/// duration via a synthetic hop + wait at each end, then re-anchors from
/// the new (earlier) start and re-backfills action positions.
pub fn stretch_flight_plan(
    plan: &mut FlightPlan,
    start_delta: i64,
    end_delta: i64,
    speed: f64,
    starting_tower: &Tower,
    finishing_tower: &Tower,
) {
    let Some(original_start) = plan.start_time() else {
        sched_warn!("(stretch_flight_plan) plan is not anchored, nothing to stretch from");
        return;
    };
    let original_total = plan.total_duration_seconds(speed);

    stretch_start(plan, start_delta, speed);
    stretch_end(plan, end_delta, speed);

    let new_start = original_start - Duration::seconds(start_delta.max(0));
    approximate_from_launch(plan, new_start, speed);
    let _ = add_positions_to_action_waypoints(plan, starting_tower, finishing_tower);

    let new_total = plan.total_duration_seconds(speed);
    debug_assert_eq!(new_total, original_total + start_delta + end_delta);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::waypoint::LegWaypoint;
    use chrono::{TimeZone, Utc};

    fn towers() -> (Tower, Tower) {
        (
            Tower::new("A", Position::new(0.0, 0.0, 0.0), 60, 60, 1, 1, 1, 1),
            Tower::new("B", Position::new(0.0, 0.0, 1000.0), 60, 60, 1, 1, 1, 1),
        )
    }

    #[test]
    fn stretching_adds_exactly_the_requested_delta() {
        let (a, b) = towers();
        let mut plan = FlightPlan::new(
            vec![Waypoint::Leg(LegWaypoint::new(a.position(), b.position()))],
            "A",
            "B",
        );
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        approximate_from_launch(&mut plan, t0, 1.0);

        stretch_flight_plan(&mut plan, 300, 150, 1.0, &a, &b);

        assert_eq!(plan.total_duration_seconds(1.0), 1000 + 300 + 150);
    }

    #[test]
    fn restretching_an_already_stretched_plan_extends_waiting_not_structure() {
        let (a, b) = towers();
        let mut plan = FlightPlan::new(
            vec![Waypoint::Leg(LegWaypoint::new(a.position(), b.position()))],
            "A",
            "B",
        );
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        approximate_from_launch(&mut plan, t0, 1.0);

        stretch_flight_plan(&mut plan, 300, 0, 1.0, &a, &b);
        let len_after_first = plan.waypoints.len();
        stretch_flight_plan(&mut plan, 200, 0, 1.0, &a, &b);

        assert_eq!(plan.waypoints.len(), len_after_first);
        assert_eq!(plan.total_duration_seconds(1.0), 1000 + 300 + 200);
    }
}
