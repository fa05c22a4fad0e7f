//! Time anchoring: three entry points that turn a plan with no (or
//! partial) timing into a fully-approximated one, all built on the same
//! forward pass.

use crate::flight_plan::FlightPlan;
use crate::waypoint::WaypointId;
use chrono::{DateTime, Duration, Utc};

/// Walks the plan forward from `start`, setting each waypoint's
/// `[start, end)` from the previous waypoint's end (or `start` for the
/// first one) and its own duration at `speed`.
fn forward_pass(plan: &mut FlightPlan, start: DateTime<Utc>, speed: f64) {
    let mut cursor = start;
    for w in &mut plan.waypoints {
        let end = cursor + Duration::seconds(w.duration_seconds(speed));
        w.set_times(cursor, end);
        cursor = end;
    }
}

/// Forward pass anchored at an explicit launch time.
pub fn approximate_from_launch(plan: &mut FlightPlan, t0: DateTime<Utc>, speed: f64) {
    forward_pass(plan, t0, speed);
}

/// Anchors so that `waypoint_id`'s start equals `eta`: walk backward
/// from that waypoint assigning times by subtracting duration, then
/// re-run the forward pass from the computed start of waypoint 0 to
/// normalize every subsequent waypoint's timing.
pub fn approximate_from_waypoint_eta(
    plan: &mut FlightPlan,
    waypoint_id: &WaypointId,
    eta: DateTime<Utc>,
    speed: f64,
) -> Option<()> {
    let target_index = plan.waypoint_index(waypoint_id)?;

    let mut cursor = eta;
    for w in plan.waypoints[..=target_index].iter_mut().rev() {
        let duration = Duration::seconds(w.duration_seconds(speed));
        let start = cursor - duration;
        w.set_times(start, cursor);
        cursor = start;
    }

    let launch = plan.waypoints[0].start_time()?;
    forward_pass(plan, launch, speed);
    Some(())
}

/// Appends a zero-work dummy action, anchors its start to `t_land` via
/// the waypoint-eta path, then discards it — the rest of the plan is
/// left with times computed backward from the landing instant.
pub fn approximate_from_landing(plan: &mut FlightPlan, t_land: DateTime<Utc>, speed: f64) {
    use crate::waypoint::action::TOKEN_DUMMY;
    use crate::waypoint::{ActionWaypoint, Waypoint};

    let dummy = ActionWaypoint::generated_of(TOKEN_DUMMY, 0);
    let dummy_id = dummy.id.clone();
    plan.waypoints.push(Waypoint::Action(dummy));

    approximate_from_waypoint_eta(plan, &dummy_id, t_land, speed);

    plan.waypoints.pop();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Position;
    use crate::waypoint::{LegWaypoint, Waypoint};
    use chrono::TimeZone;

    fn plan() -> FlightPlan {
        FlightPlan::new(
            vec![
                Waypoint::Leg(LegWaypoint::new(
                    Position::new(0.0, 0.0, 0.0),
                    Position::new(0.0, 0.0, 100.0),
                )),
                Waypoint::Leg(LegWaypoint::new(
                    Position::new(0.0, 0.0, 100.0),
                    Position::new(0.0, 0.0, 300.0),
                )),
            ],
            "A",
            "B",
        )
    }

    #[test]
    fn forward_anchoring_chains_waypoint_times() {
        let mut p = plan();
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        approximate_from_launch(&mut p, t0, 1.0);
        assert_eq!(p.waypoints[0].start_time(), Some(t0));
        assert_eq!(p.waypoints[0].end_time(), Some(t0 + Duration::seconds(100)));
        assert_eq!(p.waypoints[1].start_time(), Some(t0 + Duration::seconds(100)));
        assert_eq!(p.waypoints[1].end_time(), Some(t0 + Duration::seconds(300)));
    }

    #[test]
    fn waypoint_eta_anchors_the_named_waypoint_and_normalizes_the_rest() {
        let mut p = plan();
        let eta = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let second_id = p.waypoints[1].id().clone();
        approximate_from_waypoint_eta(&mut p, &second_id, eta, 1.0).unwrap();
        assert_eq!(p.waypoints[1].start_time(), Some(eta));
        assert_eq!(p.waypoints[0].end_time(), Some(eta));
        assert_eq!(p.waypoints[0].start_time(), Some(eta - Duration::seconds(100)));
    }

    #[test]
    fn landing_anchoring_ends_the_plan_at_t_land() {
        let mut p = plan();
        let t_land = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        approximate_from_landing(&mut p, t_land, 1.0);
        assert_eq!(p.waypoints.len(), 2);
        assert_eq!(p.waypoints[1].end_time(), Some(t_land));
    }
}
