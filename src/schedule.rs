//! [`Schedule`]: the recursive result tree produced by
//! [`crate::scheduler::Scheduler::determine_schedule`], plus
//! [`PartialFlightPlan`], used where the caller doesn't yet know which
//! towers a leg should start/end at.

use crate::flight_plan::FlightPlan;
use crate::waypoint::{Waypoint, WaypointId};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// A scheduled flight plan together with the refueler (or transit)
/// sub-schedules attached to its `being_recharged`/transit waypoints.
///
/// The root of a schedule tree may carry no flight plan of its own (see
/// `determine_schedule_for_partial_flight_plans_orchestration`), in
/// which case `flight_plan` is `None` and `related_sub_flight_plans`
/// holds the top-level schedules keyed by a synthetic id.
#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    pub flight_plan: Option<FlightPlan>,
    pub related_sub_flight_plans: HashMap<WaypointId, Vec<Schedule>>,
}

impl Schedule {
    pub fn new(flight_plan: FlightPlan) -> Self {
        Self {
            flight_plan: Some(flight_plan),
            related_sub_flight_plans: HashMap::new(),
        }
    }

    pub fn root(sub_schedules: Vec<Schedule>) -> Self {
        let mut related_sub_flight_plans = HashMap::new();
        related_sub_flight_plans.insert("root".to_string(), sub_schedules);
        Self {
            flight_plan: None,
            related_sub_flight_plans,
        }
    }

    pub fn attach(&mut self, waypoint_id: WaypointId, sub_schedule: Schedule) {
        self.related_sub_flight_plans
            .entry(waypoint_id)
            .or_default()
            .push(sub_schedule);
    }

    /// Transitive union of every flight plan in this tree, sorted by
    /// start time (plans with no start time sort last, in encounter
    /// order among themselves).
    pub fn flat_flight_plans(&self) -> Vec<&FlightPlan> {
        let mut plans = Vec::new();
        self.collect_flight_plans(&mut plans);
        plans.sort_by_key(|p| p.start_time().unwrap_or(DateTime::<Utc>::MAX_UTC));
        plans
    }

    fn collect_flight_plans<'a>(&'a self, out: &mut Vec<&'a FlightPlan>) {
        if let Some(plan) = &self.flight_plan {
            out.push(plan);
        }
        for subs in self.related_sub_flight_plans.values() {
            for sub in subs {
                sub.collect_flight_plans(out);
            }
        }
    }

    /// A schedule is possible iff its earliest flight start is still in
    /// the future relative to `now`.
    pub fn is_possible(&self, now: DateTime<Utc>) -> bool {
        self.flat_flight_plans()
            .first()
            .and_then(|p| p.start_time())
            .map(|start| start > now)
            .unwrap_or(false)
    }
}

/// A waypoint sequence that hasn't yet been bound to start/end towers.
/// Used by the partial-plan orchestration, which picks towers itself by
/// pairing nearest candidates.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialFlightPlan {
    pub waypoints: Vec<Waypoint>,
}

impl PartialFlightPlan {
    pub fn new(waypoints: Vec<Waypoint>) -> Self {
        Self { waypoints }
    }

    /// Binds this partial to concrete towers, producing an ordinary
    /// [`FlightPlan`] ready for `determine_schedule`.
    pub fn complete(
        &self,
        starting_tower_id: impl Into<String>,
        finishing_tower_id: impl Into<String>,
    ) -> FlightPlan {
        FlightPlan::new(self.waypoints.clone(), starting_tower_id, finishing_tower_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Position;
    use crate::waypoint::LegWaypoint;
    use chrono::TimeZone;

    fn plan_at(start: DateTime<Utc>) -> FlightPlan {
        let a = Position::new(0.0, 0.0, 0.0);
        let b = Position::new(0.0, 0.0, 1000.0);
        let mut leg = LegWaypoint::new(a, b);
        leg.start_time = Some(start);
        leg.end_time = Some(start + chrono::Duration::seconds(10));
        FlightPlan::new(vec![Waypoint::Leg(leg)], "A", "B")
    }

    #[test]
    fn flat_flight_plans_includes_sub_schedules_sorted_by_start() {
        let later = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let earlier = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        let mut root = Schedule::new(plan_at(later));
        root.attach("wp1".to_string(), Schedule::new(plan_at(earlier)));

        let flat = root.flat_flight_plans();
        assert_eq!(flat.len(), 2);
        assert_eq!(flat[0].start_time().unwrap(), earlier);
        assert_eq!(flat[1].start_time().unwrap(), later);
    }

    #[test]
    fn is_possible_requires_a_future_start() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let schedule = Schedule::new(plan_at(now + chrono::Duration::hours(1)));
        assert!(schedule.is_possible(now));

        let past_schedule = Schedule::new(plan_at(now - chrono::Duration::hours(1)));
        assert!(!past_schedule.is_possible(now));
    }
}
