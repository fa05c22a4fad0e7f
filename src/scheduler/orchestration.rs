//! Partial flight plan orchestration —
//! `determine_schedule_for_partial_flight_plans_orchestration`.
//!
//! Callers that know the waypoints of a mission but not which towers it
//! should start/end at submit [`PartialFlightPlan`]s. The first and last
//! waypoints are taken as the mission's logical start/end positions; each
//! partial is completed against its single nearest-start-tower x
//! nearest-finish-tower pairing (the two axes picked independently, not
//! a cross-product search) by prepending/appending the connecting legs,
//! anchored so the partial's first waypoint's ETA lands at
//! `critical_time`. There is no fallback to another pairing if that one
//! fails to schedule.

use super::determine_schedule::Anchor;
use super::Scheduler;
use crate::sched_debug;
use crate::error::{ScheduleError, ValidationError};
use crate::geometry::distance;
use crate::schedule::{PartialFlightPlan, Schedule};
use crate::waypoint::{LegWaypoint, Waypoint};
use chrono::{DateTime, Utc};

pub fn determine_schedule_for_partial_flight_plans_orchestration(
    scheduler: &mut Scheduler,
    partials: &[PartialFlightPlan],
    critical_time: DateTime<Utc>,
) -> Result<Schedule, ScheduleError> {
    let mut sub_schedules = Vec::with_capacity(partials.len());

    for partial in partials {
        sub_schedules.push(schedule_one_partial(scheduler, partial, critical_time)?);
    }

    Ok(Schedule::root(sub_schedules))
}

fn schedule_one_partial(
    scheduler: &mut Scheduler,
    partial: &PartialFlightPlan,
    critical_time: DateTime<Utc>,
) -> Result<Schedule, ScheduleError> {
    if partial.waypoints.is_empty() {
        return Err(ScheduleError::Validation(ValidationError::Empty));
    }

    let first_position = partial.waypoints[0].position().ok_or(ScheduleError::InvalidAnchor)?;
    let last_position = partial
        .waypoints
        .last()
        .and_then(Waypoint::position)
        .ok_or(ScheduleError::InvalidAnchor)?;
    let first_waypoint_id = partial.waypoints[0].id().clone();

    let start_id = nearest_tower_id(scheduler, first_position).ok_or(ScheduleError::NoSlotAvailable)?;
    let finish_id = nearest_tower_id(scheduler, last_position).ok_or(ScheduleError::NoSlotAvailable)?;

    let start_position = scheduler.fleet.tower(&start_id).unwrap().position();
    let finish_position = scheduler.fleet.tower(&finish_id).unwrap().position();

    let mut waypoints = Vec::with_capacity(partial.waypoints.len() + 2);
    waypoints.push(Waypoint::Leg(LegWaypoint::generated(start_position, first_position)));
    waypoints.extend(partial.waypoints.clone());
    waypoints.push(Waypoint::Leg(LegWaypoint::generated(last_position, finish_position)));

    let completed = PartialFlightPlan::new(waypoints);
    let mut plan = completed.complete(start_id.clone(), finish_id.clone());
    let anchor = Anchor::WaypointEta(first_waypoint_id, critical_time);

    sched_debug!(
        "(determine_schedule_for_partial_flight_plans_orchestration) trying nearest pairing {}->{}",
        start_id,
        finish_id
    );
    scheduler.determine_schedule(&mut plan, anchor)
}

/// The single tower nearest `position`. No fallback: whatever the caller
/// does with the resulting schedule attempt, it gets exactly one tower
/// per axis, not a ranked list to retry.
fn nearest_tower_id(scheduler: &Scheduler, position: crate::geometry::Position) -> Option<String> {
    scheduler
        .fleet
        .towers()
        .min_by(|a, b| {
            distance(a.position(), position)
                .partial_cmp(&distance(b.position(), position))
                .unwrap()
        })
        .map(|t| t.id().to_string())
}
