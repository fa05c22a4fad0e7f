//! Transit sub-schedules — `create_transit_schedule`.
//!
//! Produced when a bot or payload instance is tracked at a tower other
//! than the one a flight plan needs it at. Builds a minimal two-waypoint
//! plan (a zero-duration `waiting` action at the current tower, then a
//! single leg to the destination) and lets the ordinary scheduling
//! pipeline size, fit and allocate it like any other request.

use super::determine_schedule::Anchor;
use super::Scheduler;
use crate::error::ScheduleError;
use crate::flight_plan::{FlightPlan, FlightPlanMeta};
use crate::schedule::Schedule;
use crate::sched_debug;
use crate::waypoint::action::TOKEN_WAITING;
use crate::waypoint::{ActionWaypoint, LegWaypoint, Waypoint};
use chrono::{DateTime, Utc};

/// Relocates whatever is tracked at `from_tower_id` to `to_tower_id`, so
/// it's in place by `arrival_time`. `bot_model` is the schema flown for
/// the relocation itself (not necessarily the resource being moved: a
/// transited payload rides along on a bot of a schema compatible with
/// it, never pinned to a specific `bot_id`).
pub fn create_transit_schedule(
    scheduler: &mut Scheduler,
    from_tower_id: &str,
    to_tower_id: &str,
    arrival_time: DateTime<Utc>,
    bot_model: &str,
    depth: u32,
) -> Result<Schedule, ScheduleError> {
    let from_position = scheduler
        .fleet
        .tower(from_tower_id)
        .ok_or_else(|| ScheduleError::NoResourceAvailable { model: from_tower_id.to_string() })?
        .position();
    let to_position = scheduler
        .fleet
        .tower(to_tower_id)
        .ok_or_else(|| ScheduleError::NoResourceAvailable { model: to_tower_id.to_string() })?
        .position();

    let waiting = ActionWaypoint::generated_of(TOKEN_WAITING, 0).with_position(from_position);
    let leg = LegWaypoint::generated(from_position, to_position);

    let mut plan = FlightPlan::new(
        vec![Waypoint::Action(waiting), Waypoint::Leg(leg)],
        from_tower_id,
        to_tower_id,
    )
    .with_meta(FlightPlanMeta::for_bot_model(bot_model));

    sched_debug!(
        "(create_transit_schedule) relocating a {} from {} to {}, arriving by {}",
        bot_model,
        from_tower_id,
        to_tower_id,
        arrival_time
    );

    scheduler.determine_schedule_at_depth(&mut plan, Anchor::Landing(arrival_time), depth + 1)
}
