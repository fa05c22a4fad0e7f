//! Fit-to-slots — `fit_flight_plan_into_tower_allocations`.
//!
//! Snaps an anchored plan's start/end onto the launch/landing tower's
//! slot grid by stretching it, recursing when the stretch itself needed
//! enough extra flight time to trigger a fresh refuel insertion (which
//! changes the plan's duration and may require a different slot).
//!
//! Callers are expected to have called `plan.snapshot()` right after the
//! plan's initial anchoring (not at construction) — `restore_from_snapshot`
//! here resets back to that anchored-but-unstretched state on every
//! retry, not all the way back to an unanchored plan.

use crate::error::ScheduleError;
use crate::flight_plan::FlightPlan;
use crate::sched_debug;
use crate::scheduler::SchedulerConfig;
use crate::schema::BotSchema;
use crate::tower::Tower;
use crate::transforms::anchor::approximate_from_launch;
use crate::transforms::recalculate::recalculate;
use crate::transforms::stretch::stretch_flight_plan;

pub fn fit_flight_plan_into_tower_allocations(
    plan: &mut FlightPlan,
    starting_tower: &Tower,
    finishing_tower: &Tower,
    bot: &BotSchema,
    config: &SchedulerConfig,
) -> Result<(), ScheduleError> {
    fit_inner(plan, starting_tower, finishing_tower, bot, config, 0)
}

fn fit_inner(
    plan: &mut FlightPlan,
    starting_tower: &Tower,
    finishing_tower: &Tower,
    bot: &BotSchema,
    config: &SchedulerConfig,
    depth: u32,
) -> Result<(), ScheduleError> {
    if depth > config.recursion_depth_cap {
        return Err(ScheduleError::RecursionDepthExceeded);
    }

    let plan_start = plan.start_time().ok_or(ScheduleError::InvalidAnchor)?;
    let plan_end = plan.end_time().ok_or(ScheduleError::InvalidAnchor)?;

    let (_, launch_end) = starting_tower
        .nearest_launch_ending_at_or_before(plan_start)
        .ok_or(ScheduleError::NoSlotAvailable)?;
    let (landing_start, _) = finishing_tower
        .nearest_landing_starting_at_or_after(plan_end)
        .ok_or(ScheduleError::NoSlotAvailable)?;

    let start_delta = (plan_start - launch_end).num_seconds();
    let end_delta = (landing_start - plan_end).num_seconds();

    if start_delta <= 0 && end_delta <= 0 {
        sched_debug!("(fit_flight_plan_into_tower_allocations) plan already aligned to slot grid");
        plan.snapshot();
        return Ok(());
    }

    let original_refuel_count = plan.refuel_waypoint_count();

    plan.restore_from_snapshot();
    stretch_flight_plan(plan, start_delta, end_delta, bot.speed, starting_tower, finishing_tower);
    let anchored_start = plan.start_time().ok_or(ScheduleError::InvalidAnchor)?;

    recalculate(plan, bot, config);
    approximate_from_launch(plan, anchored_start, bot.speed);

    if plan.refuel_waypoint_count() == original_refuel_count {
        sched_debug!(
            "(fit_flight_plan_into_tower_allocations) fit with start_delta={} end_delta={}, no new refuels",
            start_delta,
            end_delta
        );
        plan.snapshot();
        Ok(())
    } else {
        sched_debug!(
            "(fit_flight_plan_into_tower_allocations) stretch added refuel waypoints ({} -> {}), refitting",
            original_refuel_count,
            plan.refuel_waypoint_count()
        );
        plan.snapshot();
        fit_inner(plan, starting_tower, finishing_tower, bot, config, depth + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Position;
    use crate::schema::BotType;
    use crate::waypoint::{LegWaypoint, Waypoint};
    use chrono::{TimeZone, Timelike, Utc};

    fn bot() -> BotSchema {
        BotSchema::new("op-1", BotType::Operator, 10_000, 1.0, 50.0)
    }

    fn config() -> SchedulerConfig {
        SchedulerConfig::new(600, 300, 120, 30).unwrap()
    }

    #[test]
    fn fit_snaps_the_plan_onto_the_tower_slot_grid() {
        let a = Tower::new("A", Position::new(0.0, 0.0, 0.0), 3600, 3600, 1, 1, 1, 1);
        let b = Tower::new("B", Position::new(0.0, 0.0, 1000.0), 3600, 3600, 1, 1, 1, 1);

        let mut plan = FlightPlan::new(
            vec![Waypoint::Leg(LegWaypoint::new(a.position(), b.position()))],
            "A",
            "B",
        );
        // Off-grid start: 04:35, a quarter hour into the [04:00,05:00) slot.
        let off_grid_start = Utc.with_ymd_and_hms(2024, 1, 1, 4, 35, 0).unwrap();
        approximate_from_launch(&mut plan, off_grid_start, 1.0);
        plan.snapshot();

        let result = fit_flight_plan_into_tower_allocations(&mut plan, &a, &b, &bot(), &config());
        assert!(result.is_ok());
        assert!(plan.is_approximated());

        let new_start = plan.start_time().unwrap();
        assert_eq!(new_start.minute(), 0);
        assert_eq!(new_start.second(), 0);
    }
}
