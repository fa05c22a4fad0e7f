//! Refueler sub-schedule synthesis — `create_refuel_flight_plans`.
//!
//! For a `being_recharged` waypoint on some plan, builds a rendezvous
//! plan for a refueler: travel out to the waypoint's position, wait out
//! an anticipation buffer, hand off the charge, fly home. Candidates are
//! every (tower, refueler schema) pair, tried nearest-tower-first, first
//! one that schedules successfully wins.

use super::determine_schedule::Anchor;
use super::Scheduler;
use crate::error::ScheduleError;
use crate::flight_plan::{FlightPlan, FlightPlanMeta};
use crate::geometry::{distance, Position};
use crate::schedule::Schedule;
use crate::sched_debug;
use crate::schema::BotSchema;
use crate::transforms::{add_pre_giving_refuel_waypoint, recalculate};
use crate::waypoint::action::{TOKEN_GIVING_RECHARGE, TOKEN_REFUEL_ANTICIPATION_BUFFER};
use crate::waypoint::{ActionWaypoint, LegWaypoint, Waypoint};
use chrono::{DateTime, Duration, Utc};

pub fn create_refuel_flight_plans(
    scheduler: &mut Scheduler,
    plan: &FlightPlan,
    waypoint_index: usize,
    waypoint_start: DateTime<Utc>,
    depth: u32,
) -> Result<Schedule, ScheduleError> {
    let rendezvous = plan.waypoints[waypoint_index]
        .position()
        .ok_or(ScheduleError::InvalidAnchor)?;

    let mut candidates: Vec<(String, Position, BotSchema)> = scheduler
        .fleet
        .towers()
        .flat_map(|tower| {
            let id = tower.id().to_string();
            let pos = tower.position();
            scheduler
                .fleet
                .refueler_schemas()
                .map(move |schema| (id.clone(), pos, schema.clone()))
        })
        .collect();

    candidates.sort_by(|a, b| {
        distance(a.1, rendezvous)
            .partial_cmp(&distance(b.1, rendezvous))
            .unwrap()
    });

    if candidates.is_empty() {
        return Err(ScheduleError::NoRefuelerAvailable);
    }

    for (tower_id, tower_position, bot) in candidates {
        let mut candidate_plan = build_candidate(
            &tower_id,
            tower_position,
            rendezvous,
            &bot,
            scheduler.config.refuel_duration,
            scheduler.config.refuel_anticipation_buffer,
        );

        let anticipation_waypoint_id = candidate_plan.waypoints[1].id().clone();

        // Pre-empt a refueler-needing-a-refueler loop: if the trip out
        // would itself trip `recalculate`, pre-split the outbound leg
        // before anchoring.
        let mut probe = candidate_plan.clone();
        recalculate(&mut probe, &bot, &scheduler.config);
        if probe.refuel_waypoint_count() > 0 {
            add_pre_giving_refuel_waypoint(&mut candidate_plan, &bot, &scheduler.config);
        }

        let eta = waypoint_start - Duration::seconds(scheduler.config.refuel_anticipation_buffer);
        let anchor = Anchor::WaypointEta(anticipation_waypoint_id, eta);

        match scheduler.determine_schedule_at_depth(&mut candidate_plan, anchor, depth) {
            Ok(schedule) => {
                sched_debug!(
                    "(create_refuel_flight_plans) refueler from tower {} services waypoint {}",
                    tower_id,
                    plan.waypoints[waypoint_index].id()
                );
                return Ok(schedule);
            }
            Err(e) => {
                sched_debug!(
                    "(create_refuel_flight_plans) candidate refueler from tower {} failed: {}",
                    tower_id,
                    e
                );
            }
        }
    }

    Err(ScheduleError::NoRefuelerAvailable)
}

fn build_candidate(
    tower_id: &str,
    tower_position: Position,
    rendezvous: Position,
    bot: &BotSchema,
    refuel_duration: i64,
    refuel_anticipation_buffer: i64,
) -> FlightPlan {
    let out_leg = LegWaypoint::new(tower_position, rendezvous);
    let buffer = ActionWaypoint::new(TOKEN_REFUEL_ANTICIPATION_BUFFER, refuel_anticipation_buffer).with_position(rendezvous);
    let giving = ActionWaypoint::new(TOKEN_GIVING_RECHARGE, refuel_duration).with_position(rendezvous);
    let back_leg = LegWaypoint::new(rendezvous, tower_position);

    FlightPlan::new(
        vec![
            Waypoint::Leg(out_leg),
            Waypoint::Action(buffer),
            Waypoint::Action(giving),
            Waypoint::Leg(back_leg),
        ],
        tower_id,
        tower_id,
    )
    .with_meta(FlightPlanMeta::for_bot_model(bot.model.clone()))
}
