//! Pre-giving-refuel injection — `add_pre_giving_refuel_waypoint`.
//!
//! Prevents a pathological loop where a refueler, flying out to perform
//! a handoff, would itself run out of endurance exactly at the handoff
//! position (which would require scheduling a refuel for the refueler,
//! which would itself need a refueler, ...).

use crate::flight_plan::FlightPlan;
use crate::geometry::interpolate;
use crate::sched_debug;
use crate::scheduler::SchedulerConfig;
use crate::schema::BotSchema;
use crate::waypoint::action::TOKEN_BEING_RECHARGED;
use crate::waypoint::{ActionWaypoint, LegWaypoint, Waypoint};

const SAFETY_MARGIN_SECONDS: i64 = 60;
const MIN_RATIO: f64 = 0.5;

/// Splits the leg immediately preceding the plan's `giving_recharge`
/// waypoint, inserting a `being_recharged` action partway along it. The
/// split ratio is the smallest fraction of the leg (clamped to `[0.5,
/// 1.0)`) such that the remaining leg, plus the refuel anticipation
/// buffer, plus the refuel itself, plus a 60s safety margin, still fits
/// within the bot's endurance budget.
pub fn add_pre_giving_refuel_waypoint(plan: &mut FlightPlan, bot: &BotSchema, config: &SchedulerConfig) -> bool {
    let Some(giving_index) = plan.giving_recharge_index() else {
        return false;
    };
    let Some(leg_index) = (0..giving_index).rev().find(|&i| plan.waypoints[i].is_leg()) else {
        return false;
    };

    let (from, to) = match &plan.waypoints[leg_index] {
        Waypoint::Leg(l) => (l.from, l.to),
        _ => unreachable!(),
    };

    let leg_seconds = (crate::geometry::distance(from, to) / bot.speed).round() as i64;
    if leg_seconds <= 0 {
        return false;
    }

    let budget = bot.flight_time
        - config.refuel_duration
        - config.remaining_flight_time_at_refuel
        - config.refuel_anticipation_buffer
        - SAFETY_MARGIN_SECONDS;

    // remaining_leg_seconds = leg_seconds * (1 - ratio) must be <= budget,
    // i.e. ratio >= 1 - budget/leg_seconds.
    let min_ratio_for_budget = 1.0 - (budget as f64 / leg_seconds as f64);
    let ratio = min_ratio_for_budget.max(MIN_RATIO).min(0.999);

    let split_point = interpolate(from, to, ratio);

    sched_debug!(
        "(add_pre_giving_refuel_waypoint) splitting leg {} at ratio {:.4} to pre-empt a refueler-needs-a-refueler loop",
        plan.waypoints[leg_index].id(),
        ratio
    );

    let first_half = LegWaypoint::generated(from, split_point);
    let refuel = ActionWaypoint::generated_of(TOKEN_BEING_RECHARGED, config.refuel_duration);
    let second_half = LegWaypoint::generated(split_point, to);

    plan.waypoints[leg_index] = Waypoint::Leg(first_half);
    plan.waypoints.insert(leg_index + 1, Waypoint::Action(refuel));
    plan.waypoints.insert(leg_index + 2, Waypoint::Leg(second_half));

    plan.snapshot();
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Position;
    use crate::schema::BotType;
    use crate::waypoint::action::{TOKEN_GIVING_RECHARGE, TOKEN_REFUEL_ANTICIPATION_BUFFER};

    #[test]
    fn injects_a_refuel_before_the_giving_recharge_leg() {
        let bot = BotSchema::new("refueler-1", BotType::Refueler, 2000, 1.0, 50.0);
        let config = SchedulerConfig::new(600, 300, 120, 30).unwrap();

        let tower_pos = Position::new(0.0, 0.0, 0.0);
        let rendezvous = Position::new(0.0, 0.0, 1500.0);
        let mut plan = FlightPlan::new(
            vec![
                Waypoint::Leg(LegWaypoint::new(tower_pos, rendezvous)),
                Waypoint::Action(ActionWaypoint::new(TOKEN_REFUEL_ANTICIPATION_BUFFER, 120)),
                Waypoint::Action(ActionWaypoint::new(TOKEN_GIVING_RECHARGE, 600)),
                Waypoint::Leg(LegWaypoint::new(rendezvous, tower_pos)),
            ],
            "A",
            "A",
        );

        let inserted = add_pre_giving_refuel_waypoint(&mut plan, &bot, &config);
        assert!(inserted);

        let refuel_count = plan.refuel_waypoint_count();
        assert_eq!(refuel_count, 1);
        assert!(plan.waypoints[0].is_leg());
        assert!(plan.waypoints[1]
            .as_action()
            .map(|a| a.is_being_recharged())
            .unwrap_or(false));
    }

    #[test]
    fn no_op_when_there_is_no_giving_recharge_waypoint() {
        let bot = BotSchema::new("op-1", BotType::Operator, 2000, 1.0, 50.0);
        let config = SchedulerConfig::new(600, 300, 120, 30).unwrap();
        let mut plan = FlightPlan::new(
            vec![Waypoint::Leg(LegWaypoint::new(
                Position::new(0.0, 0.0, 0.0),
                Position::new(0.0, 0.0, 100.0),
            ))],
            "A",
            "B",
        );
        assert!(!add_pre_giving_refuel_waypoint(&mut plan, &bot, &config));
    }
}
