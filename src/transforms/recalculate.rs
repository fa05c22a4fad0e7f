//! Refuel insertion — `recalculate`.
//!
//! Splits legs and actions so that between any two consecutive
//! `being_recharged` actions (or the plan's start and the first one),
//! accumulated in-flight time never exceeds the bot's endurance minus
//! its safety margins. A restartable scan: any insertion invalidates
//! waypoint indices, so the whole pass starts over rather than trying to
//! patch iterator state mid-walk.

use crate::flight_plan::FlightPlan;
use crate::geometry::interpolate;
use crate::sched_debug;
use crate::scheduler::SchedulerConfig;
use crate::schema::BotSchema;
use crate::waypoint::action::TOKEN_BEING_RECHARGED;
use crate::waypoint::{ActionWaypoint, LegWaypoint, Waypoint};

/// `threshold = bot.flight_time - remaining_flight_time_at_refuel - refuel_duration`.
fn threshold(bot: &BotSchema, config: &SchedulerConfig) -> i64 {
    bot.flight_time - config.remaining_flight_time_at_refuel - config.refuel_duration
}

pub fn recalculate(plan: &mut FlightPlan, bot: &BotSchema, config: &SchedulerConfig) {
    let threshold = threshold(bot, config);

    loop {
        if !pass(plan, bot, config, threshold) {
            break;
        }
    }
}

/// Runs one scan; returns `true` if it made an insertion (caller should
/// run another pass), `false` if the plan is already within threshold
/// everywhere.
fn pass(plan: &mut FlightPlan, bot: &BotSchema, config: &SchedulerConfig, threshold: i64) -> bool {
    let mut accumulated: i64 = 0;

    for i in 0..plan.waypoints.len() {
        match &plan.waypoints[i] {
            Waypoint::Action(a) if a.is_being_recharged() => {
                accumulated = 0;
            }
            Waypoint::Action(a) => {
                let d = a.duration_seconds;
                let would_be = accumulated + d;
                if would_be > threshold {
                    let overshoot = would_be - threshold;
                    split_action(plan, i, d, overshoot, config);
                    return true;
                }
                accumulated = would_be;
            }
            Waypoint::Leg(l) => {
                let leg_time = l.duration_seconds(bot.speed);
                let would_be = accumulated + leg_time;
                if would_be > threshold {
                    let overshoot = would_be - threshold;
                    split_leg(plan, i, leg_time, overshoot, config);
                    return true;
                }
                accumulated = would_be;
            }
        }
    }

    false
}

fn split_action(plan: &mut FlightPlan, i: usize, d: i64, overshoot: i64, config: &SchedulerConfig) {
    let is_giving_recharge = plan.waypoints[i]
        .as_action()
        .map(|a| a.is_giving_recharge())
        .unwrap_or(false);

    if is_giving_recharge {
        sched_debug!(
            "(recalculate) giving_recharge at waypoint {} can't split, inserting refuel one position earlier",
            plan.waypoints[i].id()
        );
        let insert_at = i.saturating_sub(1);
        plan.waypoints.insert(
            insert_at,
            Waypoint::Action(ActionWaypoint::generated_of(
                TOKEN_BEING_RECHARGED,
                config.refuel_duration,
            )),
        );
        return;
    }

    if d == overshoot {
        sched_debug!("(recalculate) inserting refuel immediately before waypoint {}", plan.waypoints[i].id());
        plan.waypoints.insert(
            i,
            Waypoint::Action(ActionWaypoint::generated_of(
                TOKEN_BEING_RECHARGED,
                config.refuel_duration,
            )),
        );
        return;
    }

    let label = plan.waypoints[i].as_action().unwrap().action.clone();
    let position = plan.waypoints[i].as_action().unwrap().position;

    if let Some(a) = plan.waypoints[i].as_action_mut() {
        a.duration_seconds = d - overshoot;
    }

    sched_debug!(
        "(recalculate) splitting action {} into {} + refuel + {}",
        plan.waypoints[i].id(),
        d - overshoot,
        overshoot
    );

    let mut refuel = ActionWaypoint::generated_of(TOKEN_BEING_RECHARGED, config.refuel_duration);
    refuel.position = position;
    let mut remainder = ActionWaypoint::generated_of(label, overshoot);
    remainder.position = position;

    plan.waypoints.insert(i + 1, Waypoint::Action(refuel));
    plan.waypoints.insert(i + 2, Waypoint::Action(remainder));
}

fn split_leg(plan: &mut FlightPlan, i: usize, leg_time: i64, overshoot: i64, config: &SchedulerConfig) {
    let (from, to) = match &plan.waypoints[i] {
        Waypoint::Leg(l) => (l.from, l.to),
        _ => unreachable!("split_leg called on a non-leg waypoint"),
    };

    let ratio = (leg_time - overshoot) as f64 / leg_time as f64;
    let split_point = interpolate(from, to, ratio);

    sched_debug!(
        "(recalculate) splitting leg {} at ratio {:.4}",
        plan.waypoints[i].id(),
        ratio
    );

    if let Waypoint::Leg(l) = &mut plan.waypoints[i] {
        l.to = split_point;
    }

    let refuel = Waypoint::Action(ActionWaypoint::generated_of(TOKEN_BEING_RECHARGED, config.refuel_duration));
    let second_leg = Waypoint::Leg(LegWaypoint::generated(split_point, to));

    plan.waypoints.insert(i + 1, refuel);
    plan.waypoints.insert(i + 2, second_leg);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Position;
    use crate::schema::BotType;
    use crate::waypoint::action::TOKEN_GIVING_RECHARGE;

    fn config() -> SchedulerConfig {
        SchedulerConfig::new(600, 300, 120, 30).unwrap()
    }

    fn bot(flight_time: i64, speed: f64) -> BotSchema {
        BotSchema::new("op-1", BotType::Operator, flight_time, speed, 50.0)
    }

    #[test]
    fn long_leg_is_split_when_it_exceeds_threshold() {
        // threshold = 2000 - 300 - 600 = 1100
        let bot = bot(2000, 1.0);
        let cfg = config();
        let mut plan = FlightPlan::new(
            vec![Waypoint::Leg(LegWaypoint::new(
                Position::new(0.0, 0.0, 0.0),
                Position::new(0.0, 0.0, 2000.0),
            ))],
            "A",
            "B",
        );

        recalculate(&mut plan, &bot, &cfg);

        assert_eq!(plan.waypoints.len(), 3);
        assert!(plan.waypoints[0].is_leg());
        assert!(plan.waypoints[1]
            .as_action()
            .map(|a| a.is_being_recharged())
            .unwrap_or(false));
        assert!(plan.waypoints[2].is_leg());

        let total: i64 = plan
            .waypoints
            .iter()
            .filter_map(|w| w.as_leg())
            .map(|l| l.duration_seconds(bot.speed))
            .sum();
        assert_eq!(total, 2000);
    }

    #[test]
    fn short_leg_is_left_untouched() {
        let bot = bot(2000, 1.0);
        let cfg = config();
        let mut plan = FlightPlan::new(
            vec![Waypoint::Leg(LegWaypoint::new(
                Position::new(0.0, 0.0, 0.0),
                Position::new(0.0, 0.0, 500.0),
            ))],
            "A",
            "B",
        );
        recalculate(&mut plan, &bot, &cfg);
        assert_eq!(plan.waypoints.len(), 1);
    }

    #[test]
    fn giving_recharge_triggers_an_earlier_insertion_not_a_split() {
        // threshold = 1100. leg(1000) -> padding(10) -> buffer(50) -> giving_recharge(100):
        // accum hits 1160 > 1100. The padding waypoint exists so a fix that inserts one
        // position too early (before padding) is distinguishable from inserting directly
        // before the buffer.
        let bot = bot(2000, 1.0);
        let cfg = config();
        let a = Position::new(0.0, 0.0, 0.0);
        let b = Position::new(0.0, 0.0, 1000.0);
        let mut plan = FlightPlan::new(
            vec![
                Waypoint::Leg(LegWaypoint::new(a, b)),
                Waypoint::Action(ActionWaypoint::new(
                    crate::waypoint::action::TOKEN_WAITING,
                    10,
                )),
                Waypoint::Action(ActionWaypoint::new(
                    crate::waypoint::action::TOKEN_REFUEL_ANTICIPATION_BUFFER,
                    50,
                )),
                Waypoint::Action(ActionWaypoint::new(TOKEN_GIVING_RECHARGE, 100)),
                Waypoint::Leg(LegWaypoint::new(b, a)),
            ],
            "A",
            "A",
        );

        recalculate(&mut plan, &bot, &cfg);

        let buffer_index = plan
            .waypoints
            .iter()
            .position(|w| w.as_action().map(|a| a.is_anticipation_buffer()).unwrap_or(false))
            .expect("buffer waypoint survives");
        let giving_recharge_index = plan
            .waypoints
            .iter()
            .position(|w| w.as_action().map(|a| a.is_giving_recharge()).unwrap_or(false))
            .expect("giving_recharge waypoint survives");

        // The inserted recharge must land directly before the buffer, not two
        // positions earlier (i.e. not before the padding waypoint).
        assert!(plan.waypoints[buffer_index - 1]
            .as_action()
            .map(|a| a.is_being_recharged())
            .unwrap_or(false));
        assert_eq!(giving_recharge_index, buffer_index + 1);

        assert!(plan.waypoints[buffer_index - 2]
            .as_action()
            .map(|a| a.is_waiting())
            .unwrap_or(false));
    }
}
