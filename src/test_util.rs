//! Test utilities. Provides fixture builders for canonical towers,
//! bot/payload schemas and flight plans, reused across unit and
//! integration tests.

use crate::flight_plan::FlightPlan;
use crate::geometry::Position;
use crate::schema::{BotSchema, BotType, PayloadSchema};
use crate::scheduler::{Fleet, SchedulerConfig};
use crate::tower::Tower;
use crate::waypoint::{LegWaypoint, Waypoint};

/// Operator schema used by most scenarios: endurance 500 s, speed 1
/// unit/s, matching the single-long-leg scenario.
pub fn operator_schema() -> BotSchema {
    BotSchema::new("mk1-operator", BotType::Operator, 500, 1.0, 100.0)
}

/// Refueler schema, fast enough to reach any rendezvous well within its
/// own endurance.
pub fn refueler_schema() -> BotSchema {
    BotSchema::new("mk1-refueler", BotType::Refueler, 3600, 5.0, 120.0)
}

pub fn crate_payload_schema() -> PayloadSchema {
    PayloadSchema::new("standard-crate", [operator_schema().model])
}

/// Tower at the origin with a generous slot grid (one launcher, one
/// lander, 60 s intervals) so fit-to-slots rarely has to stretch far.
pub fn tower_origin() -> Tower {
    Tower::new("tower-origin", Position::new(0.0, 0.0, 0.0), 60, 60, 2, 2, 4, 4)
}

/// Tower 1000 units along the z axis from [`tower_origin`].
pub fn tower_far() -> Tower {
    Tower::new("tower-far", Position::new(0.0, 0.0, 1000.0), 60, 60, 2, 2, 4, 4)
}

/// A third tower roughly midway, used as the nearest refueler base for
/// plans between [`tower_origin`] and [`tower_far`].
pub fn tower_midway() -> Tower {
    Tower::new("tower-midway", Position::new(0.0, 0.0, 500.0), 60, 60, 1, 1, 2, 2)
}

/// The scheduling knobs from the single-long-leg scenario: refuel 100 s,
/// remaining 200 s at refuel, anticipation buffer 100 s.
pub fn scenario_config() -> SchedulerConfig {
    SchedulerConfig::new(100, 200, 100, 30).expect("fixture config must be valid")
}

/// A fleet with origin/far/midway towers, one operator and one refueler
/// schema, and a refueler bot instance seated at each tower so refuel
/// candidates never need a transit sub-schedule of their own.
pub fn scenario_fleet() -> Fleet {
    let mut fleet = Fleet::new();
    fleet.add_bot_schema(operator_schema());
    fleet.add_bot_schema(refueler_schema());
    fleet.add_payload_schema(crate_payload_schema());
    fleet.add_tower(tower_origin());
    fleet.add_tower(tower_far());
    fleet.add_tower(tower_midway());
    fleet.add_bot(crate::schema::Bot::new("refueler-origin", refueler_schema().model), "tower-origin");
    fleet.add_bot(crate::schema::Bot::new("refueler-midway", refueler_schema().model), "tower-midway");
    fleet.add_bot(crate::schema::Bot::new("refueler-far", refueler_schema().model), "tower-far");
    fleet.add_bot(crate::schema::Bot::new("operator-1", operator_schema().model), "tower-origin");
    fleet
}

/// Single leg [0,0,0]->[0,0,1000], the literal input of the
/// single-long-leg endurance scenario.
pub fn single_long_leg_plan() -> FlightPlan {
    let leg = LegWaypoint::new(
        tower_origin().position(),
        tower_far().position(),
    );
    FlightPlan::new(vec![Waypoint::Leg(leg)], "tower-origin", "tower-far")
        .with_meta(crate::flight_plan::FlightPlanMeta::for_bot_model(operator_schema().model))
}
