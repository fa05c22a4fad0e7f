//! Flight-plan transforms: the mutating operations applied to a plan
//! between validation and resource allocation.
//!
//! Each transform operates on a [`crate::flight_plan::FlightPlan`] in
//! place; callers that need to retry from scratch use the plan's
//! snapshot/restore pair rather than anything in this module.

pub mod anchor;
pub mod fit;
pub mod positions;
pub mod pre_giving_refuel;
pub mod recalculate;
pub mod stretch;

pub use anchor::{approximate_from_landing, approximate_from_launch, approximate_from_waypoint_eta};
pub use fit::fit_flight_plan_into_tower_allocations;
pub use positions::add_positions_to_action_waypoints;
pub use pre_giving_refuel::add_pre_giving_refuel_waypoint;
pub use recalculate::recalculate;
pub use stretch::stretch_flight_plan;
