//! Waypoint model: [`LegWaypoint`] and [`ActionWaypoint`], unified behind
//! the [`Waypoint`] tagged union.
//!
//! The source implementation models this with inheritance and duck-typed
//! `isinstance` checks. There is no inheritance in Rust, so `Waypoint` is
//! a tagged union and the `isinstance` checks become the `is_leg`/
//! `is_action` pair plus the [`ActionFlags`] predicates on construction.

pub mod action;
pub mod leg;

pub use action::{ActionFlags, ActionWaypoint};
pub use leg::LegWaypoint;

use crate::geometry::Position;
use chrono::{DateTime, Utc};

/// Stable identity shared by all waypoint kinds.
pub type WaypointId = String;

pub fn new_waypoint_id() -> WaypointId {
    uuid::Uuid::new_v4().to_string()
}

/// A single step of a flight plan: either a straight-line [`LegWaypoint`]
/// or a timed [`ActionWaypoint`].
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Waypoint {
    Leg(LegWaypoint),
    Action(ActionWaypoint),
}

impl Waypoint {
    pub fn id(&self) -> &WaypointId {
        match self {
            Waypoint::Leg(l) => &l.id,
            Waypoint::Action(a) => &a.id,
        }
    }

    pub fn generated(&self) -> bool {
        match self {
            Waypoint::Leg(l) => l.generated,
            Waypoint::Action(a) => a.generated,
        }
    }

    pub fn set_generated(&mut self, generated: bool) {
        match self {
            Waypoint::Leg(l) => l.generated = generated,
            Waypoint::Action(a) => a.generated = generated,
        }
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        match self {
            Waypoint::Leg(l) => l.start_time,
            Waypoint::Action(a) => a.start_time,
        }
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        match self {
            Waypoint::Leg(l) => l.end_time,
            Waypoint::Action(a) => a.end_time,
        }
    }

    /// Invariant: either both times are set ("approximated") or both unset.
    pub fn is_approximated(&self) -> bool {
        self.start_time().is_some() && self.end_time().is_some()
    }

    pub fn set_times(&mut self, start: DateTime<Utc>, end: DateTime<Utc>) {
        match self {
            Waypoint::Leg(l) => {
                l.start_time = Some(start);
                l.end_time = Some(end);
            }
            Waypoint::Action(a) => {
                a.start_time = Some(start);
                a.end_time = Some(end);
            }
        }
    }

    pub fn clear_times(&mut self) {
        match self {
            Waypoint::Leg(l) => {
                l.start_time = None;
                l.end_time = None;
            }
            Waypoint::Action(a) => {
                a.start_time = None;
                a.end_time = None;
            }
        }
    }

    pub fn is_leg(&self) -> bool {
        matches!(self, Waypoint::Leg(_))
    }

    pub fn is_action(&self) -> bool {
        matches!(self, Waypoint::Action(_))
    }

    pub fn as_leg(&self) -> Option<&LegWaypoint> {
        match self {
            Waypoint::Leg(l) => Some(l),
            Waypoint::Action(_) => None,
        }
    }

    pub fn as_leg_mut(&mut self) -> Option<&mut LegWaypoint> {
        match self {
            Waypoint::Leg(l) => Some(l),
            Waypoint::Action(_) => None,
        }
    }

    pub fn as_action(&self) -> Option<&ActionWaypoint> {
        match self {
            Waypoint::Leg(_) => None,
            Waypoint::Action(a) => Some(a),
        }
    }

    pub fn as_action_mut(&mut self) -> Option<&mut ActionWaypoint> {
        match self {
            Waypoint::Leg(_) => None,
            Waypoint::Action(a) => Some(a),
        }
    }

    /// Duration of this waypoint in whole seconds. A leg's duration is
    /// implicit (`distance(from, to) / speed`); an action's duration is
    /// stored directly.
    pub fn duration_seconds(&self, speed: f64) -> i64 {
        match self {
            Waypoint::Leg(l) => l.duration_seconds(speed),
            Waypoint::Action(a) => a.duration_seconds,
        }
    }

    /// The position this waypoint occupies for position back-fill
    /// purposes: a leg's destination, or an action's derived position.
    pub fn position(&self) -> Option<Position> {
        match self {
            Waypoint::Leg(l) => Some(l.to),
            Waypoint::Action(a) => a.position,
        }
    }
}
