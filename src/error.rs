//! Error types surfaced by the planner.
//!
//! Each failure domain gets its own enum with a manual [`Display`] impl,
//! the same shape the router module uses for `FlightPlanError` and
//! `ItineraryError` rather than a blanket `anyhow::Error`.

use std::fmt::{Display, Formatter, Result as FmtResult};

/// A requested reservation could not be made on a resource allocator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllocationError {
    /// The requested interval overlaps an existing allocation.
    Overlap,
    /// The resource id is not known to this allocator.
    UnknownResource(String),
    /// The allocation id is not known to this allocator.
    UnknownAllocation(String),
    /// All parallel queues (launchers/landers/bays) are exhausted.
    NoCapacity,
    /// The requested interval index is out of range for the configured day.
    InvalidInterval,
}

impl Display for AllocationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            AllocationError::Overlap => write!(f, "allocation overlaps an existing reservation"),
            AllocationError::UnknownResource(id) => write!(f, "unknown resource: {id}"),
            AllocationError::UnknownAllocation(id) => write!(f, "unknown allocation: {id}"),
            AllocationError::NoCapacity => write!(f, "no parallel queue had capacity"),
            AllocationError::InvalidInterval => write!(f, "interval index out of range"),
        }
    }
}

impl std::error::Error for AllocationError {}

/// A resource's location could not be determined unambiguously.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerError {
    /// No tracker is registered for this resource id.
    UnknownResource(String),
    /// The resource is mid-allocation at the requested instant; its
    /// location cannot be resolved to a single tower.
    Ambiguous,
}

impl Display for TrackerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            TrackerError::UnknownResource(id) => write!(f, "unknown tracked resource: {id}"),
            TrackerError::Ambiguous => {
                write!(f, "resource location is ambiguous at the requested time")
            }
        }
    }
}

impl std::error::Error for TrackerError {}

/// A flight plan violates one of its structural invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The final waypoint of the plan is not a leg.
    LastWaypointNotLeg,
    /// The first leg does not depart from the starting tower's position.
    StartPositionMismatch,
    /// The last leg does not arrive at the finishing tower's position.
    EndPositionMismatch,
    /// Two consecutive legs do not join (leg A's `to` != leg B's `from`).
    DisjointLegs { at_waypoint: String },
    /// The plan has no waypoints.
    Empty,
    /// The starting or finishing tower id referenced by the plan is unknown.
    UnknownTower(String),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ValidationError::LastWaypointNotLeg => {
                write!(f, "flight plan must end with a leg waypoint")
            }
            ValidationError::StartPositionMismatch => write!(
                f,
                "first leg does not depart from the starting tower's position"
            ),
            ValidationError::EndPositionMismatch => write!(
                f,
                "last leg does not arrive at the finishing tower's position"
            ),
            ValidationError::DisjointLegs { at_waypoint } => {
                write!(f, "consecutive legs do not join at waypoint {at_waypoint}")
            }
            ValidationError::Empty => write!(f, "flight plan has no waypoints"),
            ValidationError::UnknownTower(id) => write!(f, "unknown tower: {id}"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Top-level failure of a scheduling request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    /// The input flight plan failed structural validation.
    Validation(ValidationError),
    /// A resource (tower slot, bot, payload) allocation failed with no
    /// remaining candidate to try.
    Allocation(AllocationError),
    /// A resource tracker could not resolve a location.
    Tracker(TrackerError),
    /// No tower slot could be found to fit the plan's launch or landing.
    NoSlotAvailable,
    /// No refueler candidate (tower x bot schema) could service a refuel
    /// waypoint.
    NoRefuelerAvailable,
    /// No bot or payload instance of the requested model could be bound.
    NoResourceAvailable { model: String },
    /// The bounded refueler/transit recursion depth was exceeded.
    RecursionDepthExceeded,
    /// The caller supplied zero or more than one anchor.
    InvalidAnchor,
}

impl Display for ScheduleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ScheduleError::Validation(e) => write!(f, "validation failed: {e}"),
            ScheduleError::Allocation(e) => write!(f, "allocation failed: {e}"),
            ScheduleError::Tracker(e) => write!(f, "tracker failed: {e}"),
            ScheduleError::NoSlotAvailable => {
                write!(f, "no tower slot available to fit the flight plan")
            }
            ScheduleError::NoRefuelerAvailable => {
                write!(f, "no refueler candidate could service a refuel waypoint")
            }
            ScheduleError::NoResourceAvailable { model } => {
                write!(f, "no available bot or payload instance of model {model}")
            }
            ScheduleError::RecursionDepthExceeded => {
                write!(f, "refueler/transit recursion depth exceeded")
            }
            ScheduleError::InvalidAnchor => {
                write!(f, "exactly one anchor must be supplied")
            }
        }
    }
}

impl std::error::Error for ScheduleError {}

impl From<ValidationError> for ScheduleError {
    fn from(e: ValidationError) -> Self {
        ScheduleError::Validation(e)
    }
}

impl From<AllocationError> for ScheduleError {
    fn from(e: AllocationError) -> Self {
        ScheduleError::Allocation(e)
    }
}

impl From<TrackerError> for ScheduleError {
    fn from(e: TrackerError) -> Self {
        ScheduleError::Tracker(e)
    }
}
