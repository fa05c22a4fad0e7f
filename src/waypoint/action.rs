//! [`ActionWaypoint`]: a timed, stationary step of a flight plan (a
//! recharge, a payload operation, a wait, ...).
//!
//! The label is free-form, but a small set of tokens are recognized and
//! drive planner behavior. Recognized predicates are token-membership
//! tests on the label split by whitespace, so a single action may carry
//! multiple tokens at once, e.g. `"payload being_recharged"`.

use super::{new_waypoint_id, WaypointId};
use crate::geometry::Position;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const TOKEN_BEING_RECHARGED: &str = "being_recharged";
pub const TOKEN_GIVING_RECHARGE: &str = "giving_recharge";
pub const TOKEN_PAYLOAD: &str = "payload";
pub const TOKEN_WAITING: &str = "waiting";
pub const TOKEN_REFUEL_ANTICIPATION_BUFFER: &str = "refuel_anticipation_buffer";
pub const TOKEN_DUMMY: &str = "dummy";

/// Pre-computed recognized-token membership for an action label, built
/// fresh whenever the label is set. Replaces the duck-typed
/// `isinstance`/substring checks of the source implementation with an
/// explicit small flag set.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionFlags {
    pub is_being_recharged: bool,
    pub is_giving_recharge: bool,
    pub is_payload: bool,
    pub is_waiting: bool,
    pub is_dummy: bool,
    pub is_anticipation_buffer: bool,
}

impl ActionFlags {
    fn from_label(label: &str) -> Self {
        let tokens: std::collections::HashSet<&str> = label.split_whitespace().collect();
        Self {
            is_being_recharged: tokens.contains(TOKEN_BEING_RECHARGED),
            is_giving_recharge: tokens.contains(TOKEN_GIVING_RECHARGE),
            is_payload: tokens.contains(TOKEN_PAYLOAD),
            is_waiting: tokens.contains(TOKEN_WAITING),
            is_dummy: tokens.contains(TOKEN_DUMMY),
            is_anticipation_buffer: tokens.contains(TOKEN_REFUEL_ANTICIPATION_BUFFER),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionWaypoint {
    pub id: WaypointId,
    pub action: String,
    pub duration_seconds: i64,
    pub position: Option<Position>,
    pub generated: bool,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    flags: ActionFlags,
}

impl ActionWaypoint {
    pub fn new(action: impl Into<String>, duration_seconds: i64) -> Self {
        let action = action.into();
        debug_assert!(
            duration_seconds >= 0,
            "action duration must be non-negative"
        );
        let flags = ActionFlags::from_label(&action);
        Self {
            id: new_waypoint_id(),
            action,
            duration_seconds,
            position: None,
            generated: false,
            start_time: None,
            end_time: None,
            flags,
        }
    }

    pub fn with_id(mut self, id: impl Into<WaypointId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    pub fn generated_of(action: impl Into<String>, duration_seconds: i64) -> Self {
        let mut wp = Self::new(action, duration_seconds);
        wp.generated = true;
        wp
    }

    pub fn set_action(&mut self, action: impl Into<String>) {
        let action = action.into();
        self.flags = ActionFlags::from_label(&action);
        self.action = action;
    }

    pub fn flags(&self) -> ActionFlags {
        self.flags
    }

    pub fn is_being_recharged(&self) -> bool {
        self.flags.is_being_recharged
    }

    pub fn is_giving_recharge(&self) -> bool {
        self.flags.is_giving_recharge
    }

    pub fn is_payload(&self) -> bool {
        self.flags.is_payload
    }

    pub fn is_waiting(&self) -> bool {
        self.flags.is_waiting
    }

    pub fn is_dummy(&self) -> bool {
        self.flags.is_dummy
    }

    pub fn is_anticipation_buffer(&self) -> bool {
        self.flags.is_anticipation_buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_single_token() {
        let wp = ActionWaypoint::new(TOKEN_BEING_RECHARGED, 100);
        assert!(wp.is_being_recharged());
        assert!(!wp.is_giving_recharge());
    }

    #[test]
    fn recognizes_multiple_tokens() {
        let wp = ActionWaypoint::new("payload being_recharged", 100);
        assert!(wp.is_payload());
        assert!(wp.is_being_recharged());
        assert!(!wp.is_waiting());
    }

    #[test]
    fn set_action_recomputes_flags() {
        let mut wp = ActionWaypoint::new(TOKEN_WAITING, 0);
        assert!(wp.is_waiting());
        wp.set_action(TOKEN_DUMMY);
        assert!(!wp.is_waiting());
        assert!(wp.is_dummy());
    }
}
