//! [`Tracker`]: per-resource location history used to reconstruct where
//! a bot or payload instance is at a given instant.
//!
//! The source keeps tracker history as a list of anonymous
//! `(from, to, kwargs)` tuples. Replaced here with a typed
//! [`TrackerRecord`] and an explicit sorted-order invariant instead of
//! append-then-hope-it's-sorted.

use crate::error::TrackerError;
use crate::sched_debug;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq)]
pub struct TrackerRecord {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub related_flight_plan_id: String,
    pub from_tower: String,
    pub to_tower: String,
}

/// Per-resource location/history tracker. `initial_tower` is where the
/// resource starts out, before any recorded flight.
#[derive(Debug, Clone, PartialEq)]
pub struct Tracker {
    initial_tower: String,
    history: Vec<TrackerRecord>,
}

impl Tracker {
    pub fn new(initial_tower: impl Into<String>) -> Self {
        Self {
            initial_tower: initial_tower.into(),
            history: Vec::new(),
        }
    }

    pub fn initial_tower(&self) -> &str {
        &self.initial_tower
    }

    pub fn history(&self) -> &[TrackerRecord] {
        &self.history
    }

    /// Inserts a record, keeping history sorted by `from`.
    pub fn add_record(&mut self, record: TrackerRecord) {
        let pos = self
            .history
            .iter()
            .position(|r| r.from > record.from)
            .unwrap_or(self.history.len());
        self.history.insert(pos, record);
    }

    /// Removes the record for `related_flight_plan_id`, restoring the
    /// tracker to the state it had before that allocation. Used when a
    /// scheduling call rolls back.
    pub fn remove_record_for_plan(&mut self, flight_plan_id: &str) {
        self.history.retain(|r| r.related_flight_plan_id != flight_plan_id);
    }

    /// Resolves which tower the resource is at, at instant `t`.
    ///
    /// - If `t` falls strictly within a recorded flight's `[from, to)`
    ///   window, the resource is airborne and its location is
    ///   [`TrackerError::Ambiguous`].
    /// - Otherwise, returns the `to_tower` of the most recent record
    ///   that ended at or before `t`, or the initial tower if none has.
    pub fn location_at(&self, t: DateTime<Utc>) -> Result<&str, TrackerError> {
        if let Some(in_flight) = self.history.iter().find(|r| t >= r.from && t < r.to) {
            sched_debug!(
                "(location_at) resource mid-flight ({} -> {}) at {}",
                in_flight.from_tower,
                in_flight.to_tower,
                t
            );
            return Err(TrackerError::Ambiguous);
        }

        let most_recent = self
            .history
            .iter()
            .filter(|r| r.to <= t)
            .max_by_key(|r| r.to);

        Ok(most_recent
            .map(|r| r.to_tower.as_str())
            .unwrap_or(&self.initial_tower))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, h, 0, 0).unwrap()
    }

    #[test]
    fn location_before_any_flight_is_the_initial_tower() {
        let tracker = Tracker::new("A");
        assert_eq!(tracker.location_at(t(0)), Ok("A"));
    }

    #[test]
    fn location_after_a_flight_is_its_destination() {
        let mut tracker = Tracker::new("A");
        tracker.add_record(TrackerRecord {
            from: t(1),
            to: t(2),
            related_flight_plan_id: "fp1".into(),
            from_tower: "A".into(),
            to_tower: "B".into(),
        });
        assert_eq!(tracker.location_at(t(0)), Ok("A"));
        assert_eq!(tracker.location_at(t(2)), Ok("B"));
        assert_eq!(tracker.location_at(t(3)), Ok("B"));
    }

    #[test]
    fn location_mid_flight_is_ambiguous() {
        let mut tracker = Tracker::new("A");
        tracker.add_record(TrackerRecord {
            from: t(1),
            to: t(2),
            related_flight_plan_id: "fp1".into(),
            from_tower: "A".into(),
            to_tower: "B".into(),
        });
        assert_eq!(tracker.location_at(t(1)), Err(TrackerError::Ambiguous));
    }

    #[test]
    fn removing_a_plans_record_restores_prior_state() {
        let mut tracker = Tracker::new("A");
        tracker.add_record(TrackerRecord {
            from: t(1),
            to: t(2),
            related_flight_plan_id: "fp1".into(),
            from_tower: "A".into(),
            to_tower: "B".into(),
        });
        tracker.remove_record_for_plan("fp1");
        assert_eq!(tracker.location_at(t(3)), Ok("A"));
    }
}
