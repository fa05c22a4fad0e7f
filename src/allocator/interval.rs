//! [`IntervalAllocator`]: fixed-width slot discretization built atop
//! [`ResourceAllocator`].
//!
//! A day (midnight-anchored, UTC date) is partitioned into
//! `floor(86400 / interval_duration)` fixed slots numbered `0..N`. The
//! inherited free-form `is_available` is intentionally not exposed here
//! — it would bypass slot discipline by allowing arbitrary, non-aligned
//! reservations.

use super::resource::{AllocationId, Blob, ResourceAllocator, ResourceId};
use crate::error::AllocationError;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use std::collections::{HashMap, HashSet};

#[derive(Debug)]
pub struct IntervalAllocator {
    interval_duration: Duration,
    daily_intervals: i64,
    inner: ResourceAllocator,
    /// date -> set of interval indices allocated on that date, tracked
    /// separately from `inner` so `get_available_intervals` doesn't need
    /// to scan every allocation on the resource.
    allocated_by_date: HashMap<(ResourceId, NaiveDate), HashSet<u32>>,
    /// allocation id -> (resource id, date, interval), so delete can undo
    /// the bookkeeping above.
    allocation_index: HashMap<AllocationId, (ResourceId, NaiveDate, u32)>,
}

impl IntervalAllocator {
    pub fn new(interval_duration: Duration) -> Self {
        assert!(interval_duration > Duration::zero(), "interval_duration must be positive");
        let daily_intervals = Duration::days(1).num_seconds() / interval_duration.num_seconds();
        assert!(daily_intervals >= 1, "interval_duration must divide a day into at least one slot");
        Self {
            interval_duration,
            daily_intervals,
            inner: ResourceAllocator::new(),
            allocated_by_date: HashMap::new(),
            allocation_index: HashMap::new(),
        }
    }

    pub fn add_resource(&mut self, resource_id: impl Into<ResourceId>) {
        self.inner.add_resource(resource_id);
    }

    pub fn daily_intervals(&self) -> i64 {
        self.daily_intervals
    }

    /// The half-open instant pair `[start, end)` of `interval` on `date`.
    pub fn window_for(&self, date: NaiveDate, interval: u32) -> (DateTime<Utc>, DateTime<Utc>) {
        assert!((interval as i64) < self.daily_intervals, "interval out of range");
        let midnight = Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap());
        let start = midnight + self.interval_duration * interval as i32;
        let end = start + self.interval_duration;
        (start, end)
    }

    pub fn allocate(
        &mut self,
        resource_id: &str,
        date: NaiveDate,
        interval: u32,
        blob: Blob,
    ) -> Result<AllocationId, AllocationError> {
        if (interval as i64) >= self.daily_intervals {
            return Err(AllocationError::InvalidInterval);
        }

        let (from, to) = self.window_for(date, interval);
        let id = self.inner.allocate(resource_id, from, to, blob)?;
        self.allocated_by_date
            .entry((resource_id.to_string(), date))
            .or_default()
            .insert(interval);
        self.allocation_index
            .insert(id.clone(), (resource_id.to_string(), date, interval));
        Ok(id)
    }

    pub fn delete(&mut self, allocation_id: &str) {
        if let Some((resource_id, date, interval)) = self.allocation_index.remove(allocation_id) {
            if let Some(set) = self.allocated_by_date.get_mut(&(resource_id, date)) {
                set.remove(&interval);
            }
        }
        self.inner.delete(allocation_id);
    }

    /// Unused interval indices for `date`, ascending.
    pub fn get_available_intervals(&self, resource_id: &str, date: NaiveDate) -> Vec<u32> {
        let used = self
            .allocated_by_date
            .get(&(resource_id.to_string(), date));
        (0..self.daily_intervals as u32)
            .filter(|i| used.map(|u| !u.contains(i)).unwrap_or(true))
            .collect()
    }

    /// Available intervals on the UTC date of `reference_time`, nearest
    /// first, measuring distance from each interval's *window start* to
    /// `reference_time`.
    pub fn nearest_intervals_to_window_start(
        &self,
        resource_id: &str,
        reference_time: DateTime<Utc>,
    ) -> Vec<u32> {
        self.nearest_intervals(resource_id, reference_time, |start, _end| start)
    }

    /// Same as above but measuring distance from each interval's *window
    /// end*.
    pub fn nearest_intervals_to_window_end(
        &self,
        resource_id: &str,
        reference_time: DateTime<Utc>,
    ) -> Vec<u32> {
        self.nearest_intervals(resource_id, reference_time, |_start, end| end)
    }

    fn nearest_intervals(
        &self,
        resource_id: &str,
        reference_time: DateTime<Utc>,
        pick: impl Fn(DateTime<Utc>, DateTime<Utc>) -> DateTime<Utc>,
    ) -> Vec<u32> {
        let date = reference_time.date_naive();
        let available = self.get_available_intervals(resource_id, date);
        let mut with_delta: Vec<(u32, Duration)> = available
            .into_iter()
            .map(|interval| {
                let (start, end) = self.window_for(date, interval);
                let anchor = pick(start, end);
                let delta = if anchor > reference_time {
                    anchor - reference_time
                } else {
                    reference_time - anchor
                };
                (interval, delta)
            })
            .collect();
        with_delta.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)));
        with_delta.into_iter().map(|(i, _)| i).collect()
    }

    /// The nearest available interval whose window *end* is at or before
    /// `deadline`, preferring the one closest to it.
    pub fn nearest_interval_ending_at_or_before(
        &self,
        resource_id: &str,
        deadline: DateTime<Utc>,
    ) -> Option<(u32, DateTime<Utc>, DateTime<Utc>)> {
        let date = deadline.date_naive();
        self.get_available_intervals(resource_id, date)
            .into_iter()
            .filter_map(|interval| {
                let (start, end) = self.window_for(date, interval);
                (end <= deadline).then_some((interval, start, end))
            })
            .max_by_key(|(_, _, end)| *end)
    }

    /// The nearest available interval whose window *start* is at or
    /// after `earliest`, preferring the one closest to it.
    pub fn nearest_interval_starting_at_or_after(
        &self,
        resource_id: &str,
        earliest: DateTime<Utc>,
    ) -> Option<(u32, DateTime<Utc>, DateTime<Utc>)> {
        let date = earliest.date_naive();
        self.get_available_intervals(resource_id, date)
            .into_iter()
            .filter_map(|interval| {
                let (start, end) = self.window_for(date, interval);
                (start >= earliest).then_some((interval, start, end))
            })
            .min_by_key(|(_, start, _)| *start)
    }
}
