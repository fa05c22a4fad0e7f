//! [`Tower`]: a launch/landing site with its own slot grid and bay
//! capacity. Owns four allocators so launch/landing congestion and
//! bay occupancy are tracked independently per tower.

use crate::allocator::{AllocationId, Blob, IntervalAllocator, ResourceAllocator};
use crate::error::AllocationError;
use crate::geometry::Position;
use crate::sched_debug;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

#[derive(Debug)]
pub struct Tower {
    id: String,
    position: Position,
    launch_time: i64,
    landing_time: i64,
    parallel_launchers: u32,
    parallel_landers: u32,
    payload_capacity: u32,
    bot_capacity: u32,
    launch_allocator: IntervalAllocator,
    landing_allocator: IntervalAllocator,
    payload_bay: ResourceAllocator,
    bot_bay: ResourceAllocator,
}

impl PartialEq for Tower {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Tower {}

impl Tower {
    pub fn new(
        id: impl Into<String>,
        position: Position,
        launch_time: i64,
        landing_time: i64,
        parallel_launchers: u32,
        parallel_landers: u32,
        payload_capacity: u32,
        bot_capacity: u32,
    ) -> Self {
        let id = id.into();

        let mut launch_allocator = IntervalAllocator::new(Duration::seconds(launch_time));
        let mut landing_allocator = IntervalAllocator::new(Duration::seconds(landing_time));
        for i in 0..parallel_launchers {
            launch_allocator.add_resource(i.to_string());
        }
        for i in 0..parallel_landers {
            landing_allocator.add_resource(i.to_string());
        }

        let mut payload_bay = ResourceAllocator::new();
        let mut bot_bay = ResourceAllocator::new();
        for i in 0..payload_capacity {
            payload_bay.add_resource(i.to_string());
        }
        for i in 0..bot_capacity {
            bot_bay.add_resource(i.to_string());
        }

        Self {
            id,
            position,
            launch_time,
            landing_time,
            parallel_launchers,
            parallel_landers,
            payload_capacity,
            bot_capacity,
            launch_allocator,
            landing_allocator,
            payload_bay,
            bot_bay,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn launch_time(&self) -> i64 {
        self.launch_time
    }

    pub fn landing_time(&self) -> i64 {
        self.landing_time
    }

    pub fn payload_capacity(&self) -> u32 {
        self.payload_capacity
    }

    pub fn bot_capacity(&self) -> u32 {
        self.bot_capacity
    }

    /// Tries each launcher in turn on `date`/`interval`, first success
    /// wins. `AllocationError::NoCapacity` if all are occupied.
    pub fn allocate_launch(
        &mut self,
        date: NaiveDate,
        interval: u32,
        blob: Blob,
    ) -> Result<AllocationId, AllocationError> {
        for launcher in 0..self.parallel_launchers {
            match self
                .launch_allocator
                .allocate(&launcher.to_string(), date, interval, blob.clone())
            {
                Ok(id) => return Ok(id),
                Err(AllocationError::Overlap) => continue,
                Err(other) => return Err(other),
            }
        }
        sched_debug!(
            "(allocate_launch) tower {} has no free launcher for {} interval {}",
            self.id,
            date,
            interval
        );
        Err(AllocationError::NoCapacity)
    }

    /// Symmetric to [`Tower::allocate_launch`].
    pub fn allocate_landing(
        &mut self,
        date: NaiveDate,
        interval: u32,
        blob: Blob,
    ) -> Result<AllocationId, AllocationError> {
        for lander in 0..self.parallel_landers {
            match self
                .landing_allocator
                .allocate(&lander.to_string(), date, interval, blob.clone())
            {
                Ok(id) => return Ok(id),
                Err(AllocationError::Overlap) => continue,
                Err(other) => return Err(other),
            }
        }
        sched_debug!(
            "(allocate_landing) tower {} has no free lander for {} interval {}",
            self.id,
            date,
            interval
        );
        Err(AllocationError::NoCapacity)
    }

    pub fn deallocate_launch(&mut self, allocation_id: &str) {
        self.launch_allocator.delete(allocation_id);
    }

    pub fn deallocate_landing(&mut self, allocation_id: &str) {
        self.landing_allocator.delete(allocation_id);
    }

    pub fn allocate_payload_bay(
        &mut self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<AllocationId, AllocationError> {
        for bay in 0..self.payload_capacity {
            match self.payload_bay.allocate(&bay.to_string(), from, to, Blob::new()) {
                Ok(id) => return Ok(id),
                Err(AllocationError::Overlap) => continue,
                Err(other) => return Err(other),
            }
        }
        Err(AllocationError::NoCapacity)
    }

    pub fn deallocate_payload_bay(&mut self, allocation_id: &str) {
        self.payload_bay.delete(allocation_id);
    }

    pub fn allocate_bot_bay(
        &mut self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<AllocationId, AllocationError> {
        for bay in 0..self.bot_capacity {
            match self.bot_bay.allocate(&bay.to_string(), from, to, Blob::new()) {
                Ok(id) => return Ok(id),
                Err(AllocationError::Overlap) => continue,
                Err(other) => return Err(other),
            }
        }
        Err(AllocationError::NoCapacity)
    }

    pub fn deallocate_bot_bay(&mut self, allocation_id: &str) {
        self.bot_bay.delete(allocation_id);
    }

    /// Nearest available landing interval whose window *start* aligns
    /// with `t`, across all landers, nearest first.
    pub fn nearest_intervals_to_window_start(&self, t: DateTime<Utc>) -> Vec<u32> {
        let mut merged: Vec<u32> = Vec::new();
        for lander in 0..self.parallel_landers {
            for interval in self
                .landing_allocator
                .nearest_intervals_to_window_start(&lander.to_string(), t)
            {
                if !merged.contains(&interval) {
                    merged.push(interval);
                }
            }
        }
        merged
    }

    /// Nearest available launch interval whose window *end* aligns with
    /// `t`, across all launchers, nearest first.
    pub fn nearest_intervals_to_window_end(&self, t: DateTime<Utc>) -> Vec<u32> {
        let mut merged: Vec<u32> = Vec::new();
        for launcher in 0..self.parallel_launchers {
            for interval in self
                .launch_allocator
                .nearest_intervals_to_window_end(&launcher.to_string(), t)
            {
                if !merged.contains(&interval) {
                    merged.push(interval);
                }
            }
        }
        merged
    }

    /// Nearest available launch interval, across all launchers, whose
    /// window end is at or before `deadline`.
    pub fn nearest_launch_ending_at_or_before(
        &self,
        deadline: DateTime<Utc>,
    ) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        (0..self.parallel_launchers)
            .filter_map(|launcher| {
                self.launch_allocator
                    .nearest_interval_ending_at_or_before(&launcher.to_string(), deadline)
            })
            .map(|(_, start, end)| (start, end))
            .max_by_key(|(_, end)| *end)
    }

    /// Nearest available landing interval, across all landers, whose
    /// window start is at or after `earliest`.
    pub fn nearest_landing_starting_at_or_after(
        &self,
        earliest: DateTime<Utc>,
    ) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        (0..self.parallel_landers)
            .filter_map(|lander| {
                self.landing_allocator
                    .nearest_interval_starting_at_or_after(&lander.to_string(), earliest)
            })
            .map(|(_, start, end)| (start, end))
            .min_by_key(|(start, _)| *start)
    }

    /// Allocates the launch interval whose window *ends* exactly at `t`.
    /// Callers are expected to have already snapped `t` onto the grid via
    /// [`Tower::nearest_launch_ending_at_or_before`].
    pub fn allocate_launch_ending_at(&mut self, t: DateTime<Utc>, blob: Blob) -> Result<AllocationId, AllocationError> {
        let (date, interval) = self.interval_for_window_end(t, self.launch_time)?;
        self.allocate_launch(date, interval, blob)
    }

    /// Allocates the landing interval whose window *starts* exactly at
    /// `t`. Callers are expected to have already snapped `t` via
    /// [`Tower::nearest_landing_starting_at_or_after`].
    pub fn allocate_landing_starting_at(&mut self, t: DateTime<Utc>, blob: Blob) -> Result<AllocationId, AllocationError> {
        let (date, interval) = self.interval_for_window_start(t, self.landing_time)?;
        self.allocate_landing(date, interval, blob)
    }

    fn interval_for_window_end(&self, t: DateTime<Utc>, duration_seconds: i64) -> Result<(NaiveDate, u32), AllocationError> {
        let date = t.date_naive();
        let midnight = Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap());
        let seconds_since_midnight = (t - midnight).num_seconds();
        let interval = seconds_since_midnight / duration_seconds - 1;
        if interval < 0 {
            return Err(AllocationError::InvalidInterval);
        }
        Ok((date, interval as u32))
    }

    fn interval_for_window_start(&self, t: DateTime<Utc>, duration_seconds: i64) -> Result<(NaiveDate, u32), AllocationError> {
        let date = t.date_naive();
        let midnight = Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap());
        let seconds_since_midnight = (t - midnight).num_seconds();
        if seconds_since_midnight < 0 {
            return Err(AllocationError::InvalidInterval);
        }
        Ok((date, (seconds_since_midnight / duration_seconds) as u32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tower() -> Tower {
        Tower::new("tower-a", Position::new(0.0, 0.0, 0.0), 60, 60, 1, 1, 4, 4)
    }

    #[test]
    fn equality_is_by_id() {
        let a = tower();
        let b = Tower::new("tower-a", Position::new(99.0, 0.0, 0.0), 10, 10, 2, 2, 1, 1);
        let c = Tower::new("tower-b", Position::new(0.0, 0.0, 0.0), 60, 60, 1, 1, 4, 4);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn second_launcher_is_used_when_first_is_taken() {
        let mut t = Tower::new("tower-a", Position::new(0.0, 0.0, 0.0), 3600, 3600, 2, 2, 4, 4);
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        t.allocate_launch(date, 5, Blob::new()).unwrap();
        assert!(t.allocate_launch(date, 5, Blob::new()).is_ok());
    }

    #[test]
    fn launch_fails_once_all_launchers_are_occupied() {
        let mut t = Tower::new("tower-a", Position::new(0.0, 0.0, 0.0), 3600, 3600, 1, 1, 4, 4);
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        t.allocate_launch(date, 5, Blob::new()).unwrap();
        assert_eq!(
            t.allocate_launch(date, 5, Blob::new()),
            Err(AllocationError::NoCapacity)
        );
    }

    #[test]
    fn allocate_launch_ending_at_reverses_the_window_end_to_an_interval() {
        use chrono::TimeZone;
        let mut t = Tower::new("tower-a", Position::new(0.0, 0.0, 0.0), 60, 60, 1, 1, 4, 4);
        // Window [00:01:00, 00:02:00) ends at 00:02:00, i.e. interval 1.
        let end = Utc.with_ymd_and_hms(2024, 1, 1, 0, 2, 0).unwrap();
        let id = t.allocate_launch_ending_at(end, Blob::new()).unwrap();
        assert!(t.allocate_launch_ending_at(end, Blob::new()).is_err());
        t.deallocate_launch(&id);
        assert!(t.allocate_launch_ending_at(end, Blob::new()).is_ok());
    }

    #[test]
    fn allocate_launch_ending_at_rejects_midnight() {
        use chrono::TimeZone;
        let mut t = tower();
        // A window can't end exactly at midnight: that would be interval -1.
        let midnight = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            t.allocate_launch_ending_at(midnight, Blob::new()),
            Err(AllocationError::InvalidInterval)
        );
    }

    #[test]
    fn allocate_landing_starting_at_reverses_the_window_start_to_an_interval() {
        use chrono::TimeZone;
        let mut t = Tower::new("tower-a", Position::new(0.0, 0.0, 0.0), 60, 60, 1, 1, 4, 4);
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 5, 0).unwrap();
        let id = t.allocate_landing_starting_at(start, Blob::new()).unwrap();
        assert!(t.allocate_landing_starting_at(start, Blob::new()).is_err());
        t.deallocate_landing(&id);
        assert!(t.allocate_landing_starting_at(start, Blob::new()).is_ok());
    }

    #[test]
    fn payload_bay_tracks_capacity_independently_of_launch() {
        use chrono::TimeZone;
        let mut t = tower();
        let from = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2024, 1, 1, 11, 0, 0).unwrap();
        for _ in 0..4 {
            t.allocate_payload_bay(from, to).unwrap();
        }
        assert_eq!(t.allocate_payload_bay(from, to), Err(AllocationError::NoCapacity));
    }
}
