//! [`ResourceManager`]: ties a [`ResourceAllocator`] to a per-resource
//! [`Tracker`] map, keeping both sides consistent via a shared
//! tracker id stashed in the allocation's blob.

use crate::allocator::{Allocation, AllocationId, Blob, ResourceAllocator, ResourceId};
use crate::error::AllocationError;
use crate::sched_debug;
use crate::tracker::{Tracker, TrackerRecord};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

const BLOB_KEY_TRACKER_ID: &str = "tracker_id";
const BLOB_KEY_FROM_TOWER: &str = "from_tower";
const BLOB_KEY_TO_TOWER: &str = "to_tower";
const BLOB_KEY_RELATED_FLIGHT_PLAN: &str = "related_flight_plan";

#[derive(Debug, Default)]
pub struct ResourceManager {
    allocator: ResourceAllocator,
    trackers: HashMap<ResourceId, Tracker>,
}

impl ResourceManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_resource(&mut self, resource_id: impl Into<ResourceId>, initial_tower: impl Into<String>) {
        let resource_id = resource_id.into();
        self.allocator.add_resource(resource_id.clone());
        self.trackers.insert(resource_id, Tracker::new(initial_tower));
    }

    pub fn tracker(&self, resource_id: &str) -> Option<&Tracker> {
        self.trackers.get(resource_id)
    }

    pub fn is_allocation_available(&mut self, resource_id: &str, from: DateTime<Utc>, to: DateTime<Utc>) -> bool {
        self.allocator.is_available(resource_id, from, to)
    }

    /// Reserves `[from, to)` on `resource_id` and appends a
    /// [`TrackerRecord`] for the move from `from_tower` to `to_tower`,
    /// both keyed by a freshly generated tracker id stored in the
    /// allocation's blob so `deallocate` can keep both sides in sync.
    pub fn allocate_resource(
        &mut self,
        resource_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        from_tower: impl Into<String>,
        to_tower: impl Into<String>,
        related_flight_plan: impl Into<String>,
    ) -> Result<AllocationId, AllocationError> {
        if !self.trackers.contains_key(resource_id) {
            return Err(AllocationError::UnknownResource(resource_id.to_string()));
        }

        let from_tower = from_tower.into();
        let to_tower = to_tower.into();
        let related_flight_plan = related_flight_plan.into();
        let tracker_id = uuid::Uuid::new_v4().to_string();

        let mut blob = Blob::new();
        blob.insert(BLOB_KEY_TRACKER_ID.to_string(), tracker_id);
        blob.insert(BLOB_KEY_FROM_TOWER.to_string(), from_tower.clone());
        blob.insert(BLOB_KEY_TO_TOWER.to_string(), to_tower.clone());
        blob.insert(
            BLOB_KEY_RELATED_FLIGHT_PLAN.to_string(),
            related_flight_plan.clone(),
        );

        let allocation_id = self.allocator.allocate(resource_id, from, to, blob)?;

        sched_debug!(
            "(allocate_resource) {} reserved {} from {} to {} for plan {}",
            resource_id,
            allocation_id,
            from,
            to,
            related_flight_plan
        );

        let tracker = self
            .trackers
            .get_mut(resource_id)
            .expect("checked contains_key above");
        tracker.add_record(TrackerRecord {
            from,
            to,
            related_flight_plan_id: related_flight_plan,
            from_tower,
            to_tower,
        });

        Ok(allocation_id)
    }

    /// Releases an allocation and removes the tracker record for the
    /// same flight plan, so a rolled-back allocation leaves no trace in
    /// either the allocator or the tracker.
    pub fn deallocate(&mut self, allocation_id: &str) {
        let Some(allocation) = self.allocator.get_by_id(allocation_id).cloned() else {
            return;
        };

        if let Some(plan_id) = allocation.blob.get(BLOB_KEY_RELATED_FLIGHT_PLAN) {
            if let Some(tracker) = self.trackers.get_mut(&allocation.resource_id) {
                tracker.remove_record_for_plan(plan_id);
            }
        }

        self.allocator.delete(allocation_id);
    }

    pub fn get_by_id(&self, allocation_id: &str) -> Option<&Allocation> {
        self.allocator.get_by_id(allocation_id)
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
    fn allocate_updates_both_allocator_and_tracker() {
        let mut mgr = ResourceManager::new();
        mgr.add_resource("bot1", "A");
        let id = mgr
            .allocate_resource("bot1", t(1), t(2), "A", "B", "plan1")
            .unwrap();
        assert!(mgr.get_by_id(&id).is_some());
        assert_eq!(mgr.tracker("bot1").unwrap().location_at(t(3)), Ok("B"));
    }

    #[test]
    fn deallocate_removes_both() {
        let mut mgr = ResourceManager::new();
        mgr.add_resource("bot1", "A");
        let id = mgr
            .allocate_resource("bot1", t(1), t(2), "A", "B", "plan1")
            .unwrap();
        mgr.deallocate(&id);
        assert!(mgr.get_by_id(&id).is_none());
        assert_eq!(mgr.tracker("bot1").unwrap().location_at(t(3)), Ok("A"));
    }
}
