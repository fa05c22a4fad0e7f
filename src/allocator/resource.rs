//! [`ResourceAllocator`]: per-resource interval reservations with
//! overlap detection. One allocator tracks many resources, each with its
//! own chronologically-ordered allocation list.
//!
//! Grounded on the source `ResourceAllocator`: half-open interval
//! overlap check scanning recent-first, `is_allocation_available` as a
//! speculative allocate/delete probe, idempotent delete.

use crate::error::AllocationError;
use crate::{sched_debug, sched_warn};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};

pub type ResourceId = String;
pub type AllocationId = String;

/// Free-form key/value payload carried alongside an allocation. Used by
/// [`crate::resource_manager::ResourceManager`] to stash `from_tower`,
/// `to_tower` and `related_flight_plan` without every allocator caller
/// needing its own blob type.
pub type Blob = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    pub id: AllocationId,
    pub resource_id: ResourceId,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub blob: Blob,
}

impl Allocation {
    /// Half-open interval overlap: `[f, t)` overlaps `[f', t')` iff
    /// `f < t'` and `f' < t`.
    fn overlaps(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> bool {
        self.from < to && from < self.to
    }
}

#[derive(Debug, Default)]
pub struct ResourceAllocator {
    resources: std::collections::HashSet<ResourceId>,
    allocations: HashMap<ResourceId, Vec<Allocation>>,
}

impl ResourceAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_resource(&mut self, resource_id: impl Into<ResourceId>) {
        let resource_id = resource_id.into();
        self.resources.insert(resource_id.clone());
        self.allocations.entry(resource_id).or_default();
    }

    pub fn has_resource(&self, resource_id: &str) -> bool {
        self.resources.contains(resource_id)
    }

    /// Attempts to reserve `[from, to)` on `resource_id`. Fails with
    /// [`AllocationError::Overlap`] if it overlaps any existing
    /// allocation on that resource. Allocations are scanned most-recent
    /// first, matching the source's `reversed(self.allocator[...])`.
    pub fn allocate(
        &mut self,
        resource_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        blob: Blob,
    ) -> Result<AllocationId, AllocationError> {
        if !self.resources.contains(resource_id) {
            return Err(AllocationError::UnknownResource(resource_id.to_string()));
        }

        let existing = self.allocations.entry(resource_id.to_string()).or_default();
        for allocation in existing.iter().rev() {
            if allocation.overlaps(from, to) {
                sched_warn!(
                    "(allocate) resource {} already allocated from {} to {}, requested {} to {}",
                    resource_id,
                    allocation.from,
                    allocation.to,
                    from,
                    to
                );
                return Err(AllocationError::Overlap);
            }
        }

        let id = uuid::Uuid::new_v4().to_string();
        existing.push(Allocation {
            id: id.clone(),
            resource_id: resource_id.to_string(),
            from,
            to,
            blob,
        });
        sched_debug!(
            "(allocate) reserved {} on {} from {} to {}",
            id,
            resource_id,
            from,
            to
        );
        Ok(id)
    }

    /// Idempotent: deleting an unknown allocation id is a no-op.
    pub fn delete(&mut self, allocation_id: &str) {
        for allocations in self.allocations.values_mut() {
            if let Some(pos) = allocations.iter().position(|a| a.id == allocation_id) {
                allocations.remove(pos);
                sched_debug!("(delete) removed allocation {}", allocation_id);
                return;
            }
        }
    }

    pub fn get_by_time(&self, resource_id: &str, t: DateTime<Utc>) -> Option<&Allocation> {
        self.allocations
            .get(resource_id)?
            .iter()
            .find(|a| t >= a.from && t < a.to)
    }

    pub fn get_by_id(&self, allocation_id: &str) -> Option<&Allocation> {
        self.allocations
            .values()
            .flatten()
            .find(|a| a.id == allocation_id)
    }

    pub fn allocations_for(&self, resource_id: &str) -> &[Allocation] {
        self.allocations
            .get(resource_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Probes availability by speculatively allocating and immediately
    /// deleting.
    pub fn is_available(&mut self, resource_id: &str, from: DateTime<Utc>, to: DateTime<Utc>) -> bool {
        match self.allocate(resource_id, from, to, Blob::new()) {
            Ok(id) => {
                self.delete(&id);
                true
            }
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, h, m, 0).unwrap()
    }

    #[test]
    fn allocate_and_retrieve() {
        let mut alloc = ResourceAllocator::new();
        alloc.add_resource("r1");
        let id = alloc.allocate("r1", t(10, 0), t(11, 0), Blob::new()).unwrap();
        assert!(alloc.get_by_id(&id).is_some());
        assert!(alloc.get_by_time("r1", t(10, 30)).is_some());
        assert!(alloc.get_by_time("r1", t(11, 0)).is_none());
    }

    #[test]
    fn overlap_is_rejected() {
        let mut alloc = ResourceAllocator::new();
        alloc.add_resource("r1");
        alloc.allocate("r1", t(10, 0), t(11, 0), Blob::new()).unwrap();
        assert_eq!(
            alloc.allocate("r1", t(10, 30), t(11, 30), Blob::new()),
            Err(AllocationError::Overlap)
        );
        assert_eq!(
            alloc.allocate("r1", t(9, 30), t(10, 30), Blob::new()),
            Err(AllocationError::Overlap)
        );
    }

    #[test]
    fn back_to_back_intervals_do_not_overlap() {
        let mut alloc = ResourceAllocator::new();
        alloc.add_resource("r1");
        alloc.allocate("r1", t(10, 0), t(11, 0), Blob::new()).unwrap();
        assert!(alloc.allocate("r1", t(11, 0), t(12, 0), Blob::new()).is_ok());
        assert!(alloc.allocate("r1", t(9, 0), t(10, 0), Blob::new()).is_ok());
    }

    #[test]
    fn delete_is_idempotent() {
        let mut alloc = ResourceAllocator::new();
        alloc.add_resource("r1");
        let id = alloc.allocate("r1", t(10, 0), t(11, 0), Blob::new()).unwrap();
        alloc.delete(&id);
        alloc.delete(&id);
        assert!(alloc.get_by_id(&id).is_none());
    }

    #[test]
    fn is_available_does_not_leave_a_trace() {
        let mut alloc = ResourceAllocator::new();
        alloc.add_resource("r1");
        assert!(alloc.is_available("r1", t(10, 0), t(11, 0)));
        assert!(alloc.allocations_for("r1").is_empty());
        alloc.allocate("r1", t(10, 0), t(11, 0), Blob::new()).unwrap();
        assert!(!alloc.is_available("r1", t(10, 30), t(10, 45)));
    }

    #[test]
    fn unknown_resource_errors() {
        let mut alloc = ResourceAllocator::new();
        assert_eq!(
            alloc.allocate("missing", t(10, 0), t(11, 0), Blob::new()),
            Err(AllocationError::UnknownResource("missing".to_string()))
        );
    }
}
