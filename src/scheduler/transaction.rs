//! Rollback bookkeeping for a scheduling call.
//!
//! Each allocation a [`super::Scheduler`] makes while servicing one
//! flight plan is appended to an [`AllocationLog`] keyed by that plan's
//! id. A failure anywhere beyond step 5 of `determine_schedule` replays
//! the log in reverse and releases everything, the same all-or-nothing
//! guarantee the source gives by catching exceptions around the whole
//! allocation block.

use super::Fleet;
use crate::flight_plan::FlightPlanId;
use crate::sched_debug;
use std::collections::HashMap;

/// One allocation made on behalf of a flight plan, recorded so it can be
/// undone without the caller needing to remember which allocator it came
/// from.
#[derive(Debug, Clone)]
pub enum AllocationHandle {
    Launch { tower_id: String, allocation_id: String },
    Landing { tower_id: String, allocation_id: String },
    BotBay { tower_id: String, allocation_id: String },
    PayloadBay { tower_id: String, allocation_id: String },
    Bot { allocation_id: String },
    Payload { allocation_id: String },
}

#[derive(Debug, Default)]
pub struct AllocationLog {
    by_plan: HashMap<FlightPlanId, Vec<AllocationHandle>>,
}

impl AllocationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, plan_id: &str, handle: AllocationHandle) {
        self.by_plan.entry(plan_id.to_string()).or_default().push(handle);
    }

    pub fn merge_into(&mut self, from_plan_id: &str, into_plan_id: &str) {
        if let Some(mut handles) = self.by_plan.remove(from_plan_id) {
            self.by_plan
                .entry(into_plan_id.to_string())
                .or_default()
                .append(&mut handles);
        }
    }

    /// Releases every allocation recorded for `plan_id`, most-recent
    /// first, then forgets the log entry.
    pub fn rollback(&mut self, plan_id: &str, fleet: &mut Fleet) {
        let Some(handles) = self.by_plan.remove(plan_id) else {
            return;
        };
        for handle in handles.into_iter().rev() {
            match handle {
                AllocationHandle::Launch { tower_id, allocation_id } => {
                    if let Some(tower) = fleet.tower_mut(&tower_id) {
                        tower.deallocate_launch(&allocation_id);
                    }
                }
                AllocationHandle::Landing { tower_id, allocation_id } => {
                    if let Some(tower) = fleet.tower_mut(&tower_id) {
                        tower.deallocate_landing(&allocation_id);
                    }
                }
                AllocationHandle::BotBay { tower_id, allocation_id } => {
                    if let Some(tower) = fleet.tower_mut(&tower_id) {
                        tower.deallocate_bot_bay(&allocation_id);
                    }
                }
                AllocationHandle::PayloadBay { tower_id, allocation_id } => {
                    if let Some(tower) = fleet.tower_mut(&tower_id) {
                        tower.deallocate_payload_bay(&allocation_id);
                    }
                }
                AllocationHandle::Bot { allocation_id } => {
                    fleet.bot_resources_mut().deallocate(&allocation_id);
                }
                AllocationHandle::Payload { allocation_id } => {
                    fleet.payload_resources_mut().deallocate(&allocation_id);
                }
            }
        }
        sched_debug!("(rollback) released all allocations for plan {}", plan_id);
    }

    /// Marks `plan_id`'s allocations as final; nothing more to do since
    /// they already live in the underlying allocators, but this reads
    /// clearly at call sites that want to express "this plan succeeded".
    pub fn commit(&mut self, plan_id: &str) {
        sched_debug!("(commit) plan {} allocations are now permanent", plan_id);
        let _ = plan_id;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Position;
    use crate::tower::Tower;

    #[test]
    fn rollback_releases_a_launch_allocation() {
        use crate::allocator::Blob;
        use chrono::NaiveDate;

        let mut fleet = Fleet::new();
        fleet.add_tower(Tower::new("A", Position::new(0.0, 0.0, 0.0), 60, 60, 1, 1, 1, 1));
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let allocation_id = fleet
            .tower_mut("A")
            .unwrap()
            .allocate_launch(date, 0, Blob::new())
            .unwrap();

        let mut log = AllocationLog::new();
        log.record(
            "plan1",
            AllocationHandle::Launch {
                tower_id: "A".to_string(),
                allocation_id: allocation_id.clone(),
            },
        );
        log.rollback("plan1", &mut fleet);

        assert!(fleet
            .tower_mut("A")
            .unwrap()
            .allocate_launch(date, 0, Blob::new())
            .is_ok());
    }
}
