//! Top-level scheduler entry point — `determine_schedule`.
//!
//! Validates, inserts refuel waypoints, assigns absolute times, fits the
//! plan onto both towers' slot grids, reserves launch/landing intervals,
//! binds a concrete bot/payload instance (recursing into a transit
//! sub-schedule if the resource isn't already at the start tower), then
//! recurses once more per refuel waypoint to synthesize the refueler
//! sub-schedules that service it. All-or-nothing: any failure after the
//! plan is structurally fit rolls back every allocation made so far.

use super::refuel::create_refuel_flight_plans;
use super::transaction::AllocationHandle;
use super::transit::create_transit_schedule;
use super::Scheduler;
use crate::allocator::Blob;
use crate::error::{ScheduleError, ValidationError};
use crate::flight_plan::FlightPlan;
use crate::schedule::Schedule;
use crate::schema::BotSchema;
use crate::transforms::{
    add_positions_to_action_waypoints, approximate_from_landing, approximate_from_launch,
    approximate_from_waypoint_eta, fit_flight_plan_into_tower_allocations, recalculate,
};
use crate::waypoint::WaypointId;
use chrono::{DateTime, Utc};

/// The single anchor a caller supplies to fix a plan's absolute timing.
#[derive(Debug, Clone)]
pub enum Anchor {
    Launch(DateTime<Utc>),
    Landing(DateTime<Utc>),
    WaypointEta(WaypointId, DateTime<Utc>),
}

impl Scheduler {
    pub fn determine_schedule(&mut self, plan: &mut FlightPlan, anchor: Anchor) -> Result<Schedule, ScheduleError> {
        self.determine_schedule_at_depth(plan, anchor, 0)
    }

    pub(crate) fn determine_schedule_at_depth(
        &mut self,
        plan: &mut FlightPlan,
        anchor: Anchor,
        depth: u32,
    ) -> Result<Schedule, ScheduleError> {
        if depth > self.config.recursion_depth_cap {
            return Err(ScheduleError::RecursionDepthExceeded);
        }

        // Step 1: validate.
        {
            let starting_tower = self
                .fleet
                .tower(&plan.starting_tower_id)
                .ok_or_else(|| ScheduleError::Validation(ValidationError::UnknownTower(plan.starting_tower_id.clone())))?;
            let finishing_tower = self
                .fleet
                .tower(&plan.finishing_tower_id)
                .ok_or_else(|| ScheduleError::Validation(ValidationError::UnknownTower(plan.finishing_tower_id.clone())))?;
            plan.validate(starting_tower, finishing_tower)?;
        }

        let bot_model = plan
            .meta
            .as_ref()
            .and_then(|m| m.bot_model.clone())
            .ok_or(ScheduleError::InvalidAnchor)?;
        let bot = self
            .fleet
            .bot_schema(&bot_model)
            .cloned()
            .ok_or_else(|| ScheduleError::NoResourceAvailable { model: bot_model.clone() })?;

        // Step 2: recalculate (insert refuels).
        recalculate(plan, &bot, &self.config);

        // Step 3: anchor absolute times.
        match &anchor {
            Anchor::Launch(t) => approximate_from_launch(plan, *t, bot.speed),
            Anchor::Landing(t) => approximate_from_landing(plan, *t, bot.speed),
            Anchor::WaypointEta(id, t) => {
                approximate_from_waypoint_eta(plan, id, *t, bot.speed).ok_or(ScheduleError::InvalidAnchor)?;
            }
        }
        // Fit's restarts reset to this anchored-but-unstretched baseline,
        // not all the way back to the unanchored plan from construction.
        plan.snapshot();

        // Step 4: back-fill action positions (re-validates).
        {
            let starting_tower = self.fleet.tower(&plan.starting_tower_id).unwrap();
            let finishing_tower = self.fleet.tower(&plan.finishing_tower_id).unwrap();
            add_positions_to_action_waypoints(plan, starting_tower, finishing_tower)?;
        }

        // Step 5: fit to slots.
        {
            let starting_tower = self.fleet.tower(&plan.starting_tower_id).unwrap();
            let finishing_tower = self.fleet.tower(&plan.finishing_tower_id).unwrap();
            if let Err(e) = fit_flight_plan_into_tower_allocations(plan, starting_tower, finishing_tower, &bot, &self.config) {
                self.log.rollback(&plan.id, &mut self.fleet);
                return Err(e);
            }
        }

        // Steps 6-7: allocate launch/landing, bind bot/payload instances.
        if let Err(e) = self.allocate_and_bind(plan, &bot, depth) {
            self.log.rollback(&plan.id, &mut self.fleet);
            return Err(e);
        }

        // Step 8: refueler sub-schedules for every being_recharged waypoint.
        let mut schedule = Schedule::new(plan.clone());
        for index in plan.refuel_waypoint_indices() {
            let waypoint_id = plan.waypoints[index].id().clone();
            let waypoint_start = match plan.waypoints[index].start_time() {
                Some(t) => t,
                None => {
                    self.log.rollback(&plan.id, &mut self.fleet);
                    return Err(ScheduleError::InvalidAnchor);
                }
            };
            match create_refuel_flight_plans(self, plan, index, waypoint_start, depth + 1) {
                Ok(sub) => schedule.attach(waypoint_id, sub),
                Err(e) => {
                    self.log.rollback(&plan.id, &mut self.fleet);
                    return Err(e);
                }
            }
        }

        self.log.commit(&plan.id);
        Ok(schedule)
    }

    /// Steps 6-7: reserve launch/landing intervals, then bind the plan's
    /// meta to a concrete bot/payload instance, transiting it to the
    /// start tower first if it isn't already there.
    fn allocate_and_bind(&mut self, plan: &mut FlightPlan, bot: &BotSchema, depth: u32) -> Result<(), ScheduleError> {
        let start = plan.start_time().ok_or(ScheduleError::InvalidAnchor)?;
        let end = plan.end_time().ok_or(ScheduleError::InvalidAnchor)?;

        let launch_id = {
            let tower = self.fleet.tower_mut(&plan.starting_tower_id).unwrap();
            tower.allocate_launch_ending_at(start, Blob::new())?
        };
        self.log.record(
            &plan.id,
            AllocationHandle::Launch {
                tower_id: plan.starting_tower_id.clone(),
                allocation_id: launch_id,
            },
        );

        let landing_id = {
            let tower = self.fleet.tower_mut(&plan.finishing_tower_id).unwrap();
            tower.allocate_landing_starting_at(end, Blob::new())?
        };
        self.log.record(
            &plan.id,
            AllocationHandle::Landing {
                tower_id: plan.finishing_tower_id.clone(),
                allocation_id: landing_id,
            },
        );

        let meta = plan.meta.clone().unwrap_or_default();

        if let Some(bot_id) = meta.bot_id.clone() {
            self.bind_specific_bot(plan, &bot_id, start, end, depth)?;
        } else {
            self.bind_bot_by_model(plan, &bot.model, start, end, depth)?;
        }

        if let Some(payload_id) = meta.payload_id.clone() {
            self.bind_specific_payload(plan, &payload_id, start, end, depth)?;
        } else if let Some(payload_model) = meta.payload_model.clone() {
            self.bind_payload_by_model(plan, &payload_model, start, end, depth)?;
        }

        Ok(())
    }

    fn bind_specific_bot(
        &mut self,
        plan: &mut FlightPlan,
        bot_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        depth: u32,
    ) -> Result<(), ScheduleError> {
        if !self.fleet.bot_resources_mut().is_allocation_available(bot_id, start, end) {
            return Err(ScheduleError::NoResourceAvailable { model: bot_id.to_string() });
        }

        let current_tower = self
            .fleet
            .bot_resources()
            .tracker(bot_id)
            .ok_or_else(|| ScheduleError::NoResourceAvailable { model: bot_id.to_string() })?
            .location_at(start)?
            .to_string();

        if current_tower != plan.starting_tower_id {
            let bot = self
                .fleet
                .bot(bot_id)
                .cloned()
                .ok_or_else(|| ScheduleError::NoResourceAvailable { model: bot_id.to_string() })?;
            let sub = create_transit_schedule(self, &current_tower, &plan.starting_tower_id, start, &bot.model, depth)?;
            if let Some(sub_plan) = &sub.flight_plan {
                self.log.merge_into(&sub_plan.id, &plan.id);
            }
        }

        let allocation_id = self.fleet.bot_resources_mut().allocate_resource(
            bot_id,
            start,
            end,
            current_tower,
            plan.finishing_tower_id.clone(),
            plan.id.clone(),
        )?;
        self.log.record(&plan.id, AllocationHandle::Bot { allocation_id });
        Ok(())
    }

    fn bind_bot_by_model(
        &mut self,
        plan: &mut FlightPlan,
        model: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        depth: u32,
    ) -> Result<(), ScheduleError> {
        let mut candidates: Vec<String> = self.fleet.bots_of_model(model).map(|b| b.id.clone()).collect();
        if candidates.is_empty() {
            return Err(ScheduleError::NoResourceAvailable { model: model.to_string() });
        }

        candidates.sort_by_key(|id| {
            let at_start = self
                .fleet
                .bot_resources()
                .tracker(id)
                .and_then(|t| t.location_at(start).ok())
                .map(|loc| loc == plan.starting_tower_id)
                .unwrap_or(false);
            !at_start
        });

        for bot_id in candidates {
            if self.bind_specific_bot(plan, &bot_id, start, end, depth).is_ok() {
                return Ok(());
            }
        }
        Err(ScheduleError::NoResourceAvailable { model: model.to_string() })
    }

    fn bind_specific_payload(
        &mut self,
        plan: &mut FlightPlan,
        payload_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        depth: u32,
    ) -> Result<(), ScheduleError> {
        if !self
            .fleet
            .payload_resources_mut()
            .is_allocation_available(payload_id, start, end)
        {
            return Err(ScheduleError::NoResourceAvailable { model: payload_id.to_string() });
        }

        let current_tower = self
            .fleet
            .payload_resources()
            .tracker(payload_id)
            .ok_or_else(|| ScheduleError::NoResourceAvailable { model: payload_id.to_string() })?
            .location_at(start)?
            .to_string();

        if current_tower != plan.starting_tower_id {
            let payload = self
                .fleet
                .payload(payload_id)
                .cloned()
                .ok_or_else(|| ScheduleError::NoResourceAvailable { model: payload_id.to_string() })?;
            let carrier_model = self
                .fleet
                .payload_schema(&payload.model)
                .and_then(|schema| schema.compatible_bots.iter().next().cloned())
                .ok_or_else(|| ScheduleError::NoResourceAvailable { model: payload.model.clone() })?;
            let sub = create_transit_schedule(self, &current_tower, &plan.starting_tower_id, start, &carrier_model, depth)?;
            if let Some(sub_plan) = &sub.flight_plan {
                self.log.merge_into(&sub_plan.id, &plan.id);
            }
        }

        let allocation_id = self.fleet.payload_resources_mut().allocate_resource(
            payload_id,
            start,
            end,
            current_tower,
            plan.finishing_tower_id.clone(),
            plan.id.clone(),
        )?;
        self.log.record(&plan.id, AllocationHandle::Payload { allocation_id });
        Ok(())
    }

    fn bind_payload_by_model(
        &mut self,
        plan: &mut FlightPlan,
        model: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        depth: u32,
    ) -> Result<(), ScheduleError> {
        let mut candidates: Vec<String> = self.fleet.payloads_of_model(model).map(|p| p.id.clone()).collect();
        if candidates.is_empty() {
            return Err(ScheduleError::NoResourceAvailable { model: model.to_string() });
        }

        candidates.sort_by_key(|id| {
            let at_start = self
                .fleet
                .payload_resources()
                .tracker(id)
                .and_then(|t| t.location_at(start).ok())
                .map(|loc| loc == plan.starting_tower_id)
                .unwrap_or(false);
            !at_start
        });

        for payload_id in candidates {
            if self.bind_specific_payload(plan, &payload_id, start, end, depth).is_ok() {
                return Ok(());
            }
        }
        Err(ScheduleError::NoResourceAvailable { model: model.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::Scheduler;
    use crate::test_util;
    use chrono::TimeZone;

    #[test]
    fn single_long_leg_produces_four_refuels_with_sub_schedules() {
        let mut scheduler = Scheduler::new(test_util::scenario_fleet(), test_util::scenario_config());
        let mut plan = test_util::single_long_leg_plan();
        let launch = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        let schedule = scheduler
            .determine_schedule(&mut plan, Anchor::Launch(launch))
            .expect("scenario 1 should schedule successfully");

        let scheduled = schedule.flight_plan.as_ref().expect("root plan present");
        assert_eq!(scheduled.refuel_waypoint_count(), 4);
        assert_eq!(scheduled.waypoints.iter().filter(|w| w.is_leg()).count(), 5);

        for index in scheduled.refuel_waypoint_indices() {
            let waypoint_id = scheduled.waypoints[index].id().clone();
            let subs = schedule
                .related_sub_flight_plans
                .get(&waypoint_id)
                .expect("each refuel waypoint has a refueler sub-schedule");
            assert_eq!(subs.len(), 1);
            assert!(subs[0].flight_plan.is_some());
        }
    }

    #[test]
    fn landing_anchor_ends_aligned_to_the_destination_slot_grid() {
        let mut scheduler = Scheduler::new(test_util::scenario_fleet(), test_util::scenario_config());
        let mut plan = test_util::single_long_leg_plan();
        let landing = Utc.with_ymd_and_hms(2024, 1, 1, 6, 0, 0).unwrap();

        let schedule = scheduler
            .determine_schedule(&mut plan, Anchor::Landing(landing))
            .expect("scenario 1 should schedule successfully under a landing anchor");

        let scheduled = schedule.flight_plan.as_ref().unwrap();
        let end = scheduled.end_time().unwrap();
        // Destination landing interval is 60 s wide; the fit stage must
        // leave the plan's end exactly on that grid.
        assert_eq!(end.timestamp() % 60, 0);
    }

    #[test]
    fn unknown_starting_tower_is_rejected_before_any_allocation() {
        let mut scheduler = Scheduler::new(test_util::scenario_fleet(), test_util::scenario_config());
        let mut plan = test_util::single_long_leg_plan();
        plan.starting_tower_id = "does-not-exist".to_string();

        let result = scheduler.determine_schedule(&mut plan, Anchor::Launch(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()));
        assert!(matches!(
            result,
            Err(ScheduleError::Validation(ValidationError::UnknownTower(_)))
        ));
    }
}
