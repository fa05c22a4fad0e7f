//! Top-level scheduler: orchestrates validation, refuel insertion, time
//! anchoring, slot fitting, resource binding and recursive refueler/
//! transit sub-schedule synthesis.
//!
//! State lives in an in-process [`Fleet`] registry rather than behind
//! remote service calls, with an explicit [`transaction::AllocationLog`]
//! giving all-or-nothing rollback across a whole scheduling call.

pub mod determine_schedule;
pub mod orchestration;
pub mod refuel;
pub mod transaction;
pub mod transit;

use crate::error::ScheduleError;
use crate::resource_manager::ResourceManager;
use crate::schema::{Bot, BotSchema, Payload, PayloadSchema};
use crate::tower::Tower;
use std::collections::HashMap;
use transaction::AllocationLog;

/// The four caller-supplied knobs the planner's refuel/recursion logic
/// runs on. Never sourced from the environment: see the note in
/// `SPEC_FULL.md` about what "no environment variables" actually scopes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchedulerConfig {
    /// Wall-clock seconds a `being_recharged` action occupies.
    pub refuel_duration: i64,
    /// Safety margin of flight time that must remain when a refuel
    /// occurs, expressed in the same units as a bot's `flight_time`.
    pub remaining_flight_time_at_refuel: i64,
    /// Seconds a refueler waits at the rendezvous before the handoff, to
    /// absorb scheduling jitter.
    pub refuel_anticipation_buffer: i64,
    /// Upper bound on refueler/transit recursion depth before a request
    /// fails with [`ScheduleError::RecursionDepthExceeded`].
    pub recursion_depth_cap: u32,
}

impl SchedulerConfig {
    pub fn new(
        refuel_duration: i64,
        remaining_flight_time_at_refuel: i64,
        refuel_anticipation_buffer: i64,
        recursion_depth_cap: u32,
    ) -> Result<Self, ScheduleError> {
        if refuel_duration < 0 || remaining_flight_time_at_refuel < 0 || refuel_anticipation_buffer < 0 {
            return Err(ScheduleError::InvalidAnchor);
        }
        if remaining_flight_time_at_refuel <= refuel_duration {
            return Err(ScheduleError::InvalidAnchor);
        }
        Ok(Self {
            refuel_duration,
            remaining_flight_time_at_refuel,
            refuel_anticipation_buffer,
            recursion_depth_cap,
        })
    }
}

/// The read-mostly registry the scheduler consults: bot/payload schemas,
/// towers, and the concrete instances known to exist, each with its own
/// [`ResourceManager`] for location tracking and allocation.
#[derive(Debug, Default)]
pub struct Fleet {
    bot_schemas: HashMap<String, BotSchema>,
    payload_schemas: HashMap<String, PayloadSchema>,
    towers: HashMap<String, Tower>,
    bots: HashMap<String, Bot>,
    payloads: HashMap<String, Payload>,
    bot_resources: ResourceManager,
    payload_resources: ResourceManager,
}

impl Fleet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_bot_schema(&mut self, schema: BotSchema) {
        self.bot_schemas.insert(schema.model.clone(), schema);
    }

    pub fn add_payload_schema(&mut self, schema: PayloadSchema) {
        self.payload_schemas.insert(schema.model.clone(), schema);
    }

    pub fn add_tower(&mut self, tower: Tower) {
        self.towers.insert(tower.id().to_string(), tower);
    }

    pub fn add_bot(&mut self, bot: Bot, initial_tower: impl Into<String>) {
        self.bot_resources.add_resource(bot.id.clone(), initial_tower);
        self.bots.insert(bot.id.clone(), bot);
    }

    pub fn add_payload(&mut self, payload: Payload, initial_tower: impl Into<String>) {
        self.payload_resources
            .add_resource(payload.id.clone(), initial_tower);
        self.payloads.insert(payload.id.clone(), payload);
    }

    pub fn bot_schema(&self, model: &str) -> Option<&BotSchema> {
        self.bot_schemas.get(model)
    }

    pub fn payload_schema(&self, model: &str) -> Option<&PayloadSchema> {
        self.payload_schemas.get(model)
    }

    pub fn tower(&self, id: &str) -> Option<&Tower> {
        self.towers.get(id)
    }

    pub fn tower_mut(&mut self, id: &str) -> Option<&mut Tower> {
        self.towers.get_mut(id)
    }

    pub fn towers(&self) -> impl Iterator<Item = &Tower> {
        self.towers.values()
    }

    pub fn bot(&self, id: &str) -> Option<&Bot> {
        self.bots.get(id)
    }

    pub fn payload(&self, id: &str) -> Option<&Payload> {
        self.payloads.get(id)
    }

    pub fn bots_of_model<'a>(&'a self, model: &'a str) -> impl Iterator<Item = &'a Bot> {
        self.bots.values().filter(move |b| b.model == model)
    }

    pub fn payloads_of_model<'a>(&'a self, model: &'a str) -> impl Iterator<Item = &'a Payload> {
        self.payloads.values().filter(move |p| p.model == model)
    }

    /// Refueler-capable bot schemas known to the fleet, used when a
    /// refuel candidate has no specific refueler model pinned.
    pub fn refueler_schemas(&self) -> impl Iterator<Item = &BotSchema> {
        self.bot_schemas.values().filter(|s| s.is_refueler())
    }

    pub fn bot_resources(&self) -> &ResourceManager {
        &self.bot_resources
    }

    pub fn bot_resources_mut(&mut self) -> &mut ResourceManager {
        &mut self.bot_resources
    }

    pub fn payload_resources(&self) -> &ResourceManager {
        &self.payload_resources
    }

    pub fn payload_resources_mut(&mut self) -> &mut ResourceManager {
        &mut self.payload_resources
    }
}

/// Owns all mutable allocator state for the duration of however many
/// scheduling requests it's asked to serve. Not `Sync`; the concurrency
/// model is a single-threaded owner per §5.
#[derive(Debug)]
pub struct Scheduler {
    pub fleet: Fleet,
    pub config: SchedulerConfig,
    log: AllocationLog,
}

impl Scheduler {
    pub fn new(fleet: Fleet, config: SchedulerConfig) -> Self {
        Self {
            fleet,
            config,
            log: AllocationLog::new(),
        }
    }
}
