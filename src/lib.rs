//! Cooperative flight planning and refuel scheduling for a fleet of
//! autonomous aerial bots.
//!
//! The core is single-threaded and synchronous: a [`scheduler::Scheduler`]
//! owns all allocator state and [`scheduler::Scheduler::determine_schedule`]
//! either commits a whole schedule tree or leaves every allocator exactly
//! as it found it.

mod macros;

pub mod allocator;
mod config;
pub mod error;
pub mod flight_plan;
pub mod geometry;
pub mod resource_manager;
pub mod schedule;
pub mod scheduler;
pub mod schema;
pub mod tower;
pub mod tracker;
pub mod transforms;
pub mod waypoint;

#[cfg(any(test, feature = "test_util"))]
pub mod test_util;

pub use crate::config::Config;

use std::sync::Once;
static INIT_LOGGER: Once = Once::new();

/// Initializes the logger with the provided configuration. Safe to call
/// more than once; only the first call takes effect.
pub fn init_logger(config: &Config) {
    INIT_LOGGER.call_once(|| {
        let log_cfg: &str = config.log_config.as_str();
        if let Err(e) = log4rs::init_file(log_cfg, Default::default()) {
            panic!(
                "(logger) could not parse log config {} found in config {:?}: {}.",
                log_cfg, config, e
            );
        }
    });
}
