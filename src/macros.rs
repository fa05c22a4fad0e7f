//! Log macros for the planner/scheduler core.

/// Writes a debug! message to the app::scheduler logger
#[macro_export]
macro_rules! sched_debug {
    ($($arg:tt)+) => {
        log::debug!(target: "app::scheduler", $($arg)+)
    };
}

/// Writes an info! message to the app::scheduler logger
#[macro_export]
macro_rules! sched_info {
    ($($arg:tt)+) => {
        log::info!(target: "app::scheduler", $($arg)+)
    };
}

/// Writes a warn! message to the app::scheduler logger
#[macro_export]
macro_rules! sched_warn {
    ($($arg:tt)+) => {
        log::warn!(target: "app::scheduler", $($arg)+)
    };
}

/// Writes an error! message to the app::scheduler logger
#[macro_export]
macro_rules! sched_error {
    ($($arg:tt)+) => {
        log::error!(target: "app::scheduler", $($arg)+)
    };
}
