//! Task plumbing: core-pinned spawning and the task watchdog.

pub mod task_pin;
pub mod watchdog;
