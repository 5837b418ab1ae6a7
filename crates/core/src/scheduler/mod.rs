//! Daily scheduling of content generation.

pub mod config;
pub mod runner;
pub mod store;

pub use config::{compute_next_run, FireTime, IdeaSelection, SchedulerConfig, SchedulerError};
pub use runner::{Scheduler, SchedulerStatus};
pub use store::{SchedulerRecord, SchedulerStore, SqliteSchedulerStore};
