//! Scheduler configuration and fire-time math.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::delivery::SinkKind;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("scheduler misconfiguration: {0}")]
    Misconfiguration(String),

    #[error("scheduler store error: {0}")]
    Store(String),

    #[error("scheduled submission failed: {0}")]
    Submit(String),
}

/// A daily wall-clock fire time (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FireTime {
    pub hour: u32,
    pub minute: u32,
}

impl FireTime {
    pub fn validate(&self) -> Result<(), SchedulerError> {
        if self.hour > 23 || self.minute > 59 {
            return Err(SchedulerError::Misconfiguration(format!(
                "invalid fire time {:02}:{:02}",
                self.hour, self.minute
            )));
        }
        Ok(())
    }
}

/// How the scheduler picks an idea when it fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum IdeaSelection {
    /// A uniformly random stored idea.
    #[default]
    Random,
    /// Always the same stored idea.
    Pinned { idea_id: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SchedulerConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub fire_times: Vec<FireTime>,
    #[serde(default)]
    pub idea_selection: IdeaSelection,
    /// Sinks used for scheduled tasks.
    #[serde(default = "default_targets")]
    pub targets: Vec<SinkKind>,
}

fn default_targets() -> Vec<SinkKind> {
    vec![SinkKind::Telegram, SinkKind::Tiktok]
}

impl SchedulerConfig {
    pub fn validate(&self) -> Result<(), SchedulerError> {
        for fire_time in &self.fire_times {
            fire_time.validate()?;
        }
        if self.enabled && self.fire_times.is_empty() {
            return Err(SchedulerError::Misconfiguration(
                "an enabled schedule needs at least one fire time".to_string(),
            ));
        }
        Ok(())
    }
}

/// The earliest fire time strictly after `now`, rolling to the next day
/// when all of today's times have passed. None when no times are set.
pub fn compute_next_run(now: DateTime<Utc>, fire_times: &[FireTime]) -> Option<DateTime<Utc>> {
    let today = now.date_naive();
    let mut best: Option<DateTime<Utc>> = None;
    for fire_time in fire_times {
        let naive = today.and_hms_opt(fire_time.hour, fire_time.minute, 0)?;
        let mut candidate = naive.and_utc();
        if candidate <= now {
            candidate += Duration::days(1);
        }
        best = Some(match best {
            None => candidate,
            Some(current) => current.min(candidate),
        });
    }
    best
}
