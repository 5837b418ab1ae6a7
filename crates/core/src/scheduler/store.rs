//! Scheduler state persistence.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Mutex;

use super::config::{SchedulerConfig, SchedulerError};

/// Full scheduler state: configuration plus run accounting. Persisted
/// as one JSON row so restarts keep the schedule.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchedulerRecord {
    pub config: SchedulerConfig,
    pub last_run: Option<DateTime<Utc>>,
    pub next_run: Option<DateTime<Utc>>,
    pub total_runs: u64,
    /// The scheduled instant that already fired. Guards against firing
    /// twice for the same matched time.
    pub fired_for: Option<DateTime<Utc>>,
    pub last_task_id: Option<String>,
}

pub trait SchedulerStore: Send + Sync {
    fn load(&self) -> Result<Option<SchedulerRecord>, SchedulerError>;
    fn save(&self, record: &SchedulerRecord) -> Result<(), SchedulerError>;
}

const STATE_KEY: &str = "scheduler";

pub struct SqliteSchedulerStore {
    conn: Mutex<Connection>,
}

impl SqliteSchedulerStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, SchedulerError> {
        let conn = Connection::open(path).map_err(|e| SchedulerError::Store(e.to_string()))?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self, SchedulerError> {
        let conn =
            Connection::open_in_memory().map_err(|e| SchedulerError::Store(e.to_string()))?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    fn initialize_schema(&self) -> Result<(), SchedulerError> {
        let conn = self.lock_conn()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS scheduler_state (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )
        .map_err(|e| SchedulerError::Store(e.to_string()))?;
        Ok(())
    }

    fn lock_conn(&self) -> Result<std::sync::MutexGuard<'_, Connection>, SchedulerError> {
        self.conn
            .lock()
            .map_err(|e| SchedulerError::Store(format!("lock poisoned: {}", e)))
    }
}

impl SchedulerStore for SqliteSchedulerStore {
    fn load(&self) -> Result<Option<SchedulerRecord>, SchedulerError> {
        let conn = self.lock_conn()?;
        let mut stmt = conn
            .prepare("SELECT value FROM scheduler_state WHERE key = ?1")
            .map_err(|e| SchedulerError::Store(e.to_string()))?;

        let mut rows = stmt
            .query_map(params![STATE_KEY], |row| row.get::<_, String>(0))
            .map_err(|e| SchedulerError::Store(e.to_string()))?;

        match rows.next() {
            Some(Ok(json)) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|e| SchedulerError::Store(e.to_string())),
            Some(Err(e)) => Err(SchedulerError::Store(e.to_string())),
            None => Ok(None),
        }
    }

    fn save(&self, record: &SchedulerRecord) -> Result<(), SchedulerError> {
        let json =
            serde_json::to_string(record).map_err(|e| SchedulerError::Store(e.to_string()))?;
        let conn = self.lock_conn()?;
        conn.execute(
            "INSERT INTO scheduler_state (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![STATE_KEY, json],
        )
        .map_err(|e| SchedulerError::Store(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::config::FireTime;

    #[test]
    fn test_load_empty() {
        let store = SqliteSchedulerStore::in_memory().unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let store = SqliteSchedulerStore::in_memory().unwrap();
        let mut record = SchedulerRecord::default();
        record.config.enabled = true;
        record.config.fire_times = vec![FireTime { hour: 12, minute: 0 }];
        record.total_runs = 7;

        store.save(&record).unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert!(loaded.config.enabled);
        assert_eq!(loaded.config.fire_times.len(), 1);
        assert_eq!(loaded.total_runs, 7);
    }

    #[test]
    fn test_save_overwrites() {
        let store = SqliteSchedulerStore::in_memory().unwrap();
        let mut record = SchedulerRecord::default();
        store.save(&record).unwrap();
        record.total_runs = 3;
        store.save(&record).unwrap();
        assert_eq!(store.load().unwrap().unwrap().total_runs, 3);
    }
}
