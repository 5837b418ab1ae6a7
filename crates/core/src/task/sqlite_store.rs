//! SQLite-backed task store.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;
use uuid::Uuid;

use super::store::{CreateTaskRequest, TaskError, TaskFilter, TaskStore};
use super::types::{Task, TaskState};

pub struct SqliteTaskStore {
    conn: Mutex<Connection>,
}

impl SqliteTaskStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, TaskError> {
        let conn = Connection::open(path).map_err(|e| TaskError::Database(e.to_string()))?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    /// In-memory store for tests.
    pub fn in_memory() -> Result<Self, TaskError> {
        let conn =
            Connection::open_in_memory().map_err(|e| TaskError::Database(e.to_string()))?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    fn initialize_schema(&self) -> Result<(), TaskError> {
        let conn = self.lock_conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS tasks (
                id TEXT PRIMARY KEY,
                created_at TEXT NOT NULL,
                idea_text TEXT NOT NULL,
                idea_id TEXT,
                targets TEXT NOT NULL,
                state TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_tasks_created_at ON tasks(created_at);
            CREATE INDEX IF NOT EXISTS idx_tasks_state_type
                ON tasks(json_extract(state, '$.type'));
            "#,
        )
        .map_err(|e| TaskError::Database(e.to_string()))?;
        Ok(())
    }

    fn lock_conn(&self) -> Result<std::sync::MutexGuard<'_, Connection>, TaskError> {
        self.conn
            .lock()
            .map_err(|e| TaskError::Database(format!("lock poisoned: {}", e)))
    }

    fn row_to_task(row: &rusqlite::Row<'_>) -> rusqlite::Result<Task> {
        let created_at: String = row.get("created_at")?;
        let updated_at: String = row.get("updated_at")?;
        let targets_json: String = row.get("targets")?;
        let state_json: String = row.get("state")?;

        Ok(Task {
            id: row.get("id")?,
            created_at: parse_timestamp(&created_at, row)?,
            idea_text: row.get("idea_text")?,
            idea_id: row.get("idea_id")?,
            targets: serde_json::from_str(&targets_json).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    0,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?,
            state: serde_json::from_str(&state_json).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    0,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?,
            updated_at: parse_timestamp(&updated_at, row)?,
        })
    }

    fn build_where_clause(filter: &TaskFilter) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
        let mut conditions: Vec<String> = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref state) = filter.state {
            conditions.push("json_extract(state, '$.type') = ?".to_string());
            params.push(Box::new(state.clone()));
        }

        let clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        (clause, params)
    }
}

fn parse_timestamp(value: &str, _row: &rusqlite::Row<'_>) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })
}

impl TaskStore for SqliteTaskStore {
    fn create(&self, request: CreateTaskRequest) -> Result<Task, TaskError> {
        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4().to_string(),
            created_at: now,
            idea_text: request.idea_text,
            idea_id: request.idea_id,
            targets: request.targets,
            state: TaskState::Pending,
            updated_at: now,
        };

        let targets_json = serde_json::to_string(&task.targets)
            .map_err(|e| TaskError::Database(e.to_string()))?;
        let state_json = serde_json::to_string(&task.state)
            .map_err(|e| TaskError::Database(e.to_string()))?;

        let conn = self.lock_conn()?;
        conn.execute(
            "INSERT INTO tasks (id, created_at, idea_text, idea_id, targets, state, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                task.id,
                task.created_at.to_rfc3339(),
                task.idea_text,
                task.idea_id,
                targets_json,
                state_json,
                task.updated_at.to_rfc3339(),
            ],
        )
        .map_err(|e| TaskError::Database(e.to_string()))?;

        Ok(task)
    }

    fn get(&self, id: &str) -> Result<Option<Task>, TaskError> {
        let conn = self.lock_conn()?;
        let mut stmt = conn
            .prepare("SELECT * FROM tasks WHERE id = ?1")
            .map_err(|e| TaskError::Database(e.to_string()))?;

        let mut rows = stmt
            .query_map(params![id], Self::row_to_task)
            .map_err(|e| TaskError::Database(e.to_string()))?;

        match rows.next() {
            Some(Ok(task)) => Ok(Some(task)),
            Some(Err(e)) => Err(TaskError::Database(e.to_string())),
            None => Ok(None),
        }
    }

    fn list(&self, filter: &TaskFilter) -> Result<Vec<Task>, TaskError> {
        let (where_clause, mut params) = Self::build_where_clause(filter);
        let sql = format!(
            "SELECT * FROM tasks {} ORDER BY created_at DESC LIMIT ? OFFSET ?",
            where_clause
        );
        params.push(Box::new(filter.limit));
        params.push(Box::new(filter.offset));

        let conn = self.lock_conn()?;
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| TaskError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(rusqlite::params_from_iter(params.iter()), Self::row_to_task)
            .map_err(|e| TaskError::Database(e.to_string()))?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| TaskError::Database(e.to_string()))
    }

    fn count(&self, filter: &TaskFilter) -> Result<i64, TaskError> {
        let (where_clause, params) = Self::build_where_clause(filter);
        let sql = format!("SELECT COUNT(*) FROM tasks {}", where_clause);

        let conn = self.lock_conn()?;
        conn.query_row(&sql, rusqlite::params_from_iter(params.iter()), |row| {
            row.get(0)
        })
        .map_err(|e| TaskError::Database(e.to_string()))
    }

    fn update_state(&self, id: &str, new_state: TaskState) -> Result<Task, TaskError> {
        let current = self
            .get(id)?
            .ok_or_else(|| TaskError::NotFound(id.to_string()))?;

        if !current.state.allows_transition_to(&new_state) {
            return Err(TaskError::InvalidState {
                task_id: id.to_string(),
                current_state: current.state.state_type().to_string(),
                operation: format!("transition to {}", new_state.state_type()),
            });
        }

        let state_json = serde_json::to_string(&new_state)
            .map_err(|e| TaskError::Database(e.to_string()))?;
        let updated_at = Utc::now();

        let conn = self.lock_conn()?;
        conn.execute(
            "UPDATE tasks SET state = ?1, updated_at = ?2 WHERE id = ?3",
            params![state_json, updated_at.to_rfc3339(), id],
        )
        .map_err(|e| TaskError::Database(e.to_string()))?;

        Ok(Task {
            state: new_state,
            updated_at,
            ..current
        })
    }

    fn delete(&self, id: &str) -> Result<(), TaskError> {
        let conn = self.lock_conn()?;
        let affected = conn
            .execute("DELETE FROM tasks WHERE id = ?1", params![id])
            .map_err(|e| TaskError::Database(e.to_string()))?;
        if affected == 0 {
            return Err(TaskError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::SinkKind;
    use crate::task::types::FailureKind;

    fn store() -> SqliteTaskStore {
        SqliteTaskStore::in_memory().unwrap()
    }

    fn create_request(idea: &str) -> CreateTaskRequest {
        CreateTaskRequest {
            idea_text: idea.to_string(),
            idea_id: None,
            targets: vec![SinkKind::Telegram],
        }
    }

    #[test]
    fn test_create_and_get() {
        let store = store();
        let task = store.create(create_request("an otter in space")).unwrap();
        assert_eq!(task.state, TaskState::Pending);

        let loaded = store.get(&task.id).unwrap().unwrap();
        assert_eq!(loaded.id, task.id);
        assert_eq!(loaded.idea_text, "an otter in space");
        assert_eq!(loaded.targets, vec![SinkKind::Telegram]);
    }

    #[test]
    fn test_get_missing_returns_none() {
        let store = store();
        assert!(store.get("nope").unwrap().is_none());
    }

    #[test]
    fn test_list_newest_first_and_state_filter() {
        let store = store();
        let first = store.create(create_request("idea one")).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let second = store.create(create_request("idea two")).unwrap();

        let all = store.list(&TaskFilter::new()).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, second.id);
        assert_eq!(all[1].id, first.id);

        store
            .update_state(
                &first.id,
                TaskState::GeneratingScript {
                    started_at: Utc::now(),
                },
            )
            .unwrap();

        let pending = store
            .list(&TaskFilter::new().with_state("pending"))
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, second.id);
        assert_eq!(store.count(&TaskFilter::new().with_state("pending")).unwrap(), 1);
    }

    #[test]
    fn test_update_state_rejects_backward() {
        let store = store();
        let task = store.create(create_request("idea")).unwrap();
        store
            .update_state(
                &task.id,
                TaskState::GeneratingVideo {
                    account_id: "acc-1".to_string(),
                    attempt: 1,
                    started_at: Utc::now(),
                },
            )
            .unwrap();

        let result = store.update_state(&task.id, TaskState::Pending);
        assert!(matches!(result, Err(TaskError::InvalidState { .. })));
    }

    #[test]
    fn test_terminal_state_is_absorbing() {
        let store = store();
        let task = store.create(create_request("idea")).unwrap();
        store
            .update_state(
                &task.id,
                TaskState::Failed {
                    kind: FailureKind::ScriptError,
                    reason: "no script".to_string(),
                    failed_at: Utc::now(),
                },
            )
            .unwrap();

        let result = store.update_state(
            &task.id,
            TaskState::GeneratingScript {
                started_at: Utc::now(),
            },
        );
        assert!(matches!(result, Err(TaskError::InvalidState { .. })));

        // Reads of a terminal task keep returning the same state.
        let a = store.get(&task.id).unwrap().unwrap();
        let b = store.get(&task.id).unwrap().unwrap();
        assert_eq!(a.state, b.state);
    }

    #[test]
    fn test_delete() {
        let store = store();
        let task = store.create(create_request("idea")).unwrap();
        store.delete(&task.id).unwrap();
        assert!(store.get(&task.id).unwrap().is_none());
        assert!(matches!(store.delete(&task.id), Err(TaskError::NotFound(_))));
    }
}
