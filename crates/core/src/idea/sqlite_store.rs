//! SQLite-backed idea store.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;
use uuid::Uuid;

use super::store::{IdeaError, IdeaStore};
use super::types::{CreateIdeaRequest, Idea};

pub struct SqliteIdeaStore {
    conn: Mutex<Connection>,
}

impl SqliteIdeaStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, IdeaError> {
        let conn = Connection::open(path).map_err(|e| IdeaError::Database(e.to_string()))?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self, IdeaError> {
        let conn =
            Connection::open_in_memory().map_err(|e| IdeaError::Database(e.to_string()))?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    fn initialize_schema(&self) -> Result<(), IdeaError> {
        let conn = self.lock_conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS ideas (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                tags TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                times_used INTEGER NOT NULL DEFAULT 0
            );
            CREATE INDEX IF NOT EXISTS idx_ideas_created_at ON ideas(created_at);
            "#,
        )
        .map_err(|e| IdeaError::Database(e.to_string()))?;
        Ok(())
    }

    fn lock_conn(&self) -> Result<std::sync::MutexGuard<'_, Connection>, IdeaError> {
        self.conn
            .lock()
            .map_err(|e| IdeaError::Database(format!("lock poisoned: {}", e)))
    }

    fn row_to_idea(row: &rusqlite::Row<'_>) -> rusqlite::Result<Idea> {
        let created_at: String = row.get("created_at")?;
        let updated_at: String = row.get("updated_at")?;
        let tags_json: String = row.get("tags")?;

        Ok(Idea {
            id: row.get("id")?,
            title: row.get("title")?,
            description: row.get("description")?,
            tags: serde_json::from_str(&tags_json).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    0,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?,
            created_at: parse_timestamp(&created_at)?,
            updated_at: parse_timestamp(&updated_at)?,
            times_used: row.get("times_used")?,
        })
    }
}

fn parse_timestamp(value: &str) -> rusqlite::Result<DateTime<Utc>> {
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

impl IdeaStore for SqliteIdeaStore {
    fn create(&self, request: CreateIdeaRequest) -> Result<Idea, IdeaError> {
        if request.title.trim().is_empty() {
            return Err(IdeaError::Invalid("title must not be empty".to_string()));
        }

        let now = Utc::now();
        let idea = Idea {
            id: Uuid::new_v4().to_string(),
            title: request.title,
            description: request.description,
            tags: request.tags,
            created_at: now,
            updated_at: now,
            times_used: 0,
        };

        let tags_json =
            serde_json::to_string(&idea.tags).map_err(|e| IdeaError::Database(e.to_string()))?;

        let conn = self.lock_conn()?;
        conn.execute(
            "INSERT INTO ideas (id, title, description, tags, created_at, updated_at, times_used)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0)",
            params![
                idea.id,
                idea.title,
                idea.description,
                tags_json,
                idea.created_at.to_rfc3339(),
                idea.updated_at.to_rfc3339(),
            ],
        )
        .map_err(|e| IdeaError::Database(e.to_string()))?;

        Ok(idea)
    }

    fn get(&self, id: &str) -> Result<Option<Idea>, IdeaError> {
        let conn = self.lock_conn()?;
        let mut stmt = conn
            .prepare("SELECT * FROM ideas WHERE id = ?1")
            .map_err(|e| IdeaError::Database(e.to_string()))?;

        let mut rows = stmt
            .query_map(params![id], Self::row_to_idea)
            .map_err(|e| IdeaError::Database(e.to_string()))?;

        match rows.next() {
            Some(Ok(idea)) => Ok(Some(idea)),
            Some(Err(e)) => Err(IdeaError::Database(e.to_string())),
            None => Ok(None),
        }
    }

    fn list(&self) -> Result<Vec<Idea>, IdeaError> {
        let conn = self.lock_conn()?;
        let mut stmt = conn
            .prepare("SELECT * FROM ideas ORDER BY created_at DESC")
            .map_err(|e| IdeaError::Database(e.to_string()))?;

        let rows = stmt
            .query_map([], Self::row_to_idea)
            .map_err(|e| IdeaError::Database(e.to_string()))?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| IdeaError::Database(e.to_string()))
    }

    fn delete(&self, id: &str) -> Result<(), IdeaError> {
        let conn = self.lock_conn()?;
        let affected = conn
            .execute("DELETE FROM ideas WHERE id = ?1", params![id])
            .map_err(|e| IdeaError::Database(e.to_string()))?;
        if affected == 0 {
            return Err(IdeaError::NotFound(id.to_string()));
        }
        Ok(())
    }

    fn random(&self) -> Result<Option<Idea>, IdeaError> {
        let conn = self.lock_conn()?;
        let mut stmt = conn
            .prepare("SELECT * FROM ideas ORDER BY RANDOM() LIMIT 1")
            .map_err(|e| IdeaError::Database(e.to_string()))?;

        let mut rows = stmt
            .query_map([], Self::row_to_idea)
            .map_err(|e| IdeaError::Database(e.to_string()))?;

        match rows.next() {
            Some(Ok(idea)) => Ok(Some(idea)),
            Some(Err(e)) => Err(IdeaError::Database(e.to_string())),
            None => Ok(None),
        }
    }

    fn increment_usage(&self, id: &str) -> Result<(), IdeaError> {
        let conn = self.lock_conn()?;
        let affected = conn
            .execute(
                "UPDATE ideas SET times_used = times_used + 1, updated_at = ?1 WHERE id = ?2",
                params![Utc::now().to_rfc3339(), id],
            )
            .map_err(|e| IdeaError::Database(e.to_string()))?;
        if affected == 0 {
            return Err(IdeaError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SqliteIdeaStore {
        SqliteIdeaStore::in_memory().unwrap()
    }

    fn request(title: &str) -> CreateIdeaRequest {
        CreateIdeaRequest {
            title: title.to_string(),
            description: "a short description".to_string(),
            tags: vec!["funny".to_string()],
        }
    }

    #[test]
    fn test_create_and_get() {
        let store = store();
        let idea = store.create(request("Space otter")).unwrap();
        let loaded = store.get(&idea.id).unwrap().unwrap();
        assert_eq!(loaded.title, "Space otter");
        assert_eq!(loaded.tags, vec!["funny".to_string()]);
        assert_eq!(loaded.times_used, 0);
    }

    #[test]
    fn test_empty_title_rejected() {
        let store = store();
        assert!(matches!(
            store.create(request("   ")),
            Err(IdeaError::Invalid(_))
        ));
    }

    #[test]
    fn test_list_newest_first() {
        let store = store();
        let first = store.create(request("first")).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let second = store.create(request("second")).unwrap();

        let all = store.list().unwrap();
        assert_eq!(all[0].id, second.id);
        assert_eq!(all[1].id, first.id);
    }

    #[test]
    fn test_random_on_empty_store() {
        let store = store();
        assert!(store.random().unwrap().is_none());
    }

    #[test]
    fn test_random_returns_a_stored_idea() {
        let store = store();
        let idea = store.create(request("only one")).unwrap();
        let picked = store.random().unwrap().unwrap();
        assert_eq!(picked.id, idea.id);
    }

    #[test]
    fn test_increment_usage() {
        let store = store();
        let idea = store.create(request("counted")).unwrap();
        store.increment_usage(&idea.id).unwrap();
        store.increment_usage(&idea.id).unwrap();
        assert_eq!(store.get(&idea.id).unwrap().unwrap().times_used, 2);

        assert!(matches!(
            store.increment_usage("missing"),
            Err(IdeaError::NotFound(_))
        ));
    }

    #[test]
    fn test_delete() {
        let store = store();
        let idea = store.create(request("gone")).unwrap();
        store.delete(&idea.id).unwrap();
        assert!(store.get(&idea.id).unwrap().is_none());
    }
}
