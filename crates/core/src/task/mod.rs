//! Task domain: types, store trait and SQLite implementation.

pub mod sqlite_store;
pub mod store;
pub mod types;

pub use sqlite_store::SqliteTaskStore;
pub use store::{CreateTaskRequest, TaskError, TaskFilter, TaskStore};
pub use types::{FailureKind, Task, TaskState};
