//! Stored content ideas backing scheduled and random generation.

pub mod sqlite_store;
pub mod store;
pub mod types;

pub use sqlite_store::SqliteIdeaStore;
pub use store::{IdeaError, IdeaStore};
pub use types::{CreateIdeaRequest, Idea};
