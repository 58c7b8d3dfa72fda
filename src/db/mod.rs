//! Durable task storage
//!
//! The store is the only component that reads or writes the database.
//! Every call is self-contained: it makes sure the database exists, opens
//! its own connection and releases it before returning.

mod sqlite;

pub use sqlite::{SqliteTaskStore, BUNDLED_TEMPLATE};

use crate::models::Task;
use crate::Result;

/// Storage interface for task CRUD operations
pub trait TaskStore {
    /// Create the store from its template if it does not exist yet.
    /// Cheap and idempotent once the store exists.
    fn initialize(&self) -> Result<()>;

    /// Store a new task and return its assigned id. Any id on `task` is ignored.
    fn insert(&self, task: &Task) -> Result<i64>;

    /// Overwrite all fields of the stored task with the same id
    fn update(&self, task: &Task) -> Result<()>;

    /// Remove a task by id
    fn delete(&self, id: i64) -> Result<()>;

    /// All stored tasks, in storage order
    fn fetch_all(&self) -> Result<Vec<Task>>;
}
