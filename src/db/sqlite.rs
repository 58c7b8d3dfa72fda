//! SQLite-backed task store.

use rusqlite::{params, Connection, OpenFlags, Row};
use std::fs;
use std::path::{Path, PathBuf};

use super::TaskStore;
use crate::models::{Priority, Status, Task};
use crate::{Error, Result};

/// Schema and starter rows written to a fresh database
pub const BUNDLED_TEMPLATE: &str = include_str!("../../assets/template.sql");

const INSERT_TODO: &str =
    "INSERT INTO todos (name, priority, due_date, description, status) VALUES (?1, ?2, ?3, ?4, ?5)";
const UPDATE_TODO: &str = "UPDATE todos SET name = ?1, priority = ?2, due_date = ?3, description = ?4, status = ?5 WHERE id = ?6";
const DELETE_TODO: &str = "DELETE FROM todos WHERE id = ?1";
const SELECT_TODOS: &str = "SELECT id, name, priority, due_date, description, status FROM todos";

#[derive(Debug, Clone)]
pub struct SqliteTaskStore {
    path: PathBuf,
    template: String,
}

impl SqliteTaskStore {
    /// Store at `path`, seeded from [`BUNDLED_TEMPLATE`] on first use
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_template(path, BUNDLED_TEMPLATE)
    }

    /// Store at `path`, seeded from a custom SQL script on first use
    pub fn with_template(path: impl Into<PathBuf>, template: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            template: template.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open a connection for a single operation. The caller drops it before returning.
    fn connect(&self) -> Result<Connection> {
        self.initialize()?;
        // no CREATE flag: a vanished file is an error, not a silently empty store
        let conn = Connection::open_with_flags(&self.path, OpenFlags::SQLITE_OPEN_READ_WRITE)?;
        Ok(conn)
    }

    /// Build the database next to its final location, then move it into place
    /// so a failed first run never leaves a half-written store behind.
    fn create_from_template(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let staging = self.staging_path();
        if staging.exists() {
            fs::remove_file(&staging)?;
        }

        match build_database(&staging, &self.template) {
            Ok(()) => {
                fs::rename(&staging, &self.path)?;
                Ok(())
            }
            Err(e) => {
                let _ = fs::remove_file(&staging);
                Err(e)
            }
        }
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "todos.db".into());
        name.push(".init");
        self.path.with_file_name(name)
    }

    fn trace_outcome<T>(&self, operation: &str, id: Option<i64>, result: &Result<T>) {
        match result {
            Ok(_) => tracing::debug!(operation, id = ?id, "Task store operation succeeded"),
            Err(Error::TaskNotFound(missing)) => {
                tracing::warn!(operation, id = missing, "No stored task matched")
            }
            Err(err) => tracing::error!(
                operation,
                id = ?id,
                path = %self.path.display(),
                error = %err,
                "Task store operation failed"
            ),
        }
    }
}

fn build_database(path: &Path, template: &str) -> Result<()> {
    let conn = Connection::open(path)?;
    conn.execute_batch(template)?;
    conn.close().map_err(|(_, e)| e)?;
    Ok(())
}

/// Decode one row. Rows whose enums are out of range come back as `None`.
fn row_to_task(row: &Row) -> rusqlite::Result<Option<Task>> {
    let id: i64 = row.get(0)?;
    let priority: i64 = row.get(2)?;
    let status: i64 = row.get(5)?;

    let (Some(priority), Some(status)) = (Priority::from_ordinal(priority), Status::from_ordinal(status))
    else {
        tracing::warn!(id, priority, status, "Skipping task with out-of-range priority or status");
        return Ok(None);
    };

    Ok(Some(Task {
        id: Some(id),
        name: row.get(1)?,
        priority,
        due_date: row.get(3)?,
        description: row.get(4)?,
        status,
    }))
}

impl TaskStore for SqliteTaskStore {
    fn initialize(&self) -> Result<()> {
        if self.path.exists() {
            return Ok(());
        }

        let result = self.create_from_template();
        match &result {
            Ok(()) => tracing::info!(path = %self.path.display(), "Created task database from template"),
            Err(err) => tracing::error!(
                path = %self.path.display(),
                error = %err,
                "Failed to create task database"
            ),
        }
        result
    }

    fn insert(&self, task: &Task) -> Result<i64> {
        task.validate()?;
        if let Some(id) = task.id {
            tracing::debug!(id, "Ignoring id on task passed to insert");
        }

        let result = self.connect().and_then(|conn| -> Result<i64> {
            conn.execute(
                INSERT_TODO,
                params![
                    task.name,
                    task.priority.ordinal(),
                    task.due_date,
                    task.description,
                    task.status.ordinal(),
                ],
            )?;
            Ok(conn.last_insert_rowid())
        });

        let id = result.as_ref().ok().copied();
        self.trace_outcome("insert", id, &result);
        result
    }

    fn update(&self, task: &Task) -> Result<()> {
        task.validate()?;
        let id = task.id.ok_or(Error::MissingId)?;

        let result = self.connect().and_then(|conn| -> Result<()> {
            let changed = conn.execute(
                UPDATE_TODO,
                params![
                    task.name,
                    task.priority.ordinal(),
                    task.due_date,
                    task.description,
                    task.status.ordinal(),
                    id,
                ],
            )?;
            if changed == 0 {
                return Err(Error::TaskNotFound(id));
            }
            Ok(())
        });

        self.trace_outcome("update", Some(id), &result);
        result
    }

    fn delete(&self, id: i64) -> Result<()> {
        let result = self.connect().and_then(|conn| -> Result<()> {
            if conn.execute(DELETE_TODO, params![id])? == 0 {
                return Err(Error::TaskNotFound(id));
            }
            Ok(())
        });

        self.trace_outcome("delete", Some(id), &result);
        result
    }

    fn fetch_all(&self) -> Result<Vec<Task>> {
        let result = self.connect().and_then(|conn| -> Result<Vec<Task>> {
            let mut stmt = conn.prepare(SELECT_TODOS)?;
            let rows = stmt.query_map([], row_to_task)?;

            let mut tasks = Vec::new();
            for row in rows {
                match row {
                    Ok(Some(task)) => tasks.push(task),
                    Ok(None) => {}
                    Err(
                        err @ (rusqlite::Error::InvalidColumnType(..)
                        | rusqlite::Error::FromSqlConversionFailure(..)
                        | rusqlite::Error::IntegralValueOutOfRange(..)),
                    ) => tracing::warn!(error = %err, "Skipping unreadable task row"),
                    Err(err) => return Err(err.into()),
                }
            }
            Ok(tasks)
        });

        if let Ok(tasks) = &result {
            tracing::debug!(count = tasks.len(), "Fetched tasks");
        }
        self.trace_outcome("fetch_all", None, &result);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use tempfile::TempDir;

    const EMPTY_TEMPLATE: &str = "CREATE TABLE todos (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        priority INTEGER NOT NULL DEFAULT 0,
        due_date TEXT NOT NULL,
        description TEXT,
        status INTEGER NOT NULL DEFAULT 0
    );";

    fn create_test_store() -> (SqliteTaskStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = SqliteTaskStore::with_template(temp_dir.path().join("todos.db"), EMPTY_TEMPLATE);
        (store, temp_dir)
    }

    fn sample() -> Task {
        Task::new("Write report", Priority::High, "15.03.2025").with_description("quarterly")
    }

    #[test]
    fn test_initialize_seeds_bundled_template() {
        let temp_dir = TempDir::new().unwrap();
        let store = SqliteTaskStore::new(temp_dir.path().join("nested").join("todos.db"));

        store.initialize().unwrap();

        assert!(store.path().exists());
        let tasks = store.fetch_all().unwrap();
        assert_eq!(tasks.len(), 2);
        assert!(tasks.iter().all(|t| t.is_open() && t.validate().is_ok()));
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let (store, _dir) = create_test_store();
        store.initialize().unwrap();
        store.insert(&sample()).unwrap();

        store.initialize().unwrap();
        store.initialize().unwrap();

        assert_eq!(store.fetch_all().unwrap().len(), 1);
    }

    #[test]
    fn test_failed_initialize_leaves_nothing_behind() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("todos.db");
        let store = SqliteTaskStore::with_template(&path, "THIS IS NOT SQL;");

        assert!(matches!(store.initialize(), Err(Error::Storage(_))));
        assert!(!path.exists());
        assert!(!store.staging_path().exists());
    }

    #[test]
    fn test_insert_round_trip() {
        let (store, _dir) = create_test_store();
        let task = sample();

        let id = store.insert(&task).unwrap();
        let tasks = store.fetch_all().unwrap();

        let matching: Vec<&Task> = tasks.iter().filter(|t| t.id == Some(id)).collect();
        assert_eq!(matching.len(), 1);
        assert_eq!(*matching[0], task.clone().with_id(id));
    }

    #[test]
    fn test_insert_assigns_fresh_ids() {
        let (store, _dir) = create_test_store();
        let first = store.insert(&sample()).unwrap();
        let second = store.insert(&sample().with_id(first)).unwrap();

        assert_ne!(first, second);
        assert_eq!(store.fetch_all().unwrap().len(), 2);
    }

    #[test]
    fn test_update_is_visible() {
        let (store, _dir) = create_test_store();
        let id = store.insert(&sample()).unwrap();

        let mut changed = sample().with_id(id).completed();
        changed.name = "Write final report".to_string();
        changed.description = None;
        store.update(&changed).unwrap();

        let tasks = store.fetch_all().unwrap();
        assert_eq!(tasks, vec![changed]);
    }

    #[test]
    fn test_update_unknown_id() {
        let (store, _dir) = create_test_store();
        store.insert(&sample()).unwrap();

        let result = store.update(&sample().with_id(999));
        assert!(matches!(result, Err(Error::TaskNotFound(999))));
    }

    #[test]
    fn test_update_requires_id() {
        let (store, _dir) = create_test_store();
        assert!(matches!(store.update(&sample()), Err(Error::MissingId)));
    }

    #[test]
    fn test_delete_removes_task() {
        let (store, _dir) = create_test_store();
        let keep = store.insert(&sample()).unwrap();
        let gone = store.insert(&sample()).unwrap();

        store.delete(gone).unwrap();

        let ids: Vec<Option<i64>> = store.fetch_all().unwrap().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![Some(keep)]);
        assert!(matches!(store.delete(gone), Err(Error::TaskNotFound(_))));
    }

    #[test]
    fn test_invalid_task_never_reaches_storage() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("todos.db");
        let store = SqliteTaskStore::with_template(&path, EMPTY_TEMPLATE);

        let blank = Task::new("  ", Priority::Low, "01.01.2025");
        let result = store.insert(&blank);

        assert!(matches!(
            result,
            Err(Error::Validation(ValidationError::BlankName))
        ));
        // the store was never even initialized
        assert!(!path.exists());

        let bad_date = Task::new("Task", Priority::Low, "1.1.25").with_id(1);
        assert!(matches!(
            store.update(&bad_date),
            Err(Error::Validation(ValidationError::MalformedDueDate(_)))
        ));
        assert!(!path.exists());
    }

    #[test]
    fn test_out_of_range_rows_are_skipped() {
        let (store, _dir) = create_test_store();
        let id = store.insert(&sample()).unwrap();

        let conn = Connection::open(store.path()).unwrap();
        conn.execute(
            "INSERT INTO todos (name, priority, due_date, description, status) VALUES ('bad', 7, '01.01.2025', NULL, 0)",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO todos (name, priority, due_date, description, status) VALUES ('bad', 0, '01.01.2025', NULL, 5)",
            [],
        )
        .unwrap();
        drop(conn);

        let tasks = store.fetch_all().unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, Some(id));
    }

    #[test]
    fn test_storage_failure_is_returned() {
        let temp_dir = TempDir::new().unwrap();
        // a directory exists at the database path, so opening it fails
        let store = SqliteTaskStore::with_template(temp_dir.path(), EMPTY_TEMPLATE);

        assert!(matches!(store.fetch_all(), Err(Error::Storage(_))));
        assert!(matches!(store.insert(&sample()), Err(Error::Storage(_))));
        assert!(matches!(store.delete(1), Err(Error::Storage(_))));
    }
}
