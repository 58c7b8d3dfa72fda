//! Error types for the task engine

use thiserror::Error;

/// Problems with a task that must be fixed before it can be stored.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Name must not be empty")]
    BlankName,

    #[error("Due date must use the dd.mm.yyyy format (got '{0}')")]
    MalformedDueDate(String),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid task: {0}")]
    Validation(#[from] ValidationError),

    #[error("Task not found: {0}")]
    TaskNotFound(i64),

    #[error("Task has not been saved yet")]
    MissingId,

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the message is actionable for the user.
    ///
    /// Everything else is reported as a generic failure and only logged in detail.
    pub fn is_user_facing(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}
