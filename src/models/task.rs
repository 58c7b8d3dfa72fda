use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::overdue::has_due_date_shape;

/// Task priority, stored as its ordinal
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Default for Priority {
    fn default() -> Self {
        Self::Low
    }
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn ordinal(self) -> i64 {
        match self {
            Priority::Low => 0,
            Priority::Medium => 1,
            Priority::High => 2,
        }
    }

    pub fn from_ordinal(value: i64) -> Option<Self> {
        match value {
            0 => Some(Priority::Low),
            1 => Some(Priority::Medium),
            2 => Some(Priority::High),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" | "0" => Ok(Priority::Low),
            "medium" | "1" => Ok(Priority::Medium),
            "high" | "2" => Ok(Priority::High),
            other => Err(format!("Unknown priority '{}' (use low, medium or high)", other)),
        }
    }
}

/// Completion status, stored as its ordinal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Open,
    Completed,
}

impl Default for Status {
    fn default() -> Self {
        Self::Open
    }
}

impl Status {
    pub fn ordinal(self) -> i64 {
        match self {
            Status::Open => 0,
            Status::Completed => 1,
        }
    }

    pub fn from_ordinal(value: i64) -> Option<Self> {
        match value {
            0 => Some(Status::Open),
            1 => Some(Status::Completed),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Status::Open => "open",
            Status::Completed => "done",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "open" | "0" => Ok(Status::Open),
            "completed" | "done" | "1" => Ok(Status::Completed),
            other => Err(format!("Unknown status '{}' (use open or done)", other)),
        }
    }
}

/// A single to-do record.
///
/// Construction never validates, so front ends can hold half-typed values;
/// call [`Task::validate`] before handing the task to storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Assigned by the store on insert, `None` until then
    pub id: Option<i64>,
    pub name: String,
    pub priority: Priority,
    /// `dd.mm.yyyy`
    pub due_date: String,
    pub description: Option<String>,
    pub status: Status,
}

impl Task {
    /// Create a new, unsaved open task
    pub fn new(name: impl Into<String>, priority: Priority, due_date: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            priority,
            due_date: due_date.into(),
            description: None,
            status: Status::Open,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn is_open(&self) -> bool {
        self.status == Status::Open
    }

    /// The "mark done" transition; the only way status changes.
    pub fn completed(&self) -> Self {
        Self {
            status: Status::Completed,
            ..self.clone()
        }
    }

    /// Apply an edit form. Status and id are left alone.
    pub fn apply(&mut self, edit: TaskEdit) {
        if let Some(name) = edit.name {
            self.name = name;
        }
        if let Some(priority) = edit.priority {
            self.priority = priority;
        }
        if let Some(due_date) = edit.due_date {
            self.due_date = due_date;
        }
        if let Some(description) = edit.description {
            self.description = description.filter(|d| !d.is_empty());
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::BlankName);
        }
        if !has_due_date_shape(&self.due_date) {
            return Err(ValidationError::MalformedDueDate(self.due_date.clone()));
        }
        Ok(())
    }
}

/// Fields changed by an edit form; `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskEdit {
    pub name: Option<String>,
    pub priority: Option<Priority>,
    pub due_date: Option<String>,
    /// `Some(None)` clears the description
    pub description: Option<Option<String>>,
}

impl TaskEdit {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
            && self.description.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_task_is_open_and_unsaved() {
        let task = Task::new("Buy milk", Priority::Medium, "01.02.2025");
        assert_eq!(task.id, None);
        assert_eq!(task.status, Status::Open);
        assert!(task.description.is_none());
        assert!(task.validate().is_ok());
    }

    #[test]
    fn test_blank_name_is_rejected() {
        let task = Task::new("   ", Priority::Low, "01.02.2025");
        assert_eq!(task.validate(), Err(ValidationError::BlankName));
    }

    #[test]
    fn test_due_date_shape_is_enforced() {
        for bad in ["1.2.2025", "01-02-2025", "01.02.25", "", "01.02.2025 ", "aa.bb.cccc"] {
            let task = Task::new("Task", Priority::Low, bad);
            assert_eq!(
                task.validate(),
                Err(ValidationError::MalformedDueDate(bad.to_string())),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_calendar_is_not_checked() {
        // only the textual shape matters at save time
        let task = Task::new("Task", Priority::Low, "31.02.2025");
        assert!(task.validate().is_ok());
    }

    #[test]
    fn test_edit_keeps_status_and_id() {
        let mut task = Task::new("Old", Priority::Low, "01.01.2025")
            .with_id(4)
            .completed();
        task.apply(TaskEdit {
            name: Some("New".to_string()),
            priority: Some(Priority::High),
            due_date: Some("02.02.2026".to_string()),
            description: Some(Some("notes".to_string())),
        });

        assert_eq!(task.id, Some(4));
        assert_eq!(task.status, Status::Completed);
        assert_eq!(task.name, "New");
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.due_date, "02.02.2026");
        assert_eq!(task.description.as_deref(), Some("notes"));
    }

    #[test]
    fn test_edit_clears_description() {
        let mut task = Task::new("Task", Priority::Low, "01.01.2025").with_description("x");
        task.apply(TaskEdit {
            description: Some(None),
            ..TaskEdit::default()
        });
        assert!(task.description.is_none());
    }

    #[test]
    fn test_priority_parsing() {
        assert_eq!("HIGH".parse::<Priority>(), Ok(Priority::High));
        assert_eq!("1".parse::<Priority>(), Ok(Priority::Medium));
        assert!("urgent".parse::<Priority>().is_err());
        assert_eq!(Priority::from_ordinal(3), None);
        assert!(Priority::High > Priority::Low);
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("done".parse::<Status>(), Ok(Status::Completed));
        assert_eq!("0".parse::<Status>(), Ok(Status::Open));
        assert_eq!(Status::from_ordinal(1), Some(Status::Completed));
        assert_eq!(Status::from_ordinal(-1), None);
    }
}
