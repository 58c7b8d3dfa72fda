//! Filtering and sorting of task lists for display

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::models::{Priority, Status, Task};
use crate::overdue::{due_timestamp, is_overdue};

/// Which part of the list a screen shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewFilter {
    #[default]
    Active,
    Completed,
    All,
}

impl ViewFilter {
    pub fn matches(self, task: &Task) -> bool {
        match self {
            ViewFilter::Active => task.status == Status::Open,
            ViewFilter::Completed => task.status == Status::Completed,
            ViewFilter::All => true,
        }
    }

    /// The `filter_active` flag the repository's `load` takes
    pub fn filter_active(self) -> Option<bool> {
        match self {
            ViewFilter::Active => Some(true),
            ViewFilter::Completed => Some(false),
            ViewFilter::All => None,
        }
    }
}

impl fmt::Display for ViewFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ViewFilter::Active => "active",
            ViewFilter::Completed => "done",
            ViewFilter::All => "all",
        })
    }
}

impl From<Option<bool>> for ViewFilter {
    fn from(filter_active: Option<bool>) -> Self {
        match filter_active {
            Some(true) => ViewFilter::Active,
            Some(false) => ViewFilter::Completed,
            None => ViewFilter::All,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityFilter {
    #[default]
    All,
    Only(Priority),
}

impl PriorityFilter {
    pub fn matches(self, task: &Task) -> bool {
        match self {
            PriorityFilter::All => true,
            PriorityFilter::Only(priority) => task.priority == priority,
        }
    }
}

impl FromStr for PriorityFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(PriorityFilter::All);
        }
        s.parse().map(PriorityFilter::Only)
    }
}

impl fmt::Display for PriorityFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriorityFilter::All => f.write_str("all"),
            PriorityFilter::Only(priority) => write!(f, "{}", priority),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    #[default]
    Priority,
    Date,
}

impl FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "priority" => Ok(SortBy::Priority),
            "date" | "due" => Ok(SortBy::Date),
            other => Err(format!("Unknown sort key '{}' (use priority or date)", other)),
        }
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortBy::Priority => "priority",
            SortBy::Date => "date",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortOrder::Ascending),
            "desc" | "descending" => Ok(SortOrder::Descending),
            other => Err(format!("Unknown sort order '{}' (use asc or desc)", other)),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        })
    }
}

/// Filter and sort settings. The default is the "cleared" state:
/// every priority, overdue and not, highest priority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryOptions {
    pub priority_filter: PriorityFilter,
    pub overdue_only: bool,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
}

/// Run the display pipeline: priority filter, then overdue filter, then a
/// stable sort. Tasks with equal keys keep their input order in both
/// directions, and unparsable due dates count as later than any real date.
pub fn apply_filter_and_sort<'a, I>(tasks: I, options: &QueryOptions, now: NaiveDateTime) -> Vec<&'a Task>
where
    I: IntoIterator<Item = &'a Task>,
{
    let mut result: Vec<&Task> = tasks
        .into_iter()
        .filter(|t| options.priority_filter.matches(t))
        .filter(|t| !options.overdue_only || (t.is_open() && is_overdue(t, now)))
        .collect();

    let compare = |a: &&Task, b: &&Task| -> Ordering {
        match options.sort_by {
            SortBy::Priority => a.priority.cmp(&b.priority),
            SortBy::Date => date_key(a).cmp(&date_key(b)),
        }
    };

    match options.sort_order {
        SortOrder::Ascending => result.sort_by(compare),
        SortOrder::Descending => result.sort_by(|a, b| compare(b, a)),
    }

    result
}

fn date_key(task: &Task) -> NaiveDateTime {
    due_timestamp(task).unwrap_or(NaiveDateTime::MAX)
}
