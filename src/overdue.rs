//! Due-date parsing and overdue detection

use chrono::{Days, Local, Months, NaiveDate, NaiveDateTime};

use crate::models::{Status, Task};

/// Textual check for `dd.mm.yyyy`: two digits, dot, two digits, dot, four digits.
pub fn has_due_date_shape(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            2 | 5 => *b == b'.',
            _ => b.is_ascii_digit(),
        })
}

/// Parse a due date. Day and month values outside the calendar roll over
/// into the neighbouring month or year (`31.02.2025` is 3 March 2025,
/// `00.01.2024` is 31 December 2023). Only values without the
/// `dd.mm.yyyy` shape yield `None`.
pub fn parse_due_date(value: &str) -> Option<NaiveDate> {
    if !has_due_date_shape(value) {
        return None;
    }
    let day: u64 = value[0..2].parse().ok()?;
    let month: u32 = value[3..5].parse().ok()?;
    let year: i32 = value[6..10].parse().ok()?;

    let first_of_year = NaiveDate::from_ymd_opt(year, 1, 1)?;
    let first_of_month = match month {
        0 => first_of_year.checked_sub_months(Months::new(1))?,
        m => first_of_year.checked_add_months(Months::new(m - 1))?,
    };
    match day {
        0 => first_of_month.checked_sub_days(Days::new(1)),
        d => first_of_month.checked_add_days(Days::new(d - 1)),
    }
}

/// Start of the due day, or `None` when the date cannot be parsed
pub fn due_timestamp(task: &Task) -> Option<NaiveDateTime> {
    parse_due_date(&task.due_date).and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// An open task is overdue once `now` has passed the start of its due day.
/// Completed tasks and unparsable dates are never overdue.
pub fn is_overdue(task: &Task, now: NaiveDateTime) -> bool {
    if task.status == Status::Completed {
        return false;
    }
    match due_timestamp(task) {
        Some(due) => due < now,
        None => {
            tracing::debug!(
                task_id = ?task.id,
                due_date = %task.due_date,
                "Unparsable due date, treating task as not overdue"
            );
            false
        }
    }
}

/// [`is_overdue`] against the local wall clock, for display code only.
pub fn is_overdue_now(task: &Task) -> bool {
    is_overdue(task, Local::now().naive_local())
}
