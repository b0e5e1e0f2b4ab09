use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local, Utc};

use crate::models::{Priority, Task};

/// Completion status filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Completed,
}

/// Due-date bucket filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DueFilter {
    #[default]
    All,
    /// Due on the current local calendar day.
    Today,
    /// Due strictly before now.
    Overdue,
    /// Due strictly after now.
    Upcoming,
}

/// Filter and search parameters. The default value matches every task.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Criteria {
    /// Case-insensitive substring of the task text. Empty matches all.
    pub search: String,
    /// Category id. Empty matches all.
    pub category: String,
    pub priority: Option<Priority>,
    pub status: StatusFilter,
    pub due: DueFilter,
}

impl Criteria {
    /// True when no filter is active.
    pub fn is_default(&self) -> bool {
        *self == Criteria::default()
    }
}

/// Returns the tasks matching `criteria` relative to the current local time.
pub fn visible<'a>(tasks: &'a [Task], criteria: &Criteria) -> Vec<&'a Task> {
    visible_at(tasks, criteria, Local::now())
}

/// Returns the tasks matching `criteria` relative to `now`, in input order.
pub fn visible_at<'a>(tasks: &'a [Task], criteria: &Criteria, now: DateTime<Local>) -> Vec<&'a Task> {
    let needle = criteria.search.to_lowercase();
    tasks
        .iter()
        .filter(|t| matches_search(t, &needle))
        .filter(|t| criteria.category.is_empty() || t.category == criteria.category)
        .filter(|t| criteria.priority.map_or(true, |p| t.priority == p))
        .filter(|t| matches_status(t, criteria.status))
        .filter(|t| matches_due(t, criteria.due, now))
        .collect()
}

fn matches_search(task: &Task, needle: &str) -> bool {
    needle.is_empty() || task.text.to_lowercase().contains(needle)
}

fn matches_status(task: &Task, status: StatusFilter) -> bool {
    match status {
        StatusFilter::All => true,
        StatusFilter::Active => !task.completed,
        StatusFilter::Completed => task.completed,
    }
}

// Tasks without a due date only show up under `DueFilter::All`.
fn matches_due(task: &Task, due: DueFilter, now: DateTime<Local>) -> bool {
    if due == DueFilter::All {
        return true;
    }
    let Some(due_date) = task.due_date else {
        return false;
    };
    let instant = now.with_timezone(&Utc);
    match due {
        DueFilter::All => true,
        DueFilter::Today => due_date.with_timezone(&Local).date_naive() == now.date_naive(),
        DueFilter::Overdue => due_date < instant,
        DueFilter::Upcoming => due_date > instant,
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(StatusFilter::All),
            "active" => Ok(StatusFilter::Active),
            "completed" | "done" => Ok(StatusFilter::Completed),
            other => Err(format!("unknown status '{}'. Use all, active or completed.", other)),
        }
    }
}

impl FromStr for DueFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(DueFilter::All),
            "today" => Ok(DueFilter::Today),
            "overdue" => Ok(DueFilter::Overdue),
            "upcoming" => Ok(DueFilter::Upcoming),
            other => Err(format!(
                "unknown due filter '{}'. Use all, today, overdue or upcoming.",
                other
            )),
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StatusFilter::All => "all",
            StatusFilter::Active => "active",
            StatusFilter::Completed => "completed",
        })
    }
}

impl fmt::Display for DueFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DueFilter::All => "all",
            DueFilter::Today => "today",
            DueFilter::Overdue => "overdue",
            DueFilter::Upcoming => "upcoming",
        })
    }
}
