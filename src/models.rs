use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Category assigned to freshly created tasks.
pub const DEFAULT_CATEGORY: &str = "personal";

/// Represents a single task in the list.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier, never changes once assigned.
    pub id: String,
    /// The trimmed task text.
    pub text: String,
    /// Whether the task has been completed.
    pub completed: bool,
    /// Timestamp when the task was created.
    pub created_at: DateTime<Utc>,
    pub priority: Priority,
    /// Category id. May point at a category that no longer exists.
    pub category: String,
    /// Optional due date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
    /// Free-form notes; empty means none.
    pub notes: String,
}

impl Task {
    /// A task is overdue when it is still open and its due date has passed.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.completed && self.due_date.is_some_and(|due| due < now)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(format!("unknown priority '{}'. Use low, medium or high.", other)),
        }
    }
}

/// Static reference data describing a category. Not persisted with tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Category {
    pub id: &'static str,
    pub name: &'static str,
    pub color: &'static str,
    pub icon: &'static str,
}

/// The built-in category set.
pub const CATEGORIES: &[Category] = &[
    Category { id: "personal", name: "Personal", color: "#3b82f6", icon: "🏠" },
    Category { id: "work", name: "Work", color: "#8b5cf6", icon: "💼" },
    Category { id: "shopping", name: "Shopping", color: "#10b981", icon: "🛒" },
    Category { id: "health", name: "Health", color: "#ef4444", icon: "❤️" },
    Category { id: "finance", name: "Finance", color: "#f59e0b", icon: "💰" },
];

/// Finds a built-in category by id. Unknown ids render as "no category".
pub fn lookup_category(id: &str) -> Option<&'static Category> {
    CATEGORIES.iter().find(|c| c.id == id)
}

/// Partial set of fields merged into an existing task by `TaskStore::update_task`.
///
/// Carries no `id` or `created_at`; those keys are ignored when parsing JSON.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskUpdate {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub completed: Option<bool>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub category: Option<String>,
    /// `Some(None)` clears the due date, `None` leaves it alone.
    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<DateTime<Utc>>>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl TaskUpdate {
    pub fn is_empty(&self) -> bool {
        *self == TaskUpdate::default()
    }
}

// Distinguishes an explicit `null` from a missing key.
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Counters derived from the live collection.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stats {
    pub total: usize,
    pub completed: usize,
    pub remaining: usize,
}

impl Stats {
    pub fn from_tasks(tasks: &[Task]) -> Stats {
        let completed = tasks.iter().filter(|t| t.completed).count();
        Stats {
            total: tasks.len(),
            completed,
            remaining: tasks.len() - completed,
        }
    }

    /// Window/heading title: remaining count when there is work, tagline otherwise.
    pub fn title(&self) -> String {
        if self.total > 0 {
            format!("Todust ({} remaining)", self.remaining)
        } else {
            "Todust - Stay organized and get things done!".to_string()
        }
    }
}
