use std::io::{self, Write};

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};

use crate::error::{Error, Result};
use crate::filter::{visible, Criteria};
use crate::models::{lookup_category, Priority, TaskUpdate, CATEGORIES};
use crate::storage::{KeyValueStore, TaskStorage};
use crate::store::TaskStore;

/// Extra fields that can be set when adding a task.
#[derive(Debug, Default, Clone)]
pub struct AddOptions {
    pub priority: Option<Priority>,
    pub category: Option<String>,
    pub due: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
    pub notes: Option<String>,
}

impl AddOptions {
    fn into_update(self) -> TaskUpdate {
        TaskUpdate {
            priority: self.priority,
            category: self.category,
            due_date: self.due.map(Some),
            tags: if self.tags.is_empty() { None } else { Some(self.tags) },
            notes: self.notes,
            ..TaskUpdate::default()
        }
    }
}

/// Parses a due date given as `YYYY-MM-DD` or RFC 3339.
///
/// A bare date means the end of that day in local time.
pub fn parse_due(s: &str) -> Result<DateTime<Utc>> {
    if let Ok(d) = DateTime::parse_from_rfc3339(s) {
        return Ok(d.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| {
        Error::InvalidArgument(format!("invalid due date '{}': {}. Use YYYY-MM-DD.", s, e))
    })?;
    date.and_hms_opt(23, 59, 59)
        .and_then(|end_of_day| Local.from_local_datetime(&end_of_day).earliest())
        .map(|d| d.with_timezone(&Utc))
        .ok_or_else(|| Error::InvalidArgument(format!("due date '{}' does not exist locally", s)))
}

/// Resolves a full id or a unique id prefix to a task id.
pub fn resolve_id<S: KeyValueStore>(store: &TaskStore<S>, prefix: &str) -> Result<String> {
    if let Some(t) = store.get(prefix) {
        return Ok(t.id.clone());
    }
    let mut matches = store.tasks().iter().filter(|t| t.id.starts_with(prefix));
    match (matches.next(), matches.next()) {
        (Some(t), None) if !prefix.is_empty() => Ok(t.id.clone()),
        (Some(_), _) if !prefix.is_empty() => Err(Error::AmbiguousId(prefix.to_string())),
        _ => Err(Error::TaskNotFound(prefix.to_string())),
    }
}

/// Adds a new task and applies any extra fields. Returns the new id.
pub fn cmd_add<S: KeyValueStore>(store: &mut TaskStore<S>, text: &str, options: AddOptions, silent: bool) -> Result<String> {
    let id = store.add_task(text)?.id.clone();
    let update = options.into_update();
    if !update.is_empty() {
        store.update_task(&id, update)?;
    }
    if !silent { println!("Task added (id = {})", short_id(&id)); }
    Ok(id)
}

/// Flips a task between active and completed.
pub fn cmd_toggle<S: KeyValueStore>(store: &mut TaskStore<S>, id: &str, silent: bool) -> Result<()> {
    let id = resolve_id(store, id)?;
    store.toggle_task(&id);
    if !silent {
        let state = match store.get(&id) {
            Some(t) if t.completed => "completed",
            _ => "active",
        };
        println!("Task {} marked as {}.", short_id(&id), state);
    }
    Ok(())
}

/// Removes a task.
pub fn cmd_remove<S: KeyValueStore>(store: &mut TaskStore<S>, id: &str, silent: bool) -> Result<()> {
    let id = resolve_id(store, id)?;
    store.delete_task(&id);
    if !silent { println!("Task {} removed.", short_id(&id)); }
    Ok(())
}

/// Edits an existing task's fields.
pub fn cmd_edit<S: KeyValueStore>(store: &mut TaskStore<S>, id: &str, update: TaskUpdate, silent: bool) -> Result<()> {
    let id = resolve_id(store, id)?;
    if update.is_empty() {
        return Err(Error::InvalidArgument("nothing to change".to_string()));
    }
    store.update_task(&id, update)?;
    if !silent { println!("Task {} updated.", short_id(&id)); }
    Ok(())
}

/// Removes all completed tasks.
pub fn cmd_clear<S: KeyValueStore>(store: &mut TaskStore<S>, silent: bool) -> usize {
    let removed = store.clear_completed();
    if !silent { println!("Cleared {} completed task(s).", removed); }
    removed
}

/// Lists the tasks matching `criteria` in a table, followed by the stats line.
pub fn cmd_list<S: KeyValueStore>(store: &TaskStore<S>, criteria: &Criteria) {
    let tasks = visible(store.tasks(), criteria);
    if tasks.is_empty() {
        if criteria.is_default() {
            println!("No tasks found.");
        } else {
            println!("No tasks match the current filters.");
        }
        print_stats(store);
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("ID").add_attribute(Attribute::Bold),
            Cell::new("Task").add_attribute(Attribute::Bold),
            Cell::new("Priority").add_attribute(Attribute::Bold),
            Cell::new("Category").add_attribute(Attribute::Bold),
            Cell::new("Due").add_attribute(Attribute::Bold),
            Cell::new("Tags").add_attribute(Attribute::Bold),
            Cell::new("Status").add_attribute(Attribute::Bold),
        ]);

    let now = Utc::now();
    for t in tasks {
        let priority_color = match t.priority {
            Priority::High => Color::Red,
            Priority::Medium => Color::Yellow,
            Priority::Low => Color::Green,
        };
        let category = lookup_category(&t.category)
            .map(|c| format!("{} {}", c.icon, c.name))
            .unwrap_or_else(|| "no category".to_string());
        let due = t
            .due_date
            .map(|d| d.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        let status = if t.completed { "Done" } else { "Pending" };
        let status_color = if t.completed { Color::Green } else { Color::Yellow };

        table.add_row(vec![
            Cell::new(short_id(&t.id)),
            Cell::new(&t.text),
            Cell::new(t.priority).fg(priority_color),
            Cell::new(category),
            Cell::new(due).fg(if t.is_overdue(now) { Color::Red } else { Color::Reset }),
            Cell::new(t.tags.join(", ")),
            Cell::new(status).fg(status_color),
        ]);
    }

    println!("{table}");
    print_stats(store);
}

/// Prints the derived statistics.
pub fn cmd_stats<S: KeyValueStore>(store: &TaskStore<S>) {
    println!("{}", store.stats().title());
    print_stats(store);
}

/// Lists the built-in categories.
pub fn cmd_categories() {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL)
        .set_header(vec!["Id", "Name", "Color", "Icon"]);
    for c in CATEGORIES {
        table.add_row(vec![c.id, c.name, c.color, c.icon]);
    }
    println!("{table}");
}

/// Deletes every stored task.
pub fn cmd_reset<S: KeyValueStore>(storage: &mut TaskStorage<S>, force: bool) -> Result<()> {
    if !force {
        print!("Are you sure you want to delete all tasks? This cannot be undone. [y/N] ");
        io::stdout().flush()?;
        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        if input.trim().to_lowercase() != "y" {
            println!("Aborted.");
            return Ok(());
        }
    }
    storage.clear()?;
    println!("Database reset successfully.");
    Ok(())
}

/// Prints the store's last error, if any, to stderr.
pub fn report_store_error<S: KeyValueStore>(store: &TaskStore<S>) {
    if let Some(message) = store.error() {
        eprintln!("{}", message);
    }
}

fn print_stats<S: KeyValueStore>(store: &TaskStore<S>) {
    let stats = store.stats();
    if stats.total == 0 {
        return;
    }
    println!(
        "Total: {} | Completed: {} | Remaining: {}",
        stats.total, stats.completed, stats.remaining
    );
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_id_handles_short_ids() {
        assert_eq!(short_id("abc"), "abc");
        assert_eq!(short_id("0123456789"), "01234567");
    }

    #[test]
    fn bare_due_date_is_end_of_local_day() {
        let due = parse_due("2030-06-15").unwrap().with_timezone(&Local);
        assert_eq!(due.date_naive(), NaiveDate::from_ymd_opt(2030, 6, 15).unwrap());
        assert_eq!(due.format("%H:%M:%S").to_string(), "23:59:59");
    }

    #[test]
    fn rejects_malformed_due_date() {
        assert!(matches!(parse_due("next week"), Err(Error::InvalidArgument(_))));
    }
}
