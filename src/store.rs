use chrono::Utc;
use tracing::debug;

use crate::error::ValidationError;
use crate::models::{Priority, Stats, Task, TaskUpdate, DEFAULT_CATEGORY};
use crate::storage::{KeyValueStore, TaskStorage};
use crate::validation::{new_id, sanitize, validate};

/// Message shown when the collection could not be persisted.
pub const STORAGE_FAILED: &str = "Failed to save tasks. Please try again.";

/// Owns the task collection and keeps it in sync with storage.
///
/// Tasks are kept newest-first: adds prepend, every other operation keeps
/// the existing order. Each mutation is followed by a save of the whole
/// collection. A failed save is reported through [`TaskStore::error`] but the
/// in-memory state is kept as is.
#[derive(Debug)]
pub struct TaskStore<S: KeyValueStore> {
    storage: TaskStorage<S>,
    tasks: Vec<Task>,
    error: Option<String>,
    loading: bool,
}

impl<S: KeyValueStore> TaskStore<S> {
    /// Creates a store seeded from `storage`.
    pub fn open(storage: TaskStorage<S>) -> TaskStore<S> {
        let tasks = storage.load();
        TaskStore { storage, tasks, error: None, loading: false }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn stats(&self) -> Stats {
        Stats::from_tasks(&self.tasks)
    }

    /// The last validation or storage message, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// True only while an add is being processed.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn storage(&self) -> &TaskStorage<S> {
        &self.storage
    }

    /// Ends the store's lifetime and hands back its storage.
    pub fn dispose(self) -> TaskStorage<S> {
        self.storage
    }

    /// Adds a new task at the front of the list.
    pub fn add_task(&mut self, raw_text: &str) -> Result<&Task, ValidationError> {
        let text = match validate(raw_text) {
            Ok(text) => text,
            Err(e) => {
                self.error = Some(e.to_string());
                return Err(e);
            }
        };

        self.loading = true;
        let task = Task {
            id: new_id(),
            text: sanitize(&text),
            completed: false,
            created_at: Utc::now(),
            priority: Priority::Medium,
            category: DEFAULT_CATEGORY.to_string(),
            due_date: None,
            tags: Vec::new(),
            notes: String::new(),
        };
        debug!(id = %task.id, "adding task");
        self.tasks.insert(0, task);
        self.persist();
        self.loading = false;
        Ok(&self.tasks[0])
    }

    /// Flips the completion flag. Unknown ids are ignored.
    pub fn toggle_task(&mut self, id: &str) {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            debug!(id, "toggle ignored, no such task");
            return;
        };
        task.completed = !task.completed;
        debug!(id, completed = task.completed, "toggled task");
        self.persist();
    }

    /// Removes a task. Unknown ids are ignored.
    pub fn delete_task(&mut self, id: &str) {
        let len_before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        if self.tasks.len() == len_before {
            debug!(id, "delete ignored, no such task");
            return;
        }
        debug!(id, "deleted task");
        self.persist();
    }

    /// Merges `update` into the task with `id`.
    ///
    /// New text is validated first; if it is rejected nothing is changed.
    /// Unknown ids are ignored.
    pub fn update_task(&mut self, id: &str, update: TaskUpdate) -> Result<(), ValidationError> {
        let text = match update.text.as_deref().map(validate).transpose() {
            Ok(text) => text,
            Err(e) => {
                self.error = Some(e.to_string());
                return Err(e);
            }
        };
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            debug!(id, "update ignored, no such task");
            return Ok(());
        };

        if let Some(text) = text { task.text = sanitize(&text); }
        if let Some(completed) = update.completed { task.completed = completed; }
        if let Some(priority) = update.priority { task.priority = priority; }
        if let Some(category) = update.category { task.category = category; }
        if let Some(due_date) = update.due_date { task.due_date = due_date; }
        if let Some(tags) = update.tags { task.tags = tags; }
        if let Some(notes) = update.notes { task.notes = notes; }

        debug!(id, "updated task");
        self.persist();
        Ok(())
    }

    /// Removes every completed task and returns how many were removed.
    pub fn clear_completed(&mut self) -> usize {
        let len_before = self.tasks.len();
        self.tasks.retain(|t| !t.completed);
        let removed = len_before - self.tasks.len();
        if removed > 0 {
            debug!(removed, "cleared completed tasks");
            self.persist();
        }
        removed
    }

    fn persist(&mut self) {
        match self.storage.save(&self.tasks) {
            Ok(()) => self.error = None,
            Err(_) => self.error = Some(STORAGE_FAILED.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn loading_flag_is_reset_after_add() {
        let mut store = TaskStore::open(TaskStorage::new(MemoryStore::new()));
        store.add_task("Call mom").unwrap();
        assert!(!store.is_loading());
    }

    #[test]
    fn dispose_returns_storage_with_saved_state() {
        let mut store = TaskStore::open(TaskStorage::new(MemoryStore::new()));
        store.add_task("Book dentist").unwrap();
        let storage = store.dispose();
        assert_eq!(storage.load().len(), 1);
    }
}
