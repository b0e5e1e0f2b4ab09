use chrono::{Duration, Utc};
use todust::error::ValidationError;
use todust::models::{Priority, Stats, TaskUpdate};
use todust::storage::{MemoryStore, TaskStorage, TASKS_KEY};
use todust::store::{TaskStore, STORAGE_FAILED};

fn new_store() -> TaskStore<MemoryStore> {
    TaskStore::open(TaskStorage::new(MemoryStore::new()))
}

fn assert_stats_consistent(stats: Stats) {
    assert_eq!(stats.total, stats.completed + stats.remaining);
}

#[test]
fn test_add_prepends_with_defaults() {
    let mut store = new_store();
    store.add_task("First").unwrap();
    store.add_task("  Second  ").unwrap();

    let tasks = store.tasks();
    assert_eq!(tasks[0].text, "Second");
    assert_eq!(tasks[1].text, "First");
    assert!(!tasks[0].completed);
    assert_eq!(tasks[0].priority, Priority::Medium);
    assert_eq!(tasks[0].category, "personal");
    assert!(tasks[0].tags.is_empty());
    assert_eq!(tasks[0].notes, "");
    assert_eq!(tasks[0].due_date, None);
}

#[test]
fn test_add_same_text_twice() {
    let mut store = new_store();
    let a = store.add_task("Water plants").unwrap().id.clone();
    let b = store.add_task("Water plants").unwrap().id.clone();
    assert_ne!(a, b);
    assert_eq!(store.tasks().len(), 2);
}

#[test]
fn test_add_invalid_text_does_not_mutate() {
    let mut store = new_store();
    assert_eq!(store.add_task("   ").unwrap_err(), ValidationError::EmptyText);
    assert!(store.tasks().is_empty());
    assert_eq!(store.error(), Some("Please enter a task"));
    assert!(store.storage().backend().raw(TASKS_KEY).is_none());

    let too_long = "x".repeat(101);
    assert!(matches!(store.add_task(&too_long), Err(ValidationError::TooLong { .. })));
    assert!(store.tasks().is_empty());
}

#[test]
fn test_every_mutation_is_persisted() {
    let mut store = new_store();
    let id = store.add_task("Persist me").unwrap().id.clone();
    assert_eq!(store.storage().load(), store.tasks());

    store.toggle_task(&id);
    assert!(store.storage().load()[0].completed);

    store.update_task(&id, TaskUpdate { notes: Some("n".into()), ..TaskUpdate::default() }).unwrap();
    assert_eq!(store.storage().load()[0].notes, "n");

    store.delete_task(&id);
    assert!(store.storage().load().is_empty());
}

#[test]
fn test_open_seeds_from_storage() {
    let mut store = new_store();
    store.add_task("Carry over").unwrap();
    let storage = store.dispose();

    let reopened = TaskStore::open(storage);
    assert_eq!(reopened.tasks().len(), 1);
    assert_eq!(reopened.tasks()[0].text, "Carry over");
}

#[test]
fn test_toggle_and_delete_unknown_id_are_noops() {
    let mut store = new_store();
    store.add_task("Stay").unwrap();
    let before = store.tasks().to_vec();
    let stats = store.stats();

    store.toggle_task("missing");
    store.delete_task("missing");

    assert_eq!(store.tasks(), before.as_slice());
    assert_eq!(store.stats(), stats);
}

#[test]
fn test_toggle_twice_restores() {
    let mut store = new_store();
    let id = store.add_task("Flip").unwrap().id.clone();
    store.toggle_task(&id);
    assert!(store.get(&id).unwrap().completed);
    store.toggle_task(&id);
    assert!(!store.get(&id).unwrap().completed);
}

#[test]
fn test_update_keeps_identity() {
    let mut store = new_store();
    let id = store.add_task("old").unwrap().id.clone();
    let created_at = store.get(&id).unwrap().created_at;

    let update: TaskUpdate = serde_json::from_str(
        r#"{"id":"hijacked","createdAt":"1999-12-31T23:59:59Z","text":"new"}"#,
    )
    .unwrap();
    store.update_task(&id, update).unwrap();

    let task = store.get(&id).unwrap();
    assert_eq!(task.id, id);
    assert_eq!(task.created_at, created_at);
    assert_eq!(task.text, "new");
    assert!(store.get("hijacked").is_none());
}

#[test]
fn test_update_merges_fields() {
    let mut store = new_store();
    let id = store.add_task("Plan trip").unwrap().id.clone();
    let due = Utc::now() + Duration::days(10);
    store
        .update_task(
            &id,
            TaskUpdate {
                completed: Some(true),
                priority: Some(Priority::High),
                category: Some("travel".into()),
                due_date: Some(Some(due)),
                tags: Some(vec!["summer".into()]),
                ..TaskUpdate::default()
            },
        )
        .unwrap();

    let task = store.get(&id).unwrap();
    assert_eq!(task.text, "Plan trip");
    assert!(task.completed);
    assert_eq!(task.priority, Priority::High);
    assert_eq!(task.category, "travel");
    assert_eq!(task.due_date, Some(due));
    assert_eq!(task.tags, vec!["summer".to_string()]);

    store.update_task(&id, TaskUpdate { due_date: Some(None), ..TaskUpdate::default() }).unwrap();
    assert_eq!(store.get(&id).unwrap().due_date, None);
}

#[test]
fn test_update_with_invalid_text_changes_nothing() {
    let mut store = new_store();
    let id = store.add_task("Keep me").unwrap().id.clone();
    let result = store.update_task(
        &id,
        TaskUpdate { text: Some("  ".into()), priority: Some(Priority::Low), ..TaskUpdate::default() },
    );
    assert_eq!(result, Err(ValidationError::EmptyText));
    let task = store.get(&id).unwrap();
    assert_eq!(task.text, "Keep me");
    assert_eq!(task.priority, Priority::Medium);
}

#[test]
fn test_update_unknown_id_is_noop() {
    let mut store = new_store();
    store.add_task("Only").unwrap();
    let before = store.tasks().to_vec();
    store.update_task("missing", TaskUpdate { text: Some("x".into()), ..TaskUpdate::default() }).unwrap();
    assert_eq!(store.tasks(), before.as_slice());
}

#[test]
fn test_clear_completed_preserves_order() {
    let mut store = new_store();
    let c = store.add_task("third").unwrap().id.clone();
    let b = store.add_task("second").unwrap().id.clone();
    let a = store.add_task("first").unwrap().id.clone();
    store.toggle_task(&a);
    store.toggle_task(&c);

    assert_eq!(store.clear_completed(), 2);
    assert_eq!(store.tasks().len(), 1);
    assert_eq!(store.tasks()[0].id, b);
    assert_eq!(store.clear_completed(), 0);
}

#[test]
fn test_stats_stay_consistent() {
    let mut store = new_store();
    assert_eq!(store.stats(), Stats::default());
    let ids: Vec<String> = (0..5)
        .map(|i| store.add_task(&format!("task {}", i)).unwrap().id.clone())
        .collect();
    assert_stats_consistent(store.stats());

    store.toggle_task(&ids[0]);
    store.toggle_task(&ids[3]);
    let stats = store.stats();
    assert_eq!(stats, Stats { total: 5, completed: 2, remaining: 3 });
    assert_stats_consistent(stats);

    store.clear_completed();
    assert_eq!(store.stats(), Stats { total: 3, completed: 0, remaining: 3 });
}

#[test]
fn test_stats_title() {
    let mut store = new_store();
    assert!(!store.stats().title().contains("remaining"));
    store.add_task("one").unwrap();
    assert_eq!(store.stats().title(), "Todust (1 remaining)");
}

#[test]
fn test_failed_save_keeps_in_memory_state() {
    let mut store = new_store();
    store.add_task("Saved").unwrap();

    let mut storage = store.dispose();
    storage.backend_mut().set_fail_writes(true);
    let mut store = TaskStore::open(storage);

    store.add_task("Only in memory").unwrap();
    assert_eq!(store.tasks().len(), 2);
    assert_eq!(store.error(), Some(STORAGE_FAILED));
    assert_eq!(store.storage().load().len(), 1);

    let mut storage = store.dispose();
    storage.backend_mut().set_fail_writes(false);
    let mut store = TaskStore::open(storage);
    let id = store.tasks()[0].id.clone();
    store.toggle_task(&id);
    assert_eq!(store.error(), None);
}
