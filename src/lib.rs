//! # Todust
//!
//! A small task-list engine with local persistence, plus the `todust` CLI that
//! drives it.
//!
//! ## Modules
//!
//! *   `validation`: task text checks and id generation.
//! *   `storage`: key-value backends and the task collection load/save contract.
//! *   `store`: the `TaskStore`, which owns the collection and persists every change.
//! *   `filter`: search and filter criteria applied to a task list.
//! *   `commands`: the CLI front end.
//!
//! ## Example
//!
//! ```no_run
//! use todust::filter::{visible, Criteria, StatusFilter};
//! use todust::storage::{FileStore, TaskStorage};
//! use todust::store::TaskStore;
//!
//! let mut store = TaskStore::open(TaskStorage::new(FileStore::open_default()));
//! store.add_task("Buy milk").unwrap();
//!
//! let criteria = Criteria { status: StatusFilter::Active, ..Criteria::default() };
//! for task in visible(store.tasks(), &criteria) {
//!     println!("{}", task.text);
//! }
//! println!("{}", store.stats().title());
//! ```
//!
//! ## Data Storage
//!
//! Tasks are saved as a single JSON array in `todos.json` inside your local
//! data directory (`~/.local/share/todust` on Linux). Set `TODUST_DATA_DIR`
//! to override it.

pub mod commands;
pub mod error;
pub mod filter;
pub mod models;
pub mod storage;
pub mod store;
pub mod validation;

pub use error::{Error, Result, ValidationError};
