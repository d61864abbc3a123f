//! Tasker Core Library
//!
//! Local persistence and query layer for Tasker, a personal task tracker.
//! The whole database is one JSON document stored under a single key in a
//! key/value backend.
//!
//! # Architecture
//!
//! - **Storage**: opaque blobs in a [`KeyValueStore`] (file, SQLite or memory)
//! - **Database**: generic CRUD over the fixed tables, one full
//!   read-modify-write per call
//! - **Transactions**: whole-document snapshot under a side key, with
//!   rollback
//! - **Queries**: immutable filter/sort/limit descriptors
//! - **Tasks**: task-specific operations built on the above
//!
//! # Quick Start
//!
//! ```text
//! let mut db = Database::open()?;
//!
//! db.add_new_task(NewTask::new("Write report").with_priority(Priority::High))?;
//!
//! let pending = db.get_pending_tasks()?;
//! let top = db.get_top_priority_tasks()?;
//! ```
//!
//! # Modules
//!
//! - `database`: table access layer (main entry point)
//! - `document`: document layout, tables and records
//! - `transaction`: snapshot transactions
//! - `query`: query builder
//! - `tasks`: task operations and statistics
//! - `models`: typed task model
//! - `export`: JSON export/import and XML export
//! - `validation`: task input validation
//! - `storage`: key/value backends
//! - `config`: application configuration

pub mod clock;
pub mod config;
pub mod database;
pub mod document;
pub mod error;
pub mod export;
pub mod models;
pub mod query;
pub mod response;
pub mod storage;
pub mod tasks;
pub mod transaction;
pub mod validation;

pub use clock::{Clock, SystemClock};
pub use config::{Backend, Config};
pub use database::{Database, DELETED_MESSAGE};
pub use document::{Document, Record, RecordId, Table};
pub use error::{DbError, DbResult};
pub use export::{export_file_name, tasks_to_xml};
pub use models::{NewTask, Priority, Task, TaskEdit, TaskFilter};
pub use query::{Direction, Query};
pub use response::Response;
pub use storage::{KeyValueStore, StorageError};
pub use tasks::DatabaseStats;
pub use transaction::Transaction;
pub use validation::{TaskForm, ValidationReport};
