//! Task operations
//!
//! Thin compositions of the table access layer and the query builder over
//! the `tasks` table.

use chrono::Duration;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::clock::parse_timestamp;
use crate::database::Database;
use crate::document::{fields as record_fields, Record, RecordId, Table};
use crate::error::{DbError, DbResult};
use crate::models::{fields, NewTask, Priority, Task, TaskEdit, TaskFilter};
use crate::query::{Direction, Query};

/// How many tasks `get_top_priority_tasks` returns at most
pub const TOP_PRIORITY_LIMIT: usize = 5;

/// Aggregate counts over the tasks table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseStats {
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub pending_tasks: usize,
    pub high_priority: usize,
    pub medium_priority: usize,
    pub low_priority: usize,
    /// Serialized document size in bytes
    pub database_size: usize,
}

impl DatabaseStats {
    /// Size formatted for display, e.g. `1.4 KB`
    pub fn database_size_human(&self) -> String {
        format_size(self.database_size)
    }
}

fn format_size(bytes: usize) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}

fn priority_of(record: &Record) -> Option<&str> {
    record.get(fields::PRIORITY).and_then(Value::as_str)
}

impl Database {
    /// Id for the next task: the current time in milliseconds, bumped past
    /// the largest existing numeric id so two tasks added within the same
    /// millisecond still get distinct ids
    pub fn next_task_id(&self) -> DbResult<i64> {
        let now_ms = self.now().timestamp_millis();
        let max_existing = self
            .select_all(Table::Tasks)?
            .iter()
            .filter_map(|r| r.id().and_then(Value::as_i64))
            .max();

        match max_existing {
            Some(max) if max >= now_ms => max.checked_add(1).ok_or_else(|| {
                DbError::InvalidRecord(format!("no task id left after {}", max))
            }),
            _ => Ok(now_ms),
        }
    }

    /// Create a task. New tasks always start incomplete.
    pub fn add_new_task(&mut self, new_task: NewTask) -> DbResult<Task> {
        let id = self.next_task_id()?;
        let stored = self.insert(Table::Tasks, new_task.into_record(id))?;
        info!("Added task {}", id);
        Task::from_record(&stored)
    }

    pub fn get_task(&self, id: impl Into<RecordId>) -> DbResult<Task> {
        Task::from_record(&self.select_by_id(Table::Tasks, id)?)
    }

    /// Tasks matching `filter`, in insertion order
    ///
    /// Records that do not decode as tasks are skipped with a warning.
    pub fn list_tasks(&self, filter: TaskFilter) -> DbResult<Vec<Task>> {
        let records = self.select_where(Table::Tasks, |r| filter.matches_record(r))?;
        Ok(Task::from_records(&records))
    }

    pub fn get_pending_tasks(&self) -> DbResult<Vec<Task>> {
        self.list_tasks(TaskFilter::Pending)
    }

    /// Set only the `completed` flag
    pub fn update_task_status(&mut self, id: impl Into<RecordId>, completed: bool) -> DbResult<Task> {
        let mut partial = Map::new();
        partial.insert(fields::COMPLETED.to_string(), Value::Bool(completed));
        let updated = self.update(Table::Tasks, id, partial)?;
        Task::from_record(&updated)
    }

    /// Flip the `completed` flag
    pub fn toggle_task(&mut self, id: impl Into<RecordId>) -> DbResult<Task> {
        let id = id.into();
        let current = self.select_by_id(Table::Tasks, &id)?;
        self.update_task_status(&id, !current.is_truthy(fields::COMPLETED))
    }

    /// Apply an edit. An empty edit leaves the task untouched.
    pub fn edit_task(&mut self, id: impl Into<RecordId>, edit: TaskEdit) -> DbResult<Task> {
        let id = id.into();
        if edit.is_empty() {
            debug!("Empty edit for task {}", id);
            return self.get_task(&id);
        }
        let updated = self.update(Table::Tasks, &id, edit.into_partial())?;
        Task::from_record(&updated)
    }

    pub fn delete_task(&mut self, id: impl Into<RecordId>) -> DbResult<String> {
        self.delete(Table::Tasks, id)
    }

    /// Delete completed tasks last updated more than `days_old` days ago
    ///
    /// Records are deleted one at a time. If a delete fails, tasks removed
    /// before it stay removed; wrap the call in a transaction to make the
    /// batch all-or-nothing. Returns the deleted records as stored, since
    /// imported rows need not decode as [`Task`].
    pub fn delete_old_completed_tasks(&mut self, days_old: u32) -> DbResult<Vec<Record>> {
        let cutoff = self.now() - Duration::days(i64::from(days_old));

        let stale = self.select_where(Table::Tasks, |r| {
            if !r.is_truthy(fields::COMPLETED) {
                return false;
            }
            match r.updated_at().and_then(parse_timestamp) {
                Some(updated) => updated < cutoff,
                None => {
                    warn!("Task {:?} has no readable updatedAt; skipping", r.id());
                    false
                }
            }
        })?;

        let mut purged = Vec::with_capacity(stale.len());
        for record in stale {
            let Some(id) = record.id().cloned() else {
                warn!("Completed task without an id; skipping");
                continue;
            };
            self.delete(Table::Tasks, RecordId::from(id))?;
            purged.push(record);
        }

        info!(
            "Purged {} completed task(s) older than {} day(s)",
            purged.len(),
            days_old
        );
        Ok(purged)
    }

    /// Up to five incomplete high-priority tasks, newest first
    pub fn get_top_priority_tasks(&self) -> DbResult<Vec<Task>> {
        let records = Query::table(Table::Tasks)
            .filter(|r| {
                priority_of(r) == Some(Priority::High.as_str()) && !r.is_truthy(fields::COMPLETED)
            })
            .order_by(record_fields::CREATED_AT, Direction::Descending)
            .limit(TOP_PRIORITY_LIMIT)
            .execute(self)?;
        Ok(Task::from_records(&records))
    }

    /// Counts over the tasks table plus the serialized document size
    pub fn get_database_stats(&self) -> DbResult<DatabaseStats> {
        let raw = self.raw_document()?;
        let tasks = self.select_all(Table::Tasks)?;

        let completed = tasks
            .iter()
            .filter(|r| r.is_truthy(fields::COMPLETED))
            .count();
        let with_priority = |p: Priority| {
            tasks
                .iter()
                .filter(|r| priority_of(r) == Some(p.as_str()))
                .count()
        };

        Ok(DatabaseStats {
            total_tasks: tasks.len(),
            completed_tasks: completed,
            pending_tasks: tasks.len() - completed,
            high_priority: with_priority(Priority::High),
            medium_priority: with_priority(Priority::Medium),
            low_priority: with_priority(Priority::Low),
            database_size: raw.len(),
        })
    }
}
