//! Task data model
//!
//! Tasks are stored as plain records in the `tasks` table. `Task` is the
//! typed view of such a record; `NewTask` and `TaskEdit` describe the
//! fields a caller may set.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

use crate::document::Record;
use crate::error::{DbError, DbResult};

/// Record field names used by tasks
pub mod fields {
    pub const TITLE: &str = "title";
    pub const DESCRIPTION: &str = "description";
    pub const PRIORITY: &str = "priority";
    pub const CATEGORY: &str = "category";
    pub const DUE_DATE: &str = "dueDate";
    pub const COMPLETED: &str = "completed";
}

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

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

/// Rejected priority string
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Priority must be low, medium, or high (got '{0}')")]
pub struct InvalidPriority(pub String);

impl FromStr for Priority {
    type Err = InvalidPriority;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Priority::ALL
            .into_iter()
            .find(|p| p.as_str() == s.trim().to_ascii_lowercase())
            .ok_or_else(|| InvalidPriority(s.to_string()))
    }
}

/// A task as stored in the `tasks` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i64,
    pub title: String,
    #[serde(
        default,
        deserialize_with = "empty_string_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(
        default,
        deserialize_with = "empty_string_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub category: Option<String>,
    #[serde(
        default,
        deserialize_with = "empty_date_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Decode a stored record
    pub fn from_record(record: &Record) -> DbResult<Self> {
        serde_json::from_value(record.clone().into_value()).map_err(|e| {
            let id = record
                .id()
                .map(|v| v.to_string())
                .unwrap_or_else(|| "?".to_string());
            DbError::InvalidRecord(format!("task {}: {}", id, e))
        })
    }

    /// Decode a list of stored records, skipping any that are not tasks
    pub fn from_records(records: &[Record]) -> Vec<Self> {
        records
            .iter()
            .filter_map(|record| match Task::from_record(record) {
                Ok(task) => Some(task),
                Err(e) => {
                    warn!("Skipping unreadable task record: {}", e);
                    None
                }
            })
            .collect()
    }
}

/// Fields for a task about to be created
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub category: Option<String>,
    pub due_date: Option<NaiveDate>,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Build the record to insert. `completed` always starts false.
    pub fn into_record(self, id: i64) -> Record {
        let mut record = Record::new()
            .with(crate::document::fields::ID, id)
            .with(fields::TITLE, self.title);
        if let Some(description) = self.description {
            record.insert(fields::DESCRIPTION, description);
        }
        record.insert(fields::PRIORITY, self.priority.as_str());
        if let Some(category) = self.category {
            record.insert(fields::CATEGORY, category);
        }
        if let Some(due_date) = self.due_date {
            record.insert(fields::DUE_DATE, due_date.format("%Y-%m-%d").to_string());
        }
        record.insert(fields::COMPLETED, false);
        record
    }
}

/// Changes to an existing task
///
/// `None` leaves a field alone. For optional fields `Some(None)` clears it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TaskEdit {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub priority: Option<Priority>,
    pub category: Option<Option<String>>,
    pub due_date: Option<Option<NaiveDate>>,
}

impl TaskEdit {
    pub fn is_empty(&self) -> bool {
        self == &TaskEdit::default()
    }

    /// The partial field set passed to `Database::update`
    pub fn into_partial(self) -> Map<String, Value> {
        let mut partial = Map::new();
        if let Some(title) = self.title {
            partial.insert(fields::TITLE.into(), Value::from(title));
        }
        if let Some(description) = self.description {
            partial.insert(fields::DESCRIPTION.into(), optional_string(description));
        }
        if let Some(priority) = self.priority {
            partial.insert(fields::PRIORITY.into(), Value::from(priority.as_str()));
        }
        if let Some(category) = self.category {
            partial.insert(fields::CATEGORY.into(), optional_string(category));
        }
        if let Some(due_date) = self.due_date {
            let value = due_date.map(|d| d.format("%Y-%m-%d").to_string());
            partial.insert(fields::DUE_DATE.into(), optional_string(value));
        }
        partial
    }
}

fn optional_string(value: Option<String>) -> Value {
    value.map(Value::from).unwrap_or(Value::Null)
}

/// Which tasks a listing shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskFilter {
    #[default]
    All,
    Pending,
    Completed,
}

impl TaskFilter {
    pub fn matches_record(&self, record: &Record) -> bool {
        match self {
            TaskFilter::All => true,
            TaskFilter::Pending => !record.is_truthy(fields::COMPLETED),
            TaskFilter::Completed => record.is_truthy(fields::COMPLETED),
        }
    }
}

impl FromStr for TaskFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(TaskFilter::All),
            "pending" => Ok(TaskFilter::Pending),
            "completed" | "done" => Ok(TaskFilter::Completed),
            other => Err(format!("Unknown filter '{}'", other)),
        }
    }
}

/// Legacy records store absent text as `""`
fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

fn empty_date_as_none<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn stored(value: Value) -> Record {
        Record::from_value(value).unwrap()
    }

    #[test]
    fn test_priority_parse() {
        assert_eq!("high".parse::<Priority>().unwrap(), Priority::High);
        assert_eq!(" Low ".parse::<Priority>().unwrap(), Priority::Low);
        let err = "urgent".parse::<Priority>().unwrap_err();
        assert!(err.to_string().starts_with("Priority must be low, medium, or high"));
    }

    #[test]
    fn test_task_from_full_record() {
        let record = stored(json!({
            "id": 1709285400000_i64,
            "title": "Write report",
            "description": "Quarterly numbers",
            "priority": "high",
            "category": "Work",
            "dueDate": "2024-03-15",
            "completed": false,
            "createdAt": "2024-03-01T09:30:00.000Z",
            "updatedAt": "2024-03-01T09:30:00.000Z"
        }));

        let task = Task::from_record(&record).unwrap();
        assert_eq!(task.id, 1709285400000);
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.category.as_deref(), Some("Work"));
        assert_eq!(task.due_date, NaiveDate::from_ymd_opt(2024, 3, 15));
        assert!(!task.completed);
    }

    #[test]
    fn test_task_from_legacy_record_with_empty_strings() {
        let record = stored(json!({
            "id": 1,
            "title": "Legacy",
            "description": "",
            "priority": "low",
            "category": "",
            "dueDate": "",
            "completed": true,
            "createdAt": "2024-03-01T09:30:00.000Z",
            "updatedAt": "2024-03-01T09:30:00.000Z"
        }));

        let task = Task::from_record(&record).unwrap();
        assert!(task.description.is_none());
        assert!(task.category.is_none());
        assert!(task.due_date.is_none());
        assert!(task.completed);
    }

    #[test]
    fn test_task_from_record_missing_title_fails() {
        let record = stored(json!({
            "id": 1,
            "createdAt": "2024-03-01T09:30:00.000Z",
            "updatedAt": "2024-03-01T09:30:00.000Z"
        }));

        assert!(matches!(Task::from_record(&record), Err(DbError::InvalidRecord(_))));
    }

    #[test]
    fn test_from_records_skips_unreadable_rows() {
        let good = stored(json!({
            "id": 2,
            "title": "Readable",
            "createdAt": "2024-03-01T09:30:00.000Z",
            "updatedAt": "2024-03-01T09:30:00.000Z"
        }));
        let string_id = stored(json!({
            "id": "legacy-1",
            "title": "Imported",
            "createdAt": "2024-03-01T09:30:00.000Z",
            "updatedAt": "2024-03-01T09:30:00.000Z"
        }));
        let untitled = stored(json!({ "id": 3 }));

        let tasks = Task::from_records(&[string_id, good, untitled]);
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "Readable");
    }

    #[test]
    fn test_new_task_record_layout() {
        let new_task = NewTask {
            title: "Call plumber".into(),
            description: None,
            priority: Priority::High,
            category: Some("Home".into()),
            due_date: NaiveDate::from_ymd_opt(2024, 4, 1),
        };

        assert_eq!(
            new_task.into_record(42).into_value(),
            json!({
                "id": 42,
                "title": "Call plumber",
                "priority": "high",
                "category": "Home",
                "dueDate": "2024-04-01",
                "completed": false
            })
        );
    }

    #[test]
    fn test_task_edit_partial() {
        let edit = TaskEdit {
            title: Some("Renamed".into()),
            description: Some(None),
            due_date: Some(NaiveDate::from_ymd_opt(2024, 5, 1)),
            ..TaskEdit::default()
        };
        assert!(!edit.is_empty());

        let partial = Value::Object(edit.into_partial());
        assert_eq!(
            partial,
            json!({"title": "Renamed", "description": null, "dueDate": "2024-05-01"})
        );
        assert!(TaskEdit::default().is_empty());
    }

    #[test]
    fn test_filter_matching() {
        let done = stored(json!({"id": 1, "completed": true}));
        let open = stored(json!({"id": 2}));

        assert!(TaskFilter::All.matches_record(&done));
        assert!(TaskFilter::Completed.matches_record(&done));
        assert!(!TaskFilter::Pending.matches_record(&done));
        assert!(TaskFilter::Pending.matches_record(&open));
        assert_eq!("done".parse::<TaskFilter>().unwrap(), TaskFilter::Completed);
        assert!("later".parse::<TaskFilter>().is_err());
    }
}
