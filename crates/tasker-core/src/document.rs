//! Database document model
//!
//! The whole database is one JSON document:
//!
//! ```text
//! {
//!   "tasks": [...], "users": [...], "categories": [...],
//!   "metadata": { "created": "2024-03-01T09:30:00.000Z", "version": 1 }
//! }
//! ```
//!
//! A document is always read and written as a whole. Records are plain
//! JSON objects; the access layer only relies on their `id`, `createdAt`
//! and `updatedAt` fields.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::clock::format_timestamp;
use crate::error::{DbError, DbResult};

/// Storage key holding the serialized document
pub const DB_KEY: &str = "task_management_db";

/// Suffix of the key holding a transaction snapshot
pub const BACKUP_SUFFIX: &str = "_backup";

/// Schema version written into new documents
pub const DOCUMENT_VERSION: u32 = 1;

/// Storage key holding the transaction snapshot
pub fn backup_key() -> String {
    format!("{}{}", DB_KEY, BACKUP_SUFFIX)
}

/// Record field names maintained by the access layer
pub mod fields {
    pub const ID: &str = "id";
    pub const CREATED_AT: &str = "createdAt";
    pub const UPDATED_AT: &str = "updatedAt";
}

/// The fixed set of tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Tasks,
    Users,
    Categories,
}

impl Table {
    pub const ALL: [Table; 3] = [Table::Tasks, Table::Users, Table::Categories];

    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Tasks => "tasks",
            Table::Users => "users",
            Table::Categories => "categories",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Table {
    type Err = DbError;

    fn from_str(s: &str) -> DbResult<Self> {
        Table::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| DbError::UnknownTable(s.to_string()))
    }
}

/// A record id as stored in the `id` field
///
/// Task ids are millisecond timestamps, but imported documents may carry
/// string ids, so ids compare as JSON values.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordId(Value);

impl RecordId {
    /// Parse user input: integers become numeric ids, anything else a string id
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        match trimmed.parse::<i64>() {
            Ok(n) => RecordId(Value::from(n)),
            Err(_) => RecordId(Value::from(trimmed)),
        }
    }

    /// Whether a stored `id` value refers to this id
    pub fn matches(&self, value: &Value) -> bool {
        match (&self.0, value) {
            (Value::Number(a), Value::Number(b)) => same_number(a, b),
            (a, b) => a == b,
        }
    }
}

/// Integers compare exactly; only fractional ids go through f64, so large
/// ids never alias their neighbours
fn same_number(a: &Number, b: &Number) -> bool {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        x == y
    } else if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        x == y
    } else if a.is_f64() || b.is_f64() {
        a.as_f64() == b.as_f64()
    } else {
        false
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Value::String(s) => f.write_str(s),
            other => write!(f, "{}", other),
        }
    }
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        RecordId(Value::from(id))
    }
}

impl From<u64> for RecordId {
    fn from(id: u64) -> Self {
        RecordId(Value::from(id))
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        RecordId(Value::from(id))
    }
}

impl From<String> for RecordId {
    fn from(id: String) -> Self {
        RecordId(Value::from(id))
    }
}

impl From<Value> for RecordId {
    fn from(id: Value) -> Self {
        RecordId(id)
    }
}

impl From<&RecordId> for RecordId {
    fn from(id: &RecordId) -> Self {
        id.clone()
    }
}

/// One row of a table: a JSON object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from a JSON value, which must be an object
    pub fn from_value(value: Value) -> DbResult<Self> {
        match value {
            Value::Object(map) => Ok(Record(map)),
            other => Err(DbError::InvalidRecord(format!(
                "expected a JSON object, got {}",
                other
            ))),
        }
    }

    /// Builder-style field setter
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(field.into(), value.into())
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.0.remove(field)
    }

    pub fn id(&self) -> Option<&Value> {
        self.0.get(fields::ID)
    }

    pub fn has_id(&self, id: &RecordId) -> bool {
        self.id().is_some_and(|value| id.matches(value))
    }

    pub fn created_at(&self) -> Option<&str> {
        self.0.get(fields::CREATED_AT).and_then(Value::as_str)
    }

    pub fn updated_at(&self) -> Option<&str> {
        self.0.get(fields::UPDATED_AT).and_then(Value::as_str)
    }

    /// JavaScript-style truthiness of a field; missing fields are falsy
    pub fn is_truthy(&self, field: &str) -> bool {
        match self.0.get(field) {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
            Some(Value::String(s)) => !s.is_empty(),
            Some(Value::Array(_)) | Some(Value::Object(_)) => true,
        }
    }

    /// Stamp both audit timestamps
    pub(crate) fn stamp_created(&mut self, now: DateTime<Utc>) {
        let ts = format_timestamp(now);
        self.0.insert(fields::CREATED_AT.to_string(), Value::from(ts.clone()));
        self.0.insert(fields::UPDATED_AT.to_string(), Value::from(ts));
    }

    /// Shallow merge: keys in `partial` replace stored keys, others stay
    pub(crate) fn merge(&mut self, partial: Map<String, Value>) {
        for (key, value) in partial {
            self.0.insert(key, value);
        }
    }

    pub(crate) fn touch(&mut self, now: DateTime<Utc>) {
        self.0.insert(
            fields::UPDATED_AT.to_string(),
            Value::from(format_timestamp(now)),
        );
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Record(map)
    }
}

/// Document metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// When the document was first created (RFC 3339)
    pub created: String,
    /// Schema version
    pub version: u32,
}

/// The whole database
///
/// The three tables are required fields: a document missing any of them
/// fails to parse. Unknown top-level keys are kept so export/import does
/// not lose data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub tasks: Vec<Record>,
    pub users: Vec<Record>,
    pub categories: Vec<Record>,
    pub metadata: Metadata,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Document {
    /// Create an empty document
    pub fn new(created: DateTime<Utc>) -> Self {
        Self {
            tasks: Vec::new(),
            users: Vec::new(),
            categories: Vec::new(),
            metadata: Metadata {
                created: format_timestamp(created),
                version: DOCUMENT_VERSION,
            },
            extra: Map::new(),
        }
    }

    pub fn table(&self, table: Table) -> &Vec<Record> {
        match table {
            Table::Tasks => &self.tasks,
            Table::Users => &self.users,
            Table::Categories => &self.categories,
        }
    }

    pub fn table_mut(&mut self, table: Table) -> &mut Vec<Record> {
        match table {
            Table::Tasks => &mut self.tasks,
            Table::Users => &mut self.users,
            Table::Categories => &mut self.categories,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
