//! Table access layer
//!
//! `Database` owns a key/value backend and exposes generic CRUD over the
//! fixed tables. Every operation is a complete read-modify-write of the
//! whole document: load, mutate an in-memory copy, write back. No state is
//! cached between calls.
//!
//! ## Usage
//!
//! ```ignore
//! let mut db = Database::open()?;  // Initializes on first run
//!
//! let record = Record::new().with("id", 1).with("name", "Work");
//! db.insert(Table::Categories, record)?;
//!
//! let all = db.select_all(Table::Categories)?;
//! ```

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::document::{fields, Document, Record, RecordId, Table, DB_KEY};
use crate::error::{DbError, DbResult};
use crate::storage::{open_backend, KeyValueStore, MemoryStore};

/// Confirmation returned by a successful delete
pub const DELETED_MESSAGE: &str = "Record deleted successfully";

/// Handle over the serialized database
pub struct Database {
    store: Box<dyn KeyValueStore>,
    clock: Box<dyn Clock>,
}

impl Database {
    /// Wrap a backend. Does not initialize it.
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self::with_clock(store, Box::new(SystemClock))
    }

    /// Wrap a backend with a custom time source
    pub fn with_clock(store: Box<dyn KeyValueStore>, clock: Box<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// An initialized database held in memory
    pub fn in_memory() -> DbResult<Self> {
        let mut db = Self::new(Box::new(MemoryStore::new()));
        db.initialize()?;
        Ok(db)
    }

    /// Open the database using the default configuration
    pub fn open() -> anyhow::Result<Self> {
        let config = Config::load().context("Failed to load configuration")?;
        Self::open_with_config(&config)
    }

    /// Open the configured backend and initialize it if needed
    pub fn open_with_config(config: &Config) -> anyhow::Result<Self> {
        let store = open_backend(config).context("Failed to open storage backend")?;
        let mut db = Self::new(store);
        db.initialize().context("Failed to initialize database")?;
        Ok(db)
    }

    /// Name of the backend in use
    pub fn backend_name(&self) -> &'static str {
        self.store.backend_name()
    }

    pub(crate) fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    pub(crate) fn store_mut(&mut self) -> &mut dyn KeyValueStore {
        self.store.as_mut()
    }

    /// Current time according to this database's clock
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    // ==================== Document ====================

    /// Create an empty document if none exists
    ///
    /// Idempotent: never overwrites existing data. Returns `true` when a
    /// new document was written.
    pub fn initialize(&mut self) -> DbResult<bool> {
        if self.store.get(DB_KEY)?.is_some() {
            return Ok(false);
        }

        let doc = Document::new(self.now());
        self.save(&doc)?;
        info!("Initialized empty database on {} backend", self.backend_name());
        Ok(true)
    }

    /// Whether a document exists under the database key
    pub fn is_initialized(&self) -> DbResult<bool> {
        Ok(self.store.get(DB_KEY)?.is_some())
    }

    /// The stored document exactly as serialized
    pub fn raw_document(&self) -> DbResult<String> {
        self.store.get(DB_KEY)?.ok_or(DbError::NotInitialized)
    }

    /// Load and parse the whole document
    pub fn load(&self) -> DbResult<Document> {
        let raw = self.raw_document()?;
        Document::from_json(&raw).map_err(|e| DbError::CorruptDocument(e.to_string()))
    }

    /// Serialize and write the whole document
    pub fn save(&mut self, doc: &Document) -> DbResult<()> {
        let json = doc
            .to_json()
            .map_err(|e| DbError::InvalidRecord(e.to_string()))?;
        self.store.set(DB_KEY, &json)?;
        Ok(())
    }

    // ==================== Tables ====================

    /// Append a record to a table
    ///
    /// The record must carry an `id`. `createdAt` and `updatedAt` are set
    /// to now, replacing anything the caller supplied.
    pub fn insert(&mut self, table: Table, mut record: Record) -> DbResult<Record> {
        let mut doc = self.load()?;

        let id = record
            .id()
            .cloned()
            .ok_or_else(|| DbError::InvalidRecord("record has no 'id' field".to_string()))?;

        let rows = doc.table_mut(table);
        if rows.iter().any(|r| r.id() == Some(&id)) {
            warn!("Inserting duplicate id {} into '{}'", id, table);
        }

        record.stamp_created(self.now());
        rows.push(record.clone());
        self.save(&doc)?;

        debug!("Inserted record {} into '{}'", id, table);
        Ok(record)
    }

    /// All records of a table, in insertion order
    pub fn select_all(&self, table: Table) -> DbResult<Vec<Record>> {
        let mut doc = self.load()?;
        Ok(std::mem::take(doc.table_mut(table)))
    }

    /// First record with the given id
    pub fn select_by_id(&self, table: Table, id: impl Into<RecordId>) -> DbResult<Record> {
        let id = id.into();
        let doc = self.load()?;
        doc.table(table)
            .iter()
            .find(|r| r.has_id(&id))
            .cloned()
            .ok_or_else(|| not_found(table, &id))
    }

    /// All records matching `predicate`, in insertion order
    ///
    /// An empty result is a success.
    pub fn select_where<F>(&self, table: Table, predicate: F) -> DbResult<Vec<Record>>
    where
        F: Fn(&Record) -> bool,
    {
        let mut doc = self.load()?;
        let rows = std::mem::take(doc.table_mut(table));
        Ok(rows.into_iter().filter(|r| predicate(r)).collect())
    }

    /// Shallow-merge `partial` into the first record with the given id
    ///
    /// Keys in `partial` replace stored keys; other keys are kept.
    /// `updatedAt` is refreshed. `id` and `createdAt` cannot be changed
    /// through an update and are ignored if present.
    pub fn update(
        &mut self,
        table: Table,
        id: impl Into<RecordId>,
        mut partial: Map<String, Value>,
    ) -> DbResult<Record> {
        let id = id.into();
        let mut doc = self.load()?;

        for protected in [fields::ID, fields::CREATED_AT] {
            if partial.remove(protected).is_some() {
                debug!("Ignoring '{}' in update of {} in '{}'", protected, id, table);
            }
        }

        let now = self.now();
        let record = doc
            .table_mut(table)
            .iter_mut()
            .find(|r| r.has_id(&id))
            .ok_or_else(|| not_found(table, &id))?;

        record.merge(partial);
        record.touch(now);
        let merged = record.clone();

        self.save(&doc)?;
        debug!("Updated record {} in '{}'", id, table);
        Ok(merged)
    }

    /// Remove the first record with the given id
    pub fn delete(&mut self, table: Table, id: impl Into<RecordId>) -> DbResult<String> {
        let id = id.into();
        let mut doc = self.load()?;

        let rows = doc.table_mut(table);
        let before = rows.len();
        if let Some(pos) = rows.iter().position(|r| r.has_id(&id)) {
            rows.remove(pos);
        }
        if rows.len() == before {
            return Err(not_found(table, &id));
        }

        self.save(&doc)?;
        debug!("Deleted record {} from '{}'", id, table);
        Ok(DELETED_MESSAGE.to_string())
    }
}

fn not_found(table: Table, id: &RecordId) -> DbError {
    DbError::RecordNotFound {
        table: table.to_string(),
        id: id.to_string(),
    }
}
