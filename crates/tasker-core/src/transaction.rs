//! Snapshot transactions
//!
//! `begin` copies the whole stored document, byte for byte, to a backup
//! key. `commit` drops the copy, `rollback` writes it back. This is an undo
//! point around a batch of independent writes, not an isolated
//! transaction: other handles on the same backend see uncommitted state.
//!
//! At most one snapshot exists per backend. A second `begin` while the
//! backup key is occupied fails with `TransactionInProgress`.
//!
//! ```ignore
//! let mut tx = db.begin()?;
//! tx.add_new_task(NewTask::new("Plan sprint"))?;
//! tx.add_new_task(NewTask::new("Book room"))?;
//! tx.rollback()?; // both inserts undone
//! ```

use std::ops::{Deref, DerefMut};

use tracing::{debug, info, warn};

use crate::database::Database;
use crate::document::{backup_key, DB_KEY};
use crate::error::{DbError, DbResult};

/// An open snapshot over a [`Database`]
///
/// Derefs to the database, so every table and task operation is available
/// while the transaction is open. Dropping an unfinished transaction rolls
/// it back.
pub struct Transaction<'db> {
    db: &'db mut Database,
    finished: bool,
}

impl Database {
    /// Snapshot the current document and open a transaction
    pub fn begin(&mut self) -> DbResult<Transaction<'_>> {
        let key = backup_key();
        if self.store().get(&key)?.is_some() {
            return Err(DbError::TransactionInProgress);
        }

        let snapshot = self.raw_document()?;
        self.store_mut().set(&key, &snapshot)?;
        debug!("Transaction started ({} bytes snapshot)", snapshot.len());

        Ok(Transaction {
            db: self,
            finished: false,
        })
    }

    /// Whether a snapshot is waiting under the backup key
    ///
    /// True after a process exited with a transaction still open.
    pub fn has_pending_transaction(&self) -> DbResult<bool> {
        Ok(self.store().get(&backup_key())?.is_some())
    }

    /// Restore a snapshot left behind by an interrupted transaction
    ///
    /// Returns `false` (and logs a warning) when there is nothing to roll
    /// back.
    pub fn rollback_pending(&mut self) -> DbResult<bool> {
        self.restore_snapshot()
    }

    fn restore_snapshot(&mut self) -> DbResult<bool> {
        let key = backup_key();
        let snapshot = self.store().get(&key)?;
        match snapshot {
            Some(snapshot) => {
                self.store_mut().set(DB_KEY, &snapshot)?;
                self.store_mut().remove(&key)?;
                info!("Transaction rolled back");
                Ok(true)
            }
            None => {
                warn!("No transaction to roll back");
                Ok(false)
            }
        }
    }

    fn discard_snapshot(&mut self) -> DbResult<()> {
        self.store_mut().remove(&backup_key())?;
        Ok(())
    }
}

impl Transaction<'_> {
    /// Keep all changes made since `begin`
    pub fn commit(mut self) -> DbResult<()> {
        self.finished = true;
        self.db.discard_snapshot()?;
        info!("Transaction committed");
        Ok(())
    }

    /// Restore the document as it was at `begin`
    ///
    /// Returns `false` if the snapshot had already disappeared.
    pub fn rollback(mut self) -> DbResult<bool> {
        self.finished = true;
        self.db.restore_snapshot()
    }
}

impl Deref for Transaction<'_> {
    type Target = Database;

    fn deref(&self) -> &Database {
        self.db
    }
}

impl DerefMut for Transaction<'_> {
    fn deref_mut(&mut self) -> &mut Database {
        self.db
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        warn!("Transaction dropped without commit or rollback; rolling back");
        if let Err(e) = self.db.restore_snapshot() {
            warn!("Rollback of dropped transaction failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Record, Table};
    use crate::storage::{KeyValueStore, MemoryStore};

    fn raw(db: &Database) -> String {
        db.raw_document().unwrap()
    }

    #[test]
    fn test_rollback_restores_exact_bytes() {
        let mut db = Database::in_memory().unwrap();
        db.insert(Table::Tasks, Record::new().with("id", 1).with("title", "keep"))
            .unwrap();
        let before = raw(&db);

        let mut tx = db.begin().unwrap();
        tx.insert(Table::Tasks, Record::new().with("id", 2)).unwrap();
        tx.insert(Table::Tasks, Record::new().with("id", 3)).unwrap();
        assert_eq!(tx.select_all(Table::Tasks).unwrap().len(), 3);
        assert!(tx.rollback().unwrap());

        assert_eq!(raw(&db), before);
        assert!(!db.has_pending_transaction().unwrap());
    }

    #[test]
    fn test_commit_keeps_changes() {
        let mut db = Database::in_memory().unwrap();

        let mut tx = db.begin().unwrap();
        tx.insert(Table::Users, Record::new().with("id", 1)).unwrap();
        tx.commit().unwrap();

        assert_eq!(db.select_all(Table::Users).unwrap().len(), 1);
        assert!(!db.has_pending_transaction().unwrap());
    }

    #[test]
    fn test_drop_rolls_back() {
        let mut db = Database::in_memory().unwrap();
        let before = raw(&db);

        {
            let mut tx = db.begin().unwrap();
            tx.insert(Table::Tasks, Record::new().with("id", 1)).unwrap();
        }

        assert_eq!(raw(&db), before);
        assert!(!db.has_pending_transaction().unwrap());
    }

    #[test]
    fn test_begin_refuses_existing_snapshot() {
        let mut store = MemoryStore::new();
        store.set(&backup_key(), "{}").unwrap();
        let mut db = Database::new(Box::new(store));
        db.initialize().unwrap();

        assert!(db.has_pending_transaction().unwrap());
        assert!(matches!(db.begin(), Err(DbError::TransactionInProgress)));
    }

    #[test]
    fn test_begin_requires_initialized_store() {
        let mut db = Database::new(Box::new(MemoryStore::new()));
        assert!(matches!(db.begin(), Err(DbError::NotInitialized)));
        assert!(!db.has_pending_transaction().unwrap());
    }

    #[test]
    fn test_rollback_pending_without_snapshot_changes_nothing() {
        let mut db = Database::in_memory().unwrap();
        db.insert(Table::Tasks, Record::new().with("id", 1)).unwrap();
        let before = raw(&db);

        assert!(!db.rollback_pending().unwrap());
        assert_eq!(raw(&db), before);
    }

    #[test]
    fn test_rollback_pending_restores_leftover_snapshot() {
        let mut db = Database::in_memory().unwrap();
        let before = raw(&db);

        let mut tx = db.begin().unwrap();
        tx.insert(Table::Tasks, Record::new().with("id", 1)).unwrap();
        // Simulate a process dying with the transaction open
        std::mem::forget(tx);

        assert!(db.has_pending_transaction().unwrap());
        assert!(db.rollback_pending().unwrap());
        assert_eq!(raw(&db), before);
    }

    #[test]
    fn test_new_transaction_after_commit() {
        let mut db = Database::in_memory().unwrap();
        db.begin().unwrap().commit().unwrap();
        let tx = db.begin().unwrap();
        tx.commit().unwrap();
    }
}
