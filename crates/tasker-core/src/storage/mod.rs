//! Storage layer
//!
//! The database is persisted as opaque string blobs under well-known keys
//! in a [`KeyValueStore`]. The store knows nothing about tables or
//! records; it only reads, writes and removes whole blobs.
//!
//! ## Backends
//!
//! - [`FileStore`]: one file per key in the data directory (default)
//! - [`SqliteStore`]: a single `kv_store` table in `tasker.db`
//! - [`MemoryStore`]: process memory, used by tests

pub mod error;
pub mod file;
pub mod memory;
pub mod schema;
pub mod sqlite;

pub use error::{StorageError, StorageResult};
pub use file::FileStore;
pub use memory::MemoryStore;
pub use schema::SCHEMA_VERSION;
pub use sqlite::SqliteStore;

use crate::config::{Backend, Config};

/// A string-keyed blob store
pub trait KeyValueStore {
    /// Read the blob under `key`, `None` if absent
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Write (or replace) the blob under `key`
    fn set(&mut self, key: &str, value: &str) -> StorageResult<()>;

    /// Remove the blob under `key`. Removing an absent key is a no-op.
    fn remove(&mut self, key: &str) -> StorageResult<()>;

    /// Short backend name for status output and logs
    fn backend_name(&self) -> &'static str;
}

/// Open the backend selected by `config`
pub fn open_backend(config: &Config) -> StorageResult<Box<dyn KeyValueStore>> {
    let store: Box<dyn KeyValueStore> = match config.backend {
        Backend::File => Box::new(FileStore::open(&config.data_dir)?),
        Backend::Sqlite => Box::new(SqliteStore::open(&config.sqlite_path())?),
        Backend::Memory => Box::new(MemoryStore::new()),
    };
    tracing::debug!("Opened {} storage backend", store.backend_name());
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn exercise(store: &mut dyn KeyValueStore) {
        assert!(store.get("alpha").unwrap().is_none());

        store.set("alpha", "1").unwrap();
        store.set("beta", "2").unwrap();
        assert_eq!(store.get("alpha").unwrap().as_deref(), Some("1"));
        assert_eq!(store.get("beta").unwrap().as_deref(), Some("2"));

        store.set("alpha", "3").unwrap();
        assert_eq!(store.get("alpha").unwrap().as_deref(), Some("3"));

        store.remove("alpha").unwrap();
        store.remove("alpha").unwrap();
        assert!(store.get("alpha").unwrap().is_none());
        assert_eq!(store.get("beta").unwrap().as_deref(), Some("2"));
    }

    fn config_with(temp_dir: &TempDir, backend: Backend) -> Config {
        Config {
            data_dir: temp_dir.path().to_path_buf(),
            backend,
            ..Config::default()
        }
    }

    #[test]
    fn test_backend_contract_all_backends() {
        for backend in [Backend::File, Backend::Sqlite, Backend::Memory] {
            let temp_dir = TempDir::new().unwrap();
            let mut store = open_backend(&config_with(&temp_dir, backend)).unwrap();
            assert_eq!(store.backend_name(), backend.to_string());
            exercise(store.as_mut());
        }
    }

    #[test]
    fn test_sqlite_backend_uses_configured_path() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_with(&temp_dir, Backend::Sqlite);

        let mut store = open_backend(&config).unwrap();
        store.set("k", "v").unwrap();
        assert!(config.sqlite_path().exists());
    }
}
