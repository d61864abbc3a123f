//! Storage errors
//!
//! Every backend failure is reported as a [`StorageError`]. Filesystem
//! errors are classified by kind so the CLI can print a hint next to the
//! message.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure of a key/value backend
#[derive(Error, Debug)]
pub enum StorageError {
    /// The data directory could not be created
    #[error("Failed to create data directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Permission denied: cannot access '{path}'. Check file permissions.")]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("No space left while writing '{path}'. Free up disk space and try again.")]
    DiskFull {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Reading a stored value failed for a reason other than permissions
    #[error("Failed to read '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Writing a stored value failed for an unclassified reason
    #[error("Failed to write '{path}': {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Key cannot be mapped onto a file name
    #[error("Invalid storage key '{key}': only ASCII letters, digits, '_', '-' and '.' are allowed")]
    InvalidKey { key: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("File not found: '{path}'")]
    NotFound { path: PathBuf },

    /// The temp file was written but could not replace the stored value
    #[error("Atomic write failed: could not rename '{from}' to '{to}': {source}")]
    AtomicWriteFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl StorageError {
    /// Classify an I/O error raised while writing `path`
    pub fn from_io(error: io::Error, path: PathBuf) -> Self {
        match error.kind() {
            io::ErrorKind::PermissionDenied => StorageError::PermissionDenied {
                path,
                source: error,
            },
            io::ErrorKind::NotFound => StorageError::NotFound { path },
            _ if is_disk_full_error(&error) => StorageError::DiskFull {
                path,
                source: error,
            },
            _ => StorageError::WriteError {
                path,
                source: error,
            },
        }
    }

    /// Same classification as [`from_io`](Self::from_io), but unclassified
    /// failures are reported as read errors
    pub fn from_read_io(error: io::Error, path: PathBuf) -> Self {
        match error.kind() {
            io::ErrorKind::PermissionDenied | io::ErrorKind::NotFound => {
                Self::from_io(error, path)
            }
            _ => StorageError::ReadError {
                path,
                source: error,
            },
        }
    }

    /// Hint shown under the error message, when there is something the user can do
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            StorageError::DiskFull { .. } => Some("Free up disk space and try again."),
            StorageError::PermissionDenied { .. } => {
                Some("Check the permissions of the data directory, or point data_dir somewhere writable with `tasker config set data_dir <path>`.")
            }
            StorageError::CreateDirectory { .. } => {
                Some("Check that the parent directory exists and is writable.")
            }
            StorageError::Database(_) => {
                Some("The SQLite file may be locked or damaged. Switch to the file backend with `tasker config set backend file` to keep working.")
            }
            _ => None,
        }
    }
}

fn is_disk_full_error(error: &io::Error) -> bool {
    let msg = error.to_string().to_lowercase();
    msg.contains("no space left") || msg.contains("disk full") || msg.contains("quota exceeded")
}

pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn db_file() -> PathBuf {
        PathBuf::from("/var/lib/tasker/task_management_db.json")
    }

    #[test]
    fn test_write_failures_are_classified() {
        let denied = StorageError::from_io(
            io::Error::new(io::ErrorKind::PermissionDenied, "read-only data dir"),
            db_file(),
        );
        assert!(matches!(denied, StorageError::PermissionDenied { .. }));
        assert!(denied.to_string().contains("task_management_db.json"));
        assert!(denied
            .recovery_suggestion()
            .is_some_and(|hint| hint.contains("data_dir")));

        let full = StorageError::from_io(
            io::Error::new(io::ErrorKind::Other, "No space left on device (os error 28)"),
            db_file(),
        );
        assert!(matches!(full, StorageError::DiskFull { .. }));

        let other = StorageError::from_io(
            io::Error::new(io::ErrorKind::Interrupted, "interrupted"),
            db_file(),
        );
        assert!(matches!(other, StorageError::WriteError { .. }));
        assert!(other.recovery_suggestion().is_none());
    }

    #[test]
    fn test_read_failures_are_classified() {
        let garbled = StorageError::from_read_io(
            io::Error::new(io::ErrorKind::InvalidData, "stream did not contain valid UTF-8"),
            db_file(),
        );
        assert!(matches!(garbled, StorageError::ReadError { .. }));

        let missing = StorageError::from_read_io(
            io::Error::new(io::ErrorKind::NotFound, "gone"),
            PathBuf::from("/var/lib/tasker/task_management_db_backup.json"),
        );
        assert!(matches!(missing, StorageError::NotFound { .. }));
    }

    #[test]
    fn test_invalid_key_has_no_hint() {
        let err = StorageError::InvalidKey {
            key: "../task_management_db".to_string(),
        };
        assert!(err.to_string().contains("'../task_management_db'"));
        assert!(err.recovery_suggestion().is_none());
    }
}
