//! Persistence for student records.
//!
//! [`RecordStore`] is the contract the lifecycle service talks to. Two
//! backends implement it with the same observable behavior:
//!
//! - [`TableStore`]: one row per record in a `students` table; ordering and
//!   lookups are done by SQL.
//! - [`BlobStore`]: the whole register serialized as a single JSON value under
//!   one fixed key in a local key-value table.
//!
//! The backend is picked once at startup by [`open_store`].

mod blob;
pub mod migrations;
pub mod schema;
mod table;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use rusqlite::Connection;
use tracing::{debug, info};

use crate::config::{Config, StorageBackend};
use crate::error::{Error, Result};
use crate::student::{NewStudent, StudentId, StudentPatch, StudentRecord};

pub use blob::{BlobStore, STORAGE_KEY};
pub use table::TableStore;

/// Keyed collection of student records.
///
/// Every operation may suspend. Implementations do no locking between
/// operations: two callers that read, compute and write concurrently can
/// overwrite each other.
#[async_trait]
pub trait RecordStore: Send + Sync + std::fmt::Debug {
    /// Short name of the backend, for logs and status output.
    fn backend_name(&self) -> &'static str;

    /// All records, most recently updated first.
    ///
    /// Records with equal `updated_at` keep their insertion order.
    async fn list_all(&self) -> Result<Vec<StudentRecord>>;

    /// A single record, or `None` if no record has this id.
    async fn get(&self, id: &StudentId) -> Result<Option<StudentRecord>>;

    /// Highest serial number currently stored.
    async fn max_serial(&self) -> Result<Option<u32>> {
        let records = self.list_all().await?;
        Ok(records.iter().map(|r| r.serial_no).max())
    }

    /// Store a new record. The backend assigns the id.
    async fn insert(
        &self,
        student: NewStudent,
        serial_no: u32,
        timestamp: i64,
    ) -> Result<StudentRecord>;

    /// Merge `patch` into an existing record and stamp `updated_at`.
    ///
    /// Fails with [`Error::NotFound`] if the id is unknown.
    async fn update(
        &self,
        id: &StudentId,
        patch: &StudentPatch,
        updated_at: i64,
    ) -> Result<StudentRecord>;

    /// Remove a record. Unknown ids are not an error.
    async fn delete(&self, id: &StudentId) -> Result<()>;
}

/// Open the backend selected in the configuration.
///
/// # Errors
///
/// Returns an error if the database file cannot be opened or initialized.
pub fn open_store(config: &Config) -> Result<Box<dyn RecordStore>> {
    let store: Box<dyn RecordStore> = match config.storage.backend {
        StorageBackend::Table => Box::new(TableStore::open(config.database_path())?),
        StorageBackend::Blob => Box::new(
            BlobStore::open(config.local_store_path())?.with_latency(config.simulated_latency()),
        ),
    };
    info!("Using {} record store", store.backend_name());
    Ok(store)
}

/// Open (creating if needed) a database file and bring its schema up to date.
fn open_connection(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }

    debug!("Opening database at {}", path.display());
    let conn = Connection::open(path).map_err(|source| Error::DatabaseOpen {
        path: path.to_path_buf(),
        source,
    })?;

    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
    migrations::initialize_schema(&conn)?;

    info!("Database opened at {}", path.display());
    Ok(conn)
}

/// In-memory database with the schema applied.
fn open_memory_connection() -> Result<Connection> {
    let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
        path: PathBuf::from(":memory:"),
        source,
    })?;
    migrations::initialize_schema(&conn)?;
    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_db_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "admissions_storage_{name}_{}/nested/register.db",
            std::process::id()
        ))
    }

    fn cleanup(path: &Path) {
        if let Some(dir) = path.parent().and_then(Path::parent) {
            let _ = std::fs::remove_dir_all(dir);
        }
    }

    #[test]
    fn test_open_connection_creates_parent_dirs() {
        let path = temp_db_path("parents");
        cleanup(&path);

        let conn = open_connection(&path).unwrap();
        assert!(path.exists());

        drop(conn);
        cleanup(&path);
    }

    #[tokio::test]
    async fn test_open_store_selects_backend() {
        let path = temp_db_path("select");
        cleanup(&path);

        let mut config = Config::default();
        config.storage.database_path = Some(path.clone());
        config.storage.local_store_path = Some(path.with_file_name("local.db"));

        config.storage.backend = StorageBackend::Table;
        let store = open_store(&config).unwrap();
        assert_eq!(store.backend_name(), "table");
        drop(store);

        config.storage.backend = StorageBackend::Blob;
        let store = open_store(&config).unwrap();
        assert_eq!(store.backend_name(), "blob");
        assert!(store.list_all().await.unwrap().is_empty());
        drop(store);

        cleanup(&path);
    }
}
