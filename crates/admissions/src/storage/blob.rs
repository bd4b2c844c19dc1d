//! Single-blob backend.
//!
//! The full register lives as one JSON array under [`STORAGE_KEY`] in the
//! `kv` table. Every read deserializes the whole array and every write
//! serializes it back.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, warn};
use uuid::Uuid;

use super::{open_connection, open_memory_connection, RecordStore};
use crate::error::{Error, Result};
use crate::student::{NewStudent, StudentId, StudentPatch, StudentRecord};

/// Key the serialized register is stored under.
pub const STORAGE_KEY: &str = "ps_students_2025";

/// Record store that keeps the whole register in one serialized value.
///
/// A missing value is an empty register. An unreadable value reads as empty
/// but every write fails until it is repaired.
#[derive(Debug)]
pub struct BlobStore {
    path: PathBuf,
    conn: Mutex<Connection>,
    latency: Duration,
}

impl BlobStore {
    /// Open or create a blob store at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let conn = open_connection(&path)?;
        Ok(Self {
            path,
            conn: Mutex::new(conn),
            latency: Duration::ZERO,
        })
    }

    /// Create an in-memory blob store for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn: Mutex::new(open_memory_connection()?),
            latency: Duration::ZERO,
        })
    }

    /// Delay every operation by `latency`, to mimic a slow store.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn pause(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::internal("blob store connection lock poisoned"))
    }

    fn read_raw(conn: &Connection) -> Result<Option<String>> {
        Ok(conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [STORAGE_KEY], |row| {
                row.get(0)
            })
            .optional()?)
    }

    /// Load the register for reading. An unreadable value reads as empty.
    fn load(conn: &Connection) -> Result<Vec<StudentRecord>> {
        let Some(raw) = Self::read_raw(conn)? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str(&raw) {
            Ok(records) => Ok(records),
            Err(e) => {
                warn!(
                    "Stored register under {} is unreadable, treating it as empty: {}",
                    STORAGE_KEY, e
                );
                Ok(Vec::new())
            }
        }
    }

    /// Load the register before rewriting it. An unreadable value is an
    /// error so the write cannot replace records it failed to decode.
    fn load_for_write(conn: &Connection) -> Result<Vec<StudentRecord>> {
        let Some(raw) = Self::read_raw(conn)? else {
            return Ok(Vec::new());
        };

        serde_json::from_str(&raw).map_err(|e| {
            warn!(
                "Refusing to overwrite unreadable register under {}: {}",
                STORAGE_KEY, e
            );
            Error::Json(e)
        })
    }

    fn save(conn: &Connection, records: &[StudentRecord]) -> Result<()> {
        let raw = serde_json::to_string(records)?;
        conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            (STORAGE_KEY, raw),
        )?;
        debug!("Saved {} records under {}", records.len(), STORAGE_KEY);
        Ok(())
    }
}

#[async_trait]
impl RecordStore for BlobStore {
    fn backend_name(&self) -> &'static str {
        "blob"
    }

    async fn list_all(&self) -> Result<Vec<StudentRecord>> {
        self.pause().await;
        let conn = self.lock()?;
        let mut records = Self::load(&conn)?;
        // Stable sort keeps insertion order among equal timestamps
        records.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(records)
    }

    async fn get(&self, id: &StudentId) -> Result<Option<StudentRecord>> {
        self.pause().await;
        let conn = self.lock()?;
        Ok(Self::load(&conn)?.into_iter().find(|r| &r.id == id))
    }

    async fn max_serial(&self) -> Result<Option<u32>> {
        self.pause().await;
        let conn = self.lock()?;
        Ok(Self::load(&conn)?.iter().map(|r| r.serial_no).max())
    }

    async fn insert(
        &self,
        student: NewStudent,
        serial_no: u32,
        timestamp: i64,
    ) -> Result<StudentRecord> {
        self.pause().await;
        let conn = self.lock()?;
        let mut records = Self::load_for_write(&conn)?;

        let id = StudentId::new(Uuid::new_v4().to_string());
        let record = StudentRecord::from_new(id, serial_no, timestamp, student);
        records.push(record.clone());
        Self::save(&conn, &records)?;
        Ok(record)
    }

    async fn update(
        &self,
        id: &StudentId,
        patch: &StudentPatch,
        updated_at: i64,
    ) -> Result<StudentRecord> {
        self.pause().await;
        let conn = self.lock()?;
        let mut records = Self::load_for_write(&conn)?;

        let record = records
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or_else(|| Error::not_found(id.as_str()))?;
        record.apply(patch, updated_at);
        let updated = record.clone();

        Self::save(&conn, &records)?;
        Ok(updated)
    }

    async fn delete(&self, id: &StudentId) -> Result<()> {
        self.pause().await;
        let conn = self.lock()?;
        let mut records = Self::load_for_write(&conn)?;

        let before = records.len();
        records.retain(|r| &r.id != id);
        if records.len() != before {
            Self::save(&conn, &records)?;
        }
        Ok(())
    }
}
