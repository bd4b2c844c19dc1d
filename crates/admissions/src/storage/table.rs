//! Row-per-record backend.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use super::{open_connection, open_memory_connection, RecordStore};
use crate::error::{Error, Result};
use crate::student::{NewStudent, ParseLabelError, StudentId, StudentPatch, StudentRecord};

const SELECT_COLUMNS: &str = "id, serial_no, child_name, father_name, mother_name, age_group, \
     gender, class, previous_school, comes_from_school_coverage_area, \
     comes_from_other_schools, guardian_phone, notes, created_at, updated_at";

/// Record store backed by the `students` table.
///
/// Ids are the table's integer row ids, rendered as strings. The connection
/// sits behind a mutex because `rusqlite::Connection` is not `Sync`; the lock
/// is only held for the duration of a single statement group.
#[derive(Debug)]
pub struct TableStore {
    path: PathBuf,
    conn: Mutex<Connection>,
}

impl TableStore {
    /// Open or create a table store at the given path.
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
        })
    }

    /// Create an in-memory table store for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn: Mutex::new(open_memory_connection()?),
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::internal("table store connection lock poisoned"))
    }

    fn fetch(conn: &Connection, rowid: i64) -> Result<Option<StudentRecord>> {
        let record = conn
            .query_row(
                &format!("SELECT {SELECT_COLUMNS} FROM students WHERE id = ?1"),
                [rowid],
                row_to_record,
            )
            .optional()?;
        Ok(record)
    }
}

#[async_trait]
impl RecordStore for TableStore {
    fn backend_name(&self) -> &'static str {
        "table"
    }

    async fn list_all(&self) -> Result<Vec<StudentRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM students ORDER BY updated_at DESC, id ASC"
        ))?;
        let records = stmt
            .query_map([], row_to_record)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        debug!("Listed {} records", records.len());
        Ok(records)
    }

    async fn get(&self, id: &StudentId) -> Result<Option<StudentRecord>> {
        let Some(rowid) = parse_rowid(id) else {
            return Ok(None);
        };
        let conn = self.lock()?;
        Self::fetch(&conn, rowid)
    }

    async fn max_serial(&self) -> Result<Option<u32>> {
        let conn = self.lock()?;
        let max = conn
            .query_row(
                "SELECT serial_no FROM students ORDER BY serial_no DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;
        Ok(max)
    }

    async fn insert(
        &self,
        student: NewStudent,
        serial_no: u32,
        timestamp: i64,
    ) -> Result<StudentRecord> {
        let conn = self.lock()?;
        conn.execute(
            r"
            INSERT INTO students (
                serial_no, child_name, father_name, mother_name, age_group, gender, class,
                previous_school, comes_from_school_coverage_area, comes_from_other_schools,
                guardian_phone, notes, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            ",
            params![
                serial_no,
                student.child_name,
                student.father_name,
                student.mother_name,
                student.age_group.to_string(),
                student.gender.label(),
                student.class_level.label(),
                student.previous_school,
                student.comes_from_school_coverage_area,
                student.comes_from_other_schools,
                student.guardian_phone,
                student.notes,
                timestamp,
                timestamp,
            ],
        )?;

        let rowid = conn.last_insert_rowid();
        debug!("Inserted student row {} with serial {}", rowid, serial_no);
        Self::fetch(&conn, rowid)?
            .ok_or_else(|| Error::internal(format!("inserted row {rowid} could not be read back")))
    }

    async fn update(
        &self,
        id: &StudentId,
        patch: &StudentPatch,
        updated_at: i64,
    ) -> Result<StudentRecord> {
        let rowid = parse_rowid(id).ok_or_else(|| Error::not_found(id.as_str()))?;
        let conn = self.lock()?;
        let mut record = Self::fetch(&conn, rowid)?.ok_or_else(|| Error::not_found(id.as_str()))?;
        record.apply(patch, updated_at);

        conn.execute(
            r"
            UPDATE students SET
                child_name = ?2, father_name = ?3, mother_name = ?4, age_group = ?5,
                gender = ?6, class = ?7, previous_school = ?8,
                comes_from_school_coverage_area = ?9, comes_from_other_schools = ?10,
                guardian_phone = ?11, notes = ?12, updated_at = ?13
            WHERE id = ?1
            ",
            params![
                rowid,
                record.child_name,
                record.father_name,
                record.mother_name,
                record.age_group.to_string(),
                record.gender.label(),
                record.class_level.label(),
                record.previous_school,
                record.comes_from_school_coverage_area,
                record.comes_from_other_schools,
                record.guardian_phone,
                record.notes,
                record.updated_at,
            ],
        )?;

        debug!("Updated student row {}", rowid);
        Ok(record)
    }

    async fn delete(&self, id: &StudentId) -> Result<()> {
        let Some(rowid) = parse_rowid(id) else {
            return Ok(());
        };
        let conn = self.lock()?;
        let affected = conn.execute("DELETE FROM students WHERE id = ?1", [rowid])?;
        debug!("Deleted {} student row(s) for id {}", affected, rowid);
        Ok(())
    }
}

/// Ids not produced by this backend simply match no row.
fn parse_rowid(id: &StudentId) -> Option<i64> {
    id.as_str().parse().ok()
}

fn parse_column<T>(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = ParseLabelError>,
{
    let text: String = row.get(idx)?;
    text.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Convert a database row to a `StudentRecord`.
fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<StudentRecord> {
    let id: i64 = row.get(0)?;
    Ok(StudentRecord {
        id: StudentId::new(id.to_string()),
        serial_no: row.get(1)?,
        child_name: row.get(2)?,
        father_name: row.get(3)?,
        mother_name: row.get(4)?,
        age_group: parse_column(row, 5)?,
        gender: parse_column(row, 6)?,
        class_level: parse_column(row, 7)?,
        previous_school: row.get(8)?,
        comes_from_school_coverage_area: row.get(9)?,
        comes_from_other_schools: row.get(10)?,
        guardian_phone: row.get(11)?,
        notes: row.get(12)?,
        created_at: row.get(13)?,
        updated_at: row.get(14)?,
    })
}
