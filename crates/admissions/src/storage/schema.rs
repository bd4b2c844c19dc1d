//! `SQLite` schema definitions.
//!
//! The `students` table backs [`TableStore`](super::TableStore); the `kv`
//! table backs [`BlobStore`](super::BlobStore). Both share the `metadata`
//! table that records the schema version. Statements are applied in steps by
//! [`migrations`](super::migrations).

/// Row-per-record table for the table backend.
pub const CREATE_STUDENTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS students (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    serial_no INTEGER NOT NULL,
    child_name TEXT NOT NULL,
    father_name TEXT NOT NULL,
    mother_name TEXT NOT NULL,
    age_group TEXT NOT NULL,
    gender TEXT NOT NULL,
    class TEXT NOT NULL,
    previous_school TEXT,
    comes_from_school_coverage_area INTEGER NOT NULL,
    comes_from_other_schools INTEGER NOT NULL,
    guardian_phone TEXT NOT NULL,
    notes TEXT,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
)
";

/// Index for the default listing order.
pub const CREATE_UPDATED_AT_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_students_updated_at ON students(updated_at DESC)
";

/// Index for the serial lookup. Not unique: concurrent creates may collide.
pub const CREATE_SERIAL_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_students_serial ON students(serial_no)
";

/// Key-value table holding serialized blobs for the local backend.
pub const CREATE_KV_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS kv (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// Bookkeeping table; holds the schema version.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statements_are_idempotent() {
        for stmt in [
            CREATE_STUDENTS_TABLE,
            CREATE_UPDATED_AT_INDEX,
            CREATE_SERIAL_INDEX,
            CREATE_KV_TABLE,
            CREATE_METADATA_TABLE,
        ] {
            assert!(stmt.contains("IF NOT EXISTS"), "{stmt}");
        }
    }

    #[test]
    fn test_students_table_contains_required_columns() {
        assert!(CREATE_STUDENTS_TABLE.contains("id INTEGER PRIMARY KEY"));
        assert!(CREATE_STUDENTS_TABLE.contains("serial_no INTEGER NOT NULL"));
        assert!(CREATE_STUDENTS_TABLE.contains("child_name TEXT NOT NULL"));
        assert!(CREATE_STUDENTS_TABLE.contains("class TEXT NOT NULL"));
        assert!(CREATE_STUDENTS_TABLE.contains("updated_at INTEGER NOT NULL"));
    }

    #[test]
    fn test_serial_index_is_not_unique() {
        assert!(!CREATE_SERIAL_INDEX.contains("UNIQUE"));
    }
}
