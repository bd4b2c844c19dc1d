//! Schema bootstrap and upgrades.
//!
//! The schema is built up by an ordered list of steps. The number of steps
//! applied so far is stored in the `metadata` table; opening a database runs
//! whatever steps it has not seen yet, each in its own transaction.

use rusqlite::Connection;
use tracing::{debug, info};

use crate::error::{Error, Result};

use super::schema::{
    CREATE_KV_TABLE, CREATE_METADATA_TABLE, CREATE_SERIAL_INDEX, CREATE_STUDENTS_TABLE,
    CREATE_UPDATED_AT_INDEX,
};

/// Step `n` (zero-based) takes the database to version `n + 1`.
const STEPS: &[&[&str]] = &[
    // v1: row-per-record register
    &[
        CREATE_STUDENTS_TABLE,
        CREATE_UPDATED_AT_INDEX,
        CREATE_SERIAL_INDEX,
    ],
    // v2: key-value table for the single-blob register
    &[CREATE_KV_TABLE],
];

/// Schema version written by this build.
pub const CURRENT_VERSION: usize = STEPS.len();

const VERSION_KEY: &str = "schema_version";

/// Create or upgrade the schema.
///
/// # Errors
///
/// Returns an error if a step fails, if the stored version is unreadable, or
/// if the database was written by a newer build.
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    conn.execute(CREATE_METADATA_TABLE, [])?;

    let version = schema_version(conn)?;
    if version > CURRENT_VERSION {
        return Err(Error::DatabaseMigration {
            message: format!(
                "database schema version {version} is newer than supported version {CURRENT_VERSION}"
            ),
        });
    }

    for (index, statements) in STEPS.iter().enumerate().skip(version) {
        let target = index + 1;
        debug!("Upgrading schema to v{}", target);

        let tx = conn.unchecked_transaction()?;
        for statement in *statements {
            tx.execute(statement, [])?;
        }
        record_version(&tx, target)?;
        tx.commit()?;
    }

    if version < CURRENT_VERSION {
        info!("Schema upgraded from v{} to v{}", version, CURRENT_VERSION);
    }
    Ok(())
}

/// Version recorded in `metadata`, 0 for a fresh database.
fn schema_version(conn: &Connection) -> Result<usize> {
    let stored = conn.query_row(
        "SELECT value FROM metadata WHERE key = ?1",
        [VERSION_KEY],
        |row| row.get::<_, String>(0),
    );

    match stored {
        Ok(value) => value.trim().parse().map_err(|_| Error::DatabaseMigration {
            message: format!("invalid schema version: {value}"),
        }),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
        Err(e) => Err(e.into()),
    }
}

fn record_version(conn: &Connection, version: usize) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
        (VERSION_KEY, version.to_string()),
    )?;
    Ok(())
}
