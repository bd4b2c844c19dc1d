//! Admission serial numbers.
//!
//! The next serial is always derived from the records currently in the store;
//! there is no persisted counter. Two writers creating records against the same
//! snapshot will therefore hand out the same number.

use crate::student::StudentRecord;

/// Serial number for the next admission: highest existing serial plus one.
///
/// Serials freed by deleting the newest record are handed out again, since
/// only the records that still exist are consulted.
#[must_use]
pub fn next_serial(records: &[StudentRecord]) -> u32 {
    next_after(records.iter().map(|r| r.serial_no).max())
}

/// Serial number following a known maximum (`None` for an empty register).
#[must_use]
pub fn next_after(max_serial: Option<u32>) -> u32 {
    max_serial.unwrap_or(0).saturating_add(1)
}
