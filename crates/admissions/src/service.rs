//! Record lifecycle: create, read, update, delete and the derived views.
//!
//! [`StudentService`] is the only place that stamps timestamps and hands out
//! serial numbers. It keeps no state of its own beyond the store handle; every
//! call reads the store afresh.

use tracing::{debug, info};

use crate::aggregate::{self, ChartSeries, CrossTab, DashboardStats};
use crate::error::{Error, Result};
use crate::serial;
use crate::storage::RecordStore;
use crate::student::{NewStudent, StudentId, StudentPatch, StudentRecord};

/// Source of "now" in milliseconds since the Unix epoch.
pub type Clock = fn() -> i64;

/// Current wall-clock time in milliseconds.
#[must_use]
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Admission register operations on top of a [`RecordStore`].
#[derive(Debug)]
pub struct StudentService {
    store: Box<dyn RecordStore>,
    clock: Clock,
}

impl StudentService {
    /// Create a service over the given store, using the system clock.
    #[must_use]
    pub fn new(store: Box<dyn RecordStore>) -> Self {
        Self::with_clock(store, now_millis)
    }

    /// Create a service with a custom clock.
    #[must_use]
    pub fn with_clock(store: Box<dyn RecordStore>, clock: Clock) -> Self {
        Self { store, clock }
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &dyn RecordStore {
        self.store.as_ref()
    }

    /// Admit a new student.
    ///
    /// The serial number is one above the highest serial currently stored and
    /// both timestamps are set to the same instant.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for a blank child name (nothing is
    /// written), or the store's error.
    pub async fn create(&self, student: NewStudent) -> Result<StudentRecord> {
        student.validate()?;

        let serial_no = serial::next_after(self.store.max_serial().await?);
        let now = (self.clock)();
        let record = self.store.insert(student, serial_no, now).await?;

        info!(
            "Admitted {} as serial {} (id {})",
            record.child_name, record.serial_no, record.id
        );
        Ok(record)
    }

    /// Look up a record. `Ok(None)` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns the store's error.
    pub async fn read(&self, id: &StudentId) -> Result<Option<StudentRecord>> {
        self.store.get(id).await
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the patch blanks the child name,
    /// [`Error::NotFound`] if the id is unknown, or the store's error.
    pub async fn update(&self, id: &StudentId, patch: StudentPatch) -> Result<StudentRecord> {
        patch.validate()?;
        if patch.is_empty() {
            debug!("Empty patch for {}, only touching updated_at", id);
        }

        let now = (self.clock)();
        let record = self.store.update(id, &patch, now).await?;
        info!("Updated record {} (serial {})", record.id, record.serial_no);
        Ok(record)
    }

    /// Remove a record. Deleting an unknown id succeeds.
    ///
    /// # Errors
    ///
    /// Returns the store's error.
    pub async fn delete(&self, id: &StudentId) -> Result<()> {
        self.store.delete(id).await?;
        info!("Deleted record {}", id);
        Ok(())
    }

    /// Remove a record, failing if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the id is unknown, or the store's error.
    pub async fn delete_existing(&self, id: &StudentId) -> Result<StudentRecord> {
        let record = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| Error::not_found(id.as_str()))?;
        self.delete(id).await?;
        Ok(record)
    }

    /// All records, most recently updated first.
    ///
    /// # Errors
    ///
    /// Returns the store's error.
    pub async fn list(&self) -> Result<Vec<StudentRecord>> {
        self.store.list_all().await
    }

    /// Records whose child name, father name or serial number contains
    /// `term`, ignoring case. An empty term returns everything.
    ///
    /// # Errors
    ///
    /// Returns the store's error.
    pub async fn search(&self, term: &str) -> Result<Vec<StudentRecord>> {
        let term = term.trim();
        let records = self.store.list_all().await?;
        if term.is_empty() {
            return Ok(records);
        }
        Ok(records
            .into_iter()
            .filter(|r| r.matches_search(term))
            .collect())
    }

    /// Dashboard counts over the current register.
    ///
    /// # Errors
    ///
    /// Returns the store's error.
    pub async fn dashboard(&self) -> Result<DashboardStats> {
        let records = self.store.list_all().await?;
        Ok(aggregate::dashboard_stats(&records))
    }

    /// Age × class × gender matrix over the current register.
    ///
    /// # Errors
    ///
    /// Returns the store's error.
    pub async fn cross_tab(&self) -> Result<CrossTab> {
        let records = self.store.list_all().await?;
        Ok(aggregate::cross_tab(&records))
    }

    /// Dashboard chart series over the current register.
    ///
    /// # Errors
    ///
    /// Returns the store's error.
    pub async fn charts(&self) -> Result<ChartSeries> {
        let records = self.store.list_all().await?;
        Ok(aggregate::chart_series(&records))
    }
}
