//! Configuration management.
//!
//! Loaded with figment from defaults, an optional TOML file and
//! `ADMISSIONS_`-prefixed environment variables.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "admissions";

/// Default database file for the table backend.
const DATABASE_FILE_NAME: &str = "admissions.db";

/// Default database file for the blob backend.
const LOCAL_STORE_FILE_NAME: &str = "local.db";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `ADMISSIONS_`, sections split on `__`,
///    e.g. `ADMISSIONS_STORAGE__BACKEND=blob`)
/// 2. TOML config file at `~/.config/admissions/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Report header configuration.
    pub report: ReportConfig,
}

/// Which record store to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// One row per record in a `students` table.
    #[default]
    Table,
    /// Whole register serialized under a single key.
    Blob,
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Table => write!(f, "table"),
            Self::Blob => write!(f, "blob"),
        }
    }
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Backend selected at startup.
    pub backend: StorageBackend,
    /// Database file for the table backend.
    /// Defaults to `~/.local/share/admissions/admissions.db`
    pub database_path: Option<PathBuf>,
    /// Database file for the blob backend.
    /// Defaults to `~/.local/share/admissions/local.db`
    pub local_store_path: Option<PathBuf>,
    /// Artificial delay added to every blob-backend operation, in milliseconds.
    pub simulated_latency_ms: u64,
}

/// Header printed on the government admission report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// School name.
    pub school_name: String,
    /// Report title line.
    pub report_title: String,
    /// Upazila (sub-district).
    pub upazila: String,
    /// Government school code.
    pub school_code: String,
    /// Academic year the report covers.
    pub year: u16,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            school_name: "Kagapasha Govt. Primary School".to_string(),
            report_title: "Child Survey & Admitted Child Information".to_string(),
            upazila: "Sadar".to_string(),
            school_code: "123456".to_string(),
            year: 2025,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, parsing or validation fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("ADMISSIONS_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.report.school_name.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "report.school_name must not be empty".to_string(),
            });
        }

        if !(2000..=2100).contains(&self.report.year) {
            return Err(Error::ConfigValidation {
                message: format!(
                    "report.year ({}) must be between 2000 and 2100",
                    self.report.year
                ),
            });
        }

        if let (Some(table), Some(local)) = (
            &self.storage.database_path,
            &self.storage.local_store_path,
        ) {
            if table == local {
                return Err(Error::ConfigValidation {
                    message: format!(
                        "storage.database_path and storage.local_store_path must differ ({})",
                        table.display()
                    ),
                });
            }
        }

        Ok(())
    }

    /// Get the table-backend database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the blob-backend database path, resolving defaults if not set.
    #[must_use]
    pub fn local_store_path(&self) -> PathBuf {
        self.storage
            .local_store_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(LOCAL_STORE_FILE_NAME))
    }

    /// Get the simulated store latency as a Duration.
    #[must_use]
    pub fn simulated_latency(&self) -> Duration {
        Duration::from_millis(self.storage.simulated_latency_ms)
    }
}
