//! `admissions` - A school admission register
//!
//! This library keeps student admission records in one of two interchangeable
//! stores, hands out admission serial numbers, and derives the dashboard
//! counts and the age-by-class government admission report from them.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod aggregate;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod report;
pub mod serial;
pub mod service;
pub mod storage;
pub mod student;

pub use aggregate::{ChartSeries, CrossTab, DashboardStats};
pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use report::{ReportFormat, ReportHeader};
pub use service::StudentService;
pub use storage::{open_store, RecordStore};
pub use student::{AgeGroup, ClassLevel, Gender, NewStudent, StudentId, StudentPatch, StudentRecord};
