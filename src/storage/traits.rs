//! Storage traits and error types
//!
//! This module defines the trait interface for record stores and
//! associated error types.

use crate::resource::{Record, ResourceKind};
use crate::storage::{ResourceRunRecord, RunRecord, RunStatus};
use crate::sync::ResourceReport;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Cannot store {field} value '{value}'")]
    Coercion { field: &'static str, value: String },

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("A {found} record cannot be stored as {expected}")]
    KindMismatch {
        expected: ResourceKind,
        found: ResourceKind,
    },
}

impl StorageError {
    /// Splits constraint failures out of the generic SQLite error
    pub fn classify(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(code, message)
                if code.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                StorageError::ConstraintViolation(
                    message.unwrap_or_else(|| code.to_string()),
                )
            }
            other => StorageError::Sqlite(other),
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for record store implementations
///
/// A store maps each record onto its resource table by natural key. Every
/// `upsert_record` call is its own atomic unit; nothing spans a batch.
pub trait RecordStore {
    // ===== Records =====

    /// Inserts the record, or updates the row that already has its natural key
    fn upsert_record(&mut self, record: &Record) -> StorageResult<()>;

    /// Counts the rows held for a resource
    fn count_rows(&self, kind: ResourceKind) -> StorageResult<u64>;

    // ===== Run Ledger =====

    /// Creates a new sync run
    ///
    /// # Arguments
    ///
    /// * `config_hash` - Hash of the configuration file
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64>;

    /// Records how one resource fared within a run
    fn record_resource_run(&mut self, run_id: i64, report: &ResourceReport) -> StorageResult<()>;

    /// Sets the final status and finish timestamp of a run
    fn finish_run(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Gets the per-resource rows of a run
    fn get_resource_runs(&self, run_id: i64) -> StorageResult<Vec<ResourceRunRecord>>;
}
