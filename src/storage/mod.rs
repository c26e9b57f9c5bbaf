//! Storage module for persisting scraped records
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Idempotent per-record upserts keyed by natural key
//! - The sync-run ledger

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStore;
pub use traits::{RecordStore, StorageError, StorageResult};

use crate::resource::{Record, ResourceKind};
use crate::SyncError;

use std::path::Path;

/// Initializes or opens a record store
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStore)` - Successfully initialized store
/// * `Err(SyncError)` - Failed to initialize store
pub fn open_store(path: &Path) -> Result<SqliteStore, SyncError> {
    SqliteStore::open(path)
}

/// Outcome of persisting one batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpsertSummary {
    pub succeeded: usize,
    pub failed: usize,
    /// Natural keys of the records that failed, for operator follow-up
    pub failed_keys: Vec<String>,
}

/// Persists `records` one at a time.
///
/// A record that fails (constraint violation, wrong resource, no key) is
/// logged with its natural key and counted; the batch always runs to the end.
pub fn upsert<S: RecordStore + ?Sized>(
    store: &mut S,
    resource: ResourceKind,
    records: &[Record],
) -> UpsertSummary {
    let mut summary = UpsertSummary::default();

    for record in records {
        let key = record.natural_key();
        let result = if record.kind() != resource {
            Err(StorageError::KindMismatch {
                expected: resource,
                found: record.kind(),
            })
        } else if key.trim().is_empty() {
            Err(StorageError::Coercion {
                field: "natural key",
                value: key.clone(),
            })
        } else {
            store.upsert_record(record)
        };

        match result {
            Ok(()) => summary.succeeded += 1,
            Err(e) => {
                tracing::warn!("Failed to persist {} record {}: {}", resource, key, e);
                summary.failed += 1;
                summary.failed_keys.push(key);
            }
        }
    }

    tracing::info!(
        "Persisted {} {} records ({} failed)",
        summary.succeeded,
        resource,
        summary.failed
    );
    summary
}

/// Represents a sync run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
}

/// One resource's row in the run ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRunRecord {
    pub resource: String,
    pub pages_fetched: u64,
    pub found: u64,
    pub skipped: u64,
    pub rejected: u64,
    pub persisted: u64,
    pub failed: u64,
    pub cap_hit: bool,
    /// The resource stopped on a hard failure part way through
    pub interrupted: bool,
    pub failed_keys: Vec<String>,
}

/// Status of a sync run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    /// Finished, but some records could not be persisted or were rejected
    CompletedWithErrors,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::CompletedWithErrors => "completed_with_errors",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "completed_with_errors" => Some(Self::CompletedWithErrors),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}
