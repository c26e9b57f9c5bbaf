//! Portal-Sync: a scrape-and-sync bridge for a server-rendered admin panel
//!
//! This crate logs into an administrative web application that exposes no API,
//! extracts typed records from its HTML tables and inline modal dialogs, and
//! upserts them into a SQLite store keyed by each resource's natural key.

pub mod config;
pub mod extract;
pub mod output;
pub mod resource;
pub mod session;
pub mod storage;
pub mod sync;

use thiserror::Error;

/// Main error type for Portal-Sync operations
///
/// Only authentication and transport failures abort a sync. Malformed rows
/// and per-record persistence failures are counted, never raised.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Authentication error: {0}")]
    Authentication(#[from] AuthError),

    #[error("HTTP error for {url}: {source}")]
    Transport { url: String, source: reqwest::Error },

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] ::url::ParseError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Authentication failures against the source system
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("No login credentials configured (set [credentials] or PORTAL_LOGIN_ID/PORTAL_PASSWORD)")]
    MissingCredentials,

    #[error("Login rejected: the source system returned its login page")]
    Rejected,

    #[error("Session expired while fetching {path}")]
    SessionExpired { path: String },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Unknown resource: {0}")]
    UnknownResource(String),
}

/// Result type alias for Portal-Sync operations
pub type Result<T> = std::result::Result<T, SyncError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use extract::{Extraction, ParsedDocument, SkipReason};
pub use resource::{Record, ResourceDescriptor, ResourceKind};
pub use session::{PageFetcher, PageSource, Session};
pub use storage::{upsert, RecordStore, SqliteStore, UpsertSummary};
pub use sync::{paginate, Synchronizer};
