//! Sync orchestration
//!
//! This module ties the pieces together:
//! - `paginator`: walks a listing page by page
//! - `coordinator`: scrapes and persists resources, keeps the run ledger
//! - `report`: per-resource and per-run outcomes

mod coordinator;
mod paginator;
mod report;

pub use coordinator::Synchronizer;
pub use paginator::{paginate, Interrupted, PageRun};
pub use report::{ResourceReport, SyncSummary, Termination};
