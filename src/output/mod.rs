//! Output module for sync summaries and store statistics
//!
//! This module handles:
//! - Rendering the per-run summary with failed and rejected keys
//! - Reading row counts and the run ledger back out of the store

pub mod stats;
mod summary;

pub use stats::{load_statistics, print_statistics, StoreStatistics};
pub use summary::{print_summary, render_summary};
