//! Statistics read back from the record store
//!
//! This module reports what the store holds without touching the source
//! system: row counts per resource and the most recent run ledger.

use crate::resource::ResourceKind;
use crate::storage::{RecordStore, ResourceRunRecord, RunRecord};
use crate::SyncError;

/// Store statistics summary
#[derive(Debug, Clone)]
pub struct StoreStatistics {
    /// Row count per resource, in catalogue order
    pub rows_by_resource: Vec<(ResourceKind, u64)>,

    /// The most recent sync run, if any
    pub latest_run: Option<RunRecord>,

    /// Per-resource ledger rows of the most recent run
    pub latest_resources: Vec<ResourceRunRecord>,
}

impl StoreStatistics {
    pub fn total_rows(&self) -> u64 {
        self.rows_by_resource.iter().map(|(_, n)| n).sum()
    }
}

/// Loads statistics from a store
///
/// # Arguments
///
/// * `store` - The store to query
///
/// # Returns
///
/// * `Ok(StoreStatistics)` - Successfully loaded statistics
/// * `Err(SyncError)` - Failed to query statistics
pub fn load_statistics(store: &dyn RecordStore) -> Result<StoreStatistics, SyncError> {
    let mut rows_by_resource = Vec::with_capacity(ResourceKind::ALL.len());
    for kind in ResourceKind::ALL {
        rows_by_resource.push((kind, store.count_rows(kind)?));
    }

    let latest_run = store.get_latest_run()?;
    let latest_resources = match &latest_run {
        Some(run) => store.get_resource_runs(run.id)?,
        None => Vec::new(),
    };

    Ok(StoreStatistics {
        rows_by_resource,
        latest_run,
        latest_resources,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &StoreStatistics) {
    println!("=== Store Statistics ===\n");

    println!("Rows by Resource:");
    for (kind, count) in &stats.rows_by_resource {
        println!("  {:<16} {}", kind.name(), count);
    }
    println!("  {:<16} {}", "total", stats.total_rows());
    println!();

    match &stats.latest_run {
        None => println!("No sync runs recorded"),
        Some(run) => {
            println!("Latest Run:");
            println!("  ID: {}", run.id);
            println!("  Started: {}", run.started_at);
            if let Some(finished) = &run.finished_at {
                println!("  Finished: {}", finished);
            }
            println!("  Status: {}", run.status.to_db_string());
            println!("  Config hash: {}", run.config_hash);

            if !stats.latest_resources.is_empty() {
                println!();
                for row in &stats.latest_resources {
                    println!(
                        "  {:<16} pages {:>4}  found {:>6}  persisted {:>6}  failed {:>4}  rejected {:>4}{}{}",
                        row.resource,
                        row.pages_fetched,
                        row.found,
                        row.persisted,
                        row.failed,
                        row.rejected,
                        if row.cap_hit { "  (offset cap hit)" } else { "" },
                        if row.interrupted { "  (interrupted)" } else { "" }
                    );
                }
            }
        }
    }
}
