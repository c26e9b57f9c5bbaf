//! Offset pagination over listing pages
//!
//! Listings are walked with `start=<offset>&pagecounter=<page size>` until a
//! page yields no records. The offset cap on each descriptor stops a listing
//! that never runs dry; hitting it is logged as a warning so a change in the
//! source's paging can be noticed.

use crate::extract::{Extraction, ParsedDocument};
use crate::resource::ResourceDescriptor;
use crate::session::PageSource;
use crate::sync::report::Termination;
use crate::SyncError;

/// Everything gathered from one resource, in page-then-row order
#[derive(Debug)]
pub struct PageRun<T> {
    pub records: Vec<T>,
    pub skipped: usize,
    /// `(key, reason)` for every rejected row
    pub rejected: Vec<(String, String)>,
    pub pages_fetched: usize,
    pub termination: Termination,
}

impl<T> PageRun<T> {
    fn new() -> Self {
        Self {
            records: Vec::new(),
            skipped: 0,
            rejected: Vec::new(),
            pages_fetched: 0,
            termination: Termination::Exhausted,
        }
    }

    /// Folds one page's extractions in; returns how many records it held
    fn absorb(&mut self, extractions: Vec<Extraction<T>>) -> usize {
        let mut found = 0;
        for extraction in extractions {
            match extraction {
                Extraction::Found(record) => {
                    self.records.push(record);
                    found += 1;
                }
                Extraction::Skipped(reason) => {
                    tracing::trace!("Skipped row: {}", reason);
                    self.skipped += 1;
                }
                Extraction::Failed { key, reason } => {
                    tracing::warn!("Rejected row {}: {}", key, reason);
                    self.rejected.push((key, reason));
                }
            }
        }
        self.pages_fetched += 1;
        found
    }
}

/// A fetch failed part way through; what was gathered before it is kept
#[derive(Debug)]
pub struct Interrupted<T> {
    pub partial: PageRun<T>,
    pub error: SyncError,
}

/// Fetches every page of `descriptor` and runs `extract` over each.
///
/// Non-paginated resources are fetched once. For paginated ones the first
/// page with zero found records ends the walk; that page is still fetched
/// and counted.
pub async fn paginate<S, T, F>(
    source: &mut S,
    descriptor: &ResourceDescriptor,
    extract: F,
) -> Result<PageRun<T>, Interrupted<T>>
where
    S: PageSource,
    F: Fn(&ParsedDocument) -> Vec<Extraction<T>>,
{
    let mut run = PageRun::new();
    let base_query = descriptor.base_query();

    let Some(paging) = descriptor.paging else {
        match source.fetch_page(descriptor.path, &base_query).await {
            Ok(doc) => {
                let found = run.absorb(extract(&doc));
                tracing::info!("{}: {} records", descriptor.kind, found);
                run.termination = Termination::SinglePage;
                return Ok(run);
            }
            Err(error) => return Err(Interrupted { partial: run, error }),
        }
    };

    let step = paging.page_size.max(1);
    let mut start: u32 = 0;

    loop {
        if start > paging.max_offset {
            tracing::warn!(
                "{}: offset cap {} reached with records still coming; stopping at offset {}",
                descriptor.kind,
                paging.max_offset,
                start
            );
            run.termination = Termination::OffsetCap { next_offset: start };
            return Ok(run);
        }

        let mut query = base_query.clone();
        query.push(("start".to_string(), start.to_string()));
        query.push(("pagecounter".to_string(), paging.page_size.to_string()));

        let doc = match source.fetch_page(descriptor.path, &query).await {
            Ok(doc) => doc,
            Err(error) => return Err(Interrupted { partial: run, error }),
        };

        let found = run.absorb(extract(&doc));
        tracing::info!(
            "{}: {} records at offset {}",
            descriptor.kind,
            found,
            start
        );

        if found == 0 {
            run.termination = Termination::Exhausted;
            return Ok(run);
        }

        start = match start.checked_add(step) {
            Some(next) => next,
            None => {
                tracing::warn!("{}: offset overflowed at {}", descriptor.kind, start);
                run.termination = Termination::OffsetCap { next_offset: start };
                return Ok(run);
            }
        };
    }
}
