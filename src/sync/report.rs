//! What a sync did, per resource and per run

use crate::resource::ResourceKind;

/// Why pagination stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// A page came back with no records
    Exhausted,
    /// The offset cap was reached while pages still had records
    OffsetCap { next_offset: u32 },
    /// The listing is not paginated
    SinglePage,
    /// A hard failure stopped the walk; only earlier pages were read
    Interrupted,
}

/// Outcome of syncing one resource
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceReport {
    pub resource: ResourceKind,
    pub pages_fetched: usize,
    pub termination: Termination,
    /// Records extracted from the source
    pub found: usize,
    /// Rows screened out as noise
    pub skipped: usize,
    /// Keys of rows that were read but inconsistent, never persisted
    pub rejected: Vec<String>,
    /// Found records whose password was recovered with low confidence
    pub low_confidence: usize,
    pub persisted: usize,
    /// Keys of records the store refused
    pub failed_keys: Vec<String>,
}

impl ResourceReport {
    pub fn cap_hit(&self) -> bool {
        matches!(self.termination, Termination::OffsetCap { .. })
    }

    pub fn is_interrupted(&self) -> bool {
        self.termination == Termination::Interrupted
    }

    pub fn has_errors(&self) -> bool {
        self.is_interrupted() || !self.rejected.is_empty() || !self.failed_keys.is_empty()
    }
}

/// Outcome of a multi-resource sync
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncSummary {
    /// Ledger id, when the run was recorded
    pub run_id: Option<i64>,
    pub reports: Vec<ResourceReport>,
}

impl SyncSummary {
    pub fn total_found(&self) -> usize {
        self.reports.iter().map(|r| r.found).sum()
    }

    pub fn total_persisted(&self) -> usize {
        self.reports.iter().map(|r| r.persisted).sum()
    }

    pub fn total_failed(&self) -> usize {
        self.reports.iter().map(|r| r.failed_keys.len()).sum()
    }

    pub fn total_rejected(&self) -> usize {
        self.reports.iter().map(|r| r.rejected.len()).sum()
    }

    pub fn has_errors(&self) -> bool {
        self.reports.iter().any(ResourceReport::has_errors)
    }
}
