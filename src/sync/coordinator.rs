//! Sync coordinator - per-resource and multi-resource orchestration
//!
//! A [`Synchronizer`] owns one page source and one record store and runs
//! resources strictly one after another: fetch a page, extract it, move on,
//! then persist what was gathered. Nothing is ever fetched concurrently; the
//! source keeps its session in a cookie and does not tolerate it.

use crate::config::ResourceOverride;
use crate::extract::Extraction;
use crate::resource::{Record, ResourceDescriptor, ResourceKind};
use crate::session::PageSource;
use crate::storage::{upsert, RecordStore, RunStatus};
use crate::sync::paginator::{paginate, Interrupted, PageRun};
use crate::sync::report::{ResourceReport, SyncSummary, Termination};
use crate::{Result, SyncError};
use std::collections::BTreeMap;

/// Drives resources from a [`PageSource`] into a [`RecordStore`]
pub struct Synchronizer<S, R> {
    source: S,
    store: R,
    overrides: BTreeMap<String, ResourceOverride>,
}

impl<S: PageSource, R: RecordStore> Synchronizer<S, R> {
    pub fn new(source: S, store: R) -> Self {
        Self {
            source,
            store,
            overrides: BTreeMap::new(),
        }
    }

    /// Applies per-resource paging overrides, keyed by resource name
    pub fn with_overrides(mut self, overrides: &BTreeMap<String, ResourceOverride>) -> Self {
        self.overrides = overrides.clone();
        self
    }

    /// The descriptor a sync of `kind` will use
    pub fn descriptor(&self, kind: ResourceKind) -> ResourceDescriptor {
        kind.descriptor_with(self.overrides.get(kind.name()))
    }

    pub fn store(&self) -> &R {
        &self.store
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn into_parts(self) -> (S, R) {
        (self.source, self.store)
    }

    /// Scrapes every record of `kind` without persisting anything
    pub async fn collect(&mut self, kind: ResourceKind) -> Result<Vec<Record>> {
        match self.scrape(kind).await {
            Ok(run) => Ok(run.records),
            Err(interrupted) => Err(interrupted.error),
        }
    }

    /// Scrapes `kind` and upserts what was found.
    ///
    /// If a fetch fails part way, the records from earlier pages are still
    /// persisted before the error is returned.
    pub async fn sync(&mut self, kind: ResourceKind) -> Result<ResourceReport> {
        self.sync_resource(kind).await.map_err(|(_, error)| error)
    }

    /// Syncs each of `kinds` in order, recording the run in the store's ledger.
    ///
    /// The first hard failure (authentication or transport) stops the run and
    /// is returned. The interrupted resource still gets its ledger row, then
    /// the run is marked failed.
    pub async fn sync_all(
        &mut self,
        kinds: &[ResourceKind],
        config_hash: &str,
    ) -> Result<SyncSummary> {
        let run_id = self.store.create_run(config_hash)?;
        tracing::info!("Starting sync run {} over {} resources", run_id, kinds.len());

        let mut summary = SyncSummary {
            run_id: Some(run_id),
            reports: Vec::with_capacity(kinds.len()),
        };

        for &kind in kinds {
            match self.sync_resource(kind).await {
                Ok(report) => {
                    self.store.record_resource_run(run_id, &report)?;
                    summary.reports.push(report);
                }
                Err((partial, e)) => {
                    if let Err(ledger) = self.store.record_resource_run(run_id, &partial) {
                        tracing::warn!("Could not record {} in run {}: {}", kind, run_id, ledger);
                    }
                    if let Err(ledger) = self.store.finish_run(run_id, RunStatus::Failed) {
                        tracing::warn!("Could not close run {}: {}", run_id, ledger);
                    }
                    return Err(e);
                }
            }
        }

        let status = if summary.has_errors() {
            RunStatus::CompletedWithErrors
        } else {
            RunStatus::Completed
        };
        self.store.finish_run(run_id, status)?;
        tracing::info!("Sync run {} finished: {}", run_id, status.to_db_string());

        Ok(summary)
    }

    pub async fn sync_students(&mut self) -> Result<ResourceReport> {
        self.sync(ResourceKind::Students).await
    }

    pub async fn sync_marksheets(&mut self) -> Result<ResourceReport> {
        self.sync(ResourceKind::Marksheets).await
    }

    pub async fn sync_admit_cards(&mut self) -> Result<ResourceReport> {
        self.sync(ResourceKind::AdmitCards).await
    }

    pub async fn sync_online_results(&mut self) -> Result<ResourceReport> {
        self.sync(ResourceKind::OnlineResults).await
    }

    pub async fn sync_fee_reports(&mut self) -> Result<ResourceReport> {
        self.sync(ResourceKind::FeeReports).await
    }

    pub async fn sync_branch_wallet(&mut self) -> Result<ResourceReport> {
        self.sync(ResourceKind::BranchWallet).await
    }

    pub async fn sync_dues(&mut self) -> Result<ResourceReport> {
        self.sync(ResourceKind::Dues).await
    }

    pub async fn sync_paper_sets(&mut self) -> Result<ResourceReport> {
        self.sync(ResourceKind::PaperSets).await
    }

    pub async fn sync_study_materials(&mut self) -> Result<ResourceReport> {
        self.sync(ResourceKind::StudyMaterials).await
    }

    pub async fn sync_staff(&mut self) -> Result<ResourceReport> {
        self.sync(ResourceKind::Staff).await
    }

    pub async fn sync_courses(&mut self) -> Result<ResourceReport> {
        self.sync(ResourceKind::Courses).await
    }

    pub async fn sync_branches(&mut self) -> Result<ResourceReport> {
        self.sync(ResourceKind::Branches).await
    }

    pub async fn sync_news(&mut self) -> Result<ResourceReport> {
        self.sync(ResourceKind::News).await
    }

    pub async fn sync_web_pages(&mut self) -> Result<ResourceReport> {
        self.sync(ResourceKind::WebPages).await
    }

    pub async fn sync_banners(&mut self) -> Result<ResourceReport> {
        self.sync(ResourceKind::Banners).await
    }

    pub async fn sync_photo_albums(&mut self) -> Result<ResourceReport> {
        self.sync(ResourceKind::PhotoAlbums).await
    }

    pub async fn sync_video_albums(&mut self) -> Result<ResourceReport> {
        self.sync(ResourceKind::VideoAlbums).await
    }

    /// Scrapes and persists one resource. On a hard failure the error comes
    /// back together with the report of what was persisted before it.
    async fn sync_resource(
        &mut self,
        kind: ResourceKind,
    ) -> std::result::Result<ResourceReport, (ResourceReport, SyncError)> {
        tracing::info!("Syncing {}", kind);

        match self.scrape(kind).await {
            Ok(run) => {
                let report = self.persist(kind, run);
                tracing::info!(
                    "{}: {} found, {} persisted, {} failed, {} rejected, {} skipped over {} pages",
                    kind,
                    report.found,
                    report.persisted,
                    report.failed_keys.len(),
                    report.rejected.len(),
                    report.skipped,
                    report.pages_fetched
                );
                Ok(report)
            }
            Err(Interrupted { mut partial, error }) => {
                tracing::error!(
                    "{} interrupted after {} pages: {}",
                    kind,
                    partial.pages_fetched,
                    error
                );
                partial.termination = Termination::Interrupted;
                let report = self.persist(kind, partial);
                if report.persisted > 0 {
                    tracing::info!("{}: kept {} records from earlier pages", kind, report.persisted);
                }
                Err((report, error))
            }
        }
    }

    async fn scrape(
        &mut self,
        kind: ResourceKind,
    ) -> std::result::Result<PageRun<Record>, Interrupted<Record>> {
        let descriptor = self.descriptor(kind);
        paginate(&mut self.source, &descriptor, |doc| {
            let extractions = descriptor.extract(doc);
            let low = extractions
                .iter()
                .filter(|e| matches!(e, Extraction::Found(r) if r.has_low_confidence()))
                .count();
            if low > 0 {
                tracing::warn!("{}: {} passwords recovered with low confidence", kind, low);
            }
            extractions
        })
        .await
    }

    fn persist(&mut self, kind: ResourceKind, run: PageRun<Record>) -> ResourceReport {
        let outcome = upsert(&mut self.store, kind, &run.records);
        ResourceReport {
            resource: kind,
            pages_fetched: run.pages_fetched,
            termination: run.termination,
            found: run.records.len(),
            skipped: run.skipped,
            rejected: run.rejected.into_iter().map(|(key, _)| key).collect(),
            low_confidence: run.records.iter().filter(|r| r.has_low_confidence()).count(),
            persisted: outcome.succeeded,
            failed_keys: outcome.failed_keys,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::ParsedDocument;
    use crate::storage::SqliteStore;
    use crate::AuthError;

    /// Answers every path with the same fixed HTML, or fails on one path
    struct StaticSite {
        pages: BTreeMap<&'static str, &'static str>,
        failing_path: Option<&'static str>,
        fetched: Vec<String>,
    }

    impl PageSource for StaticSite {
        async fn fetch_page(
            &mut self,
            path: &str,
            _query: &[(String, String)],
        ) -> Result<ParsedDocument> {
            self.fetched.push(path.to_string());
            if self.failing_path == Some(path) {
                return Err(AuthError::SessionExpired {
                    path: path.to_string(),
                }
                .into());
            }
            Ok(ParsedDocument::parse(
                self.pages.get(path).copied().unwrap_or("<html></html>"),
            ))
        }
    }

    const STAFF_PAGE: &str = r#"<table>
        <tr><td>Emp ID</td><td>Name</td><td>Phone</td><td>Salary</td><td>Department</td></tr>
        <tr><td>EMP01</td><td>Anil Verma</td><td>9000000001</td><td>12,000</td><td>Accounts</td></tr>
        <tr><td>EMP02</td><td>Sunita Devi</td><td>9000000002</td><td>9500</td><td>Front Office</td></tr>
    </table>"#;

    const COURSES_PAGE: &str = r#"<table>
        <tr><td>S.No</td><td>Course Name</td><td>Fee</td><td>Duration</td><td>Action</td></tr>
        <tr><td>1</td><td>ADCA</td><td>12000</td><td>12 Months</td><td>Edit</td></tr>
    </table>"#;

    fn site(failing_path: Option<&'static str>) -> StaticSite {
        let mut pages = BTreeMap::new();
        pages.insert("/emp.php", STAFF_PAGE);
        pages.insert("/courses.php", COURSES_PAGE);
        StaticSite {
            pages,
            failing_path,
            fetched: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_sync_persists_and_reports() {
        let mut sync = Synchronizer::new(site(None), SqliteStore::in_memory().unwrap());

        let report = sync.sync_staff().await.unwrap();

        assert_eq!(report.found, 2);
        assert_eq!(report.persisted, 2);
        assert_eq!(report.termination, Termination::SinglePage);
        assert!(report.failed_keys.is_empty());
        assert_eq!(sync.store().count_rows(ResourceKind::Staff).unwrap(), 2);
    }

    #[tokio::test]
    async fn test_sync_twice_is_idempotent() {
        let mut sync = Synchronizer::new(site(None), SqliteStore::in_memory().unwrap());

        sync.sync_staff().await.unwrap();
        sync.sync_staff().await.unwrap();

        assert_eq!(sync.store().count_rows(ResourceKind::Staff).unwrap(), 2);
    }

    #[tokio::test]
    async fn test_collect_does_not_persist() {
        let mut sync = Synchronizer::new(site(None), SqliteStore::in_memory().unwrap());

        let records = sync.collect(ResourceKind::Staff).await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].natural_key(), "EMP01");
        assert_eq!(sync.store().count_rows(ResourceKind::Staff).unwrap(), 0);
    }

    #[tokio::test]
    async fn test_sync_all_records_ledger() {
        let mut sync = Synchronizer::new(site(None), SqliteStore::in_memory().unwrap());

        let summary = sync
            .sync_all(&[ResourceKind::Staff, ResourceKind::Courses], "hash")
            .await
            .unwrap();

        assert_eq!(summary.total_persisted(), 3);
        let run_id = summary.run_id.unwrap();
        let run = sync.store().get_run(run_id).unwrap();
        assert_eq!(run.status, RunStatus::Completed);
        let rows = sync.store().get_resource_runs(run_id).unwrap();
        let names: Vec<_> = rows.iter().map(|r| r.resource.as_str()).collect();
        assert_eq!(names, vec!["staff", "courses"]);
    }

    #[tokio::test]
    async fn test_hard_failure_stops_run() {
        let mut sync = Synchronizer::new(
            site(Some("/emp.php")),
            SqliteStore::in_memory().unwrap(),
        );

        let err = sync
            .sync_all(&[ResourceKind::Staff, ResourceKind::Courses], "hash")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SyncError::Authentication(AuthError::SessionExpired { .. })
        ));
        assert_eq!(sync.source().fetched, vec!["/emp.php".to_string()]);
        let run = sync.store().get_latest_run().unwrap().unwrap();
        assert_eq!(run.status, RunStatus::Failed);

        let rows = sync.store().get_resource_runs(run.id).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].resource, "staff");
        assert!(rows[0].interrupted);
        assert_eq!(rows[0].pages_fetched, 0);
    }

    /// Serves student pages at offsets 0 and 50, then fails at 100
    struct FlakyListing {
        fetched: usize,
    }

    impl PageSource for FlakyListing {
        async fn fetch_page(
            &mut self,
            _path: &str,
            query: &[(String, String)],
        ) -> Result<ParsedDocument> {
            self.fetched += 1;
            let start = query
                .iter()
                .find(|(k, _)| k == "start")
                .map(|(_, v)| v.as_str())
                .unwrap_or("0");
            let reg_no = match start {
                "0" => "GO100110020241760126",
                "50" => "GO100110020241760127",
                _ => {
                    return Err(AuthError::SessionExpired {
                        path: "/search_home.php".to_string(),
                    }
                    .into())
                }
            };
            Ok(ParsedDocument::parse(&format!(
                r#"<div id="suggesstion-box"><table class="table">
                    <tr><td>{} 9335848463</td><td><strong>Ram</strong></td><td>ADCA</td><td>900</td><td>PAID</td><td>Edit</td></tr>
                </table></div>"#,
                reg_no
            )))
        }
    }

    #[tokio::test]
    async fn test_interrupted_resource_keeps_partial_ledger_row() {
        let store = SqliteStore::in_memory().unwrap();
        store
            .connection()
            .execute_batch(
                "CREATE TRIGGER refuse_student BEFORE INSERT ON students
                 WHEN NEW.reg_no = 'GO100110020241760127'
                 BEGIN SELECT RAISE(ABORT, 'refused'); END;",
            )
            .unwrap();
        let mut sync = Synchronizer::new(FlakyListing { fetched: 0 }, store);

        let err = sync
            .sync_all(&[ResourceKind::Students, ResourceKind::Staff], "hash")
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Authentication(_)));
        assert_eq!(sync.source().fetched, 3);

        let run = sync.store().get_latest_run().unwrap().unwrap();
        assert_eq!(run.status, RunStatus::Failed);
        let rows = sync.store().get_resource_runs(run.id).unwrap();
        assert_eq!(rows.len(), 1);
        let students = &rows[0];
        assert_eq!(students.resource, "students");
        assert!(students.interrupted);
        assert_eq!(students.pages_fetched, 2);
        assert_eq!(students.found, 2);
        assert_eq!(students.persisted, 1);
        assert_eq!(
            students.failed_keys,
            vec!["GO100110020241760127".to_string()]
        );
        assert_eq!(sync.store().count_rows(ResourceKind::Students).unwrap(), 1);
    }

    #[test]
    fn test_overrides_reach_descriptor() {
        let mut overrides = BTreeMap::new();
        overrides.insert(
            "students".to_string(),
            ResourceOverride {
                page_size: Some(25),
                max_offset: None,
            },
        );
        let sync = Synchronizer::new(site(None), SqliteStore::in_memory().unwrap())
            .with_overrides(&overrides);

        let paging = sync.descriptor(ResourceKind::Students).paging.unwrap();
        assert_eq!(paging.page_size, 25);
        assert_eq!(paging.max_offset, 1000);
    }
}
