//! Operator-facing sync summary
//!
//! Renders what a sync did per resource, followed by every natural key that
//! failed to persist or was rejected at extraction, so an operator can chase
//! them up in the source system.

use crate::sync::{ResourceReport, SyncSummary, Termination};

/// Formats a sync summary as plain text
///
/// # Arguments
///
/// * `summary` - The finished sync
///
/// # Returns
///
/// The rendered summary, newline-terminated
pub fn render_summary(summary: &SyncSummary) -> String {
    let mut out = String::new();

    out.push_str("=== Sync Summary ===\n\n");
    if let Some(run_id) = summary.run_id {
        out.push_str(&format!("Run: {}\n\n", run_id));
    }

    out.push_str(&format!(
        "{:<16} {:>6} {:>6} {:>9} {:>6} {:>8} {:>7}  {}\n",
        "Resource", "Pages", "Found", "Persisted", "Failed", "Rejected", "Skipped", "End"
    ));
    for report in &summary.reports {
        out.push_str(&format!(
            "{:<16} {:>6} {:>6} {:>9} {:>6} {:>8} {:>7}  {}\n",
            report.resource.name(),
            report.pages_fetched,
            report.found,
            report.persisted,
            report.failed_keys.len(),
            report.rejected.len(),
            report.skipped,
            termination_label(report)
        ));
    }

    out.push_str(&format!(
        "\nTotal: {} found, {} persisted, {} failed, {} rejected\n",
        summary.total_found(),
        summary.total_persisted(),
        summary.total_failed(),
        summary.total_rejected()
    ));

    let low_confidence: usize = summary.reports.iter().map(|r| r.low_confidence).sum();
    if low_confidence > 0 {
        out.push_str(&format!(
            "Low-confidence passwords: {}\n",
            low_confidence
        ));
    }

    for report in summary.reports.iter().filter(|r| r.has_errors()) {
        out.push_str(&format!("\n{}:\n", report.resource));
        for key in &report.failed_keys {
            out.push_str(&format!("  failed   {}\n", key));
        }
        for key in &report.rejected {
            out.push_str(&format!("  rejected {}\n", key));
        }
    }

    out
}

/// Prints a sync summary to stdout
pub fn print_summary(summary: &SyncSummary) {
    print!("{}", render_summary(summary));
}

fn termination_label(report: &ResourceReport) -> String {
    match report.termination {
        Termination::Exhausted => "exhausted".to_string(),
        Termination::SinglePage => "single page".to_string(),
        Termination::Interrupted => "INTERRUPTED".to_string(),
        Termination::OffsetCap { next_offset } => format!("CAP HIT at {}", next_offset),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ResourceKind;

    fn report(resource: ResourceKind) -> ResourceReport {
        ResourceReport {
            resource,
            pages_fetched: 3,
            termination: Termination::Exhausted,
            found: 100,
            skipped: 6,
            rejected: vec![],
            low_confidence: 0,
            persisted: 100,
            failed_keys: vec![],
        }
    }

    #[test]
    fn test_failed_and_rejected_keys_are_listed() {
        let mut students = report(ResourceKind::Students);
        students.persisted = 99;
        students.failed_keys = vec!["GO1001100".to_string()];
        let mut marksheets = report(ResourceKind::Marksheets);
        marksheets.rejected = vec!["GO1001200".to_string()];
        marksheets.termination = Termination::OffsetCap { next_offset: 2550 };

        let text = render_summary(&SyncSummary {
            run_id: Some(7),
            reports: vec![students, marksheets, report(ResourceKind::Staff)],
        });

        assert!(text.contains("Run: 7"));
        assert!(text.contains("failed   GO1001100"));
        assert!(text.contains("rejected GO1001200"));
        assert!(text.contains("CAP HIT at 2550"));
        assert!(text.contains("Total: 300 found, 299 persisted, 1 failed, 1 rejected"));
        assert!(!text.contains("\nstaff:\n"));
    }

    #[test]
    fn test_clean_summary_has_no_key_listing() {
        let text = render_summary(&SyncSummary {
            run_id: None,
            reports: vec![report(ResourceKind::Courses)],
        });

        assert!(!text.contains("Run:"));
        assert!(!text.contains("failed "));
        assert!(!text.contains("Low-confidence"));
    }
}
