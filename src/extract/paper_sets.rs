//! Exam paper sets, paginated ten at a time

use super::heuristics::parse_count;
use super::{extract_rows, Extraction, ParsedDocument, Row, RowRules, SkipReason};

pub const PATH: &str = "/paper_list.php";

pub const RULES: RowRules = RowRules {
    row_selector: "tr",
    min_columns: 4,
    header_cell: 0,
    header_tokens: &["S.No"],
};

#[derive(Debug, Clone, PartialEq)]
pub struct PaperSet {
    pub title: String,
    pub course: String,
    pub subject: String,
    pub total_questions: Option<i64>,
    pub duration: String,
}

impl PaperSet {
    /// Titles repeat across courses
    pub fn paper_key(&self) -> String {
        format!("{}::{}", self.course, self.title)
    }
}

pub fn extract(doc: &ParsedDocument, rules: &RowRules) -> Vec<Extraction<PaperSet>> {
    extract_rows(doc, rules, read_row)
}

fn read_row(_: &ParsedDocument, row: &Row<'_>) -> Extraction<PaperSet> {
    let title = row.text(1);
    if title.is_empty() {
        return Extraction::Skipped(SkipReason::MissingKey);
    }
    Extraction::Found(PaperSet {
        title,
        course: row.text(2),
        subject: row.text(3),
        total_questions: parse_count(&row.text(4)),
        duration: row.text(5),
    })
}
