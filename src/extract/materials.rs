//! Study materials offered for download
//!
//! The PDF is not linked from the row. Cell 5 holds a button whose modal
//! embeds the file in an `<iframe>`.

use super::document::first_attr;
use super::{extract_rows, Extraction, ParsedDocument, Row, RowRules, SkipReason};

pub const PATH: &str = "/download.php";

pub const RULES: RowRules = RowRules {
    row_selector: "table tr",
    min_columns: 5,
    header_cell: 0,
    header_tokens: &["S.No"],
};

#[derive(Debug, Clone, PartialEq)]
pub struct StudyMaterial {
    pub title: String,
    pub program: String,
    pub subject: String,
    /// Usually relative, e.g. `file/notes.pdf`
    pub file_url: Option<String>,
}

impl StudyMaterial {
    pub fn material_key(&self) -> String {
        format!("{}|{}|{}", self.program, self.subject, self.title)
    }
}

pub fn extract(doc: &ParsedDocument, rules: &RowRules) -> Vec<Extraction<StudyMaterial>> {
    extract_rows(doc, rules, read_row)
}

fn read_row(doc: &ParsedDocument, row: &Row<'_>) -> Extraction<StudyMaterial> {
    let title = row.text(1);
    if title.is_empty() {
        return Extraction::Skipped(SkipReason::MissingKey);
    }

    let file_url = row
        .cell(5)
        .and_then(|c| first_attr(c, "button", "data-target"))
        .and_then(|reference| match doc.fragment(&reference) {
            Some(modal) => first_attr(modal, "iframe", "src"),
            None => {
                tracing::debug!("Material '{}' points at missing {}", title, reference);
                None
            }
        });

    Extraction::Found(StudyMaterial {
        program: row.text(3),
        subject: row.text(4),
        file_url,
        title,
    })
}
