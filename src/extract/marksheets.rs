//! Marksheet listing
//!
//! Cell 1 reads `REGNO - Student Name`. Everything else that matters,
//! the subject marks and the issue metadata, lives in form inputs inside the
//! modal referenced from cell 3.

use super::document::{direct_cells, first_attr, input_value, select_in, text_of};
use super::{extract_rows, Extraction, ParsedDocument, Row, RowRules, SkipReason};
use scraper::ElementRef;

pub const PATH: &str = "/marksheet_list.php";

pub const RULES: RowRules = RowRules {
    row_selector: "table tr",
    min_columns: 5,
    header_cell: 1,
    header_tokens: &["REG", "S.No"],
};

#[derive(Debug, Clone, PartialEq)]
pub struct Marksheet {
    pub reg_no: String,
    pub student_name: String,
    pub course: String,
    pub session: String,
    pub issue_date: String,
    pub marksheet_no: String,
    pub certificate_no: String,
    /// In the order the modal lists them
    pub subjects: Vec<SubjectMark>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubjectMark {
    pub subject: String,
    pub marks: String,
}

pub fn extract(doc: &ParsedDocument, rules: &RowRules) -> Vec<Extraction<Marksheet>> {
    extract_rows(doc, rules, read_row)
}

fn read_row(doc: &ParsedDocument, row: &Row<'_>) -> Extraction<Marksheet> {
    let identity = row.text(1);
    let Some((reg_no, student_name)) = identity.split_once('-') else {
        return Extraction::Skipped(SkipReason::Unrecognized("no REGNO - Name separator"));
    };
    let reg_no = reg_no.trim().to_string();
    if reg_no.is_empty() {
        return Extraction::Skipped(SkipReason::MissingKey);
    }

    let Some(reference) = row
        .cell(3)
        .and_then(|c| first_attr(c, "button", "data-target"))
    else {
        return Extraction::Skipped(SkipReason::NoDetail);
    };
    let Some(modal) = doc.fragment(&reference) else {
        return Extraction::Failed {
            key: reg_no,
            reason: format!("modal {} not found", reference),
        };
    };

    let field = |name: &str| input_value(modal, name).unwrap_or_default();

    Extraction::Found(Marksheet {
        student_name: student_name.trim().to_string(),
        course: row.lines(2).into_iter().next().unwrap_or_default(),
        session: field("csession"),
        issue_date: field("doj"),
        marksheet_no: field("mslno"),
        certificate_no: field("cslno"),
        subjects: read_subjects(modal),
        reg_no,
    })
}

/// Subject rows are the modal rows carrying a `theory*` input
fn read_subjects(modal: ElementRef<'_>) -> Vec<SubjectMark> {
    select_in(modal, "table tr")
        .into_iter()
        .filter_map(|tr| {
            let marks = first_attr(tr, r#"input[name^="theory"]"#, "value")?;
            let subject = direct_cells(tr).get(1).map(|c| text_of(*c))?;
            (!subject.is_empty()).then_some(SubjectMark { subject, marks })
        })
        .collect()
}
