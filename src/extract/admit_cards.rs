//! Admit card listing
//!
//! Cell 1 is `<strong>REGNO</strong> - Name<br>Course`; exam venue, date and
//! time come from the inputs of the modal referenced from cell 2.

use super::document::{first_attr, first_text, input_value};
use super::{extract_rows, Extraction, ParsedDocument, Row, RowRules, SkipReason};

pub const PATH: &str = "/admitcard_list.php";

pub const RULES: RowRules = RowRules {
    row_selector: "table tr",
    min_columns: 4,
    header_cell: 1,
    header_tokens: &["REG", "S.No"],
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdmitCard {
    pub reg_no: String,
    pub student_name: String,
    pub course: String,
    pub card_no: String,
    pub exam_centre_code: String,
    pub exam_centre_address: String,
    pub exam_date: String,
    pub exam_time: String,
    pub issue_date: String,
}

pub fn extract(doc: &ParsedDocument, rules: &RowRules) -> Vec<Extraction<AdmitCard>> {
    extract_rows(doc, rules, read_row)
}

fn read_row(doc: &ParsedDocument, row: &Row<'_>) -> Extraction<AdmitCard> {
    let Some(reg_no) = row.cell(1).and_then(|c| first_text(c, "strong")) else {
        return Extraction::Skipped(SkipReason::MissingKey);
    };

    // The name is the text node starting with '-'; the course follows it
    let lines = row.lines(1);
    let name_at = lines.iter().position(|l| l.starts_with('-'));
    let student_name = name_at
        .map(|i| lines[i].trim_start_matches('-').trim().to_string())
        .unwrap_or_default();
    let course = name_at
        .and_then(|i| lines.get(i + 1))
        .cloned()
        .unwrap_or_default();

    let mut card = AdmitCard {
        reg_no,
        student_name,
        course,
        ..AdmitCard::default()
    };

    let Some(reference) = row
        .cell(2)
        .and_then(|c| first_attr(c, "button", "data-target"))
    else {
        return Extraction::Found(card);
    };
    let Some(modal) = doc.fragment(&reference) else {
        return Extraction::Failed {
            key: card.reg_no,
            reason: format!("modal {} not found", reference),
        };
    };

    let field = |name: &str| input_value(modal, name).unwrap_or_default();
    card.card_no = field("cardno");
    card.exam_centre_code = field("pexam_address");
    card.exam_centre_address = field("texam_address");
    card.exam_date = field("texam_date");
    card.exam_time = field("texam_time");
    card.issue_date = field("doj");

    Extraction::Found(card)
}
