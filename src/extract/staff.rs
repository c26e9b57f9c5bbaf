//! Employee listing

use super::heuristics::parse_amount;
use super::{extract_rows, Extraction, ParsedDocument, Row, RowRules, SkipReason};

pub const PATH: &str = "/emp.php";

pub const RULES: RowRules = RowRules {
    row_selector: "table tr",
    min_columns: 5,
    header_cell: 0,
    header_tokens: &["Emp ID"],
};

#[derive(Debug, Clone, PartialEq)]
pub struct StaffMember {
    pub emp_id: String,
    pub name: String,
    pub phone: String,
    pub salary: Option<f64>,
    pub salary_text: String,
    pub department: String,
}

pub fn extract(doc: &ParsedDocument, rules: &RowRules) -> Vec<Extraction<StaffMember>> {
    extract_rows(doc, rules, read_row)
}

fn read_row(_: &ParsedDocument, row: &Row<'_>) -> Extraction<StaffMember> {
    let emp_id = row.text(0);
    if emp_id.is_empty() {
        return Extraction::Skipped(SkipReason::MissingKey);
    }
    let salary_text = row.text(3);
    Extraction::Found(StaffMember {
        emp_id,
        name: row.text(1),
        phone: row.text(2),
        salary: parse_amount(&salary_text),
        salary_text,
        department: row.text(4),
    })
}
