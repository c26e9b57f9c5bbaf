//! Fee collection report and next-installment dues report

use super::heuristics::{classify_fee, parse_amount, FeeStatus};
use super::{extract_rows, Extraction, ParsedDocument, Row, RowRules, SkipReason};

pub const RECEIPTS_PATH: &str = "/membersfee.php";

pub const RECEIPT_RULES: RowRules = RowRules {
    row_selector: "table tr",
    min_columns: 8,
    header_cell: 1,
    header_tokens: &["Form No.", "Student Name"],
};

pub const DUES_PATH: &str = "/next-installment-date-report.php";

pub const DUE_RULES: RowRules = RowRules {
    row_selector: "table tr",
    min_columns: 8,
    header_cell: 0,
    header_tokens: &["SID"],
};

/// One payment collected against a student's admission form
#[derive(Debug, Clone, PartialEq)]
pub struct FeeReceipt {
    pub form_no: String,
    pub student_name: String,
    pub course: String,
    pub batch: String,
    /// `None` when the cell holds no number (`waived`, `-`)
    pub amount: Option<f64>,
    /// The amount exactly as displayed, part of the natural key
    pub amount_text: String,
    pub cheque_no: String,
    pub date: String,
}

impl FeeReceipt {
    /// A form can carry several payments, so the key spans date and amount
    pub fn entry_key(&self) -> String {
        format!("{}|{}|{}", self.form_no, self.date, self.amount_text)
    }
}

/// A student's outstanding installment
#[derive(Debug, Clone, PartialEq)]
pub struct DueEntry {
    pub sid: String,
    pub name: String,
    pub contact: String,
    pub course: String,
    pub total_paid: f64,
    pub fee_status: FeeStatus,
    pub due_amount: i64,
    pub due_date: String,
    pub remarks: String,
}

pub fn extract_receipts(doc: &ParsedDocument, rules: &RowRules) -> Vec<Extraction<FeeReceipt>> {
    extract_rows(doc, rules, read_receipt)
}

pub fn extract_dues(doc: &ParsedDocument, rules: &RowRules) -> Vec<Extraction<DueEntry>> {
    extract_rows(doc, rules, read_due)
}

fn read_receipt(_: &ParsedDocument, row: &Row<'_>) -> Extraction<FeeReceipt> {
    let form_no = row.text(1);
    if form_no.is_empty() {
        return Extraction::Skipped(SkipReason::MissingKey);
    }
    let amount_text = row.text(5);

    Extraction::Found(FeeReceipt {
        form_no,
        student_name: row.text(2),
        course: row.text(3),
        batch: row.text(4),
        amount: parse_amount(&amount_text),
        amount_text,
        cheque_no: row.text(6),
        date: row.text(7),
    })
}

fn read_due(_: &ParsedDocument, row: &Row<'_>) -> Extraction<DueEntry> {
    let sid = row.text(0);
    if sid.is_empty() {
        return Extraction::Skipped(SkipReason::MissingKey);
    }
    let (fee_status, due_amount) = classify_fee(&row.text(5));

    Extraction::Found(DueEntry {
        name: row.text(1),
        contact: row.text(2),
        course: row.text(3),
        total_paid: parse_amount(&row.text(4)).unwrap_or(0.0),
        fee_status,
        due_amount,
        due_date: row.text(6),
        remarks: row.text(7),
        sid,
    })
}
