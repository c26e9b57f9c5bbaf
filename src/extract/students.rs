//! Student search listing
//!
//! The lead cell holds `"<REGNO> <PASSWORD>"`; the fee cell is either `PAID`
//! or an amount still due; the action cell points at a modal carrying the
//! label/value details that the listing itself never shows.

use super::document::{direct_cells, first_attr, first_text, select_in, text_of};
use super::heuristics::{self, classify_fee, split_identity, FeeStatus, PasswordToken};
use super::{extract_rows, Extraction, ParsedDocument, Row, RowRules, SkipReason};
use scraper::ElementRef;

pub const PATH: &str = "/search_home.php";

pub const RULES: RowRules = RowRules {
    row_selector: "div#suggesstion-box table.table tr",
    min_columns: 6,
    header_cell: 0,
    header_tokens: &["REG", "SNO", "S.No"],
};

/// Registration numbers shorter than this are layout noise
pub const MIN_REG_NO_LEN: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct Student {
    pub reg_no: String,
    pub password: Option<PasswordToken>,
    pub name: String,
    pub course: String,
    pub contact: String,
    pub fee_status: FeeStatus,
    pub due_amount: i64,
    /// Numeric id the source system uses in its edit links
    pub source_id: Option<i64>,
    pub print_url: Option<String>,
    pub upload_url: Option<String>,
    pub edit_url: Option<String>,
    pub details: StudentDetails,
}

/// Fields only present in the row's modal
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StudentDetails {
    pub net_fee: i64,
    pub father_name: String,
    pub date_of_joining: String,
    pub batch: String,
    pub address: String,
    pub updated_by: String,
}

impl StudentDetails {
    fn read(modal: ElementRef<'_>) -> Self {
        let mut details = StudentDetails::default();
        for tr in select_in(modal, ".modal-body table tr") {
            let cells = direct_cells(tr);
            if cells.len() < 2 {
                continue;
            }
            let label = text_of(cells[0]).to_lowercase();
            let value = text_of(cells[1]);

            if label.contains("net fee") {
                details.net_fee = heuristics::parse_count(&value).unwrap_or(0);
            }
            if label.contains("father") {
                details.father_name = value.clone();
            }
            if label.contains("doj") {
                details.date_of_joining = value.clone();
            }
            if label.contains("batch") {
                details.batch = value.clone();
            }
            if label.contains("address") {
                details.address = value.clone();
            }
            if label.contains("updated") {
                details.updated_by = value;
            }
        }
        details
    }
}

pub fn extract(doc: &ParsedDocument, rules: &RowRules) -> Vec<Extraction<Student>> {
    extract_rows(doc, rules, read_row)
}

fn read_row(doc: &ParsedDocument, row: &Row<'_>) -> Extraction<Student> {
    let Some(identity) = split_identity(&row.text(0)) else {
        return Extraction::Skipped(SkipReason::MissingKey);
    };
    let length = identity.reg_no.chars().count();
    if length < MIN_REG_NO_LEN {
        return Extraction::Skipped(SkipReason::KeyTooShort {
            length,
            minimum: MIN_REG_NO_LEN,
        });
    }

    let name = row
        .cell(1)
        .and_then(|c| first_text(c, "strong"))
        .unwrap_or_else(|| row.text(1));
    let course = row
        .cell(2)
        .and_then(|c| first_text(c, "strong"))
        .unwrap_or_else(|| row.text(2));
    let (fee_status, due_amount) = classify_fee(&row.text(4));

    let action = row.cell(5);
    let link = |pattern: &str| {
        action.and_then(|c| first_attr(c, &format!(r#"a[href*="{}"]"#, pattern), "href"))
    };
    let print_url = link("print_form");
    let upload_url = link("upload_documents");
    let edit_url = link("members_add");
    let source_id = edit_url
        .as_deref()
        .and_then(|href| heuristics::link_param(href, "edit"))
        .and_then(|id| id.parse().ok());

    let modal_ref = action.and_then(|c| first_attr(c, "button[data-target]", "data-target"));
    let details = match modal_ref {
        Some(reference) => match doc.fragment(&reference) {
            Some(modal) => StudentDetails::read(modal),
            None => {
                tracing::debug!(
                    "Student {} points at missing modal {}",
                    identity.reg_no,
                    reference
                );
                StudentDetails::default()
            }
        },
        None => StudentDetails::default(),
    };

    Extraction::Found(Student {
        reg_no: identity.reg_no,
        password: identity.password,
        name,
        course,
        contact: row.text(3),
        fee_status,
        due_amount,
        source_id,
        print_url,
        upload_url,
        edit_url,
        details,
    })
}
