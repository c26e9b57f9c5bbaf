//! Per-resource field extraction
//!
//! Every listing page is a loosely structured HTML table. Each resource gets
//! its own extraction policy in its own module; they share only the row
//! screening in [`RowRules`] and the text helpers in [`heuristics`].
//!
//! Extraction never fails as a whole. Each candidate row becomes one
//! [`Extraction`]: a record, a skip with its reason, or a rejection of a row
//! that carried a key but could not be read consistently.

pub mod admit_cards;
pub mod branches;
pub mod cms;
pub mod courses;
pub mod document;
pub mod fees;
pub mod gallery;
pub mod heuristics;
pub mod marksheets;
pub mod materials;
pub mod paper_sets;
pub mod results;
pub mod staff;
pub mod students;
pub mod wallet;

pub use document::{ParsedDocument, Row};
pub use heuristics::{Confidence, FeeStatus, PasswordToken};

use std::fmt;

/// Outcome of reading a single row
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction<T> {
    Found(T),
    Skipped(SkipReason),
    /// The row has a natural key but its data is inconsistent
    Failed { key: String, reason: String },
}

impl<T> Extraction<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Extraction<U> {
        match self {
            Extraction::Found(value) => Extraction::Found(f(value)),
            Extraction::Skipped(reason) => Extraction::Skipped(reason),
            Extraction::Failed { key, reason } => Extraction::Failed { key, reason },
        }
    }

    pub fn found(self) -> Option<T> {
        match self {
            Extraction::Found(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Extraction::Found(_))
    }
}

/// Why a row was not treated as data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    TooFewColumns { found: usize, required: usize },
    HeaderRow,
    InsideModal,
    MissingKey,
    KeyTooShort { length: usize, minimum: usize },
    /// The row points at no detail fragment and cannot be read without one
    NoDetail,
    Unrecognized(&'static str),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::TooFewColumns { found, required } => {
                write!(f, "{} columns, need {}", found, required)
            }
            SkipReason::HeaderRow => f.write_str("header row"),
            SkipReason::InsideModal => f.write_str("row belongs to a modal"),
            SkipReason::MissingKey => f.write_str("no natural key"),
            SkipReason::KeyTooShort { length, minimum } => {
                write!(f, "key of length {} is shorter than {}", length, minimum)
            }
            SkipReason::NoDetail => f.write_str("no detail fragment"),
            SkipReason::Unrecognized(what) => write!(f, "unrecognized row: {}", what),
        }
    }
}

/// Which rows of a page are candidates, and how noise is told apart from data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowRules {
    pub row_selector: &'static str,
    pub min_columns: usize,
    /// Index of the cell checked against `header_tokens`
    pub header_cell: usize,
    pub header_tokens: &'static [&'static str],
}

impl RowRules {
    /// Screens out layout rows, header rows and modal-internal rows
    pub fn screen(&self, row: &Row<'_>) -> Result<(), SkipReason> {
        if row.len() < self.min_columns {
            return Err(SkipReason::TooFewColumns {
                found: row.len(),
                required: self.min_columns,
            });
        }
        if heuristics::is_header(&row.text(self.header_cell), self.header_tokens) {
            return Err(SkipReason::HeaderRow);
        }
        if row.is_inside_modal() {
            return Err(SkipReason::InsideModal);
        }
        Ok(())
    }
}

/// Runs `read` over every row that passes `rules`
pub fn extract_rows<T>(
    doc: &ParsedDocument,
    rules: &RowRules,
    read: impl Fn(&ParsedDocument, &Row<'_>) -> Extraction<T>,
) -> Vec<Extraction<T>> {
    doc.rows(rules.row_selector)
        .iter()
        .map(|row| match rules.screen(row) {
            Ok(()) => read(doc, row),
            Err(reason) => Extraction::Skipped(reason),
        })
        .collect()
}

/// Keeps only the found records, dropping skips and rejections
pub fn found<T>(extractions: Vec<Extraction<T>>) -> Vec<T> {
    extractions.into_iter().filter_map(Extraction::found).collect()
}
