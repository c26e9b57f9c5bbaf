//! Online exam results
//!
//! Eleven columns per row. Cells 6 and 9 are percentage bars and are not
//! read.

use super::heuristics::parse_count;
use super::{extract_rows, Extraction, ParsedDocument, Row, RowRules, SkipReason};

pub const PATH: &str = "/result.php";

pub const RULES: RowRules = RowRules {
    row_selector: "table tr",
    min_columns: 11,
    header_cell: 0,
    header_tokens: &["Sn"],
};

#[derive(Debug, Clone, PartialEq)]
pub struct ExamResult {
    pub student_name: String,
    pub date: String,
    pub test_name: String,
    pub total_questions: Option<i64>,
    pub attempted: Option<i64>,
    pub correct: Option<i64>,
    pub wrong: Option<i64>,
    pub total_marks: Option<i64>,
}

impl ExamResult {
    /// A student can sit the same test on different days
    pub fn result_key(&self) -> String {
        format!("{}|{}|{}", self.student_name, self.test_name, self.date)
    }
}

pub fn extract(doc: &ParsedDocument, rules: &RowRules) -> Vec<Extraction<ExamResult>> {
    extract_rows(doc, rules, read_row)
}

fn read_row(_: &ParsedDocument, row: &Row<'_>) -> Extraction<ExamResult> {
    let student_name = row.text(1);
    let test_name = row.text(3);
    if student_name.is_empty() || test_name.is_empty() {
        return Extraction::Skipped(SkipReason::MissingKey);
    }
    let count = |index| parse_count(&row.text(index));

    Extraction::Found(ExamResult {
        student_name,
        date: row.text(2),
        test_name,
        total_questions: count(4),
        attempted: count(5),
        correct: count(7),
        wrong: count(8),
        total_marks: count(10),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::found;

    #[test]
    fn test_exam_results() {
        let doc = ParsedDocument::parse(
            r##"<table>
                <tr bgcolor="#153450"><td>Sn</td><td>Name</td><td>Date</td><td>Test</td><td>Total</td><td>Attempt</td><td>%</td><td>Right</td><td>Wrong</td><td>%</td><td>Marks</td></tr>
                <tr bgcolor="#dff0d8"><td>1</td><td>Ram Kumar</td><td>12-03-2024</td><td>ADCA Set A</td><td>50</td><td>48</td><td>96%</td><td>40</td><td>8</td><td>80%</td><td>40</td></tr>
                <tr bgcolor="#f2dede"><td>2</td><td>Sita Devi</td><td>12-03-2024</td><td>ADCA Set A</td><td>50</td><td>0</td><td>0%</td><td>0</td><td>0</td><td>0%</td><td>-</td></tr>
                <tr><td>3</td><td>Mohan</td><td>12-03-2024</td><td>Set B</td></tr>
            </table>"##,
        );
        let out = extract(&doc, &RULES);
        assert_eq!(out[0], Extraction::Skipped(SkipReason::HeaderRow));
        assert!(matches!(
            out[3],
            Extraction::Skipped(SkipReason::TooFewColumns { found: 4, required: 11 })
        ));

        let results = found(out);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].test_name, "ADCA Set A");
        assert_eq!(results[0].attempted, Some(48));
        assert_eq!(results[0].correct, Some(40));
        assert_eq!(results[0].wrong, Some(8));
        assert_eq!(results[0].total_marks, Some(40));
        assert_eq!(results[0].result_key(), "Ram Kumar|ADCA Set A|12-03-2024");
        assert_eq!(results[1].total_marks, None);
    }
}
