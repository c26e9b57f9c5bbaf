//! Course catalogue

use super::document::{first_attr, first_text};
use super::{extract_rows, Extraction, ParsedDocument, Row, RowRules, SkipReason};

pub const PATH: &str = "/courses.php";

pub const RULES: RowRules = RowRules {
    row_selector: "table tr",
    min_columns: 5,
    header_cell: 1,
    header_tokens: &["Course Name"],
};

#[derive(Debug, Clone, PartialEq)]
pub struct Course {
    pub name: String,
    pub fee: String,
    pub duration: String,
    pub image_url: Option<String>,
}

pub fn extract(doc: &ParsedDocument, rules: &RowRules) -> Vec<Extraction<Course>> {
    extract_rows(doc, rules, read_row)
}

/// Values sit in a `<span>` when the cell also holds an image or a caption
fn span_or_text(row: &Row<'_>, index: usize) -> String {
    row.cell(index)
        .and_then(|c| first_text(c, "span"))
        .unwrap_or_else(|| row.text(index))
}

fn read_row(_: &ParsedDocument, row: &Row<'_>) -> Extraction<Course> {
    let name = span_or_text(row, 1);
    if name.is_empty() {
        return Extraction::Skipped(SkipReason::MissingKey);
    }
    Extraction::Found(Course {
        name,
        fee: span_or_text(row, 2),
        duration: span_or_text(row, 3),
        image_url: row.cell(1).and_then(|c| first_attr(c, "img", "src")),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::found;

    #[test]
    fn test_courses() {
        let doc = ParsedDocument::parse(
            r#"<table>
                <tr><td>S.No</td><td>Course Name</td><td>Fee</td><td>Duration</td><td>Action</td></tr>
                <tr>
                    <td>1</td>
                    <td><img src="course/adca.jpg"><span>ADCA</span></td>
                    <td><span>12000</span> INR</td>
                    <td><span>12 Months</span></td>
                    <td>Edit</td>
                </tr>
                <tr><td>2</td><td>DCA</td><td>6000</td><td>6 Months</td><td>Edit</td></tr>
            </table>"#,
        );
        let courses = found(extract(&doc, &RULES));
        assert_eq!(courses.len(), 2);
        assert_eq!(courses[0].name, "ADCA");
        assert_eq!(courses[0].fee, "12000");
        assert_eq!(courses[0].duration, "12 Months");
        assert_eq!(courses[0].image_url.as_deref(), Some("course/adca.jpg"));
        assert_eq!(courses[1].name, "DCA");
        assert_eq!(courses[1].image_url, None);
    }
}
