//! Branch listing
//!
//! The details cell is free text: a name in `<strong>` followed by
//! `Code : ...` and `Address : ...` lines. Only rows whose first cell shows
//! a branch logo belong to the listing.

use super::document::{first_attr, first_text, select_in};
use super::heuristics::labeled_field;
use super::{extract_rows, Extraction, ParsedDocument, Row, RowRules, SkipReason};

pub const PATH: &str = "/branch.php";

/// Labels that share the details cell
const LABELS: &[&str] = &["Code", "Address"];

pub const RULES: RowRules = RowRules {
    row_selector: "table tr",
    min_columns: 3,
    header_cell: 0,
    header_tokens: &["S.No"],
};

#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    pub code: String,
    pub name: String,
    pub address: String,
    pub image_url: Option<String>,
}

pub fn extract(doc: &ParsedDocument, rules: &RowRules) -> Vec<Extraction<Branch>> {
    extract_rows(doc, rules, read_row)
}

fn read_row(_: &ParsedDocument, row: &Row<'_>) -> Extraction<Branch> {
    let Some(logo) = row.cell(0) else {
        return Extraction::Skipped(SkipReason::Unrecognized("no logo cell"));
    };
    if select_in(logo, "img").is_empty() {
        return Extraction::Skipped(SkipReason::Unrecognized("no branch logo"));
    }

    let text = row.lines(1).join("\n");
    let Some(code) = labeled_field(&text, "Code", LABELS) else {
        return Extraction::Skipped(SkipReason::MissingKey);
    };
    let name = row
        .cell(1)
        .and_then(|c| first_text(c, "strong"))
        .unwrap_or_default();

    Extraction::Found(Branch {
        code,
        name,
        address: labeled_field(&text, "Address", LABELS).unwrap_or_default(),
        image_url: first_attr(logo, "img", "src"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::found;

    #[test]
    fn test_branches() {
        let doc = ParsedDocument::parse(
            r#"<table>
                <tr><td>S.No</td><td>Details</td><td>Action</td></tr>
                <tr>
                    <td><img src="branch/gokul.png"></td>
                    <td><strong>Gokul Computer Centre</strong><br>Code : GOKUL01<br>Address : Main Road, Agra</td>
                    <td>Edit</td>
                </tr>
                <tr>
                    <td><img src="branch/new.png"></td>
                    <td><strong>New Branch</strong><br>Code : NB02</td>
                    <td>Edit</td>
                </tr>
                <tr>
                    <td><img src="branch/x.png"></td>
                    <td><strong>Unlabelled</strong><br>Agra</td>
                    <td>Edit</td>
                </tr>
                <tr><td>1</td><td>Code : X</td><td>no logo</td></tr>
            </table>"#,
        );
        let out = extract(&doc, &RULES);
        assert!(out.contains(&Extraction::Skipped(SkipReason::MissingKey)));
        assert!(out.contains(&Extraction::Skipped(SkipReason::Unrecognized(
            "no branch logo"
        ))));

        let branches = found(out);
        assert_eq!(branches.len(), 2);
        assert_eq!(branches[0].code, "GOKUL01");
        assert_eq!(branches[0].name, "Gokul Computer Centre");
        assert_eq!(branches[0].address, "Main Road, Agra");
        assert_eq!(branches[0].image_url.as_deref(), Some("branch/gokul.png"));
        // No address label: left empty, not guessed
        assert_eq!(branches[1].address, "");
    }

    #[test]
    fn test_branch_address_with_ward_number() {
        let doc = ParsedDocument::parse(
            r#"<table>
                <tr>
                    <td><img src="branch/ward.png"></td>
                    <td><strong>Ward Centre</strong><br>Code : WC05<br>Address : Ward No: 5, Agra</td>
                    <td>Edit</td>
                </tr>
                <tr>
                    <td><img src="branch/inline.png"></td>
                    <td><strong>Inline Centre</strong> Code : IC09 Address : Gali No: 3, Mathura</td>
                    <td>Edit</td>
                </tr>
            </table>"#,
        );
        let branches = found(extract(&doc, &RULES));

        assert_eq!(branches.len(), 2);
        assert_eq!(branches[0].code, "WC05");
        assert_eq!(branches[0].address, "Ward No: 5, Agra");
        assert_eq!(branches[1].code, "IC09");
        assert_eq!(branches[1].address, "Gali No: 3, Mathura");
    }
}
