//! Branch wallet: fee transfers debited from the franchise branches

use super::document::text_of;
use super::heuristics::parse_amount;
use super::{extract_rows, Extraction, ParsedDocument, Row, RowRules, SkipReason};

pub const PATH: &str = "/branchfee.php";

pub const RULES: RowRules = RowRules {
    row_selector: "table tr",
    min_columns: 6,
    header_cell: 0,
    header_tokens: &["SN"],
};

#[derive(Debug, Clone, PartialEq)]
pub struct WalletEntry {
    pub branch: String,
    pub amount: Option<f64>,
    pub amount_text: String,
    pub date: String,
    pub description: String,
    pub mode: String,
}

impl WalletEntry {
    /// Transactions carry no id; a branch can be debited the same amount
    /// twice on one day only with a different description
    pub fn entry_key(&self) -> String {
        format!(
            "{}|{}|{}|{}",
            self.branch, self.date, self.amount_text, self.description
        )
    }
}

/// The "Net Payment" figure shown above the listing
pub fn net_payment(doc: &ParsedDocument) -> Option<String> {
    doc.select(".box-title strong")
        .first()
        .map(|el| text_of(*el))
        .filter(|s| !s.is_empty())
}

pub fn extract(doc: &ParsedDocument, rules: &RowRules) -> Vec<Extraction<WalletEntry>> {
    if let Some(net) = net_payment(doc) {
        tracing::debug!("Net branch payment: {}", net);
    }
    extract_rows(doc, rules, read_row)
}

fn read_row(_: &ParsedDocument, row: &Row<'_>) -> Extraction<WalletEntry> {
    let branch = row.text(1);
    if branch.is_empty() {
        return Extraction::Skipped(SkipReason::MissingKey);
    }
    let amount_text = row.text(2);

    Extraction::Found(WalletEntry {
        branch,
        amount: parse_amount(&amount_text),
        amount_text,
        date: row.text(3),
        description: row.text(4),
        mode: row.text(5),
    })
}
