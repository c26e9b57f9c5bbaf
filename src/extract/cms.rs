//! Website content managed through the panel: news items and static pages

use super::document::first_attr;
use super::{extract_rows, Extraction, ParsedDocument, Row, RowRules, SkipReason};

pub const NEWS_PATH: &str = "/news_list.php";

pub const NEWS_RULES: RowRules = RowRules {
    row_selector: "tr[bgcolor]",
    min_columns: 3,
    header_cell: 0,
    header_tokens: &["S.No"],
};

pub const PAGES_PATH: &str = "/page_list.php";

pub const PAGE_RULES: RowRules = RowRules {
    row_selector: ".textli",
    min_columns: 3,
    header_cell: 0,
    header_tokens: &["S.No"],
};

/// Both listings are filtered by country; 0 lists everything
pub const COUNTRY_QUERY: &[(&str, &str)] = &[("country", "0")];

#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub title: String,
    pub attachment_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WebPage {
    pub title: String,
    pub image_url: Option<String>,
}

pub fn extract_news(doc: &ParsedDocument, rules: &RowRules) -> Vec<Extraction<Notice>> {
    extract_rows(doc, rules, read_notice)
}

pub fn extract_pages(doc: &ParsedDocument, rules: &RowRules) -> Vec<Extraction<WebPage>> {
    extract_rows(doc, rules, read_page)
}

fn read_notice(_: &ParsedDocument, row: &Row<'_>) -> Extraction<Notice> {
    let title = row.text(1);
    if title.is_empty() {
        return Extraction::Skipped(SkipReason::MissingKey);
    }
    Extraction::Found(Notice {
        title,
        attachment_url: row.cell(2).and_then(|c| first_attr(c, "a", "href")),
    })
}

fn read_page(_: &ParsedDocument, row: &Row<'_>) -> Extraction<WebPage> {
    let title = row.text(1);
    if title.is_empty() {
        return Extraction::Skipped(SkipReason::MissingKey);
    }
    Extraction::Found(WebPage {
        title,
        image_url: row.cell(2).and_then(|c| first_attr(c, "img", "src")),
    })
}
