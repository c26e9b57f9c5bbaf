//! Queryable HTML documents
//!
//! A thin layer over `scraper` that speaks in the terms the extractors need:
//! table rows with their direct cells, trimmed cell text, form-field values,
//! and lookup of the hidden modal fragments that rows point at.

use crate::extract::heuristics::collapse_whitespace;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

static ID_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("[id]").expect("static selector"));

static LOGIN_FORM_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"input[name="loginid"]"#).expect("static selector"));

/// A fetched page parsed into a DOM
pub struct ParsedDocument {
    html: Html,
    url: Option<String>,
}

impl std::fmt::Debug for ParsedDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParsedDocument")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

impl ParsedDocument {
    /// Parses a full HTML document. Parsing never fails; broken markup is
    /// repaired the way a browser would.
    pub fn parse(body: &str) -> Self {
        Self {
            html: Html::parse_document(body),
            url: None,
        }
    }

    /// Attaches the URL the document was served from
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn html(&self) -> &Html {
        &self.html
    }

    /// Returns every element matching `selector`, in document order
    pub fn select(&self, selector: &str) -> Vec<ElementRef<'_>> {
        match parse_selector(selector) {
            Some(sel) => self.html.select(&sel).collect(),
            None => Vec::new(),
        }
    }

    /// Returns every row matching `selector` together with its direct `<td>` cells
    pub fn rows(&self, selector: &str) -> Vec<Row<'_>> {
        self.select(selector).into_iter().map(Row::new).collect()
    }

    /// Resolves a fragment reference such as `#exampleModal149`
    pub fn fragment(&self, reference: &str) -> Option<ElementRef<'_>> {
        let id = reference.trim().trim_start_matches('#');
        if id.is_empty() {
            return None;
        }
        self.html
            .select(&ID_SELECTOR)
            .find(|el| el.value().attr("id") == Some(id))
    }

    /// True if the page carries the source system's login form
    pub fn has_login_form(&self) -> bool {
        self.html.select(&LOGIN_FORM_SELECTOR).next().is_some()
    }

    /// The `<title>` text, if any
    pub fn title(&self) -> Option<String> {
        self.select("title")
            .first()
            .map(|el| text_of(*el))
            .filter(|s| !s.is_empty())
    }
}

/// A table row and its direct cells
#[derive(Debug, Clone)]
pub struct Row<'a> {
    element: ElementRef<'a>,
    cells: Vec<ElementRef<'a>>,
}

impl<'a> Row<'a> {
    pub fn new(element: ElementRef<'a>) -> Self {
        Self {
            cells: direct_cells(element),
            element,
        }
    }

    pub fn element(&self) -> ElementRef<'a> {
        self.element
    }

    /// Number of direct `<td>` cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cell(&self, index: usize) -> Option<ElementRef<'a>> {
        self.cells.get(index).copied()
    }

    /// Whitespace-collapsed text of a cell; empty if the cell is absent
    pub fn text(&self, index: usize) -> String {
        self.cell(index).map(text_of).unwrap_or_default()
    }

    /// Individual text nodes of a cell, trimmed, empties dropped
    pub fn lines(&self, index: usize) -> Vec<String> {
        self.cell(index).map(lines_of).unwrap_or_default()
    }

    /// True if the row sits inside a modal dialog rather than the listing itself
    pub fn is_inside_modal(&self) -> bool {
        self.element
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|el| el.value().classes().any(|c| c == "modal"))
    }
}

fn parse_selector(selector: &str) -> Option<Selector> {
    match Selector::parse(selector) {
        Ok(sel) => Some(sel),
        Err(e) => {
            tracing::debug!("Invalid selector '{}': {:?}", selector, e);
            None
        }
    }
}

/// Direct `<td>` children of a row
pub fn direct_cells(row: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "td")
        .collect()
}

/// Text content of an element with whitespace runs collapsed
pub fn text_of(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

/// Text nodes of an element, each collapsed, empties dropped
pub fn lines_of(element: ElementRef<'_>) -> Vec<String> {
    element
        .text()
        .map(collapse_whitespace)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Descendants of `element` matching `selector`
pub fn select_in<'a>(element: ElementRef<'a>, selector: &str) -> Vec<ElementRef<'a>> {
    match parse_selector(selector) {
        Some(sel) => element.select(&sel).collect(),
        None => Vec::new(),
    }
}

/// Text of the first non-empty descendant matching `selector`
pub fn first_text(element: ElementRef<'_>, selector: &str) -> Option<String> {
    select_in(element, selector)
        .into_iter()
        .map(text_of)
        .find(|s| !s.is_empty())
}

/// Attribute of the first descendant matching `selector` that carries it
pub fn first_attr(element: ElementRef<'_>, selector: &str, attr: &str) -> Option<String> {
    select_in(element, selector)
        .into_iter()
        .filter_map(|el| el.value().attr(attr))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// Value of the named form field (`<input>` or `<textarea>`) inside `element`
pub fn input_value(element: ElementRef<'_>, name: &str) -> Option<String> {
    let escaped = name.replace('\\', "\\\\").replace('"', "\\\"");
    let input = first_attr(element, &format!(r#"input[name="{}"]"#, escaped), "value");
    input.or_else(|| first_text(element, &format!(r#"textarea[name="{}"]"#, escaped)))
}
