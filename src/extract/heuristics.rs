//! Text heuristics shared by the extractors
//!
//! Everything here works on already-extracted cell text. None of it knows
//! about rows, selectors or resources.

use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?").expect("static regex"));

static LABELLED_PASSWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bpass(?:word)?\b\s*[:\-]?\s*([^\s:]+)").expect("static regex")
});

static PASSWORD_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9@#._-]{4,32}$").expect("static regex"));

static DATE_FORMATS: &[&str] = &[
    "%d-%m-%Y", "%d/%m/%Y", "%d.%m.%Y", "%Y-%m-%d", "%Y/%m/%d", "%d %b %Y", "%d-%b-%Y",
    "%d %B %Y",
];

/// Collapses runs of whitespace (including non-breaking spaces) to single spaces
pub fn collapse_whitespace(text: &str) -> String {
    text.split(|c: char| c.is_whitespace() || c == '\u{a0}')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Case-sensitive substring match of a lead cell against header words
pub fn is_header(lead: &str, tokens: &[&str]) -> bool {
    tokens.iter().any(|token| lead.contains(token))
}

/// Whether a student still owes fees
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeStatus {
    Paid,
    Due,
}

impl FeeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeeStatus::Paid => "PAID",
            FeeStatus::Due => "DUE",
        }
    }
}

impl std::fmt::Display for FeeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies a fee cell: the literal `PAID` marker, or an amount still due.
///
/// The due amount defaults to 0 when no number can be read.
pub fn classify_fee(text: &str) -> (FeeStatus, i64) {
    if text.contains("PAID") {
        return (FeeStatus::Paid, 0);
    }
    let due = parse_amount(text).map(|v| v.trunc() as i64).unwrap_or(0);
    (FeeStatus::Due, due)
}

/// Reads the first number out of a money cell, ignoring thousands separators
/// and surrounding labels (`"Rs. 5,700.00"`, `"5700 Pay"`).
pub fn parse_amount(text: &str) -> Option<f64> {
    let cleaned = text.replace(',', "");
    NUMBER
        .find(&cleaned)
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// Reads the first integer out of a cell
pub fn parse_count(text: &str) -> Option<i64> {
    parse_amount(text).map(|v| v.trunc() as i64)
}

/// How much an extracted password can be trusted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confidence {
    Likely,
    Low,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::Likely => "likely",
            Confidence::Low => "low",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordToken {
    pub value: String,
    pub confidence: Confidence,
}

/// The key and password recovered from a combined identity cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub reg_no: String,
    pub password: Option<PasswordToken>,
}

/// Splits a `"<REGNO> <PASSWORD>"` cell.
///
/// An explicit `pass`-labelled fragment wins over position. A positional
/// token is only `Likely` when it is the sole extra token and looks like a
/// password; anything else is kept but marked `Low`.
pub fn split_identity(text: &str) -> Option<Identity> {
    let mut tokens = text.split_whitespace();
    let reg_no = tokens.next()?.to_string();
    let rest: Vec<&str> = tokens.collect();

    let password = match LABELLED_PASSWORD.captures(text) {
        Some(caps) => caps.get(1).map(|m| PasswordToken {
            value: m.as_str().to_string(),
            confidence: Confidence::Low,
        }),
        None => rest.first().map(|token| PasswordToken {
            value: token.to_string(),
            confidence: if rest.len() == 1 && PASSWORD_TOKEN.is_match(token) {
                Confidence::Likely
            } else {
                Confidence::Low
            },
        }),
    };

    Some(Identity { reg_no, password })
}

/// Pulls `value` out of free text shaped like `Label : value`.
///
/// The value runs to the end of the line. When several labels share a line,
/// it stops where one of `stops` begins; any other `Word :` inside the value
/// (`Ward No: 5`) is kept. Returns `None` when the label is absent or its
/// value is empty.
pub fn labeled_field(text: &str, label: &str, stops: &[&str]) -> Option<String> {
    let pattern = format!(r"(?im)\b{}[ \t]*:[ \t]*([^\n]*)", regex::escape(label));
    let re = Regex::new(&pattern).ok()?;
    let raw = re.captures(text)?.get(1)?.as_str();

    let others: Vec<String> = stops
        .iter()
        .filter(|stop| !stop.eq_ignore_ascii_case(label))
        .map(|stop| regex::escape(stop))
        .collect();
    let end = if others.is_empty() {
        None
    } else {
        Regex::new(&format!(r"(?i)\s\b(?:{})[ \t]*:", others.join("|")))
            .ok()?
            .find(raw)
            .map(|m| m.start())
    };

    let value = raw[..end.unwrap_or(raw.len())].trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Normalizes the date spellings the source system uses
pub fn normalize_date(text: &str) -> Option<NaiveDate> {
    let text = collapse_whitespace(text);
    if text.is_empty() {
        return None;
    }
    let first_token = text.split(' ').next().unwrap_or_default();
    let parsed = [text.as_str(), first_token].into_iter().find_map(|candidate| {
        DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(candidate, fmt).ok())
    });
    parsed
}

/// Value of a query parameter inside a relative link such as `edit.php?edit=42`
pub fn link_param(href: &str, name: &str) -> Option<String> {
    let query = href.split_once('?')?.1;
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combined_identity_cell() {
        let identity = split_identity("GO100110020241760126 9335848463").unwrap();
        assert_eq!(identity.reg_no, "GO100110020241760126");
        let password = identity.password.unwrap();
        assert_eq!(password.value, "9335848463");
        assert_eq!(password.confidence, Confidence::Likely);
    }

    #[test]
    fn test_identity_without_password() {
        let identity = split_identity("GO1001100").unwrap();
        assert_eq!(identity.reg_no, "GO1001100");
        assert!(identity.password.is_none());
        assert!(split_identity("   ").is_none());
    }

    #[test]
    fn test_identity_low_confidence() {
        let extra = split_identity("GO1001100 abcd efgh").unwrap();
        assert_eq!(extra.password.unwrap().confidence, Confidence::Low);

        let odd = split_identity("GO1001100 a$b").unwrap();
        assert_eq!(odd.password.unwrap().confidence, Confidence::Low);
    }

    #[test]
    fn test_identity_labelled_password_wins() {
        let identity = split_identity("GO1001100 Pass: secret99").unwrap();
        let password = identity.password.unwrap();
        assert_eq!(password.value, "secret99");
        assert_eq!(password.confidence, Confidence::Low);
    }

    #[test]
    fn test_fee_classification() {
        assert_eq!(classify_fee("PAID"), (FeeStatus::Paid, 0));
        assert_eq!(classify_fee("5700 Pay"), (FeeStatus::Due, 5700));
        assert_eq!(classify_fee("5,700.00"), (FeeStatus::Due, 5700));
        assert_eq!(classify_fee("Pay now"), (FeeStatus::Due, 0));
        assert_eq!(classify_fee(""), (FeeStatus::Due, 0));
    }

    #[test]
    fn test_fee_marker_is_case_sensitive() {
        assert_eq!(classify_fee("Unpaid 500"), (FeeStatus::Due, 500));
        assert_eq!(classify_fee("paid"), (FeeStatus::Due, 0));
        assert_eq!(classify_fee("2000 (part paid)"), (FeeStatus::Due, 2000));
        assert_eq!(classify_fee("Fee PAID"), (FeeStatus::Paid, 0));
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("Rs. 12,500.50"), Some(12500.5));
        assert_eq!(parse_amount("800"), Some(800.0));
        assert_eq!(parse_amount("n/a"), None);
        assert_eq!(parse_count("Total 60 Questions"), Some(60));
    }

    #[test]
    fn test_is_header() {
        assert!(is_header("S.No", &["S.No"]));
        assert!(is_header("REG NO / PASSWORD", &["REG", "SNO"]));
        assert!(!is_header("s.no", &["S.No"]));
        assert!(!is_header("GO1001100 pw", &["REG", "SNO", "S.No"]));
    }

    const BRANCH_LABELS: &[&str] = &["Code", "Address"];

    #[test]
    fn test_labeled_field() {
        let text = "Gokul Institute\nCode : GK-22\nAddress : Main Road, Agra";
        assert_eq!(
            labeled_field(text, "Code", BRANCH_LABELS).as_deref(),
            Some("GK-22")
        );
        assert_eq!(
            labeled_field(text, "Address", BRANCH_LABELS).as_deref(),
            Some("Main Road, Agra")
        );

        let inline = "Code : GK22 Address : Station Road";
        assert_eq!(
            labeled_field(inline, "Code", BRANCH_LABELS).as_deref(),
            Some("GK22")
        );
        assert_eq!(
            labeled_field(inline, "Address", BRANCH_LABELS).as_deref(),
            Some("Station Road")
        );
    }

    #[test]
    fn test_labeled_field_keeps_inner_labels() {
        let text = "Code : GK22\nAddress : Ward No: 5, Near Bus Stand, Agra";
        assert_eq!(
            labeled_field(text, "Address", BRANCH_LABELS).as_deref(),
            Some("Ward No: 5, Near Bus Stand, Agra")
        );

        let inline = "Address : Plot No: 12 Gali No: 3 Code : GK22";
        assert_eq!(
            labeled_field(inline, "Address", BRANCH_LABELS).as_deref(),
            Some("Plot No: 12 Gali No: 3")
        );
        assert_eq!(
            labeled_field("Address : Ward No: 5", "Address", &[]).as_deref(),
            Some("Ward No: 5")
        );
    }

    #[test]
    fn test_labeled_field_absent_is_empty() {
        assert_eq!(labeled_field("Gokul Institute, Agra", "Code", BRANCH_LABELS), None);
        assert_eq!(labeled_field("Pincode : 282001", "Code", BRANCH_LABELS), None);
        assert_eq!(labeled_field("Code :   ", "Code", BRANCH_LABELS), None);
    }

    #[test]
    fn test_normalize_date() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 15);
        assert_eq!(normalize_date("15-03-2024"), expected);
        assert_eq!(normalize_date("15/03/2024"), expected);
        assert_eq!(normalize_date("15.03.2024"), expected);
        assert_eq!(normalize_date("2024-03-15"), expected);
        assert_eq!(normalize_date("15 Mar 2024"), expected);
        assert_eq!(normalize_date("2024-03-15 10:30:00"), expected);
        assert_eq!(normalize_date("0000-00-00"), None);
        assert_eq!(normalize_date(""), None);
    }

    #[test]
    fn test_link_param() {
        assert_eq!(
            link_param("members_add.php?edit=4417&mode=1", "edit").as_deref(),
            Some("4417")
        );
        assert_eq!(link_param("members_add.php", "edit"), None);
        assert_eq!(link_param("members_add.php?edit=", "edit"), None);
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  Ram \n\t Kumar\u{a0} "), "Ram Kumar");
    }
}
