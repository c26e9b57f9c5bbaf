//! Database schema definitions
//!
//! One table per resource, each with a UNIQUE natural key so every write can
//! be an `INSERT ... ON CONFLICT DO UPDATE`. CHECK constraints reject values
//! that cannot be right (negative dues, unknown fee statuses) per record.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track sync runs
CREATE TABLE IF NOT EXISTS sync_runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL
);

-- Per-resource outcome of each run
CREATE TABLE IF NOT EXISTS resource_runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES sync_runs(id),
    resource TEXT NOT NULL,
    pages_fetched INTEGER NOT NULL,
    found INTEGER NOT NULL,
    skipped INTEGER NOT NULL,
    rejected INTEGER NOT NULL,
    persisted INTEGER NOT NULL,
    failed INTEGER NOT NULL,
    cap_hit INTEGER NOT NULL DEFAULT 0,
    interrupted INTEGER NOT NULL DEFAULT 0,
    -- Newline-separated natural keys the store refused
    failed_keys TEXT NOT NULL DEFAULT '',
    recorded_at TEXT NOT NULL,
    UNIQUE(run_id, resource)
);

CREATE TABLE IF NOT EXISTS students (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    reg_no TEXT NOT NULL UNIQUE CHECK (length(reg_no) >= 5),
    password TEXT,
    password_confidence TEXT CHECK (password_confidence IN ('likely', 'low')),
    name TEXT NOT NULL,
    course TEXT,
    contact TEXT,
    fee_status TEXT NOT NULL CHECK (fee_status IN ('PAID', 'DUE')),
    due_amount INTEGER NOT NULL CHECK (due_amount >= 0),
    net_fee INTEGER NOT NULL DEFAULT 0 CHECK (net_fee >= 0),
    father_name TEXT,
    doj_raw TEXT,
    doj TEXT,
    batch TEXT,
    address TEXT,
    updated_by TEXT,
    source_id INTEGER,
    print_url TEXT,
    upload_url TEXT,
    edit_url TEXT,
    first_seen_at TEXT NOT NULL,
    last_synced_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS marksheets (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    reg_no TEXT NOT NULL UNIQUE CHECK (length(reg_no) > 0),
    student_name TEXT,
    course TEXT,
    session TEXT,
    issue_date_raw TEXT,
    issue_date TEXT,
    marksheet_no TEXT,
    certificate_no TEXT,
    first_seen_at TEXT NOT NULL,
    last_synced_at TEXT NOT NULL
);

-- Replaced wholesale with the parent row
CREATE TABLE IF NOT EXISTS marksheet_subjects (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    marksheet_id INTEGER NOT NULL REFERENCES marksheets(id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    subject TEXT NOT NULL,
    marks TEXT NOT NULL,
    marks_value REAL,
    UNIQUE(marksheet_id, position)
);

CREATE INDEX IF NOT EXISTS idx_marksheet_subjects_sheet ON marksheet_subjects(marksheet_id);

CREATE TABLE IF NOT EXISTS admit_cards (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    reg_no TEXT NOT NULL UNIQUE CHECK (length(reg_no) > 0),
    student_name TEXT,
    course TEXT,
    card_no TEXT,
    exam_centre_code TEXT,
    exam_centre_address TEXT,
    exam_date_raw TEXT,
    exam_date TEXT,
    exam_time TEXT,
    issue_date_raw TEXT,
    issue_date TEXT,
    first_seen_at TEXT NOT NULL,
    last_synced_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS online_results (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    result_key TEXT NOT NULL UNIQUE,
    student_name TEXT NOT NULL,
    test_name TEXT NOT NULL,
    exam_date_raw TEXT,
    exam_date TEXT,
    total_questions INTEGER CHECK (total_questions IS NULL OR total_questions >= 0),
    attempted INTEGER CHECK (attempted IS NULL OR attempted >= 0),
    correct INTEGER CHECK (correct IS NULL OR correct >= 0),
    wrong INTEGER CHECK (wrong IS NULL OR wrong >= 0),
    total_marks INTEGER,
    first_seen_at TEXT NOT NULL,
    last_synced_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS fee_reports (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    entry_key TEXT NOT NULL UNIQUE,
    form_no TEXT NOT NULL,
    student_name TEXT,
    course TEXT,
    batch TEXT,
    amount REAL CHECK (amount IS NULL OR amount >= 0),
    amount_text TEXT NOT NULL,
    cheque_no TEXT,
    payment_date_raw TEXT,
    payment_date TEXT,
    first_seen_at TEXT NOT NULL,
    last_synced_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_fee_reports_form ON fee_reports(form_no);

CREATE TABLE IF NOT EXISTS branch_wallet (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    entry_key TEXT NOT NULL UNIQUE,
    branch TEXT NOT NULL,
    amount REAL CHECK (amount IS NULL OR amount >= 0),
    amount_text TEXT NOT NULL,
    txn_date_raw TEXT,
    txn_date TEXT,
    description TEXT,
    mode TEXT,
    first_seen_at TEXT NOT NULL,
    last_synced_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS dues (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    sid TEXT NOT NULL UNIQUE,
    name TEXT,
    contact TEXT,
    course TEXT,
    total_paid REAL NOT NULL CHECK (total_paid >= 0),
    fee_status TEXT NOT NULL CHECK (fee_status IN ('PAID', 'DUE')),
    due_amount INTEGER NOT NULL CHECK (due_amount >= 0),
    due_date_raw TEXT,
    due_date TEXT,
    remarks TEXT,
    first_seen_at TEXT NOT NULL,
    last_synced_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS paper_sets (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    paper_key TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL,
    course TEXT,
    subject TEXT,
    total_questions INTEGER CHECK (total_questions IS NULL OR total_questions >= 0),
    duration TEXT,
    first_seen_at TEXT NOT NULL,
    last_synced_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS study_materials (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    material_key TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL,
    program TEXT,
    subject TEXT,
    file_url TEXT,
    first_seen_at TEXT NOT NULL,
    last_synced_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS staff (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    emp_id TEXT NOT NULL UNIQUE,
    name TEXT,
    phone TEXT,
    salary REAL CHECK (salary IS NULL OR salary >= 0),
    salary_text TEXT,
    department TEXT,
    first_seen_at TEXT NOT NULL,
    last_synced_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS courses (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    fee TEXT,
    duration TEXT,
    image_url TEXT,
    first_seen_at TEXT NOT NULL,
    last_synced_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS branches (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    code TEXT NOT NULL UNIQUE,
    name TEXT,
    address TEXT,
    image_url TEXT,
    first_seen_at TEXT NOT NULL,
    last_synced_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS notices (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL UNIQUE,
    attachment_url TEXT,
    first_seen_at TEXT NOT NULL,
    last_synced_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS web_pages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL UNIQUE,
    image_url TEXT,
    first_seen_at TEXT NOT NULL,
    last_synced_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS banners (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    image_url TEXT NOT NULL UNIQUE,
    first_seen_at TEXT NOT NULL,
    last_synced_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS photo_albums (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    url TEXT,
    album_id TEXT,
    item_count INTEGER CHECK (item_count IS NULL OR item_count >= 0),
    first_seen_at TEXT NOT NULL,
    last_synced_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS video_albums (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    url TEXT,
    album_id TEXT,
    item_count INTEGER CHECK (item_count IS NULL OR item_count >= 0),
    first_seen_at TEXT NOT NULL,
    last_synced_at TEXT NOT NULL
);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ResourceKind;
    use rusqlite::Connection;

    #[test]
    fn test_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        initialize_schema(&conn).unwrap();
        let result = initialize_schema(&conn);

        assert!(result.is_ok());
    }

    #[test]
    fn test_every_resource_has_a_table() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();

        let tables = ResourceKind::ALL
            .iter()
            .map(|kind| kind.table())
            .chain(["sync_runs", "resource_runs", "marksheet_subjects"]);

        for table in tables {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "Table {} should exist", table);
        }
    }
}
