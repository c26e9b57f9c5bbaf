//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the RecordStore trait.
//! All statements are parameterized; no scraped value is ever spliced into SQL.

use crate::extract::admit_cards::AdmitCard;
use crate::extract::branches::Branch;
use crate::extract::cms::{Notice, WebPage};
use crate::extract::courses::Course;
use crate::extract::fees::{DueEntry, FeeReceipt};
use crate::extract::gallery::{Album, Banner};
use crate::extract::heuristics::{normalize_date, parse_amount};
use crate::extract::marksheets::Marksheet;
use crate::extract::materials::StudyMaterial;
use crate::extract::paper_sets::PaperSet;
use crate::extract::results::ExamResult;
use crate::extract::staff::StaffMember;
use crate::extract::students::Student;
use crate::extract::wallet::WalletEntry;
use crate::resource::{Record, ResourceKind};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{RecordStore, StorageError, StorageResult};
use crate::storage::{ResourceRunRecord, RunRecord, RunStatus};
use crate::sync::ResourceReport;
use crate::SyncError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

/// SQLite record store
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (creating if needed) the database at `path`
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStore)` - Successfully opened/created database
    /// * `Err(SyncError)` - Failed to open database
    pub fn open(path: &Path) -> Result<Self, SyncError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn in_memory() -> Result<Self, SyncError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Direct access for ad-hoc queries
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn execute(&self, sql: &str, params: impl rusqlite::Params) -> StorageResult<()> {
        self.conn
            .execute(sql, params)
            .map(|_| ())
            .map_err(StorageError::classify)
    }

    fn upsert_student(&self, s: &Student) -> StorageResult<()> {
        let now = now();
        let (password, confidence) = match &s.password {
            Some(token) => (Some(token.value.as_str()), Some(token.confidence.as_str())),
            None => (None, None),
        };
        self.execute(
            "INSERT INTO students (
                reg_no, password, password_confidence, name, course, contact,
                fee_status, due_amount, net_fee, father_name, doj_raw, doj, batch,
                address, updated_by, source_id, print_url, upload_url, edit_url,
                first_seen_at, last_synced_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?20)
            ON CONFLICT(reg_no) DO UPDATE SET
                password = excluded.password,
                password_confidence = excluded.password_confidence,
                name = excluded.name,
                course = excluded.course,
                contact = excluded.contact,
                fee_status = excluded.fee_status,
                due_amount = excluded.due_amount,
                net_fee = excluded.net_fee,
                father_name = excluded.father_name,
                doj_raw = excluded.doj_raw,
                doj = excluded.doj,
                batch = excluded.batch,
                address = excluded.address,
                updated_by = excluded.updated_by,
                source_id = excluded.source_id,
                print_url = excluded.print_url,
                upload_url = excluded.upload_url,
                edit_url = excluded.edit_url,
                last_synced_at = excluded.last_synced_at",
            params![
                s.reg_no,
                password,
                confidence,
                s.name,
                s.course,
                s.contact,
                s.fee_status.as_str(),
                s.due_amount,
                s.details.net_fee,
                s.details.father_name,
                s.details.date_of_joining,
                iso_date(&s.details.date_of_joining),
                s.details.batch,
                s.details.address,
                s.details.updated_by,
                s.source_id,
                s.print_url,
                s.upload_url,
                s.edit_url,
                now,
            ],
        )
    }

    /// The marksheet row and its subjects change together or not at all
    fn upsert_marksheet(&mut self, m: &Marksheet) -> StorageResult<()> {
        let now = now();
        let tx = self.conn.transaction()?;

        tx.execute(
            "INSERT INTO marksheets (
                reg_no, student_name, course, session, issue_date_raw, issue_date,
                marksheet_no, certificate_no, first_seen_at, last_synced_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
            ON CONFLICT(reg_no) DO UPDATE SET
                student_name = excluded.student_name,
                course = excluded.course,
                session = excluded.session,
                issue_date_raw = excluded.issue_date_raw,
                issue_date = excluded.issue_date,
                marksheet_no = excluded.marksheet_no,
                certificate_no = excluded.certificate_no,
                last_synced_at = excluded.last_synced_at",
            params![
                m.reg_no,
                m.student_name,
                m.course,
                m.session,
                m.issue_date,
                iso_date(&m.issue_date),
                m.marksheet_no,
                m.certificate_no,
                now,
            ],
        )
        .map_err(StorageError::classify)?;

        let sheet_id: i64 = tx.query_row(
            "SELECT id FROM marksheets WHERE reg_no = ?1",
            params![m.reg_no],
            |row| row.get(0),
        )?;

        tx.execute(
            "DELETE FROM marksheet_subjects WHERE marksheet_id = ?1",
            params![sheet_id],
        )?;
        for (position, subject) in m.subjects.iter().enumerate() {
            tx.execute(
                "INSERT INTO marksheet_subjects (marksheet_id, position, subject, marks, marks_value)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    sheet_id,
                    position as i64,
                    subject.subject,
                    subject.marks,
                    parse_amount(&subject.marks),
                ],
            )
            .map_err(StorageError::classify)?;
        }

        tx.commit()?;
        Ok(())
    }

    fn upsert_admit_card(&self, a: &AdmitCard) -> StorageResult<()> {
        self.execute(
            "INSERT INTO admit_cards (
                reg_no, student_name, course, card_no, exam_centre_code,
                exam_centre_address, exam_date_raw, exam_date, exam_time,
                issue_date_raw, issue_date, first_seen_at, last_synced_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)
            ON CONFLICT(reg_no) DO UPDATE SET
                student_name = excluded.student_name,
                course = excluded.course,
                card_no = excluded.card_no,
                exam_centre_code = excluded.exam_centre_code,
                exam_centre_address = excluded.exam_centre_address,
                exam_date_raw = excluded.exam_date_raw,
                exam_date = excluded.exam_date,
                exam_time = excluded.exam_time,
                issue_date_raw = excluded.issue_date_raw,
                issue_date = excluded.issue_date,
                last_synced_at = excluded.last_synced_at",
            params![
                a.reg_no,
                a.student_name,
                a.course,
                a.card_no,
                a.exam_centre_code,
                a.exam_centre_address,
                a.exam_date,
                iso_date(&a.exam_date),
                a.exam_time,
                a.issue_date,
                iso_date(&a.issue_date),
                now(),
            ],
        )
    }

    fn upsert_fee_receipt(&self, f: &FeeReceipt) -> StorageResult<()> {
        self.execute(
            "INSERT INTO fee_reports (
                entry_key, form_no, student_name, course, batch, amount, amount_text,
                cheque_no, payment_date_raw, payment_date, first_seen_at, last_synced_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)
            ON CONFLICT(entry_key) DO UPDATE SET
                student_name = excluded.student_name,
                course = excluded.course,
                batch = excluded.batch,
                amount = excluded.amount,
                cheque_no = excluded.cheque_no,
                payment_date = excluded.payment_date,
                last_synced_at = excluded.last_synced_at",
            params![
                f.entry_key(),
                f.form_no,
                f.student_name,
                f.course,
                f.batch,
                f.amount,
                f.amount_text,
                f.cheque_no,
                f.date,
                iso_date(&f.date),
                now(),
            ],
        )
    }

    fn upsert_due(&self, d: &DueEntry) -> StorageResult<()> {
        self.execute(
            "INSERT INTO dues (
                sid, name, contact, course, total_paid, fee_status, due_amount,
                due_date_raw, due_date, remarks, first_seen_at, last_synced_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)
            ON CONFLICT(sid) DO UPDATE SET
                name = excluded.name,
                contact = excluded.contact,
                course = excluded.course,
                total_paid = excluded.total_paid,
                fee_status = excluded.fee_status,
                due_amount = excluded.due_amount,
                due_date_raw = excluded.due_date_raw,
                due_date = excluded.due_date,
                remarks = excluded.remarks,
                last_synced_at = excluded.last_synced_at",
            params![
                d.sid,
                d.name,
                d.contact,
                d.course,
                d.total_paid,
                d.fee_status.as_str(),
                d.due_amount,
                d.due_date,
                iso_date(&d.due_date),
                d.remarks,
                now(),
            ],
        )
    }

    fn upsert_paper_set(&self, p: &PaperSet) -> StorageResult<()> {
        self.execute(
            "INSERT INTO paper_sets (
                paper_key, title, course, subject, total_questions, duration,
                first_seen_at, last_synced_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
            ON CONFLICT(paper_key) DO UPDATE SET
                subject = excluded.subject,
                total_questions = excluded.total_questions,
                duration = excluded.duration,
                last_synced_at = excluded.last_synced_at",
            params![
                p.paper_key(),
                p.title,
                p.course,
                p.subject,
                p.total_questions,
                p.duration,
                now(),
            ],
        )
    }

    fn upsert_staff(&self, s: &StaffMember) -> StorageResult<()> {
        self.execute(
            "INSERT INTO staff (
                emp_id, name, phone, salary, salary_text, department,
                first_seen_at, last_synced_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
            ON CONFLICT(emp_id) DO UPDATE SET
                name = excluded.name,
                phone = excluded.phone,
                salary = excluded.salary,
                salary_text = excluded.salary_text,
                department = excluded.department,
                last_synced_at = excluded.last_synced_at",
            params![
                s.emp_id,
                s.name,
                s.phone,
                s.salary,
                s.salary_text,
                s.department,
                now(),
            ],
        )
    }

    fn upsert_course(&self, c: &Course) -> StorageResult<()> {
        self.execute(
            "INSERT INTO courses (name, fee, duration, image_url, first_seen_at, last_synced_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            ON CONFLICT(name) DO UPDATE SET
                fee = excluded.fee,
                duration = excluded.duration,
                image_url = excluded.image_url,
                last_synced_at = excluded.last_synced_at",
            params![c.name, c.fee, c.duration, c.image_url, now()],
        )
    }

    fn upsert_branch(&self, b: &Branch) -> StorageResult<()> {
        self.execute(
            "INSERT INTO branches (code, name, address, image_url, first_seen_at, last_synced_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            ON CONFLICT(code) DO UPDATE SET
                name = excluded.name,
                address = excluded.address,
                image_url = excluded.image_url,
                last_synced_at = excluded.last_synced_at",
            params![b.code, b.name, b.address, b.image_url, now()],
        )
    }

    fn upsert_notice(&self, n: &Notice) -> StorageResult<()> {
        self.execute(
            "INSERT INTO notices (title, attachment_url, first_seen_at, last_synced_at)
            VALUES (?1, ?2, ?3, ?3)
            ON CONFLICT(title) DO UPDATE SET
                attachment_url = excluded.attachment_url,
                last_synced_at = excluded.last_synced_at",
            params![n.title, n.attachment_url, now()],
        )
    }

    fn upsert_web_page(&self, w: &WebPage) -> StorageResult<()> {
        self.execute(
            "INSERT INTO web_pages (title, image_url, first_seen_at, last_synced_at)
            VALUES (?1, ?2, ?3, ?3)
            ON CONFLICT(title) DO UPDATE SET
                image_url = excluded.image_url,
                last_synced_at = excluded.last_synced_at",
            params![w.title, w.image_url, now()],
        )
    }

    fn upsert_exam_result(&self, r: &ExamResult) -> StorageResult<()> {
        self.execute(
            "INSERT INTO online_results (
                result_key, student_name, test_name, exam_date_raw, exam_date,
                total_questions, attempted, correct, wrong, total_marks,
                first_seen_at, last_synced_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)
            ON CONFLICT(result_key) DO UPDATE SET
                total_questions = excluded.total_questions,
                attempted = excluded.attempted,
                correct = excluded.correct,
                wrong = excluded.wrong,
                total_marks = excluded.total_marks,
                last_synced_at = excluded.last_synced_at",
            params![
                r.result_key(),
                r.student_name,
                r.test_name,
                r.date,
                iso_date(&r.date),
                r.total_questions,
                r.attempted,
                r.correct,
                r.wrong,
                r.total_marks,
                now(),
            ],
        )
    }

    fn upsert_wallet_entry(&self, w: &WalletEntry) -> StorageResult<()> {
        self.execute(
            "INSERT INTO branch_wallet (
                entry_key, branch, amount, amount_text, txn_date_raw, txn_date,
                description, mode, first_seen_at, last_synced_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
            ON CONFLICT(entry_key) DO UPDATE SET
                amount = excluded.amount,
                txn_date = excluded.txn_date,
                mode = excluded.mode,
                last_synced_at = excluded.last_synced_at",
            params![
                w.entry_key(),
                w.branch,
                w.amount,
                w.amount_text,
                w.date,
                iso_date(&w.date),
                w.description,
                w.mode,
                now(),
            ],
        )
    }

    fn upsert_study_material(&self, m: &StudyMaterial) -> StorageResult<()> {
        self.execute(
            "INSERT INTO study_materials (
                material_key, title, program, subject, file_url, first_seen_at, last_synced_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            ON CONFLICT(material_key) DO UPDATE SET
                file_url = excluded.file_url,
                last_synced_at = excluded.last_synced_at",
            params![
                m.material_key(),
                m.title,
                m.program,
                m.subject,
                m.file_url,
                now(),
            ],
        )
    }

    fn upsert_banner(&self, b: &Banner) -> StorageResult<()> {
        self.execute(
            "INSERT INTO banners (image_url, first_seen_at, last_synced_at)
            VALUES (?1, ?2, ?2)
            ON CONFLICT(image_url) DO UPDATE SET
                last_synced_at = excluded.last_synced_at",
            params![b.image_url, now()],
        )
    }

    /// Photo and video albums share a shape but not a table
    fn upsert_album(&self, kind: ResourceKind, a: &Album) -> StorageResult<()> {
        self.execute(
            &format!(
                "INSERT INTO {} (name, url, album_id, item_count, first_seen_at, last_synced_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?5)
                ON CONFLICT(name) DO UPDATE SET
                    url = excluded.url,
                    album_id = excluded.album_id,
                    item_count = excluded.item_count,
                    last_synced_at = excluded.last_synced_at",
                kind.table()
            ),
            params![a.name, a.url, a.album_id, a.item_count, now()],
        )
    }
}

impl RecordStore for SqliteStore {
    // ===== Records =====

    fn upsert_record(&mut self, record: &Record) -> StorageResult<()> {
        match record {
            Record::Student(s) => self.upsert_student(s),
            Record::Marksheet(m) => self.upsert_marksheet(m),
            Record::AdmitCard(a) => self.upsert_admit_card(a),
            Record::FeeReceipt(f) => self.upsert_fee_receipt(f),
            Record::Due(d) => self.upsert_due(d),
            Record::PaperSet(p) => self.upsert_paper_set(p),
            Record::Staff(s) => self.upsert_staff(s),
            Record::Course(c) => self.upsert_course(c),
            Record::Branch(b) => self.upsert_branch(b),
            Record::Notice(n) => self.upsert_notice(n),
            Record::WebPage(w) => self.upsert_web_page(w),
            Record::ExamResult(r) => self.upsert_exam_result(r),
            Record::WalletEntry(w) => self.upsert_wallet_entry(w),
            Record::StudyMaterial(m) => self.upsert_study_material(m),
            Record::Banner(b) => self.upsert_banner(b),
            Record::PhotoAlbum(a) => self.upsert_album(ResourceKind::PhotoAlbums, a),
            Record::VideoAlbum(a) => self.upsert_album(ResourceKind::VideoAlbums, a),
        }
    }

    fn count_rows(&self, kind: ResourceKind) -> StorageResult<u64> {
        // Table names come from a closed set, never from input
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", kind.table()),
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    // ===== Run Ledger =====

    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64> {
        self.conn.execute(
            "INSERT INTO sync_runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now(), config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn record_resource_run(&mut self, run_id: i64, report: &ResourceReport) -> StorageResult<()> {
        self.conn
            .execute(
                "INSERT INTO resource_runs (
                    run_id, resource, pages_fetched, found, skipped, rejected,
                    persisted, failed, cap_hit, interrupted, failed_keys, recorded_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                ON CONFLICT(run_id, resource) DO UPDATE SET
                    pages_fetched = excluded.pages_fetched,
                    found = excluded.found,
                    skipped = excluded.skipped,
                    rejected = excluded.rejected,
                    persisted = excluded.persisted,
                    failed = excluded.failed,
                    cap_hit = excluded.cap_hit,
                    interrupted = excluded.interrupted,
                    failed_keys = excluded.failed_keys,
                    recorded_at = excluded.recorded_at",
                params![
                    run_id,
                    report.resource.name(),
                    report.pages_fetched as i64,
                    report.found as i64,
                    report.skipped as i64,
                    report.rejected.len() as i64,
                    report.persisted as i64,
                    report.failed_keys.len() as i64,
                    report.cap_hit(),
                    report.is_interrupted(),
                    report.failed_keys.join("\n"),
                    now(),
                ],
            )
            .map_err(|e| match StorageError::classify(e) {
                StorageError::ConstraintViolation(_) => StorageError::RunNotFound(run_id),
                other => other,
            })?;
        Ok(())
    }

    fn finish_run(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()> {
        let updated = self.conn.execute(
            "UPDATE sync_runs SET status = ?1, finished_at = ?2 WHERE id = ?3",
            params![status.to_db_string(), now(), run_id],
        )?;
        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status FROM sync_runs WHERE id = ?1",
                params![run_id],
                run_from_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status FROM sync_runs ORDER BY id DESC LIMIT 1",
                [],
                run_from_row,
            )
            .optional()?;
        Ok(run)
    }

    fn get_resource_runs(&self, run_id: i64) -> StorageResult<Vec<ResourceRunRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT resource, pages_fetched, found, skipped, rejected, persisted, failed, cap_hit,
                    interrupted, failed_keys
             FROM resource_runs WHERE run_id = ?1 ORDER BY id",
        )?;
        let rows = stmt
            .query_map(params![run_id], |row| {
                Ok(ResourceRunRecord {
                    resource: row.get(0)?,
                    pages_fetched: row.get::<_, i64>(1)? as u64,
                    found: row.get::<_, i64>(2)? as u64,
                    skipped: row.get::<_, i64>(3)? as u64,
                    rejected: row.get::<_, i64>(4)? as u64,
                    persisted: row.get::<_, i64>(5)? as u64,
                    failed: row.get::<_, i64>(6)? as u64,
                    cap_hit: row.get(7)?,
                    interrupted: row.get(8)?,
                    failed_keys: row
                        .get::<_, String>(9)?
                        .lines()
                        .map(str::to_string)
                        .collect(),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(4)?)
            .unwrap_or(RunStatus::Running),
    })
}

fn now() -> String {
    Utc::now().to_rfc3339()
}

fn iso_date(raw: &str) -> Option<String> {
    normalize_date(raw).map(|d| d.format("%Y-%m-%d").to_string())
}
