//! Integration tests for the sync engine
//!
//! These tests use wiremock to stand in for the admin panel and drive the
//! real session, fetcher, synchronizer and SQLite store end-to-end.

use portal_sync::config::{Credentials, SourceConfig};
use portal_sync::storage::RunStatus;
use portal_sync::sync::Termination;
use portal_sync::{
    AuthError, PageFetcher, PageSource, RecordStore, ResourceKind, Session, SqliteStore,
    SyncError, Synchronizer,
};
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LOGIN_FORM: &str = r#"<html><body><form action="login.php" method="post">
    <input name="loginid"><input name="password" type="password">
    <input type="submit" name="Submit2" value="Login">
</form></body></html>"#;

const STAFF_PAGE: &str = r#"<html><body><table>
    <tr><td>Emp ID</td><td>Name</td><td>Phone</td><td>Salary</td><td>Department</td></tr>
    <tr><td>EMP01</td><td>Anil Verma</td><td>9000000001</td><td>12,000</td><td>Accounts</td></tr>
</table></body></html>"#;

/// Creates a source config pointing at the mock server
fn source_config(base_url: &str, relogin_on_expiry: bool) -> SourceConfig {
    toml::from_str(&format!(
        "base-url = \"{}\"\nrelogin-on-expiry = {}",
        base_url, relogin_on_expiry
    ))
    .expect("source config")
}

/// Source config that gives up on any request slower than one second
fn impatient_source_config(base_url: &str) -> SourceConfig {
    toml::from_str(&format!(
        "base-url = \"{}\"\nrequest-timeout-secs = 1",
        base_url
    ))
    .expect("source config")
}

fn fetcher(server: &MockServer, relogin_on_expiry: bool) -> PageFetcher {
    let session = Session::new(
        source_config(&server.uri(), relogin_on_expiry),
        Credentials::new("admin", "secret"),
    )
    .expect("session");
    PageFetcher::new(session)
}

/// Mounts the login handshake; `accept` decides where the POST lands
async fn mount_login(server: &MockServer, accept: bool, expected_posts: u64) {
    Mock::given(method("GET"))
        .and(path("/index.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LOGIN_FORM))
        .mount(server)
        .await;

    let post = if accept {
        ResponseTemplate::new(302).insert_header("Location", "/dashboard.php")
    } else {
        ResponseTemplate::new(200).set_body_string(LOGIN_FORM)
    };
    Mock::given(method("POST"))
        .and(path("/login.php"))
        .respond_with(post)
        .expect(expected_posts)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/dashboard.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<h1>Dashboard</h1>"))
        .mount(server)
        .await;
}

fn student_row(reg_no: &str, password: &str, name: &str, fee: &str) -> String {
    format!(
        r#"<tr>
            <td>{} {}</td>
            <td><strong>{}</strong></td>
            <td><strong>ADCA</strong></td>
            <td>9000000000</td>
            <td>{}</td>
            <td><a href="members_add.php?edit=1">Edit</a></td>
        </tr>"#,
        reg_no, password, name, fee
    )
}

fn student_page(rows: &[String]) -> String {
    format!(
        r#"<html><body><div id="suggesstion-box"><table class="table">
            <tr><td>REG NO</td><td>Name</td><td>Course</td><td>Contact</td><td>Fee</td><td>Action</td></tr>
            {}
        </table></div></body></html>"#,
        rows.concat()
    )
}

async fn mount_student_page(server: &MockServer, start: &str, rows: &[String]) {
    Mock::given(method("GET"))
        .and(path("/search_home.php"))
        .and(query_param("start", start))
        .and(query_param("pagecounter", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_string(student_page(rows)))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_login_lands_on_dashboard() {
    let server = MockServer::start().await;
    mount_login(&server, true, 1).await;

    let mut session = Session::new(
        source_config(&server.uri(), true),
        Credentials::new("admin", "secret"),
    )
    .unwrap();

    assert!(session.login().await.unwrap());
    assert!(session.is_authenticated());
}

#[tokio::test]
async fn test_rejected_login_fails_fetch() {
    let server = MockServer::start().await;
    mount_login(&server, false, 1).await;

    let mut fetcher = fetcher(&server, true);
    let err = fetcher.fetch_page("/emp.php", &[]).await.unwrap_err();

    assert!(matches!(err, SyncError::Authentication(AuthError::Rejected)));
    assert!(!fetcher.session().is_authenticated());
}

#[tokio::test]
async fn test_paginated_students_sync_is_idempotent() {
    let server = MockServer::start().await;
    mount_login(&server, true, 1).await;
    mount_student_page(
        &server,
        "0",
        &[
            student_row("GO100110020241760126", "9335848463", "Ram Kumar", "PAID"),
            student_row("GO100110020241760127", "pass1234", "Sita Devi", "5700 Pay"),
        ],
    )
    .await;
    mount_student_page(
        &server,
        "50",
        &[student_row("GO100110020241760128", "x9y8z7", "Mohan Lal", "1,200")],
    )
    .await;
    mount_student_page(&server, "100", &[]).await;

    let mut sync = Synchronizer::new(fetcher(&server, true), SqliteStore::in_memory().unwrap());

    let first = sync.sync_students().await.unwrap();
    assert_eq!(first.pages_fetched, 3);
    assert_eq!(first.termination, Termination::Exhausted);
    assert_eq!(first.found, 3);
    assert_eq!(first.persisted, 3);

    let snapshot = |store: &SqliteStore| -> Vec<(String, Option<String>, String, i64)> {
        store
            .connection()
            .prepare("SELECT reg_no, password, fee_status, due_amount FROM students ORDER BY reg_no")
            .unwrap()
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap()
    };
    let before = snapshot(sync.store());

    let second = sync.sync_students().await.unwrap();
    assert_eq!(second.persisted, 3);
    assert_eq!(sync.store().count_rows(ResourceKind::Students).unwrap(), 3);
    assert_eq!(snapshot(sync.store()), before);

    assert_eq!(
        before[0],
        (
            "GO100110020241760126".to_string(),
            Some("9335848463".to_string()),
            "PAID".to_string(),
            0
        )
    );
    assert_eq!(before[1].2, "DUE");
    assert_eq!(before[1].3, 5700);
}

#[tokio::test]
async fn test_session_expiry_without_relogin() {
    let server = MockServer::start().await;
    mount_login(&server, true, 1).await;
    Mock::given(method("GET"))
        .and(path("/emp.php"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/index.php"))
        .mount(&server)
        .await;

    let mut fetcher = fetcher(&server, false);
    let err = fetcher.fetch_page("/emp.php", &[]).await.unwrap_err();

    match err {
        SyncError::Authentication(AuthError::SessionExpired { path }) => {
            assert_eq!(path, "/emp.php")
        }
        other => panic!("expected session expiry, got {:?}", other),
    }
    assert!(!fetcher.session().is_authenticated());
}

#[tokio::test]
async fn test_session_expiry_recovers_with_one_relogin() {
    let server = MockServer::start().await;
    mount_login(&server, true, 2).await;
    Mock::given(method("GET"))
        .and(path("/emp.php"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/index.php"))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/emp.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string(STAFF_PAGE))
        .mount(&server)
        .await;

    let mut sync = Synchronizer::new(fetcher(&server, true), SqliteStore::in_memory().unwrap());
    let report = sync.sync_staff().await.unwrap();

    assert_eq!(report.persisted, 1);
    assert_eq!(sync.store().count_rows(ResourceKind::Staff).unwrap(), 1);
}

#[tokio::test]
async fn test_sync_all_into_file_database() {
    let server = MockServer::start().await;
    mount_login(&server, true, 1).await;
    Mock::given(method("GET"))
        .and(path("/emp.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string(STAFF_PAGE))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("portal.db");

    {
        let store = SqliteStore::open(&db_path).unwrap();
        let mut sync = Synchronizer::new(fetcher(&server, true), store);
        let summary = sync.sync_all(&[ResourceKind::Staff], "hash").await.unwrap();
        assert_eq!(summary.total_persisted(), 1);
    }

    let reopened = SqliteStore::open(&db_path).unwrap();
    assert_eq!(reopened.count_rows(ResourceKind::Staff).unwrap(), 1);
    let run = reopened.get_latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.config_hash, "hash");
}

#[tokio::test]
async fn test_refused_connection_is_transport_error() {
    // Bind then release a port so nothing is listening on it
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let session = Session::new(
        source_config(&format!("http://127.0.0.1:{}", port), true),
        Credentials::new("admin", "secret"),
    )
    .unwrap();

    let err = session.get("/emp.php", &[]).await.unwrap_err();

    match err {
        SyncError::Transport { url, .. } => assert!(url.ends_with("/emp.php")),
        other => panic!("expected transport error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_timeout_mid_pagination_keeps_earlier_pages() {
    let server = MockServer::start().await;
    mount_login(&server, true, 1).await;
    mount_student_page(
        &server,
        "0",
        &[student_row("GO100110020241760126", "9335848463", "Ram Kumar", "PAID")],
    )
    .await;
    mount_student_page(
        &server,
        "50",
        &[student_row("GO100110020241760127", "pass1234", "Sita Devi", "5700 Pay")],
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/search_home.php"))
        .and(query_param("start", "100"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(student_page(&[]))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let session = Session::new(
        impatient_source_config(&server.uri()),
        Credentials::new("admin", "secret"),
    )
    .unwrap();
    let mut sync = Synchronizer::new(PageFetcher::new(session), SqliteStore::in_memory().unwrap());

    let err = sync
        .sync_all(&[ResourceKind::Students, ResourceKind::Staff], "hash")
        .await
        .unwrap_err();

    match err {
        SyncError::Transport { url, source } => {
            assert!(url.contains("start=100"));
            assert!(source.is_timeout());
        }
        other => panic!("expected transport error, got {:?}", other),
    }
    assert_eq!(sync.store().count_rows(ResourceKind::Students).unwrap(), 2);
    assert_eq!(sync.store().count_rows(ResourceKind::Staff).unwrap(), 0);

    let run = sync.store().get_latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Failed);
    let rows = sync.store().get_resource_runs(run.id).unwrap();
    assert_eq!(rows.len(), 1);
    assert!(rows[0].interrupted);
    assert_eq!(rows[0].pages_fetched, 2);
    assert_eq!(rows[0].persisted, 2);
}
