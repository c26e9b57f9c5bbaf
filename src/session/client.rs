//! The authenticated session
//!
//! The source system is a cookie-session PHP application. A session is:
//! - one `reqwest` client whose cookie jar carries the PHP session id
//! - the credential pair used to (re-)establish it
//! - an `authenticated` flag that only this module sets, and that the
//!   fetcher clears when it notices the session has been dropped

use crate::config::{Credentials, SourceConfig};
use crate::extract::ParsedDocument;
use crate::{Result, SyncError};
use reqwest::{redirect::Policy, Client, StatusCode};
use std::time::Duration;
use url::Url;

/// A page as the transport returned it, before parsing
#[derive(Debug)]
pub struct RawPage {
    /// URL after redirects were followed
    pub final_url: Url,
    pub status: StatusCode,
    pub body: String,
}

/// Builds the HTTP client shared by every request of a session
///
/// # Example
///
/// ```no_run
/// use portal_sync::config::SourceConfig;
/// use portal_sync::session::build_http_client;
///
/// # fn demo(source: &SourceConfig) {
/// let client = build_http_client(source).unwrap();
/// # }
/// ```
pub fn build_http_client(source: &SourceConfig) -> std::result::Result<Client, reqwest::Error> {
    let mut builder = Client::builder()
        .user_agent(source.user_agent.clone())
        .cookie_store(true)
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true);

    if let Some(secs) = source.request_timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }

    builder.build()
}

/// Explicit session object; nothing about it is global
pub struct Session {
    client: Client,
    source: SourceConfig,
    credentials: Credentials,
    authenticated: bool,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("base_url", &self.source.base_url)
            .field("credentials", &self.credentials)
            .field("authenticated", &self.authenticated)
            .finish()
    }
}

impl Session {
    pub fn new(source: SourceConfig, credentials: Credentials) -> Result<Self> {
        let client = build_http_client(&source)?;
        Ok(Self::with_client(client, source, credentials))
    }

    /// Uses a caller-built client, e.g. one with different TLS settings
    pub fn with_client(client: Client, source: SourceConfig, credentials: Credentials) -> Self {
        Self {
            client,
            source,
            credentials,
            authenticated: false,
        }
    }

    pub fn source(&self) -> &SourceConfig {
        &self.source
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Marks the session as dropped by the source system
    pub fn invalidate(&mut self) {
        if self.authenticated {
            tracing::debug!("Session for {} invalidated", self.source.base_url);
        }
        self.authenticated = false;
    }

    /// Builds the absolute URL for a path under the base URL.
    ///
    /// The base may itself carry a path (`https://host/new`), so paths are
    /// appended rather than resolved.
    pub fn endpoint(&self, path: &str, query: &[(String, String)]) -> Result<Url> {
        let mut url = Url::parse(&format!(
            "{}{}",
            self.source.base_url.trim_end_matches('/'),
            path
        ))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    /// Performs the login handshake.
    ///
    /// GETs the login page to obtain a session cookie, then POSTs the
    /// credentials. The source answers a bad login with HTTP 200 and the
    /// login form again, so success is judged only by whether the redirect
    /// chain ended on the landing page.
    ///
    /// Returns `Ok(false)` on rejected credentials; transport failures are
    /// errors.
    pub async fn login(&mut self) -> Result<bool> {
        self.authenticated = false;

        let login_page = self.endpoint(&self.source.login_page, &[])?;
        tracing::debug!("GET {}", login_page);
        self.client
            .get(login_page.clone())
            .send()
            .await
            .map_err(|e| transport(&login_page, e))?;

        let endpoint = self.endpoint(&self.source.login_endpoint, &[])?;
        let form = [
            ("loginid", self.credentials.login_id.as_str()),
            ("password", self.credentials.password.as_str()),
            (self.source.submit_field.as_str(), self.source.submit_value.as_str()),
        ];
        tracing::debug!("POST {}", endpoint);
        let response = self
            .client
            .post(endpoint.clone())
            .form(&form)
            .send()
            .await
            .map_err(|e| transport(&endpoint, e))?;

        let landed = response.url().as_str().contains(&self.source.landing_marker);
        if landed {
            tracing::info!(
                "Logged in to {} as {}",
                self.source.base_url,
                self.credentials.login_id
            );
        } else {
            tracing::warn!(
                "Login as {} rejected (ended at {})",
                self.credentials.login_id,
                response.url()
            );
        }

        self.authenticated = landed;
        Ok(landed)
    }

    /// Issues one GET and returns the body with the URL it finally came from
    pub async fn get(&self, path: &str, query: &[(String, String)]) -> Result<RawPage> {
        let url = self.endpoint(path, query)?;
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| transport(&url, e))?;
        let final_url = response.url().clone();
        let status = response.status();
        let body = response.text().await.map_err(|e| transport(&url, e))?;

        tracing::trace!("{} -> {} ({} bytes)", url, status, body.len());
        Ok(RawPage {
            final_url,
            status,
            body,
        })
    }

    /// True if a page fetched for `requested` is really the login screen
    pub fn is_login_redirect(&self, requested: &str, page: &RawPage, doc: &ParsedDocument) -> bool {
        let final_path = page.final_url.path();
        let redirected = [&self.source.login_page, &self.source.login_endpoint]
            .into_iter()
            .any(|login| final_path.ends_with(login.as_str()) && !requested.ends_with(login.as_str()));
        redirected || doc.has_login_form()
    }
}

fn transport(url: &Url, source: reqwest::Error) -> SyncError {
    SyncError::Transport {
        url: url.to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(base: &str) -> SourceConfig {
        toml::from_str(&format!("base-url = \"{}\"", base)).unwrap()
    }

    fn session(base: &str) -> Session {
        Session::new(source(base), Credentials::new("admin", "secret")).unwrap()
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let s = session("https://portal.example.com/new/");
        let url = s
            .endpoint(
                "/search_home.php",
                &[
                    ("start".to_string(), "50".to_string()),
                    ("pagecounter".to_string(), "50".to_string()),
                ],
            )
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://portal.example.com/new/search_home.php?start=50&pagecounter=50"
        );
    }

    #[test]
    fn test_new_session_is_unauthenticated() {
        let mut s = session("https://portal.example.com/new");
        assert!(!s.is_authenticated());
        s.invalidate();
        assert!(!s.is_authenticated());
    }

    #[test]
    fn test_login_redirect_detection() {
        let s = session("https://portal.example.com/new");
        let page = |url: &str| RawPage {
            final_url: Url::parse(url).unwrap(),
            status: StatusCode::OK,
            body: String::new(),
        };
        let empty = ParsedDocument::parse("<html></html>");

        let bounced = page("https://portal.example.com/new/index.php");
        assert!(s.is_login_redirect("/emp.php", &bounced, &empty));

        let served = page("https://portal.example.com/new/emp.php");
        assert!(!s.is_login_redirect("/emp.php", &served, &empty));

        let form = ParsedDocument::parse(r#"<input name="loginid">"#);
        assert!(s.is_login_redirect("/emp.php", &served, &form));
    }

    #[test]
    fn test_debug_hides_password() {
        let s = session("https://portal.example.com/new");
        let shown = format!("{:?}", s);
        assert!(!shown.contains("secret"));
    }
}
