//! Page fetching on top of a session
//!
//! [`PageSource`] is the seam the pagination driver and the synchronizer are
//! written against. [`PageFetcher`] is the real implementation; tests plug in
//! canned pages instead.

use crate::extract::ParsedDocument;
use crate::session::client::{RawPage, Session};
use crate::{AuthError, Result};

/// Anything that can hand back a parsed listing page
///
/// Documents are not `Send`, so implementations are driven sequentially on
/// the current task.
#[allow(async_fn_in_trait)]
pub trait PageSource {
    async fn fetch_page(&mut self, path: &str, query: &[(String, String)])
        -> Result<ParsedDocument>;
}

/// What a single GET turned out to be
enum Fetched {
    Page(ParsedDocument),
    LoginScreen,
}

/// Fetches pages through an authenticated [`Session`], logging in on demand
#[derive(Debug)]
pub struct PageFetcher {
    session: Session,
    relogin_on_expiry: bool,
}

impl PageFetcher {
    pub fn new(session: Session) -> Self {
        let relogin_on_expiry = session.source().relogin_on_expiry;
        Self {
            session,
            relogin_on_expiry,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn into_session(self) -> Session {
        self.session
    }

    /// Logs in unless the session already is; a rejection is fatal
    async fn ensure_authenticated(&mut self) -> Result<()> {
        if self.session.is_authenticated() {
            return Ok(());
        }
        if self.session.login().await? {
            Ok(())
        } else {
            Err(AuthError::Rejected.into())
        }
    }

    async fn get(&self, path: &str, query: &[(String, String)]) -> Result<Fetched> {
        let page = self.session.get(path, query).await?;
        Ok(self.classify(path, page))
    }

    fn classify(&self, path: &str, page: RawPage) -> Fetched {
        let doc = ParsedDocument::parse(&page.body).with_url(page.final_url.as_str());
        if self.session.is_login_redirect(path, &page, &doc) {
            Fetched::LoginScreen
        } else {
            Fetched::Page(doc)
        }
    }
}

impl PageSource for PageFetcher {
    /// Fetches and parses one page.
    ///
    /// A page that turns out to be the login screen means the source dropped
    /// the session. With re-login enabled the fetcher logs in once more and
    /// repeats the request once; otherwise, or if that also bounces, the
    /// session is reported expired.
    async fn fetch_page(
        &mut self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<ParsedDocument> {
        self.ensure_authenticated().await?;

        if let Fetched::Page(doc) = self.get(path, query).await? {
            return Ok(doc);
        }

        tracing::warn!("Session expired while fetching {}", path);
        self.session.invalidate();
        if !self.relogin_on_expiry {
            return Err(expired(path));
        }

        self.ensure_authenticated().await?;
        match self.get(path, query).await? {
            Fetched::Page(doc) => Ok(doc),
            Fetched::LoginScreen => {
                self.session.invalidate();
                Err(expired(path))
            }
        }
    }
}

fn expired(path: &str) -> crate::SyncError {
    AuthError::SessionExpired {
        path: path.to_string(),
    }
    .into()
}
