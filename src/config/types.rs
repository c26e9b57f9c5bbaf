use crate::resource::ResourceKind;
use crate::ConfigError;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Main configuration structure for Portal-Sync
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub source: SourceConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    /// Per-resource paging overrides, keyed by resource name
    #[serde(default)]
    pub resources: BTreeMap<String, ResourceOverride>,
}

impl Config {
    /// The resources a full sync covers, in catalogue order when unlisted
    pub fn resource_kinds(&self) -> Result<Vec<ResourceKind>, ConfigError> {
        if self.sync.resources.is_empty() {
            return Ok(ResourceKind::ALL.to_vec());
        }
        self.sync
            .resources
            .iter()
            .map(|name| ResourceKind::from_name(name))
            .collect()
    }
}

/// Where the admin panel lives and how its login handshake looks
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Base URL every path is appended to (e.g. "https://portal.example.com/new")
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Page fetched first to establish session cookies
    #[serde(rename = "login-page", default = "default_login_page")]
    pub login_page: String,

    /// Endpoint the credential form is POSTed to
    #[serde(rename = "login-endpoint", default = "default_login_endpoint")]
    pub login_endpoint: String,

    /// Fragment of the final URL that proves a successful login
    #[serde(rename = "landing-marker", default = "default_landing_marker")]
    pub landing_marker: String,

    /// Name of the submit button field sent with the credentials
    #[serde(rename = "submit-field", default = "default_submit_field")]
    pub submit_field: String,

    /// Value of the submit button field
    #[serde(rename = "submit-value", default = "default_submit_value")]
    pub submit_value: String,

    /// User-Agent header presented to the source system
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Optional whole-request timeout; unset means the transport default
    #[serde(rename = "request-timeout-secs", default)]
    pub request_timeout_secs: Option<u64>,

    /// Whether a detected session expiry triggers one transparent re-login
    #[serde(rename = "relogin-on-expiry", default = "default_true")]
    pub relogin_on_expiry: bool,
}

/// Login credentials; either field may instead come from the environment
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CredentialsConfig {
    #[serde(rename = "login-id", default)]
    pub login_id: Option<String>,

    #[serde(default)]
    pub password: Option<String>,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// Which resources a plain `portal-sync <config>` run covers
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SyncConfig {
    /// Resource names to sync; empty means every known resource
    #[serde(default)]
    pub resources: Vec<String>,
}

/// Paging overrides for a single resource
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourceOverride {
    #[serde(rename = "page-size", default)]
    pub page_size: Option<u32>,

    /// Offset after which pagination stops regardless of results
    #[serde(rename = "max-offset", default)]
    pub max_offset: Option<u32>,
}

fn default_login_page() -> String {
    "/index.php".to_string()
}

fn default_login_endpoint() -> String {
    "/login.php".to_string()
}

fn default_landing_marker() -> String {
    "dashboard.php".to_string()
}

fn default_submit_field() -> String {
    "Submit2".to_string()
}

fn default_submit_value() -> String {
    "Login".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string()
}

fn default_true() -> bool {
    true
}
