//! Configuration module for Portal-Sync
//!
//! This module handles loading, parsing, and validating TOML configuration files,
//! and resolving login credentials from the file or the environment.
//!
//! # Example
//!
//! ```no_run
//! use portal_sync::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("portal.toml")).unwrap();
//! println!("Syncing from: {}", config.source.base_url);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CredentialsConfig, OutputConfig, ResourceOverride, SourceConfig, SyncConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};

use crate::AuthError;

/// Environment variable consulted when `[credentials] login-id` is absent
pub const LOGIN_ID_ENV: &str = "PORTAL_LOGIN_ID";

/// Environment variable consulted when `[credentials] password` is absent
pub const PASSWORD_ENV: &str = "PORTAL_PASSWORD";

/// A resolved credential pair
#[derive(Clone)]
pub struct Credentials {
    pub login_id: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("login_id", &self.login_id)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn new(login_id: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            login_id: login_id.into(),
            password: password.into(),
        }
    }

    /// Resolves credentials from the config, falling back to the environment
    pub fn resolve(config: &CredentialsConfig) -> Result<Self, AuthError> {
        let login_id = config
            .login_id
            .clone()
            .or_else(|| std::env::var(LOGIN_ID_ENV).ok())
            .filter(|s| !s.is_empty())
            .ok_or(AuthError::MissingCredentials)?;
        let password = config
            .password
            .clone()
            .or_else(|| std::env::var(PASSWORD_ENV).ok())
            .filter(|s| !s.is_empty())
            .ok_or(AuthError::MissingCredentials)?;

        Ok(Self { login_id, password })
    }
}
