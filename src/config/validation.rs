use crate::config::types::{Config, OutputConfig, ResourceOverride, SourceConfig, SyncConfig};
use crate::resource::ResourceKind;
use crate::ConfigError;
use std::collections::BTreeMap;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_source_config(&config.source)?;
    validate_output_config(&config.output)?;
    validate_sync_config(&config.sync)?;
    validate_resource_overrides(&config.resources)?;
    Ok(())
}

/// Validates the source system settings
fn validate_source_config(config: &SourceConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url must use http or https, got '{}'",
            url.scheme()
        )));
    }

    for (field, path) in [
        ("login-page", &config.login_page),
        ("login-endpoint", &config.login_endpoint),
    ] {
        validate_path(field, path)?;
    }

    if config.landing_marker.trim().is_empty() {
        return Err(ConfigError::Validation(
            "landing-marker cannot be empty".to_string(),
        ));
    }

    if config.submit_field.trim().is_empty() {
        return Err(ConfigError::Validation(
            "submit-field cannot be empty".to_string(),
        ));
    }

    if config.request_timeout_secs == Some(0) {
        return Err(ConfigError::Validation(
            "request-timeout-secs must be >= 1 when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates an endpoint path relative to the base URL
fn validate_path(field: &str, path: &str) -> Result<(), ConfigError> {
    if !path.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "{} must start with '/', got '{}'",
            field, path
        )));
    }
    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validates that every selected resource is known
fn validate_sync_config(config: &SyncConfig) -> Result<(), ConfigError> {
    for name in &config.resources {
        ResourceKind::from_name(name)?;
    }
    Ok(())
}

/// Validates per-resource paging overrides
fn validate_resource_overrides(
    overrides: &BTreeMap<String, ResourceOverride>,
) -> Result<(), ConfigError> {
    for (name, entry) in overrides {
        let kind = ResourceKind::from_name(name)?;

        if entry.page_size == Some(0) {
            return Err(ConfigError::Validation(format!(
                "page-size for '{}' must be >= 1",
                name
            )));
        }

        if !kind.is_paginated() && (entry.page_size.is_some() || entry.max_offset.is_some()) {
            return Err(ConfigError::Validation(format!(
                "'{}' is a single-page resource; page-size/max-offset do not apply",
                name
            )));
        }
    }
    Ok(())
}
