// SPDX-FileCopyrightText: 2026 Vaultline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as non-empty paths, HTTPS endpoints and positive timeouts.

use crate::diagnostic::ConfigError;
use crate::model::VaultlineConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &VaultlineConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if config.client.application_name.trim().is_empty() {
        fail("client.application_name must not be empty".to_string());
    }

    if config.client.device_name.trim().is_empty() {
        fail("client.device_name must not be empty".to_string());
    }

    if let Err(message) = check_base_url(&config.api.base_url) {
        fail(message);
    }

    for (name, value) in [
        ("api.request_timeout_secs", config.api.request_timeout_secs),
        (
            "api.verification_timeout_secs",
            config.api.verification_timeout_secs,
        ),
        ("api.connect_timeout_secs", config.api.connect_timeout_secs),
        (
            "sync.auto_sync_interval_secs",
            config.sync.auto_sync_interval_secs,
        ),
    ] {
        if value == 0 {
            fail(format!("{name} must be greater than zero"));
        }
    }

    if config.kdf.cache_capacity == 0 {
        fail("kdf.cache_capacity must be greater than zero".to_string());
    }

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    if config.storage.secrets_path.trim().is_empty() {
        fail("storage.secrets_path must not be empty".to_string());
    } else if config.storage.secrets_path == config.storage.database_path {
        fail("storage.secrets_path must differ from storage.database_path".to_string());
    }

    let level = config.logging.level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        fail(format!(
            "logging.level `{}` is not one of {}",
            config.logging.level,
            LOG_LEVELS.join(", ")
        ));
    }

    if let Some(login) = &config.headless.login
        && login.trim().is_empty()
    {
        fail("headless.login must not be empty when set".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// HTTPS is required except for loopback hosts.
fn check_base_url(url: &str) -> Result<(), String> {
    let url = url.trim();
    let (scheme, rest) = url
        .split_once("://")
        .ok_or_else(|| format!("api.base_url `{url}` is not an absolute URL"))?;
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host = if authority.starts_with('[') {
        authority.split_inclusive(']').next().unwrap_or_default()
    } else {
        authority.split(':').next().unwrap_or_default()
    };
    if host.is_empty() {
        return Err(format!("api.base_url `{url}` has no host"));
    }
    match scheme {
        "https" => Ok(()),
        "http" if matches!(host, "localhost" | "127.0.0.1" | "[::1]") => Ok(()),
        _ => Err(format!(
            "api.base_url `{url}` must use https (http is only allowed for localhost)"
        )),
    }
}
