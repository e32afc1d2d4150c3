// SPDX-FileCopyrightText: 2026 Vaultline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Vaultline client.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Top-level Vaultline configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VaultlineConfig {
    /// Application identity and API keys.
    #[serde(default)]
    pub client: ClientConfig,

    /// Remote vault service settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Local database and secret store locations.
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub sync: SyncConfig,

    #[serde(default)]
    pub kdf: KdfConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Pre-seeded answers for non-interactive runs.
    #[serde(default)]
    pub headless: HeadlessConfig,
}

/// Application identity sent to the remote service.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Sent as the user agent and stored as the device config version.
    #[serde(default = "default_application_name")]
    pub application_name: String,

    #[serde(default = "default_app_access_key")]
    pub app_access_key: String,

    #[serde(default = "default_app_secret_key")]
    pub app_secret_key: String,

    /// Name under which this device is registered.
    #[serde(default = "default_device_name")]
    pub device_name: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            application_name: default_application_name(),
            app_access_key: default_app_access_key(),
            app_secret_key: default_app_secret_key(),
            device_name: default_device_name(),
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("application_name", &self.application_name)
            .field("app_access_key", &self.app_access_key)
            .field("app_secret_key", &"[REDACTED]")
            .field("device_name", &self.device_name)
            .finish()
    }
}

fn default_application_name() -> String {
    "Vaultline CLI v1.0".to_string()
}

// Release builds bake the keys in at compile time.
fn default_app_access_key() -> String {
    option_env!("VAULTLINE_APP_ACCESS_KEY")
        .unwrap_or_default()
        .to_string()
}

fn default_app_secret_key() -> String {
    option_env!("VAULTLINE_APP_SECRET_KEY")
        .unwrap_or_default()
        .to_string()
}

fn default_device_name() -> String {
    "Vaultline CLI".to_string()
}

/// Remote vault service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
    /// Scheme and host; requests go to `{base_url}/v1/...`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Timeout for push verifications that wait on the user's phone.
    #[serde(default = "default_verification_timeout_secs")]
    pub verification_timeout_secs: u64,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            verification_timeout_secs: default_verification_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.dashlane.com".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_verification_timeout_secs() -> u64 {
    300
}

fn default_connect_timeout_secs() -> u64 {
    10
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite vault database.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Path to the SQLite file backing the secret store.
    #[serde(default = "default_secrets_path")]
    pub secrets_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            secrets_path: default_secrets_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn data_file(name: &str) -> String {
    dirs::data_dir()
        .map(|p| p.join("vaultline").join(name))
        .unwrap_or_else(|| std::path::PathBuf::from(name))
        .to_string_lossy()
        .into_owned()
}

fn default_database_path() -> String {
    data_file("vaultline.db")
}

fn default_secrets_path() -> String {
    data_file("secrets.db")
}

fn default_wal_mode() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SyncConfig {
    /// Minimum age of the last sync before a query triggers a new one.
    #[serde(default = "default_auto_sync_interval_secs")]
    pub auto_sync_interval_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            auto_sync_interval_secs: default_auto_sync_interval_secs(),
        }
    }
}

fn default_auto_sync_interval_secs() -> u64 {
    3600
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct KdfConfig {
    /// Maximum number of derived keys kept in memory.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

impl Default for KdfConfig {
    fn default() -> Self {
        Self {
            cache_capacity: default_cache_capacity(),
        }
    }
}

fn default_cache_capacity() -> usize {
    256
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

/// Values used instead of prompting. Unset fields fall back to prompts.
#[derive(Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HeadlessConfig {
    #[serde(default)]
    pub login: Option<String>,

    #[serde(default)]
    pub master_password: Option<String>,

    #[serde(default)]
    pub otp_code: Option<String>,
}

impl fmt::Debug for HeadlessConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redacted = |v: &Option<String>| v.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("HeadlessConfig")
            .field("login", &self.login)
            .field("master_password", &redacted(&self.master_password))
            .field("otp_code", &redacted(&self.otp_code))
            .finish()
    }
}
