// SPDX-FileCopyrightText: 2026 Vaultline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-session identity built from the loaded configuration.

use std::fmt;
use std::time::Duration;

use vaultline_config::VaultlineConfig;

/// Identity and tuning for one [`Session`](crate::Session).
#[derive(Clone)]
pub struct SessionConfig {
    pub login: String,
    /// Secret-store service name and stored device config version.
    pub application_name: String,
    pub app_access_key: String,
    pub app_secret_key: String,
    pub device_name: String,
    pub app_version: String,
    /// Minimum age of the last sync before a query syncs first.
    pub auto_sync_interval: Duration,
}

impl SessionConfig {
    pub fn from_config(config: &VaultlineConfig, login: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            application_name: config.client.application_name.clone(),
            app_access_key: config.client.app_access_key.clone(),
            app_secret_key: config.client.app_secret_key.clone(),
            device_name: config.client.device_name.clone(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            auto_sync_interval: Duration::from_secs(config.sync.auto_sync_interval_secs),
        }
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("login", &self.login)
            .field("application_name", &self.application_name)
            .field("app_access_key", &self.app_access_key)
            .field("app_secret_key", &"[REDACTED]")
            .field("device_name", &self.device_name)
            .field("app_version", &self.app_version)
            .field("auto_sync_interval", &self.auto_sync_interval)
            .finish()
    }
}
