// SPDX-FileCopyrightText: 2026 Vaultline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./vaultline.toml` > `~/.config/vaultline/vaultline.toml` >
//! `/etc/vaultline/vaultline.toml` with environment variable overrides via the
//! `VAULTLINE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is large and external

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::VaultlineConfig;

pub(crate) const SYSTEM_CONFIG: &str = "/etc/vaultline/vaultline.toml";
pub(crate) const LOCAL_CONFIG: &str = "vaultline.toml";

/// Config sections that environment variables can address.
const SECTIONS: &[&str] = &[
    "client", "api", "storage", "sync", "kdf", "logging", "headless",
];

pub(crate) fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("vaultline/vaultline.toml"))
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/vaultline/vaultline.toml` (system-wide)
/// 3. `~/.config/vaultline/vaultline.toml` (user XDG config)
/// 4. `./vaultline.toml` (local directory)
/// 5. `VAULTLINE_*` environment variables
pub fn load_config() -> Result<VaultlineConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<VaultlineConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(VaultlineConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<VaultlineConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(VaultlineConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for config loading, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(VaultlineConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG))
        .merge(env_provider())
}

fn split_section(key: &str) -> Option<(&'static str, &str)> {
    SECTIONS.iter().find_map(|section| {
        key.strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
            .filter(|rest| !rest.is_empty())
            .map(|rest| (*section, rest))
    })
}

/// Maps `VAULTLINE_<SECTION>_<KEY>` to `<section>.<key>`.
///
/// Only the leading section name is split off, so keys that contain
/// underscores stay intact: `VAULTLINE_API_BASE_URL` is `api.base_url`.
/// Variables that do not name a section, such as the build-time
/// `VAULTLINE_APP_ACCESS_KEY`, are ignored.
fn env_provider() -> Env {
    Env::prefixed("VAULTLINE_")
        .filter(|key| split_section(key.as_str()).is_some())
        .map(|key| match split_section(key.as_str()) {
            Some((section, rest)) => format!("{section}.{rest}").into(),
            None => key.as_str().to_string().into(),
        })
}
