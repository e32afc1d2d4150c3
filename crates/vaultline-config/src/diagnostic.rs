// SPDX-FileCopyrightText: 2026 Vaultline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turning Figment extraction failures into miette diagnostics.
//!
//! Unknown keys get a "did you mean" suggestion, or a pointer to the section
//! the key actually lives in. Type errors on credential keys never echo the
//! offending value.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use figment::error::{Actual, Kind};
use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Every section of `vaultline.toml` and the keys it accepts.
pub const KNOWN_KEYS: &[(&str, &[&str])] = &[
    (
        "client",
        &[
            "application_name",
            "app_access_key",
            "app_secret_key",
            "device_name",
        ],
    ),
    (
        "api",
        &[
            "base_url",
            "request_timeout_secs",
            "verification_timeout_secs",
            "connect_timeout_secs",
        ],
    ),
    ("storage", &["database_path", "secrets_path", "wal_mode"]),
    ("sync", &["auto_sync_interval_secs"]),
    ("kdf", &["cache_capacity"]),
    ("logging", &["level"]),
    ("headless", &["login", "master_password", "otp_code"]),
];

/// Keys whose values are credentials.
const SECRET_KEYS: &[&str] = &[
    "client.app_access_key",
    "client.app_secret_key",
    "headless.master_password",
    "headless.otp_code",
];

const SUGGESTION_THRESHOLD: f64 = 0.75;

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(
        code(vaultline::config::unknown_key),
        help(
            "{}",
            unknown_key_help(key, suggestion.as_deref(), belongs_in.as_deref(), valid_keys)
        )
    )]
    UnknownKey {
        key: String,
        /// Closest accepted key in the same section.
        suggestion: Option<String>,
        /// Another section that accepts `key` verbatim.
        belongs_in: Option<String>,
        valid_keys: String,
        #[label("not accepted here")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("invalid type for key `{key}`: {detail}")]
    #[diagnostic(code(vaultline::config::invalid_type), help("{hint}"))]
    InvalidType {
        /// Dotted path such as `kdf.cache_capacity`.
        key: String,
        detail: String,
        hint: String,
        #[label("wrong type here")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("missing required key `{key}`")]
    #[diagnostic(
        code(vaultline::config::missing_key),
        help("add `{key} = <value>` to your vaultline.toml")
    )]
    MissingKey { key: String },

    #[error("validation error: {message}")]
    #[diagnostic(code(vaultline::config::validation))]
    Validation { message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(vaultline::config::other))]
    Other(String),
}

fn unknown_key_help(
    key: &str,
    suggestion: Option<&str>,
    belongs_in: Option<&str>,
    valid_keys: &str,
) -> String {
    match (belongs_in, suggestion) {
        (Some(section), _) => format!("`{key}` belongs in the [{section}] section"),
        (None, Some(s)) => format!("did you mean `{s}`? Valid keys: {valid_keys}"),
        (None, None) => format!("valid keys: {valid_keys}"),
    }
}

/// Converts every error carried by `err` into a [`ConfigError`].
///
/// `toml_sources` holds `(path, content)` pairs of the files that were
/// merged, used to point spans at the offending key.
pub fn figment_to_config_errors(
    err: figment::Error,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    err.into_iter()
        .map(|error| {
            let path: Vec<String> = error.path.clone();
            match &error.kind {
                Kind::UnknownField(field, expected) => {
                    let (span, src) = locate(&error, &path, field, toml_sources);
                    ConfigError::UnknownKey {
                        key: field.clone(),
                        suggestion: suggest_key(field, expected),
                        belongs_in: home_section(&path, field).map(str::to_string),
                        valid_keys: expected.join(", "),
                        span,
                        src,
                    }
                }
                Kind::MissingField(field) => ConfigError::MissingKey {
                    key: field.to_string(),
                },
                Kind::InvalidType(actual, expected) => {
                    let key = path.join(".");
                    let (span, src) = match path.split_last() {
                        Some((field, section)) => locate(&error, section, field, toml_sources),
                        None => (None, None),
                    };
                    let found = if SECRET_KEYS.contains(&key.as_str()) {
                        redacted_kind(actual).to_string()
                    } else {
                        actual.to_string()
                    };
                    ConfigError::InvalidType {
                        detail: format!("found {found}, expected {expected}"),
                        hint: type_hint(&error, &key, expected),
                        key,
                        span,
                        src,
                    }
                }
                _ => ConfigError::Other(error.to_string()),
            }
        })
        .collect()
}

/// The section other than `path` whose keys include `field`.
fn home_section(path: &[String], field: &str) -> Option<&'static str> {
    let current = path.first().map(String::as_str);
    KNOWN_KEYS
        .iter()
        .filter(|(section, _)| Some(*section) != current)
        .find(|(_, keys)| keys.contains(&field))
        .map(|(section, _)| *section)
}

fn redacted_kind(actual: &Actual) -> &'static str {
    match actual {
        Actual::Str(_) | Actual::Char(_) => "a string",
        Actual::Bool(_) => "a boolean",
        Actual::Signed(_) | Actual::Unsigned(_) | Actual::Float(_) => "a number",
        _ => "a value",
    }
}

/// Names the environment variable when the bad value did not come from a file.
fn type_hint(error: &figment::Error, key: &str, expected: &str) -> String {
    let from_env = error
        .metadata
        .as_ref()
        .is_some_and(|m| m.source.is_none() && m.name.contains("environment"));
    if from_env {
        let var = format!("VAULTLINE_{}", key.replace('.', "_").to_uppercase());
        format!("expected {expected}; check the value of {var}")
    } else {
        format!("expected {expected}")
    }
}

fn locate(
    error: &figment::Error,
    section: &[String],
    field: &str,
    toml_sources: &[(String, String)],
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let file = error
        .metadata
        .as_ref()
        .and_then(|m| m.source.as_ref())
        .and_then(|s| match s {
            figment::Source::File(path) => Some(path.display().to_string()),
            _ => None,
        });
    let source = match file {
        Some(file) => toml_sources.iter().find(|(p, _)| *p == file),
        // Inline strings carry no path.
        None if toml_sources.len() == 1 => toml_sources.first(),
        None => None,
    };

    source
        .and_then(|(path, content)| {
            find_key_offset(content, section, field).map(|offset| {
                (
                    Some(SourceSpan::new(offset.into(), field.len())),
                    Some(NamedSource::new(path, content.clone())),
                )
            })
        })
        .unwrap_or((None, None))
}

/// Byte offset of `field` inside the `[section]` table of `content`.
///
/// Only lines under the exact table header are considered, so a key of the
/// same name in another table is never matched. An empty `section` means
/// the keys before the first header.
pub fn find_key_offset(content: &str, section: &[String], field: &str) -> Option<usize> {
    let wanted = section.join(".");
    let mut table = String::new();
    let mut offset = 0;

    for line in content.split_inclusive('\n') {
        let trimmed = line.trim_start();
        if let Some(header) = trimmed.strip_prefix('[') {
            table = header
                .split(']')
                .next()
                .unwrap_or_default()
                .trim()
                .to_string();
        } else if table == wanted
            && let Some(rest) = trimmed.strip_prefix(field)
            && rest.trim_start().starts_with('=')
        {
            return Some(offset + line.len() - trimmed.len());
        }
        offset += line.len();
    }
    None
}

/// Closest entry of `valid_keys` by Jaro-Winkler similarity, if any is
/// close enough.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|key| (strsim::jaro_winkler(unknown, key), *key))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

/// Renders each error to stderr with miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = miette::GraphicalReportHandler::new();
    for error in errors {
        let mut buf = String::new();
        match handler.render_report(&mut buf, error) {
            Ok(()) => eprint!("{buf}"),
            Err(_) => eprintln!("Error: {error}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api() -> Vec<String> {
        vec!["api".to_string()]
    }

    #[test]
    fn suggests_close_keys_only() {
        let valid = &["login", "master_password", "otp_code"];
        assert_eq!(
            suggest_key("master_pasword", valid).as_deref(),
            Some("master_password")
        );
        assert_eq!(suggest_key("zzzzzz", valid), None);
    }

    #[test]
    fn home_section_skips_the_current_one() {
        assert_eq!(home_section(&api(), "wal_mode"), Some("storage"));
        assert_eq!(home_section(&["storage".to_string()], "wal_mode"), None);
        assert_eq!(home_section(&api(), "nonsense"), None);
    }

    #[test]
    fn offset_stays_inside_the_named_table() {
        let content = concat!(
            "level = \"x\"\n",
            "[logging]\nlevel = \"debug\"\n",
            "[api]\nbase_rul = \"https://x\"\n",
        );
        let o = find_key_offset(content, &api(), "base_rul").unwrap();
        assert_eq!(&content[o..o + 8], "base_rul");

        let top = find_key_offset(content, &[], "level").unwrap();
        assert_eq!(top, 0);
        let logging = find_key_offset(content, &["logging".to_string()], "level").unwrap();
        assert_eq!(&content[logging - 10..logging], "[logging]\n");
    }

    #[test]
    fn offset_needs_the_exact_key() {
        let content = "[api]\nbase_url_extra = 1\n";
        assert_eq!(find_key_offset(content, &api(), "base_url"), None);
        assert_eq!(find_key_offset(content, &["kdf".to_string()], "x"), None);
    }

    #[test]
    fn secret_values_are_described_not_echoed() {
        assert_eq!(redacted_kind(&Actual::Str("hunter2".into())), "a string");
        assert_eq!(redacted_kind(&Actual::Unsigned(123456)), "a number");
    }

    #[test]
    fn known_keys_cover_serialized_defaults() {
        let defaults = toml::Value::try_from(crate::VaultlineConfig::default()).unwrap();
        let sections = defaults.as_table().unwrap();
        for (section, value) in sections {
            let keys = KNOWN_KEYS
                .iter()
                .find(|(name, _)| name == section)
                .map(|(_, keys)| *keys)
                .unwrap_or_else(|| panic!("section {section} missing"));
            for key in value.as_table().unwrap().keys() {
                assert!(keys.contains(&key.as_str()), "{section}.{key} missing");
            }
        }
    }
}
