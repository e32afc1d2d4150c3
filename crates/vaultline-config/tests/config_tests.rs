// SPDX-FileCopyrightText: 2026 Vaultline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Vaultline configuration system.

use figment::Jail;
use serial_test::serial;
use vaultline_config::diagnostic::ConfigError;
use vaultline_config::model::VaultlineConfig;
use vaultline_config::{load_and_validate_path, load_and_validate_str, load_config_from_str};

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_vaultline_config() {
    let toml = r#"
[client]
application_name = "Vaultline Test"
app_access_key = "ACCESS"
app_secret_key = "SECRET"
device_name = "build-agent"

[api]
base_url = "https://vault.example.com"
request_timeout_secs = 5
verification_timeout_secs = 60
connect_timeout_secs = 2

[storage]
database_path = "/tmp/vault.db"
secrets_path = "/tmp/secrets.db"
wal_mode = false

[sync]
auto_sync_interval_secs = 600

[kdf]
cache_capacity = 16

[logging]
level = "debug"

[headless]
login = "alice@example.com"
master_password = "correct-horse"
otp_code = "123456"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.client.application_name, "Vaultline Test");
    assert_eq!(config.client.app_access_key, "ACCESS");
    assert_eq!(config.client.app_secret_key, "SECRET");
    assert_eq!(config.client.device_name, "build-agent");
    assert_eq!(config.api.base_url, "https://vault.example.com");
    assert_eq!(config.api.request_timeout_secs, 5);
    assert_eq!(config.api.verification_timeout_secs, 60);
    assert_eq!(config.api.connect_timeout_secs, 2);
    assert_eq!(config.storage.database_path, "/tmp/vault.db");
    assert_eq!(config.storage.secrets_path, "/tmp/secrets.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.sync.auto_sync_interval_secs, 600);
    assert_eq!(config.kdf.cache_capacity, 16);
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.headless.login.as_deref(), Some("alice@example.com"));
    assert_eq!(config.headless.master_password.as_deref(), Some("correct-horse"));
    assert_eq!(config.headless.otp_code.as_deref(), Some("123456"));
}

/// Missing optional sections use defaults without error.
#[test]
fn missing_optional_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");

    assert_eq!(config.client.application_name, "Vaultline CLI v1.0");
    assert_eq!(config.client.device_name, "Vaultline CLI");
    assert_eq!(config.api.base_url, "https://api.dashlane.com");
    assert_eq!(config.api.request_timeout_secs, 30);
    assert_eq!(config.api.verification_timeout_secs, 300);
    assert_eq!(config.api.connect_timeout_secs, 10);
    assert!(config.storage.database_path.ends_with("vaultline.db"));
    assert!(config.storage.secrets_path.ends_with("secrets.db"));
    assert!(config.storage.wal_mode);
    assert_eq!(config.sync.auto_sync_interval_secs, 3600);
    assert_eq!(config.kdf.cache_capacity, 256);
    assert_eq!(config.logging.level, "warn");
    assert!(config.headless.login.is_none());
    assert!(config.headless.master_password.is_none());
}

#[test]
fn unknown_field_in_api_is_reported_with_suggestion() {
    let toml = r#"
[api]
base_rul = "https://vault.example.com"
"#;

    let errors = load_and_validate_str(toml).expect_err("should produce errors");
    let found = errors.iter().any(|e| {
        matches!(e, ConfigError::UnknownKey { key, suggestion, valid_keys, .. } if {
            key == "base_rul"
                && suggestion.as_deref() == Some("base_url")
                && valid_keys.contains("request_timeout_secs")
        })
    });
    assert!(found, "expected UnknownKey for base_rul, got: {errors:?}");
}

#[test]
fn unknown_top_level_section_is_rejected() {
    let toml = r#"
[telemetry]
enabled = true
"#;

    let err = load_config_from_str(toml).expect_err("unknown section should be rejected");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("telemetry"),
        "error should mention unknown field, got: {err_str}"
    );
}

#[test]
fn invalid_type_is_reported() {
    let toml = r#"
[kdf]
cache_capacity = "lots"
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject invalid type");
    assert!(
        errors.iter().any(|e| matches!(
            e,
            ConfigError::InvalidType { key, .. } if key.contains("cache_capacity")
        )),
        "got: {errors:?}"
    );
}

#[test]
fn misplaced_key_points_at_its_section() {
    let toml = r#"
[api]
wal_mode = true
"#;

    let errors = load_and_validate_str(toml).expect_err("wal_mode is not an api key");
    let error = errors
        .iter()
        .find(|e| matches!(e, ConfigError::UnknownKey { key, .. } if key == "wal_mode"))
        .expect("unknown key error");
    let help = miette::Diagnostic::help(error)
        .map(|h| h.to_string())
        .unwrap_or_default();
    assert_eq!(help, "`wal_mode` belongs in the [storage] section");
}

#[test]
fn credential_type_errors_do_not_echo_the_value() {
    let toml = r#"
[headless]
otp_code = 123456
"#;

    let errors = load_and_validate_str(toml).expect_err("otp_code must be a string");
    let rendered: Vec<String> = errors.iter().map(ToString::to_string).collect();
    assert!(
        errors.iter().any(|e| matches!(
            e,
            ConfigError::InvalidType { key, span: Some(_), .. } if key == "headless.otp_code"
        )),
        "got: {errors:?}"
    );
    assert!(rendered.iter().all(|m| !m.contains("123456")), "got: {rendered:?}");
}

#[test]
fn validation_errors_are_collected() {
    let toml = r#"
[api]
base_url = "http://vault.example.com"
request_timeout_secs = 0

[logging]
level = "loud"
"#;

    let errors = load_and_validate_str(toml).expect_err("should fail validation");
    let messages: Vec<String> = errors
        .iter()
        .filter_map(|e| match e {
            ConfigError::Validation { message } => Some(message.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(messages.len(), 3, "got: {messages:?}");
}

#[test]
fn secrets_are_redacted_from_debug() {
    let toml = r#"
[client]
app_secret_key = "super-secret"

[headless]
master_password = "correct-horse"
"#;
    let config = load_config_from_str(toml).unwrap();
    let debug = format!("{config:?}");
    assert!(!debug.contains("super-secret"));
    assert!(!debug.contains("correct-horse"));
    assert!(debug.contains("[REDACTED]"));
}

#[test]
fn config_error_renders_with_miette() {
    use miette::{Diagnostic, GraphicalReportHandler};

    let error = ConfigError::UnknownKey {
        key: "base_rul".to_string(),
        suggestion: Some("base_url".to_string()),
        belongs_in: None,
        valid_keys: "base_url, request_timeout_secs".to_string(),
        span: None,
        src: None,
    };

    assert_eq!(
        error.code().map(|c| c.to_string()).as_deref(),
        Some("vaultline::config::unknown_key")
    );
    let help = error.help().map(|h| h.to_string()).unwrap_or_default();
    assert!(help.contains("did you mean `base_url`"), "got: {help}");

    let mut buf = String::new();
    GraphicalReportHandler::new()
        .render_report(&mut buf, &error)
        .expect("should render without error");
    assert!(buf.contains("base_rul"));
}

#[test]
#[serial]
fn env_vars_override_files() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "vaultline.toml",
            r#"
[api]
base_url = "https://from-file.example.com"

[client]
device_name = "from-file"
"#,
        )?;
        jail.set_env("VAULTLINE_API_BASE_URL", "https://from-env.example.com");
        jail.set_env("VAULTLINE_SYNC_AUTO_SYNC_INTERVAL_SECS", "120");
        jail.set_env("VAULTLINE_HEADLESS_MASTER_PASSWORD", "env-password");

        let config: VaultlineConfig = vaultline_config::load_config()?;
        assert_eq!(config.api.base_url, "https://from-env.example.com");
        assert_eq!(config.client.device_name, "from-file");
        assert_eq!(config.sync.auto_sync_interval_secs, 120);
        assert_eq!(
            config.headless.master_password.as_deref(),
            Some("env-password")
        );
        Ok(())
    });
}

#[test]
#[serial]
fn unrelated_prefixed_env_vars_are_ignored() {
    Jail::expect_with(|jail| {
        jail.set_env("VAULTLINE_APP_ACCESS_KEY", "baked-in-at-build-time");
        jail.set_env("VAULTLINE_CONFIG", "/somewhere/else.toml");
        let config: VaultlineConfig = vaultline_config::load_config()?;
        assert_eq!(config.api.base_url, "https://api.dashlane.com");
        Ok(())
    });
}

#[test]
#[serial]
fn explicit_path_is_loaded_and_validated() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("custom.toml");
    std::fs::write(&path, "[kdf]\ncache_capacity = 4\n").unwrap();
    let config = load_and_validate_path(&path).unwrap();
    assert_eq!(config.kdf.cache_capacity, 4);

    std::fs::write(&path, "[kdf]\ncache_capacity = 0\n").unwrap();
    let errors = load_and_validate_path(&path).unwrap_err();
    assert!(matches!(
        &errors[0],
        ConfigError::Validation { message } if message.contains("cache_capacity")
    ));
}

#[test]
#[serial]
fn env_type_errors_name_the_variable() {
    Jail::expect_with(|jail| {
        jail.set_env("VAULTLINE_KDF_CACHE_CAPACITY", "lots");
        let errors = vaultline_config::load_and_validate().unwrap_err();
        let hint = errors
            .iter()
            .find_map(|e| match e {
                ConfigError::InvalidType { key, hint, .. } if key == "kdf.cache_capacity" => {
                    Some(hint.clone())
                }
                _ => None,
            })
            .expect("invalid type error");
        assert!(hint.contains("VAULTLINE_KDF_CACHE_CAPACITY"), "got: {hint}");
        Ok(())
    });
}
