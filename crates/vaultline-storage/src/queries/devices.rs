// SPDX-FileCopyrightText: 2026 Vaultline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Device configuration CRUD operations.

use std::str::FromStr;

use rusqlite::{Row, params};
use tracing::warn;
use vaultline_core::{AuthMethod, DeviceConfig, VaultlineError};

use crate::database::{Database, map_tr_err};

/// Get the device configuration for `login`.
pub async fn get(db: &Database, login: &str) -> Result<Option<DeviceConfig>, VaultlineError> {
    let login = login.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<DeviceConfig>, rusqlite::Error> {
            let result = conn.query_row(
                "SELECT login, version, access_key, secret_key_encrypted,
                        master_password_encrypted, should_not_save_master_password,
                        local_key_encrypted, auto_sync, authentication_mode,
                        server_key_encrypted
                 FROM device WHERE login = ?1",
                params![login],
                row_to_config,
            );
            match result {
                Ok(config) => Ok(Some(config)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err(VaultlineError::FailedDatabaseCreation))
}

/// Insert or replace the configuration keyed by its login.
pub async fn set(db: &Database, config: &DeviceConfig) -> Result<(), VaultlineError> {
    let config = config.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO device (login, version, access_key, secret_key_encrypted,
                        master_password_encrypted, should_not_save_master_password,
                        local_key_encrypted, auto_sync, authentication_mode,
                        server_key_encrypted)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                 ON CONFLICT(login) DO UPDATE SET
                    version = excluded.version,
                    access_key = excluded.access_key,
                    secret_key_encrypted = excluded.secret_key_encrypted,
                    master_password_encrypted = excluded.master_password_encrypted,
                    should_not_save_master_password = excluded.should_not_save_master_password,
                    local_key_encrypted = excluded.local_key_encrypted,
                    auto_sync = excluded.auto_sync,
                    authentication_mode = excluded.authentication_mode,
                    server_key_encrypted = excluded.server_key_encrypted",
                params![
                    config.login,
                    config.version,
                    config.access_key,
                    config.secret_key_encrypted,
                    config.master_password_encrypted,
                    config.should_not_save_master_password,
                    config.local_key_encrypted,
                    config.auto_sync,
                    config.authentication_mode.map(|m| m.to_string()),
                    config.server_key_encrypted,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err(VaultlineError::UpdateConfigFailed))
}

/// Logins with a stored configuration, sorted.
pub async fn list_logins(db: &Database) -> Result<Vec<String>, VaultlineError> {
    db.connection()
        .call(|conn| -> Result<Vec<String>, rusqlite::Error> {
            let mut stmt = conn.prepare("SELECT login FROM device ORDER BY login")?;
            let logins = stmt
                .query_map([], |row| row.get(0))?
                .collect::<Result<Vec<String>, _>>()?;
            Ok(logins)
        })
        .await
        .map_err(map_tr_err(VaultlineError::FailedDatabaseCreation))
}

fn row_to_config(row: &Row<'_>) -> Result<DeviceConfig, rusqlite::Error> {
    let login: String = row.get(0)?;
    let mode: Option<String> = row.get(8)?;
    let authentication_mode = mode.and_then(|m| match AuthMethod::from_str(&m) {
        Ok(method) => Some(method),
        Err(_) => {
            warn!(login = %login, mode = %m, "ignoring unknown stored authentication mode");
            None
        }
    });
    Ok(DeviceConfig {
        version: row.get(1)?,
        access_key: row.get(2)?,
        secret_key_encrypted: row.get(3)?,
        master_password_encrypted: row.get(4)?,
        should_not_save_master_password: row.get(5)?,
        local_key_encrypted: row.get(6)?,
        auto_sync: row.get(7)?,
        authentication_mode,
        server_key_encrypted: row.get(9)?,
        login,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::Schema;
    use tempfile::tempdir;

    fn sample(login: &str) -> DeviceConfig {
        let mut config = DeviceConfig::new(login);
        config.version = "Vaultline CLI v1.0".into();
        config.access_key = "DEVICE-ACCESS".into();
        config.secret_key_encrypted = "c2VjcmV0".into();
        config.local_key_encrypted = "bG9jYWw=".into();
        config.authentication_mode = Some(AuthMethod::Totp);
        config
    }

    #[tokio::test]
    async fn round_trip_and_update() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("devices.db");
        let db = Database::open(path.to_str().unwrap(), false, Schema::Vault)
            .await
            .unwrap();

        assert!(get(&db, "alice@example.com").await.unwrap().is_none());

        let mut config = sample("alice@example.com");
        set(&db, &config).await.unwrap();
        assert_eq!(get(&db, "alice@example.com").await.unwrap(), Some(config.clone()));

        config.auto_sync = true;
        config.should_not_save_master_password = false;
        config.master_password_encrypted = Some("bXA=".into());
        config.server_key_encrypted = Some("c2s=".into());
        set(&db, &config).await.unwrap();
        assert_eq!(get(&db, "alice@example.com").await.unwrap(), Some(config));
    }

    #[tokio::test]
    async fn list_logins_is_sorted() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logins.db");
        let db = Database::open(path.to_str().unwrap(), false, Schema::Vault)
            .await
            .unwrap();
        set(&db, &sample("carol@example.com")).await.unwrap();
        set(&db, &sample("alice@example.com")).await.unwrap();
        assert_eq!(
            list_logins(&db).await.unwrap(),
            vec!["alice@example.com", "carol@example.com"]
        );
    }
}
