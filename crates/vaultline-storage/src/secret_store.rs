// SPDX-FileCopyrightText: 2026 Vaultline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! File-backed [`SecretStore`] for hosts without a usable OS keychain.
//!
//! Secrets live in their own SQLite file, separate from the vault database,
//! so that wiping one never touches the other. On Unix the file is
//! restricted to the owning user.

use async_trait::async_trait;
use rusqlite::params;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, error};
use vaultline_core::{SecretStore, VaultlineError};

use crate::database::{Database, map_tr_err};
use crate::migrations::Schema;

pub struct SqliteSecretStore {
    db: Database,
}

impl SqliteSecretStore {
    /// Opens or creates the secret database at `path`.
    ///
    /// Any failure is reported as `KeychainUnavailable`.
    pub async fn open(path: &str, wal_mode: bool) -> Result<Self, VaultlineError> {
        let db = Database::open(path, wal_mode, Schema::Secrets)
            .await
            .map_err(|e| {
                error!(path, error = %e, "secret store could not be opened");
                VaultlineError::KeychainUnavailable
            })?;
        restrict_permissions(path);
        Ok(Self { db })
    }

    pub async fn close(&self) -> Result<(), VaultlineError> {
        self.db.close().await
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &str) {
    use std::os::unix::fs::PermissionsExt;

    if let Err(e) = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)) {
        tracing::warn!(path, error = %e, "could not restrict secret store permissions");
    }
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &str) {}

#[async_trait]
impl SecretStore for SqliteSecretStore {
    async fn set_secret(
        &self,
        service: &str,
        account: &str,
        value: &SecretString,
    ) -> Result<(), VaultlineError> {
        let service = service.to_string();
        let account = account.to_string();
        let value = value.expose_secret().to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.db
            .connection()
            .call(move |conn| -> Result<(), rusqlite::Error> {
                conn.execute(
                    "INSERT INTO secrets (service, account, value, updated_at)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT(service, account) DO UPDATE SET
                        value = excluded.value,
                        updated_at = excluded.updated_at",
                    params![service, account, value, now],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err(VaultlineError::KeychainUnavailable))?;
        debug!("secret stored");
        Ok(())
    }

    async fn get_secret(
        &self,
        service: &str,
        account: &str,
    ) -> Result<Option<SecretString>, VaultlineError> {
        let service = service.to_string();
        let account = account.to_string();
        self.db
            .connection()
            .call(move |conn| -> Result<Option<String>, rusqlite::Error> {
                let result = conn.query_row(
                    "SELECT value FROM secrets WHERE service = ?1 AND account = ?2",
                    params![service, account],
                    |row| row.get(0),
                );
                match result {
                    Ok(value) => Ok(Some(value)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e),
                }
            })
            .await
            .map(|value| value.map(SecretString::from))
            .map_err(map_tr_err(VaultlineError::KeychainUnavailable))
    }

    async fn delete_secret(&self, service: &str, account: &str) -> Result<(), VaultlineError> {
        let service = service.to_string();
        let account = account.to_string();
        self.db
            .connection()
            .call(move |conn| -> Result<(), rusqlite::Error> {
                conn.execute(
                    "DELETE FROM secrets WHERE service = ?1 AND account = ?2",
                    params![service, account],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err(VaultlineError::KeychainUnavailable))
    }
}
