// SPDX-FileCopyrightText: 2026 Vaultline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the [`LocalStorage`] trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use vaultline_config::model::StorageConfig;
use vaultline_core::{DeviceConfig, LocalStorage, TransactionRow, TransactionTypes, VaultlineError};

use crate::database::Database;
use crate::migrations::Schema;
use crate::queries::{self, sync_state::SyncState};

/// SQLite-backed vault storage.
///
/// The database is opened on [`SqliteStorage::initialize`]; every
/// [`LocalStorage`] call before that fails with `FailedDatabaseConnection`.
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage with the given configuration.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Creates and initializes the storage in one step.
    pub async fn open(config: StorageConfig) -> Result<Self, VaultlineError> {
        let storage = Self::new(config);
        storage.initialize().await?;
        Ok(storage)
    }

    /// Opens the database file and runs pending migrations.
    pub async fn initialize(&self) -> Result<(), VaultlineError> {
        let db = Database::open(&self.config.database_path, self.config.wal_mode, Schema::Vault)
            .await?;
        self.db
            .set(db)
            .map_err(|_| VaultlineError::FailedDatabaseConnection)?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    /// Checkpoints the WAL. A no-op if never initialized.
    pub async fn close(&self) -> Result<(), VaultlineError> {
        if let Some(db) = self.db.get() {
            db.close().await?;
        }
        Ok(())
    }

    fn db(&self) -> Result<&Database, VaultlineError> {
        self.db
            .get()
            .ok_or(VaultlineError::FailedDatabaseConnection)
    }
}

#[async_trait]
impl LocalStorage for SqliteStorage {
    async fn get_device_config(&self, login: &str) -> Result<Option<DeviceConfig>, VaultlineError> {
        queries::devices::get(self.db()?, login).await
    }

    async fn set_device_config(&self, config: &DeviceConfig) -> Result<(), VaultlineError> {
        queries::devices::set(self.db()?, config).await
    }

    async fn last_sync_time(&self, login: &str) -> Result<u64, VaultlineError> {
        Ok(queries::sync_state::get(self.db()?, login)
            .await?
            .last_client_sync)
    }

    async fn last_server_sync_time(&self, login: &str) -> Result<u64, VaultlineError> {
        Ok(queries::sync_state::get(self.db()?, login)
            .await?
            .last_server_sync)
    }

    async fn update_last_sync_time(
        &self,
        login: &str,
        server_timestamp: u64,
    ) -> Result<(), VaultlineError> {
        let now = u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0);
        let state = SyncState {
            last_server_sync: server_timestamp,
            last_client_sync: now,
        };
        queries::sync_state::update(self.db()?, login, state).await
    }

    async fn upsert_transactions(&self, rows: &[TransactionRow]) -> Result<(), VaultlineError> {
        if rows.is_empty() {
            return Ok(());
        }
        queries::transactions::upsert(self.db()?, rows).await?;
        debug!(count = rows.len(), "transactions upserted");
        Ok(())
    }

    async fn query_transactions(
        &self,
        login: &str,
        types: TransactionTypes,
    ) -> Result<Vec<TransactionRow>, VaultlineError> {
        queries::transactions::query_edits(self.db()?, login, types).await
    }

    async fn remove_user_data(&self, login: &str) -> Result<(), VaultlineError> {
        queries::remove_login(self.db()?, login).await?;
        info!(login, "local user data removed");
        Ok(())
    }

    async fn list_logins(&self) -> Result<Vec<String>, VaultlineError> {
        queries::devices::list_logins(self.db()?).await
    }

    async fn drop_all(&self) -> Result<(), VaultlineError> {
        self.db()?.drop_all().await?;
        info!(path = %self.config.database_path, "vault tables dropped");
        Ok(())
    }
}
