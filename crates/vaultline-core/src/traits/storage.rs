// SPDX-FileCopyrightText: 2026 Vaultline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Local persistence for transactions, device configuration and sync state.

use async_trait::async_trait;

use crate::error::VaultlineError;
use crate::types::{DeviceConfig, TransactionRow, TransactionTypes};

/// Relational store behind the session engine.
///
/// Failures are reported with the storage-family error codes
/// (`FailedDatabaseCreation`, `DatabaseTransactionFailure`,
/// `UpdateConfigFailed`).
#[async_trait]
pub trait LocalStorage: Send + Sync {
    /// Device configuration for `login`, if one has been written.
    async fn get_device_config(&self, login: &str) -> Result<Option<DeviceConfig>, VaultlineError>;

    /// Inserts or replaces the device configuration keyed by its login.
    async fn set_device_config(&self, config: &DeviceConfig) -> Result<(), VaultlineError>;

    /// Local clock (Unix seconds) of the last successful sync, `0` if never.
    async fn last_sync_time(&self, login: &str) -> Result<u64, VaultlineError>;

    /// Server timestamp returned by the last successful sync, `0` if never.
    async fn last_server_sync_time(&self, login: &str) -> Result<u64, VaultlineError>;

    /// Records a completed sync: stores `server_timestamp` and stamps the
    /// current local time.
    async fn update_last_sync_time(
        &self,
        login: &str,
        server_timestamp: u64,
    ) -> Result<(), VaultlineError>;

    /// Upserts all rows atomically. Either every row is written or none is.
    async fn upsert_transactions(&self, rows: &[TransactionRow]) -> Result<(), VaultlineError>;

    /// `BACKUP_EDIT` rows for `login` whose category is in `types`
    /// (every category when `types` is empty).
    async fn query_transactions(
        &self,
        login: &str,
        types: TransactionTypes,
    ) -> Result<Vec<TransactionRow>, VaultlineError>;

    /// Deletes every row belonging to `login` across all tables.
    async fn remove_user_data(&self, login: &str) -> Result<(), VaultlineError>;

    /// Logins that have a device configuration.
    async fn list_logins(&self) -> Result<Vec<String>, VaultlineError>;

    /// Drops all vault tables.
    async fn drop_all(&self) -> Result<(), VaultlineError>;
}
