// SPDX-FileCopyrightText: 2026 Vaultline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end session tests.
//!
//! `TestHarness` assembles temp SQLite storage, an in-memory secret store, a
//! shared key cache and a mock vault service, and hands out sessions wired
//! to all of them.

use std::sync::Arc;

use vaultline_api::ApiClient;
use vaultline_config::VaultlineConfig;
use vaultline_config::model::StorageConfig;
use vaultline_core::{LocalStorage, VaultlineError};
use vaultline_crypto::KeyCache;
use vaultline_session::{Session, SessionConfig};
use vaultline_storage::SqliteStorage;

use crate::memory_secret_store::MemorySecretStore;
use crate::mock_vault::MockVault;

pub const TEST_LOGIN: &str = "alice@example.com";
pub const TEST_APPLICATION: &str = "Vaultline Test";

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    login: String,
    auto_sync_interval_secs: u64,
    verification_timeout_secs: u64,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            login: TEST_LOGIN.to_string(),
            auto_sync_interval_secs: 3600,
            verification_timeout_secs: 5,
        }
    }

    pub fn with_login(mut self, login: &str) -> Self {
        self.login = login.to_string();
        self
    }

    pub fn with_auto_sync_interval(mut self, secs: u64) -> Self {
        self.auto_sync_interval_secs = secs;
        self
    }

    pub fn with_verification_timeout(mut self, secs: u64) -> Self {
        self.verification_timeout_secs = secs;
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, VaultlineError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|_| VaultlineError::FailedDatabaseCreation)?;
        let vault = MockVault::start().await;

        let mut config = VaultlineConfig::default();
        config.client.application_name = TEST_APPLICATION.to_string();
        config.client.app_access_key = "APPKEY".to_string();
        config.client.app_secret_key = "app-secret".to_string();
        config.client.device_name = "test-device".to_string();
        config.api.base_url = vault.uri();
        config.api.request_timeout_secs = 5;
        config.api.verification_timeout_secs = self.verification_timeout_secs;
        config.api.connect_timeout_secs = 2;
        config.sync.auto_sync_interval_secs = self.auto_sync_interval_secs;
        config.storage = StorageConfig {
            database_path: temp_dir.path().join("vault.db").to_string_lossy().into_owned(),
            secrets_path: temp_dir.path().join("secrets.db").to_string_lossy().into_owned(),
            wal_mode: true,
        };

        let storage = Arc::new(SqliteStorage::open(config.storage.clone()).await?);

        Ok(TestHarness {
            _temp_dir: temp_dir,
            vault,
            storage,
            secrets: Arc::new(MemorySecretStore::new()),
            key_cache: Arc::new(KeyCache::new(config.kdf.cache_capacity)),
            login: self.login,
            config,
        })
    }
}

/// A complete session environment for integration tests.
pub struct TestHarness {
    _temp_dir: tempfile::TempDir,
    pub vault: MockVault,
    pub storage: Arc<SqliteStorage>,
    pub secrets: Arc<MemorySecretStore>,
    pub key_cache: Arc<KeyCache>,
    pub login: String,
    pub config: VaultlineConfig,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// A fresh session for the harness login sharing storage, secret store
    /// and key cache with every other session from this harness.
    pub fn session(&self) -> Session {
        self.session_for(&self.login)
    }

    pub fn session_for(&self, login: &str) -> Session {
        let api = ApiClient::new(&self.config.api, &self.config.client.application_name)
            .expect("mock server URL is valid");
        Session::new(
            SessionConfig::from_config(&self.config, login),
            self.storage.clone(),
            self.secrets.clone(),
            api,
            self.key_cache.clone(),
        )
        .expect("test session config is valid")
    }

    /// Storage as the trait object the session sees.
    pub fn local_storage(&self) -> Arc<dyn LocalStorage> {
        self.storage.clone()
    }
}
