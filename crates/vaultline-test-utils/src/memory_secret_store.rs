// SPDX-FileCopyrightText: 2026 Vaultline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory secret store for deterministic tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::Mutex;
use vaultline_core::{SecretStore, VaultlineError};

/// A [`SecretStore`] backed by a map. Writes can be made to fail to
/// exercise the paths that tolerate an unavailable keychain.
#[derive(Default)]
pub struct MemorySecretStore {
    entries: Mutex<HashMap<(String, String), SecretString>>,
    fail_writes: AtomicBool,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `set_secret` fail with `KeychainUnavailable`.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Exposed value for `(service, account)`.
    pub async fn peek(&self, service: &str, account: &str) -> Option<String> {
        self.entries
            .lock()
            .await
            .get(&(service.to_string(), account.to_string()))
            .map(|s| s.expose_secret().to_string())
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    async fn set_secret(
        &self,
        service: &str,
        account: &str,
        value: &SecretString,
    ) -> Result<(), VaultlineError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(VaultlineError::KeychainUnavailable);
        }
        self.entries
            .lock()
            .await
            .insert(
                (service.to_string(), account.to_string()),
                SecretString::from(value.expose_secret().to_string()),
            );
        Ok(())
    }

    async fn get_secret(
        &self,
        service: &str,
        account: &str,
    ) -> Result<Option<SecretString>, VaultlineError> {
        Ok(self
            .entries
            .lock()
            .await
            .get(&(service.to_string(), account.to_string()))
            .map(|s| SecretString::from(s.expose_secret().to_string())))
    }

    async fn delete_secret(&self, service: &str, account: &str) -> Result<(), VaultlineError> {
        self.entries
            .lock()
            .await
            .remove(&(service.to_string(), account.to_string()));
        Ok(())
    }
}
