// SPDX-FileCopyrightText: 2026 Vaultline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OS-keychain style secret storage.

use async_trait::async_trait;
use secrecy::SecretString;

use crate::error::VaultlineError;

/// Keychain-like store addressed by `(service, account)`.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Stores or replaces the secret for `(service, account)`.
    async fn set_secret(
        &self,
        service: &str,
        account: &str,
        value: &SecretString,
    ) -> Result<(), VaultlineError>;

    /// Returns the secret, or `None` when no entry exists.
    async fn get_secret(
        &self,
        service: &str,
        account: &str,
    ) -> Result<Option<SecretString>, VaultlineError>;

    /// Removes the entry. Removing a missing entry is not an error.
    async fn delete_secret(&self, service: &str, account: &str) -> Result<(), VaultlineError>;
}
