// SPDX-FileCopyrightText: 2026 Vaultline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wiping the local keys and vault data of one login or of all of them.

use tracing::{info, warn};
use vaultline_core::VaultlineError;

use crate::session::Session;

/// Which local data [`Session::reset`] removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetScope {
    /// This session's login only.
    CurrentLogin,
    /// Every login known to local storage; the tables are dropped.
    AllLogins,
}

impl Session {
    /// Deletes local keys and vault data. The device will have to register
    /// again on the next operation.
    pub async fn reset(&mut self, scope: ResetScope) -> Result<(), VaultlineError> {
        match scope {
            ResetScope::CurrentLogin => {
                let login = self.config.login.clone();
                self.delete_local_key(&login).await;
                self.storage.remove_user_data(&login).await?;
            }
            ResetScope::AllLogins => {
                let mut logins = self.storage.list_logins().await?;
                if !logins.contains(&self.config.login) {
                    logins.push(self.config.login.clone());
                }
                for login in &logins {
                    self.delete_local_key(login).await;
                }
                self.storage.drop_all().await?;
                info!(logins = logins.len(), "all local vault data removed");
            }
        }

        self.secrets.forget_device();
        self.registered_with = None;
        self.config_dirty = false;
        Ok(())
    }

    async fn delete_local_key(&self, login: &str) {
        if let Err(e) = self
            .secret_store
            .delete_secret(&self.config.application_name, login)
            .await
        {
            warn!(login, error = %e, "could not delete local key from the secret store");
        }
    }
}
