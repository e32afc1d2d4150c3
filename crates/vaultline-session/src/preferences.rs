// SPDX-FileCopyrightText: 2026 Vaultline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-login preferences stored in the device configuration.

use tracing::debug;
use vaultline_core::{DeviceConfig, VaultlineError};

use crate::session::Session;

impl Session {
    /// Whether the master password is kept (encrypted) between runs.
    pub async fn store_master_password(&self) -> Result<bool, VaultlineError> {
        Ok(self.device_config().await?.should_save_master_password())
    }

    /// Turning this off also deletes the stored password. Turning it on
    /// stores the password the next time the session has it.
    pub async fn set_store_master_password(&mut self, enabled: bool) -> Result<(), VaultlineError> {
        let mut config = self.device_config().await?;
        config.should_not_save_master_password = !enabled;
        if !enabled {
            config.master_password_encrypted = None;
        }
        self.storage.set_device_config(&config).await?;
        debug!(enabled, "store master password preference updated");
        Ok(())
    }

    /// Whether queries synchronize first when the vault is stale.
    pub async fn auto_sync(&self) -> Result<bool, VaultlineError> {
        Ok(self.device_config().await?.auto_sync)
    }

    pub async fn set_auto_sync(&mut self, enabled: bool) -> Result<(), VaultlineError> {
        let mut config = self.device_config().await?;
        config.auto_sync = enabled;
        self.storage.set_device_config(&config).await?;
        debug!(enabled, "auto sync preference updated");
        Ok(())
    }

    async fn device_config(&self) -> Result<DeviceConfig, VaultlineError> {
        self.storage
            .get_device_config(&self.config.login)
            .await?
            .ok_or(VaultlineError::DeviceNotRegistered)
    }
}
