// SPDX-FileCopyrightText: 2026 Vaultline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The per-login session.
//!
//! A [`Session`] owns the transient inputs (master password, email token,
//! 2FA code) and the secrets recovered or issued for the device. Operations
//! that need input the session does not have fail with one of the
//! continuation errors (`RequireMasterPassword`, `Require2FACode`,
//! `RequireEmailToken`); the caller assigns the value and calls the same
//! operation again.

use std::sync::Arc;

use tracing::{debug, warn};
use vaultline_api::{ApiClient, Credentials};
use vaultline_core::{AuthMethod, LocalStorage, SecretStore, VaultlineError};
use vaultline_crypto::KeyCache;
use zeroize::Zeroize;

use crate::config::SessionConfig;
use crate::secrets::Secrets;

pub struct Session {
    pub(crate) config: SessionConfig,
    pub(crate) storage: Arc<dyn LocalStorage>,
    pub(crate) secret_store: Arc<dyn SecretStore>,
    pub(crate) api: ApiClient,
    pub(crate) key_cache: Arc<KeyCache>,
    pub(crate) secrets: Secrets,
    /// Verification method used by the registration this run performed.
    pub(crate) registered_with: Option<AuthMethod>,
    /// The persisted device configuration is stale.
    pub(crate) config_dirty: bool,
    /// The stored master password was already read this run.
    pub(crate) stored_password_tried: bool,
    /// The current master password was read from the device configuration.
    pub(crate) password_from_store: bool,
}

impl Session {
    /// Creates a session for `config.login`.
    ///
    /// Nothing is read from storage or the network until an operation runs.
    pub fn new(
        config: SessionConfig,
        storage: Arc<dyn LocalStorage>,
        secret_store: Arc<dyn SecretStore>,
        api: ApiClient,
        key_cache: Arc<KeyCache>,
    ) -> Result<Self, VaultlineError> {
        if config.login.trim().is_empty() {
            return Err(VaultlineError::MissingOrInvalidLogin);
        }
        if config.app_access_key.is_empty() || config.app_secret_key.is_empty() {
            return Err(VaultlineError::MissingOrInvalidAppKeys);
        }
        if config.application_name.is_empty() {
            return Err(VaultlineError::InvalidParameter);
        }
        debug!(login = %config.login, "session created");

        Ok(Self {
            config,
            storage,
            secret_store,
            api,
            key_cache,
            secrets: Secrets::default(),
            registered_with: None,
            config_dirty: false,
            stored_password_tried: false,
            password_from_store: false,
        })
    }

    pub fn login(&self) -> &str {
        &self.config.login
    }

    pub fn application_name(&self) -> &str {
        &self.config.application_name
    }

    pub fn has_master_password(&self) -> bool {
        !self.secrets.master_password.is_empty()
    }

    /// True once device credentials are loaded or issued.
    pub fn is_device_registered(&self) -> bool {
        self.secrets.has_device()
    }

    pub fn assign_master_password(&mut self, password: &str) -> Result<(), VaultlineError> {
        if password.is_empty() {
            return Err(VaultlineError::InvalidParameter);
        }
        self.secrets.set_master_password(password);
        self.password_from_store = false;
        Ok(())
    }

    pub fn assign_email_token(&mut self, token: &str) -> Result<(), VaultlineError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(VaultlineError::InvalidParameter);
        }
        self.secrets.email_token.zeroize();
        self.secrets.email_token.push_str(token);
        Ok(())
    }

    pub fn assign_two_factor_code(&mut self, code: &str) -> Result<(), VaultlineError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(VaultlineError::InvalidParameter);
        }
        self.secrets.two_factor_code.zeroize();
        self.secrets.two_factor_code.push_str(code);
        Ok(())
    }

    pub fn clear_master_password(&mut self) {
        self.secrets.clear_master_password();
        self.password_from_store = false;
    }

    pub fn clear_email_token(&mut self) {
        self.secrets.email_token.zeroize();
    }

    pub fn clear_two_factor_code(&mut self) {
        self.secrets.two_factor_code.zeroize();
    }

    /// Signing credentials for the current state. Device keys are empty
    /// until the device is registered.
    pub(crate) fn credentials(&self) -> Credentials<'_> {
        Credentials {
            login: &self.config.login,
            app_access_key: &self.config.app_access_key,
            app_secret_key: &self.config.app_secret_key,
            device_access_key: &self.secrets.device_access_key,
            device_secret_key: &self.secrets.device_secret_key,
        }
    }

    /// Runs [`Session::get_or_update_secrets`], forgetting the master
    /// password when it turned out to be wrong.
    pub(crate) async fn ensure_secrets(&mut self) -> Result<(), VaultlineError> {
        match self.get_or_update_secrets().await {
            Err(e) => Err(self.forget_password_on(e).await),
            ok => ok,
        }
    }

    /// Clears a rejected master password, and its stored copy when that is
    /// where it came from. Returns `error` for the caller to propagate.
    pub(crate) async fn forget_password_on(&mut self, error: VaultlineError) -> VaultlineError {
        if error != VaultlineError::InvalidMasterPassword {
            return error;
        }
        debug!("clearing rejected master password");
        self.secrets.clear_master_password();
        if self.password_from_store
            && let Err(e) = self.discard_stored_master_password().await
        {
            warn!(error = %e, "could not discard stored master password");
        }
        error
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("secrets", &self.secrets)
            .field("registered_with", &self.registered_with)
            .field("config_dirty", &self.config_dirty)
            .field("password_from_store", &self.password_from_store)
            .finish_non_exhaustive()
    }
}
