// SPDX-FileCopyrightText: 2026 Vaultline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recovering and persisting the secrets a session needs.
//!
//! The local key lives in the secret store (base64) and, wrapped under a key
//! derived from the master password, in the device configuration. The
//! device credentials and server key are stored encrypted under the local
//! key.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, error, info, warn};
use vaultline_core::{DeviceConfig, VaultlineError};
use vaultline_crypto::blob::KeyDerivation;
use vaultline_crypto::{Envelope, LOCAL_KEY_DERIVATION, cipher, kdf, local_key_salt};
use zeroize::Zeroizing;

use crate::session::Session;

/// Secrets decrypted from a stored device configuration.
struct StoredDevice {
    access_key: String,
    secret_key_hex: Zeroizing<String>,
    server_key: Option<Zeroizing<String>>,
}

impl Session {
    /// Fills in every secret needed to talk to the service and open the
    /// vault, registering the device when no usable registration exists.
    pub async fn get_or_update_secrets(&mut self) -> Result<(), VaultlineError> {
        if self.secrets.local_key.is_empty() {
            self.establish_local_key().await?;
        }

        if self.secrets.master_password.is_empty() && !self.stored_password_tried {
            self.stored_password_tried = true;
            self.recover_stored_master_password().await?;
        }
        if self.secrets.master_password.is_empty() {
            return Err(VaultlineError::RequireMasterPassword);
        }

        if !self.secrets.has_device() {
            match self.load_device().await {
                Ok(device) => self.apply_device(device),
                Err(VaultlineError::DeviceNotRegistered) => {
                    self.register_device().await?;
                    self.config_dirty = true;
                }
                Err(e) => return Err(e),
            }
        }

        if let Some(config) = self.storage.get_device_config(&self.config.login).await?
            && config.should_save_master_password()
            && config
                .master_password_encrypted
                .as_deref()
                .is_none_or(str::is_empty)
        {
            debug!("master password should be stored but is not");
            self.config_dirty = true;
        }

        Ok(())
    }

    /// Writes the device configuration from the current secrets, keeping the
    /// stored preferences.
    pub async fn update_device_configuration(&mut self) -> Result<(), VaultlineError> {
        let login = self.config.login.clone();
        let previous = self.storage.get_device_config(&login).await?;
        let wrapping_key = self.wrapping_key().await?;

        let mut config = DeviceConfig::new(login);
        config.version = self.config.application_name.clone();
        config.access_key = self.secrets.device_access_key.clone();
        if let Some(previous) = &previous {
            config.auto_sync = previous.auto_sync;
            config.should_not_save_master_password = previous.should_not_save_master_password;
            config.authentication_mode = previous.authentication_mode;
        }
        if self.registered_with.is_some() {
            config.authentication_mode = self.registered_with;
        }

        let secret_key = hex::decode(self.secrets.device_secret_key.as_str()).map_err(|e| {
            error!(error = %e, "device secret key is not hex");
            VaultlineError::InternalEncryptFailure
        })?;
        let secret_key = Zeroizing::new(secret_key);

        let envelope = Envelope::new(&self.secrets.local_key, b"", &self.key_cache);
        config.secret_key_encrypted = envelope.encrypt_and_serialize(&secret_key)?;
        if !self.secrets.server_key.is_empty() {
            config.server_key_encrypted =
                Some(envelope.encrypt_and_serialize(self.secrets.server_key.as_bytes())?);
        }
        if config.should_save_master_password() {
            config.master_password_encrypted =
                Some(envelope.encrypt_and_serialize(self.secrets.master_password.as_bytes())?);
        }
        config.local_key_encrypted = Envelope::new(&wrapping_key, b"", &self.key_cache)
            .encrypt_and_serialize(&self.secrets.local_key)?;

        self.storage.set_device_config(&config).await?;
        self.config_dirty = false;
        info!(login = %config.login, "device configuration saved");
        Ok(())
    }

    pub(crate) async fn persist_if_dirty(&mut self) -> Result<(), VaultlineError> {
        if self.config_dirty {
            self.update_device_configuration().await?;
        }
        Ok(())
    }

    /// Secret store first, then the wrapped copy in the device
    /// configuration, else a fresh key.
    async fn establish_local_key(&mut self) -> Result<(), VaultlineError> {
        if let Some(key) = self.local_key_from_secret_store().await {
            self.secrets.local_key = key;
            return Ok(());
        }

        let key = match self.storage.get_device_config(&self.config.login).await? {
            Some(config) => {
                if self.secrets.master_password.is_empty() {
                    return Err(VaultlineError::RequireMasterPassword);
                }
                if config.local_key_encrypted.is_empty() {
                    debug!("device configuration has no wrapped local key");
                    cipher::generate_key()?
                } else {
                    let wrapping_key = self.wrapping_key().await?;
                    Envelope::new(&wrapping_key, b"", &self.key_cache)
                        .deserialize_and_decrypt(&config.local_key_encrypted)
                        .await
                        .map_err(|_| {
                            warn!("local key did not unwrap with the master password");
                            VaultlineError::InvalidMasterPassword
                        })?
                }
            }
            None => {
                info!(login = %self.config.login, "generating new local key");
                cipher::generate_key()?
            }
        };
        self.secrets.local_key = key;

        let encoded = SecretString::from(STANDARD.encode(self.secrets.local_key.as_slice()));
        if let Err(e) = self
            .secret_store
            .set_secret(&self.config.application_name, &self.config.login, &encoded)
            .await
        {
            warn!(error = %e, "could not save local key to the secret store");
        }
        Ok(())
    }

    async fn local_key_from_secret_store(&self) -> Option<Zeroizing<Vec<u8>>> {
        let stored = self
            .secret_store
            .get_secret(&self.config.application_name, &self.config.login)
            .await;
        match stored {
            Ok(Some(value)) => match STANDARD.decode(value.expose_secret().trim()) {
                Ok(key) if !key.is_empty() => Some(Zeroizing::new(key)),
                Ok(_) => None,
                Err(e) => {
                    warn!(error = %e, "stored local key is not base64, ignoring it");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "secret store unavailable");
                None
            }
        }
    }

    /// Derives (once per master password) the key that wraps the local key.
    async fn wrapping_key(&mut self) -> Result<Zeroizing<Vec<u8>>, VaultlineError> {
        if self.secrets.master_password.is_empty() {
            return Err(VaultlineError::RequireMasterPassword);
        }
        if self.secrets.wrapping_key.is_empty() {
            let password = self.secrets.master_password.clone();
            let salt = local_key_salt(&self.config.login);
            let derived = tokio::task::spawn_blocking(move || {
                kdf::derive(
                    &KeyDerivation::Argon2d(LOCAL_KEY_DERIVATION),
                    &salt,
                    password.as_bytes(),
                )
            })
            .await
            .map_err(|_| VaultlineError::InternalEncryptFailure)??;
            self.secrets.wrapping_key = derived;
        }
        Ok(self.secrets.wrapping_key.clone())
    }

    async fn recover_stored_master_password(&mut self) -> Result<(), VaultlineError> {
        let Some(config) = self.storage.get_device_config(&self.config.login).await? else {
            return Ok(());
        };
        if !config.should_save_master_password() {
            return Ok(());
        }
        let Some(sealed) = config.master_password_encrypted.filter(|s| !s.is_empty()) else {
            return Ok(());
        };
        let opened = Envelope::new(&self.secrets.local_key, b"", &self.key_cache)
            .deserialize_and_decrypt(&sealed)
            .await;
        match opened.map(|bytes| String::from_utf8(bytes.to_vec())) {
            Ok(Ok(password)) => {
                debug!("using stored master password");
                self.secrets.set_master_password(&Zeroizing::new(password));
                self.password_from_store = true;
            }
            _ => warn!("stored master password could not be decrypted, ignoring it"),
        }
        Ok(())
    }

    /// Removes the stored master password from the device configuration.
    /// The preference to store it is kept, so a password that later opens
    /// the vault is stored in its place.
    pub(crate) async fn discard_stored_master_password(&mut self) -> Result<(), VaultlineError> {
        self.password_from_store = false;
        let Some(mut config) = self.storage.get_device_config(&self.config.login).await? else {
            return Ok(());
        };
        if config.master_password_encrypted.take().is_some() {
            self.storage.set_device_config(&config).await?;
            info!(login = %config.login, "discarded stale stored master password");
        }
        Ok(())
    }

    async fn load_device(&self) -> Result<StoredDevice, VaultlineError> {
        let Some(config) = self.storage.get_device_config(&self.config.login).await? else {
            return Err(VaultlineError::DeviceNotRegistered);
        };
        if !config.is_registered() {
            return Err(VaultlineError::DeviceNotRegistered);
        }

        let envelope = Envelope::new(&self.secrets.local_key, b"", &self.key_cache);
        let secret_key = envelope
            .deserialize_and_decrypt(&config.secret_key_encrypted)
            .await
            .map_err(|_| {
                warn!("stored device secret does not decrypt, device must be registered again");
                VaultlineError::DeviceNotRegistered
            })?;

        let server_key = match config.server_key_encrypted.as_deref() {
            Some(sealed) if !sealed.is_empty() => Some(open_text(&envelope, sealed).await?),
            _ => None,
        };

        Ok(StoredDevice {
            access_key: config.access_key,
            secret_key_hex: Zeroizing::new(hex::encode(secret_key.as_slice())),
            server_key,
        })
    }

    fn apply_device(&mut self, device: StoredDevice) {
        debug!(access_key = %device.access_key, "device configuration loaded");
        self.secrets.device_access_key = device.access_key;
        self.secrets.device_secret_key = device.secret_key_hex;
        if let Some(server_key) = device.server_key {
            self.secrets.server_key = server_key;
        }
    }
}

async fn open_text(
    envelope: &Envelope<'_>,
    sealed: &str,
) -> Result<Zeroizing<String>, VaultlineError> {
    let bytes = envelope.deserialize_and_decrypt(sealed).await?;
    String::from_utf8(bytes.to_vec())
        .map(Zeroizing::new)
        .map_err(|_| VaultlineError::InternalDecryptFailure)
}
