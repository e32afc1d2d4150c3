// SPDX-FileCopyrightText: 2026 Vaultline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base64 text envelope around [`EncryptedData`].
//!
//! Sealing always encrypts under the local key without derivation. Opening
//! accepts any derivation: blobs from the server carry their own Argon2d or
//! PBKDF2 header and are keyed by the password, everything else by the
//! local key.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::{debug, error};
use vaultline_core::VaultlineError;
use zeroize::Zeroizing;

use crate::blob::EncryptedData;
use crate::cipher;
use crate::kdf::KeyCache;

/// Keys and cache needed to seal and open envelopes.
pub struct Envelope<'a> {
    local_key: &'a [u8],
    password: &'a [u8],
    cache: &'a KeyCache,
}

impl<'a> Envelope<'a> {
    pub fn new(local_key: &'a [u8], password: &'a [u8], cache: &'a KeyCache) -> Self {
        Self {
            local_key,
            password,
            cache,
        }
    }

    /// Encrypts under the local key, encodes and base64-encodes.
    pub fn encrypt_and_serialize(&self, plaintext: &[u8]) -> Result<String, VaultlineError> {
        let data = cipher::encrypt(self.local_key, plaintext)?;
        Ok(STANDARD.encode(data.encode()))
    }

    /// Reverses [`Envelope::encrypt_and_serialize`], and also opens
    /// password-derived blobs.
    pub async fn deserialize_and_decrypt(
        &self,
        input: &str,
    ) -> Result<Zeroizing<Vec<u8>>, VaultlineError> {
        let raw = STANDARD.decode(input.trim()).map_err(|e| {
            debug!(error = %e, "envelope is not base64");
            VaultlineError::InternalDecryptFailure
        })?;
        let data = EncryptedData::decode(&raw).map_err(|e| {
            error!(error = %e, "failed to decode encrypted data");
            VaultlineError::InternalDecryptFailure
        })?;

        if data.key_derivation.is_none() {
            return cipher::decrypt(self.local_key, &data);
        }

        let key = self
            .cache
            .get_or_derive(&raw, &data, self.password)
            .await
            .map_err(|_| VaultlineError::InternalDecryptFailure)?;
        cipher::decrypt(&key, &data).inspect_err(|_| {
            self.cache.forget(&raw, &data, self.password);
        })
    }

    /// Opens a password-derived blob and reseals it under the local key.
    pub async fn recrypt(&self, input: &str) -> Result<String, VaultlineError> {
        let plaintext = self.deserialize_and_decrypt(input).await?;
        self.encrypt_and_serialize(&plaintext)
    }
}
