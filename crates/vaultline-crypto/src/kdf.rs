// SPDX-FileCopyrightText: 2026 Vaultline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Password-based key derivation and the derived-key cache.
//!
//! Argon2d (v0x13) and PBKDF2-HMAC-SHA512 both produce 32-byte keys. The
//! [`KeyCache`] memoizes results per blob fingerprint so that a vault full of
//! entries sharing one derivation header costs a single hash.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use ring::digest::{SHA256, SHA512, digest};
use tokio::sync::OnceCell;
use tracing::debug;
use vaultline_core::VaultlineError;
use zeroize::Zeroizing;

use crate::blob::{Argon2Config, DEFAULT_HASH_METHOD, EncryptedData, KeyDerivation};

/// Key material that is wiped on drop.
pub type SymmetricKey = Zeroizing<Vec<u8>>;

pub const DERIVED_KEY_LENGTH: usize = 32;

/// Parameters used to wrap the local key with the master password.
pub const LOCAL_KEY_DERIVATION: Argon2Config = Argon2Config {
    salt_length: 16,
    time_cost: 3,
    memory_cost: 32768,
    parallelism: 2,
};

/// Deterministic per-login salt for the local-key wrap: SHA-512(login)[..16].
pub fn local_key_salt(login: &str) -> [u8; 16] {
    let hashed = digest(&SHA512, login.as_bytes());
    let mut salt = [0u8; 16];
    salt.copy_from_slice(&hashed.as_ref()[..16]);
    salt
}

/// Derives a content key from `password`.
///
/// [`KeyDerivation::None`] returns the password bytes unchanged.
pub fn derive(
    derivation: &KeyDerivation,
    salt: &[u8],
    password: &[u8],
) -> Result<SymmetricKey, VaultlineError> {
    match derivation {
        KeyDerivation::None => Ok(Zeroizing::new(password.to_vec())),
        KeyDerivation::Argon2d(c) => argon2d(c, salt, password),
        KeyDerivation::Pbkdf2(c) => {
            if !c.hash_method.is_empty() && !c.hash_method.eq_ignore_ascii_case(DEFAULT_HASH_METHOD)
            {
                debug!(hash_method = %c.hash_method, "unsupported PBKDF2 hash");
                return Err(VaultlineError::InternalEncryptFailure);
            }
            let iterations =
                NonZeroU32::new(c.iterations).ok_or(VaultlineError::InternalEncryptFailure)?;
            let mut out = Zeroizing::new(vec![0u8; DERIVED_KEY_LENGTH]);
            ring::pbkdf2::derive(
                ring::pbkdf2::PBKDF2_HMAC_SHA512,
                iterations,
                salt,
                password,
                out.as_mut_slice(),
            );
            Ok(out)
        }
    }
}

fn argon2d(c: &Argon2Config, salt: &[u8], password: &[u8]) -> Result<SymmetricKey, VaultlineError> {
    let params = argon2::Params::new(
        c.memory_cost,
        c.time_cost,
        c.parallelism,
        Some(DERIVED_KEY_LENGTH),
    )
    .map_err(|e| {
        debug!(error = %e, "invalid Argon2d parameters");
        VaultlineError::InternalEncryptFailure
    })?;

    let argon2 = argon2::Argon2::new(argon2::Algorithm::Argon2d, argon2::Version::V0x13, params);

    let mut out = Zeroizing::new(vec![0u8; DERIVED_KEY_LENGTH]);
    argon2
        .hash_password_into(password, salt, out.as_mut_slice())
        .map_err(|e| {
            debug!(error = %e, "Argon2d derivation failed");
            VaultlineError::InternalEncryptFailure
        })?;
    Ok(out)
}

type Fingerprint = [u8; 32];

fn fingerprint(raw: &[u8], data: &EncryptedData, password: &[u8]) -> Fingerprint {
    let id = data.key_identifier(raw);
    let mut input = Zeroizing::new(Vec::with_capacity(id.len() + password.len()));
    input.extend_from_slice(id);
    input.extend_from_slice(password);
    let mut out = [0u8; 32];
    out.copy_from_slice(digest(&SHA256, &input).as_ref());
    out
}

/// Memoizes derived keys by blob fingerprint.
///
/// The fingerprint is the SHA-256 of the blob's key identifier followed by
/// the password, so neither is kept in the map. Concurrent lookups of the
/// same fingerprint share one derivation, which runs on the blocking pool.
/// When the cache is full it is cleared before the next insert.
pub struct KeyCache {
    entries: DashMap<Fingerprint, Arc<OnceCell<SymmetricKey>>>,
    capacity: usize,
    derivations: AtomicU64,
}

impl KeyCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            capacity: capacity.max(1),
            derivations: AtomicU64::new(0),
        }
    }

    /// Returns the key for the blob `data` decoded from `raw`, deriving it
    /// on a miss.
    pub async fn get_or_derive(
        &self,
        raw: &[u8],
        data: &EncryptedData,
        password: &[u8],
    ) -> Result<SymmetricKey, VaultlineError> {
        let fp = fingerprint(raw, data, password);

        if !self.entries.contains_key(&fp) && self.entries.len() >= self.capacity {
            debug!(capacity = self.capacity, "key cache full, clearing");
            self.entries.clear();
        }
        let cell = self.entries.entry(fp).or_default().clone();

        let result = cell
            .get_or_try_init(|| async {
                let derivation = data.key_derivation.clone();
                let salt = data.cipher_data.salt.clone();
                let password = Zeroizing::new(password.to_vec());
                self.derivations.fetch_add(1, Ordering::Relaxed);
                debug!(derivation = derivation.tag(), "deriving content key");
                match tokio::task::spawn_blocking(move || derive(&derivation, &salt, &password))
                    .await
                {
                    Ok(derived) => derived,
                    Err(_) => Err(VaultlineError::InternalEncryptFailure),
                }
            })
            .await;

        match result {
            Ok(key) => Ok(key.clone()),
            Err(e) => {
                self.entries.remove(&fp);
                Err(e)
            }
        }
    }

    /// Drops the entry for this blob and password, e.g. after the derived
    /// key failed to authenticate.
    pub fn forget(&self, raw: &[u8], data: &EncryptedData, password: &[u8]) {
        self.entries.remove(&fingerprint(raw, data, password));
    }

    /// Number of derivations actually performed.
    pub fn derivation_count(&self) -> u64 {
        self.derivations.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl Default for KeyCache {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::{CipherConfig, CipherData, Pbkdf2Config};

    fn pbkdf2(iterations: u32) -> KeyDerivation {
        KeyDerivation::Pbkdf2(Pbkdf2Config {
            salt_length: 16,
            iterations,
            hash_method: DEFAULT_HASH_METHOD.to_string(),
        })
    }

    fn cheap_argon2() -> KeyDerivation {
        KeyDerivation::Argon2d(Argon2Config {
            salt_length: 16,
            time_cost: 1,
            memory_cost: 64,
            parallelism: 1,
        })
    }

    fn blob(derivation: KeyDerivation, salt: u8, payload: &[u8]) -> (Vec<u8>, EncryptedData) {
        let data = EncryptedData {
            version: 1,
            key_derivation: derivation,
            cipher_config: CipherConfig::default(),
            cipher_data: CipherData {
                salt: vec![salt; 16],
                iv: vec![0; 16],
                hash: vec![0; 32],
                encrypted_payload: payload.to_vec(),
            },
        };
        (data.encode(), data)
    }

    #[test]
    fn none_returns_password() {
        let key = derive(&KeyDerivation::None, b"", b"raw key").unwrap();
        assert_eq!(key.as_slice(), b"raw key");
    }

    #[test]
    fn argon2d_is_deterministic_and_parameter_sensitive() {
        let salt = [9u8; 16];
        let a = derive(&cheap_argon2(), &salt, b"pw").unwrap();
        let b = derive(&cheap_argon2(), &salt, b"pw").unwrap();
        assert_eq!(a.len(), 32);
        assert_eq!(*a, *b);

        let other_salt = derive(&cheap_argon2(), &[8u8; 16], b"pw").unwrap();
        assert_ne!(*a, *other_salt);

        let more_time = KeyDerivation::Argon2d(Argon2Config {
            salt_length: 16,
            time_cost: 2,
            memory_cost: 64,
            parallelism: 1,
        });
        assert_ne!(*a, *derive(&more_time, &salt, b"pw").unwrap());

        assert_ne!(*a, *derive(&cheap_argon2(), &salt, b"pw2").unwrap());

        let more_memory = KeyDerivation::Argon2d(Argon2Config {
            salt_length: 16,
            time_cost: 1,
            memory_cost: 128,
            parallelism: 1,
        });
        assert_ne!(*a, *derive(&more_memory, &salt, b"pw").unwrap());

        let two_lanes = KeyDerivation::Argon2d(Argon2Config {
            salt_length: 16,
            time_cost: 1,
            memory_cost: 64,
            parallelism: 2,
        });
        assert_ne!(*a, *derive(&two_lanes, &salt, b"pw").unwrap());
    }

    #[test]
    fn pbkdf2_is_parameter_sensitive() {
        let base = derive(&pbkdf2(10), b"salt", b"password").unwrap();
        assert_eq!(*base, *derive(&pbkdf2(10), b"salt", b"password").unwrap());
        assert_ne!(*base, *derive(&pbkdf2(11), b"salt", b"password").unwrap());
        assert_ne!(*base, *derive(&pbkdf2(10), b"pepper", b"password").unwrap());
        assert_ne!(*base, *derive(&pbkdf2(10), b"salt", b"passwore").unwrap());
    }

    #[test]
    fn pbkdf2_matches_reference_vector() {
        // PBKDF2-HMAC-SHA512("password", "salt", 1), first 32 bytes.
        let key = derive(&pbkdf2(1), b"salt", b"password").unwrap();
        assert_eq!(
            hex::encode(key.as_slice()),
            "867f70cf1ade02cff3752599a3a53dc4af34c7a669815ae5d513554e1c8cf252"
        );
    }

    #[test]
    fn pbkdf2_rejects_zero_iterations_and_unknown_hash() {
        assert!(derive(&pbkdf2(0), b"salt", b"pw").is_err());
        let sha1 = KeyDerivation::Pbkdf2(Pbkdf2Config {
            salt_length: 16,
            iterations: 1,
            hash_method: "sha1".to_string(),
        });
        assert_eq!(
            derive(&sha1, b"salt", b"pw").unwrap_err(),
            VaultlineError::InternalEncryptFailure
        );
    }

    #[test]
    fn local_key_salt_is_sha512_prefix() {
        let salt = local_key_salt("alice@example.com");
        let full = digest(&SHA512, b"alice@example.com");
        assert_eq!(&salt[..], &full.as_ref()[..16]);
    }

    #[tokio::test]
    async fn cache_hit_skips_derivation() {
        let cache = KeyCache::new(8);
        let (raw_a, a) = blob(pbkdf2(10), 1, b"first entry");
        let (raw_b, b) = blob(pbkdf2(10), 1, b"second entry, longer");

        let k1 = cache.get_or_derive(&raw_a, &a, b"pw").await.unwrap();
        let k2 = cache.get_or_derive(&raw_b, &b, b"pw").await.unwrap();

        assert_eq!(*k1, *k2);
        assert_eq!(cache.derivation_count(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn different_password_or_salt_misses() {
        let cache = KeyCache::new(8);
        let (raw, data) = blob(pbkdf2(10), 1, b"entry");
        let (raw2, data2) = blob(pbkdf2(10), 2, b"entry");

        cache.get_or_derive(&raw, &data, b"pw").await.unwrap();
        cache.get_or_derive(&raw, &data, b"other").await.unwrap();
        cache.get_or_derive(&raw2, &data2, b"pw").await.unwrap();
        assert_eq!(cache.derivation_count(), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_misses_share_one_derivation() {
        let cache = Arc::new(KeyCache::new(8));
        let (raw, data) = blob(cheap_argon2(), 3, b"entry");
        let raw = Arc::new(raw);
        let data = Arc::new(data);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let (cache, raw, data) = (cache.clone(), raw.clone(), data.clone());
            handles.push(tokio::spawn(async move {
                cache.get_or_derive(&raw, &data, b"pw").await.unwrap()
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        assert_eq!(cache.derivation_count(), 1);
    }

    #[tokio::test]
    async fn forget_and_capacity() {
        let cache = KeyCache::new(2);
        let (raw, data) = blob(pbkdf2(5), 1, b"x");
        cache.get_or_derive(&raw, &data, b"a").await.unwrap();
        cache.forget(&raw, &data, b"a");
        assert!(cache.is_empty());

        cache.get_or_derive(&raw, &data, b"a").await.unwrap();
        cache.get_or_derive(&raw, &data, b"b").await.unwrap();
        assert_eq!(cache.len(), 2);
        cache.get_or_derive(&raw, &data, b"c").await.unwrap();
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn failed_derivation_is_not_cached() {
        let cache = KeyCache::new(8);
        let (raw, data) = blob(pbkdf2(0), 1, b"x");
        assert!(cache.get_or_derive(&raw, &data, b"pw").await.is_err());
        assert!(cache.is_empty());
    }
}
