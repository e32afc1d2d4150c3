// SPDX-FileCopyrightText: 2026 Vaultline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! AES-256-CBC with PKCS#7 padding, authenticated by HMAC-SHA256
//! (encrypt-then-MAC).
//!
//! A single input key is stretched with SHA-512 into a cipher half and a
//! MAC half. Every call to [`encrypt`] draws a fresh 16-byte IV from the
//! system CSPRNG.

use aes::Aes256;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use ring::digest::{SHA512, digest};
use ring::hmac;
use ring::rand::{SecureRandom, SystemRandom};
use tracing::debug;
use vaultline_core::VaultlineError;
use zeroize::Zeroizing;

use crate::blob::{
    CipherConfig, CipherData, ENCRYPTED_DATA_VERSION, EncryptedData, HASH_LENGTH, KeyDerivation,
};

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

pub const IV_LENGTH: usize = 16;

/// Cipher and MAC keys derived from one input key.
pub struct SplitKey {
    pub cipher: Zeroizing<[u8; 32]>,
    pub mac: Zeroizing<[u8; 32]>,
}

/// SHA-512(key): the first half keys AES, the second half keys HMAC.
pub fn split_key(key: &[u8]) -> SplitKey {
    let hashed = digest(&SHA512, key);
    let bytes = hashed.as_ref();
    let mut cipher = Zeroizing::new([0u8; 32]);
    let mut mac = Zeroizing::new([0u8; 32]);
    cipher.copy_from_slice(&bytes[..32]);
    mac.copy_from_slice(&bytes[32..64]);
    SplitKey { cipher, mac }
}

fn mac_input(iv: &[u8], ciphertext: &[u8]) -> Vec<u8> {
    let mut input = Vec::with_capacity(iv.len() + ciphertext.len());
    input.extend_from_slice(iv);
    input.extend_from_slice(ciphertext);
    input
}

/// Encrypts `plaintext` under `key` into a blob without key derivation.
pub fn encrypt(key: &[u8], plaintext: &[u8]) -> Result<EncryptedData, VaultlineError> {
    if key.is_empty() {
        return Err(VaultlineError::InternalEncryptFailure);
    }
    let keys = split_key(key);

    let mut iv = [0u8; IV_LENGTH];
    SystemRandom::new()
        .fill(&mut iv)
        .map_err(|_| VaultlineError::InternalEncryptFailure)?;

    let ciphertext = Aes256CbcEnc::new_from_slices(&keys.cipher[..], &iv)
        .map_err(|_| VaultlineError::InternalEncryptFailure)?
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    let mac_key = hmac::Key::new(hmac::HMAC_SHA256, &keys.mac[..]);
    let tag = hmac::sign(&mac_key, &mac_input(&iv, &ciphertext));

    Ok(EncryptedData {
        version: ENCRYPTED_DATA_VERSION,
        key_derivation: KeyDerivation::None,
        cipher_config: CipherConfig::default(),
        cipher_data: CipherData {
            salt: Vec::new(),
            iv: iv.to_vec(),
            hash: tag.as_ref().to_vec(),
            encrypted_payload: ciphertext,
        },
    })
}

/// Verifies the MAC in constant time, then decrypts.
///
/// Fails closed: a bad tag never reaches the block cipher.
pub fn decrypt(key: &[u8], data: &EncryptedData) -> Result<Zeroizing<Vec<u8>>, VaultlineError> {
    let cd = &data.cipher_data;
    if key.is_empty() || cd.iv.len() != IV_LENGTH || cd.hash.len() != HASH_LENGTH {
        return Err(VaultlineError::InternalDecryptFailure);
    }
    let keys = split_key(key);

    let mac_key = hmac::Key::new(hmac::HMAC_SHA256, &keys.mac[..]);
    if hmac::verify(&mac_key, &mac_input(&cd.iv, &cd.encrypted_payload), &cd.hash).is_err() {
        debug!("HMAC verification failed");
        return Err(VaultlineError::InternalDecryptFailure);
    }

    let plaintext = Aes256CbcDec::new_from_slices(&keys.cipher[..], &cd.iv)
        .map_err(|_| VaultlineError::InternalDecryptFailure)?
        .decrypt_padded_vec_mut::<Pkcs7>(&cd.encrypted_payload)
        .map_err(|_| VaultlineError::InternalDecryptFailure)?;

    Ok(Zeroizing::new(plaintext))
}

/// Fills a fresh random 32-byte key.
pub fn generate_key() -> Result<Zeroizing<Vec<u8>>, VaultlineError> {
    let mut key = Zeroizing::new(vec![0u8; 32]);
    SystemRandom::new()
        .fill(key.as_mut_slice())
        .map_err(|_| VaultlineError::InternalEncryptFailure)?;
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encrypt_decrypt_inverse() {
        let key = generate_key().unwrap();
        let data = encrypt(&key, b"vault entry").unwrap();
        assert_eq!(decrypt(&key, &data).unwrap().as_slice(), b"vault entry");
    }

    #[test]
    fn blob_shape() {
        let data = encrypt(&[7u8; 32], &[0u8; 16]).unwrap();
        assert_eq!(data.cipher_data.iv.len(), 16);
        assert_eq!(data.cipher_data.hash.len(), 32);
        // 16 bytes of plaintext gain one full block of padding.
        assert_eq!(data.cipher_data.encrypted_payload.len(), 32);
        assert!(data.cipher_data.salt.is_empty());
        assert_eq!(data.key_derivation, KeyDerivation::None);
        assert_eq!(data.cipher_config, CipherConfig::default());
    }

    #[test]
    fn fresh_iv_per_call() {
        let key = [1u8; 32];
        let a = encrypt(&key, b"same").unwrap();
        let b = encrypt(&key, b"same").unwrap();
        assert_ne!(a.cipher_data.iv, b.cipher_data.iv);
        assert_ne!(a.cipher_data.encrypted_payload, b.cipher_data.encrypted_payload);
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let key = [2u8; 32];
        let mut data = encrypt(&key, b"do not tamper").unwrap();
        data.cipher_data.encrypted_payload[0] ^= 0x01;
        assert_eq!(
            decrypt(&key, &data).unwrap_err(),
            VaultlineError::InternalDecryptFailure
        );
    }

    #[test]
    fn tampered_hash_is_rejected() {
        let key = [2u8; 32];
        let mut data = encrypt(&key, b"do not tamper").unwrap();
        data.cipher_data.hash[31] ^= 0x80;
        assert!(decrypt(&key, &data).is_err());
    }

    #[test]
    fn wrong_key_is_rejected() {
        let data = encrypt(&[3u8; 32], b"secret").unwrap();
        assert!(decrypt(&[4u8; 32], &data).is_err());
    }

    #[test]
    fn empty_key_is_refused() {
        assert_eq!(
            encrypt(&[], b"x").unwrap_err(),
            VaultlineError::InternalEncryptFailure
        );
    }

    #[test]
    fn split_key_halves_differ() {
        let keys = split_key(b"some key");
        assert_ne!(*keys.cipher, *keys.mac);
        let again = split_key(b"some key");
        assert_eq!(*keys.cipher, *again.cipher);
    }
}
