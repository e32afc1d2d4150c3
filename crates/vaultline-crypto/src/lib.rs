// SPDX-FileCopyrightText: 2026 Vaultline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cryptographic engine for the Vaultline client.
//!
//! - [`wire`]: `$`-delimited field serializer with scoped packed mode.
//! - [`blob`]: the self-describing [`EncryptedData`] container.
//! - [`kdf`]: Argon2d / PBKDF2 key derivation and the [`KeyCache`].
//! - [`cipher`]: AES-256-CBC + HMAC-SHA256.
//! - [`envelope`]: base64 text envelopes keyed by the local key.

pub mod blob;
pub mod cipher;
pub mod envelope;
pub mod kdf;
pub mod wire;

pub use blob::{
    Argon2Config, CipherConfig, CipherData, CipherMode, CodecError, EncryptedData, KeyDerivation,
    Pbkdf2Config,
};
pub use envelope::Envelope;
pub use kdf::{KeyCache, LOCAL_KEY_DERIVATION, SymmetricKey, derive, local_key_salt};
pub use wire::{WireError, WireFormat, WireReader, WireWriter};
