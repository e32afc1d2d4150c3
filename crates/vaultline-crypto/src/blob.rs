// SPDX-FileCopyrightText: 2026 Vaultline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Self-describing encrypted blob.
//!
//! Layout (`$` marks a field terminator):
//!
//! ```text
//! $ version$ derivation-tag$ params...$ aes256$ mode$ iv-length$ [salt][iv][hash][payload]
//! ```
//!
//! The trailing cipher data is packed: its field sizes come from the
//! derivation parameters, the cipher configuration and [`HASH_LENGTH`].

use std::fmt;

use thiserror::Error;

use crate::wire::{self, WireError, WireFormat, WireReader, WireWriter};

/// The only supported blob version.
pub const ENCRYPTED_DATA_VERSION: u32 = 1;

/// Length of the HMAC-SHA256 tag.
pub const HASH_LENGTH: usize = 32;

pub const ENCRYPTION_AES256: &str = "aes256";
pub const DEFAULT_HASH_METHOD: &str = "sha512";

const TAG_NO_DERIVATION: &str = "noderivation";
const TAG_ARGON2D: &str = "argon2d";
const TAG_PBKDF2: &str = "pbkdf2";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error(transparent)]
    Wire(#[from] WireError),

    #[error("unsupported encrypted data version {found} (expected 1)")]
    VersionMismatch { found: u32 },

    #[error("unknown key derivation `{0}`")]
    UnknownDerivation(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Argon2Config {
    pub salt_length: u32,
    pub time_cost: u32,
    /// KiB.
    pub memory_cost: u32,
    pub parallelism: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pbkdf2Config {
    pub salt_length: u32,
    pub iterations: u32,
    pub hash_method: String,
}

/// How the content key is obtained from a password.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyDerivation {
    /// The supplied key is used as is.
    None,
    Argon2d(Argon2Config),
    Pbkdf2(Pbkdf2Config),
}

impl KeyDerivation {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::None => TAG_NO_DERIVATION,
            Self::Argon2d(_) => TAG_ARGON2D,
            Self::Pbkdf2(_) => TAG_PBKDF2,
        }
    }

    /// Number of salt bytes carried in the cipher data.
    pub fn salt_length(&self) -> usize {
        match self {
            Self::None => 0,
            Self::Argon2d(c) => c.salt_length as usize,
            Self::Pbkdf2(c) => c.salt_length as usize,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    fn write_params(&self, w: &mut WireWriter) {
        match self {
            Self::None => {}
            Self::Argon2d(c) => {
                w.write_u32(c.salt_length);
                w.write_u32(c.time_cost);
                w.write_u32(c.memory_cost);
                w.write_u32(c.parallelism);
            }
            Self::Pbkdf2(c) => {
                w.write_u32(c.salt_length);
                w.write_u32(c.iterations);
                w.write_str(&c.hash_method);
            }
        }
    }

    fn read_tagged(r: &mut WireReader<'_>) -> Result<Self, CodecError> {
        let tag = r.read_str()?;
        r.scoped(|r| -> Result<Self, CodecError> {
            match tag.as_str() {
                TAG_NO_DERIVATION => Ok(Self::None),
                TAG_ARGON2D => Ok(Self::Argon2d(Argon2Config {
                    salt_length: r.read_u32()?,
                    time_cost: r.read_u32()?,
                    memory_cost: r.read_u32()?,
                    parallelism: r.read_u32()?,
                })),
                TAG_PBKDF2 => Ok(Self::Pbkdf2(Pbkdf2Config {
                    salt_length: r.read_u32()?,
                    iterations: r.read_u32()?,
                    hash_method: r.read_str()?,
                })),
                _ => Err(CodecError::UnknownDerivation(tag.clone())),
            }
        })
    }
}

/// Block-cipher chaining plus authentication scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CipherMode {
    CbcHmac,
    /// Legacy tag, processed exactly like [`CipherMode::CbcHmac`].
    CbcHmac64,
}

impl CipherMode {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::CbcHmac => "cbchmac",
            Self::CbcHmac64 => "cbchmac64",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "cbchmac" => Some(Self::CbcHmac),
            "cbchmac64" => Some(Self::CbcHmac64),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CipherConfig {
    pub encryption: String,
    pub mode: CipherMode,
    pub iv_length: u32,
}

impl Default for CipherConfig {
    fn default() -> Self {
        Self {
            encryption: ENCRYPTION_AES256.to_string(),
            mode: CipherMode::CbcHmac,
            iv_length: 16,
        }
    }
}

impl WireFormat for CipherConfig {
    type Error = WireError;

    fn write_fields(&self, w: &mut WireWriter) {
        w.write_str(&self.encryption);
        w.write_str(self.mode.tag());
        w.write_u32(self.iv_length);
    }

    fn read_fields(r: &mut WireReader<'_>) -> Result<Self, WireError> {
        let encryption = r.read_str()?;
        let offset = r.position();
        let tag = r.read_str()?;
        let mode = CipherMode::from_tag(&tag).ok_or_else(|| WireError::MalformedField {
            offset,
            reason: format!("unknown cipher mode `{tag}`"),
        })?;
        let iv_length = r.read_u32()?;
        Ok(Self {
            encryption,
            mode,
            iv_length,
        })
    }
}

#[derive(Clone, Default, PartialEq, Eq)]
pub struct CipherData {
    pub salt: Vec<u8>,
    pub iv: Vec<u8>,
    pub hash: Vec<u8>,
    pub encrypted_payload: Vec<u8>,
}

impl fmt::Debug for CipherData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CipherData")
            .field("salt_len", &self.salt.len())
            .field("iv_len", &self.iv.len())
            .field("hash_len", &self.hash.len())
            .field("payload_len", &self.encrypted_payload.len())
            .finish()
    }
}

impl CipherData {
    fn write_packed(&self, w: &mut WireWriter) {
        w.scoped(|w| {
            w.set_packed(true);
            if !self.salt.is_empty() {
                w.write_bytes(&self.salt);
            }
            w.write_bytes(&self.iv);
            w.write_bytes(&self.hash);
            w.write_bytes(&self.encrypted_payload);
        });
    }

    fn read_packed(
        r: &mut WireReader<'_>,
        salt_length: usize,
        iv_length: usize,
    ) -> Result<Self, WireError> {
        r.scoped(|r| -> Result<Self, WireError> {
            r.set_packed(true);
            // A zero length would swallow the rest of the blob.
            let mut sized = |len: usize| -> Result<Vec<u8>, WireError> {
                if len == 0 {
                    Ok(Vec::new())
                } else {
                    r.read_bytes(len).map(<[u8]>::to_vec)
                }
            };
            let salt = sized(salt_length)?;
            let iv = sized(iv_length)?;
            let hash = sized(HASH_LENGTH)?;
            let encrypted_payload = r.read_bytes(0)?.to_vec();
            Ok(Self {
                salt,
                iv,
                hash,
                encrypted_payload,
            })
        })
    }
}

/// A decoded encrypted blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedData {
    pub version: u32,
    pub key_derivation: KeyDerivation,
    pub cipher_config: CipherConfig,
    pub cipher_data: CipherData,
}

impl EncryptedData {
    pub fn encode(&self) -> Vec<u8> {
        wire::encode(self)
    }

    pub fn decode(input: &[u8]) -> Result<Self, CodecError> {
        wire::decode(input)
    }

    /// Prefix of `raw` that identifies the key: everything before
    /// `iv ‖ hash ‖ payload`. `raw` must be the bytes `self` was decoded
    /// from.
    pub fn key_identifier<'a>(&self, raw: &'a [u8]) -> &'a [u8] {
        let tail = self.cipher_data.iv.len()
            + self.cipher_data.hash.len()
            + self.cipher_data.encrypted_payload.len();
        &raw[..raw.len().saturating_sub(tail)]
    }
}

impl WireFormat for EncryptedData {
    type Error = CodecError;

    fn write_fields(&self, w: &mut WireWriter) {
        w.write_bytes(b"");
        w.write_u32(self.version);
        w.write_str(self.key_derivation.tag());
        w.scoped(|w| self.key_derivation.write_params(w));
        w.nested(&self.cipher_config);
        self.cipher_data.write_packed(w);
    }

    fn read_fields(r: &mut WireReader<'_>) -> Result<Self, CodecError> {
        r.read_bytes(0)?;
        let version = r.read_u32()?;
        if version != ENCRYPTED_DATA_VERSION {
            return Err(CodecError::VersionMismatch { found: version });
        }
        let key_derivation = KeyDerivation::read_tagged(r)?;
        let cipher_config = r.nested::<CipherConfig>()?;
        let cipher_data = CipherData::read_packed(
            r,
            key_derivation.salt_length(),
            cipher_config.iv_length as usize,
        )?;
        Ok(Self {
            version,
            key_derivation,
            cipher_config,
            cipher_data,
        })
    }
}
