// SPDX-FileCopyrightText: 2026 Vaultline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared across the Vaultline workspace.

use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// What a synchronized transaction does to a vault entry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, Serialize, Deserialize,
)]
pub enum TransactionAction {
    /// Entry created or updated; carries encrypted content.
    #[strum(serialize = "BACKUP_EDIT")]
    #[serde(rename = "BACKUP_EDIT")]
    BackupEdit,
    /// Entry deleted; carries no content.
    #[strum(serialize = "BACKUP_REMOVE")]
    #[serde(rename = "BACKUP_REMOVE")]
    BackupRemove,
}

bitflags! {
    /// Bitmask over vault entry categories.
    ///
    /// An empty mask selects every category.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TransactionTypes: u32 {
        const AUTHENTIFIANT = 1 << 0;
        const BANK_STATEMENT = 1 << 1;
        const AUTH_CATEGORY = 1 << 2;
        const SECURE_NOTE_CATEGORY = 1 << 3;
        const DRIVER_LICENCE = 1 << 4;
        const EMAIL = 1 << 5;
        const IDENTITY = 1 << 6;
        const PAYMENT_MEANS_CREDIT_CARD = 1 << 7;
        const SECURE_NOTE = 1 << 8;
        const SETTINGS = 1 << 9;
    }
}

impl TransactionTypes {
    /// Every known category paired with its wire tag, in bit order.
    const TAGS: [(Self, &'static str); 10] = [
        (Self::AUTHENTIFIANT, "AUTHENTIFIANT"),
        (Self::BANK_STATEMENT, "BANKSTATEMENT"),
        (Self::AUTH_CATEGORY, "AUTH_CATEGORY"),
        (Self::SECURE_NOTE_CATEGORY, "SECURENOTE_CATEGORY"),
        (Self::DRIVER_LICENCE, "DRIVERLICENCE"),
        (Self::EMAIL, "EMAIL"),
        (Self::IDENTITY, "IDENTITY"),
        (Self::PAYMENT_MEANS_CREDIT_CARD, "PAYMENTMEANS_CREDITCARD"),
        (Self::SECURE_NOTE, "SECURENOTE"),
        (Self::SETTINGS, "SETTINGS"),
    ];

    /// Wire tags of the categories present in this mask, in bit order.
    pub fn tags(&self) -> Vec<&'static str> {
        Self::TAGS
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, tag)| *tag)
            .collect()
    }

    /// Looks up the single-category mask for a wire tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::TAGS
            .iter()
            .find(|(_, t)| *t == tag)
            .map(|(flag, _)| *flag)
    }
}

/// One row of the locally stored transaction log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRow {
    pub login: String,
    /// Stable identifier, unique per login.
    pub identifier: String,
    /// Category wire tag, e.g. `AUTHENTIFIANT`.
    pub kind: String,
    pub action: TransactionAction,
    /// Encrypted envelope under the local key. Empty for removals.
    pub content: String,
}

/// Second-factor methods the remote service may offer during device
/// registration.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    EmailToken,
    Totp,
    DuoPush,
    DashlaneAuthenticator,
    Sso,
    U2f,
}

/// Persisted per-login device registration and preferences.
///
/// Every `*_encrypted` field holds a base64 envelope. The `Debug`
/// implementation redacts all of them.
#[derive(Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    pub login: String,
    /// Application name that wrote this record.
    pub version: String,
    pub access_key: String,
    pub secret_key_encrypted: String,
    pub master_password_encrypted: Option<String>,
    pub should_not_save_master_password: bool,
    /// Local key wrapped under the master-password-derived key.
    pub local_key_encrypted: String,
    pub auto_sync: bool,
    pub authentication_mode: Option<AuthMethod>,
    pub server_key_encrypted: Option<String>,
}

impl DeviceConfig {
    /// Empty configuration for `login` with the default preferences.
    pub fn new(login: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            version: String::new(),
            access_key: String::new(),
            secret_key_encrypted: String::new(),
            master_password_encrypted: None,
            should_not_save_master_password: true,
            local_key_encrypted: String::new(),
            auto_sync: false,
            authentication_mode: None,
            server_key_encrypted: None,
        }
    }

    pub fn should_save_master_password(&self) -> bool {
        !self.should_not_save_master_password
    }

    /// True when the record carries usable device credentials.
    pub fn is_registered(&self) -> bool {
        !self.access_key.is_empty() && !self.secret_key_encrypted.is_empty()
    }
}

impl fmt::Debug for DeviceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceConfig")
            .field("login", &self.login)
            .field("version", &self.version)
            .field("access_key", &self.access_key)
            .field("secret_key_encrypted", &"[REDACTED]")
            .field(
                "master_password_encrypted",
                &self.master_password_encrypted.as_ref().map(|_| "[REDACTED]"),
            )
            .field(
                "should_not_save_master_password",
                &self.should_not_save_master_password,
            )
            .field("local_key_encrypted", &"[REDACTED]")
            .field("auto_sync", &self.auto_sync)
            .field("authentication_mode", &self.authentication_mode)
            .field(
                "server_key_encrypted",
                &self.server_key_encrypted.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}
