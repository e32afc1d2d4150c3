// SPDX-FileCopyrightText: 2026 Vaultline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory secret material held by a session.
//!
//! Every field is wiped on drop. An empty value means "not known yet".

use std::fmt;

use zeroize::{Zeroize, Zeroizing};

#[derive(Default)]
pub(crate) struct Secrets {
    pub master_password: Zeroizing<String>,
    pub email_token: Zeroizing<String>,
    pub two_factor_code: Zeroizing<String>,
    pub device_access_key: String,
    /// Lowercase hex, as issued by the service.
    pub device_secret_key: Zeroizing<String>,
    pub server_key: Zeroizing<String>,
    /// Root symmetric key for everything stored locally.
    pub local_key: Zeroizing<Vec<u8>>,
    /// Key derived from the master password that wraps the local key.
    pub wrapping_key: Zeroizing<Vec<u8>>,
}

impl Secrets {
    /// Password used for server-encrypted content: the server key, when the
    /// account has one, followed by the master password.
    pub fn vault_password(&self) -> Zeroizing<String> {
        let mut password = Zeroizing::new(String::new());
        let server_key = self.server_key.as_str();
        if !server_key.is_empty() && !self.master_password.starts_with(server_key) {
            password.push_str(server_key);
        }
        password.push_str(&self.master_password);
        password
    }

    pub fn set_master_password(&mut self, value: &str) {
        self.clear_master_password();
        self.master_password.push_str(value);
    }

    pub fn clear_master_password(&mut self) {
        self.master_password.zeroize();
        self.wrapping_key.zeroize();
    }

    /// Forgets everything tied to the device and local key, keeping the
    /// user-supplied inputs.
    pub fn forget_device(&mut self) {
        self.device_access_key.clear();
        self.device_secret_key.zeroize();
        self.server_key.zeroize();
        self.local_key.zeroize();
    }

    pub fn has_device(&self) -> bool {
        !self.device_access_key.is_empty()
    }
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = |present: bool| if present { "[REDACTED]" } else { "<empty>" };
        f.debug_struct("Secrets")
            .field("master_password", &state(!self.master_password.is_empty()))
            .field("email_token", &state(!self.email_token.is_empty()))
            .field("two_factor_code", &state(!self.two_factor_code.is_empty()))
            .field("device_access_key", &self.device_access_key)
            .field("device_secret_key", &state(!self.device_secret_key.is_empty()))
            .field("server_key", &state(!self.server_key.is_empty()))
            .field("local_key", &state(!self.local_key.is_empty()))
            .finish()
    }
}
