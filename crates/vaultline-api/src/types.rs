// SPDX-FileCopyrightText: 2026 Vaultline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request and response bodies for the remote vault service.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use vaultline_core::{AuthMethod, TransactionAction};

/// Verification methods this client can complete, in preference order.
pub const SUPPORTED_METHODS: [AuthMethod; 4] = [
    AuthMethod::EmailToken,
    AuthMethod::Totp,
    AuthMethod::DuoPush,
    AuthMethod::DashlaneAuthenticator,
];

/// Error envelope returned instead of `data` on failure.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub errors: Vec<ApiErrorDetail>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(rename = "type")]
    pub type_: String,
    pub code: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub login: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct AuthMethodsRequest<'a> {
    pub login: &'a str,
    pub methods: [AuthMethod; 4],
}

#[derive(Debug, Serialize)]
pub(crate) struct EmailTokenRequest<'a> {
    pub login: &'a str,
    pub token: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TotpRequest<'a> {
    pub login: &'a str,
    pub otp: &'a str,
    pub activation_flow: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DeviceInfo<'a> {
    pub device_name: &'a str,
    pub app_version: &'a str,
    pub platform: &'static str,
    pub os_country: &'static str,
    pub os_language: &'static str,
    pub temporary: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CompleteRegistrationRequest<'a> {
    pub device: DeviceInfo<'a>,
    pub login: &'a str,
    pub auth_ticket: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LatestContentRequest {
    pub timestamp: u64,
    pub needs_keys: bool,
    pub team_admin_groups: bool,
    pub transactions: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Verifications {
    #[serde(default)]
    pub verifications: Vec<Verification>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Verification {
    #[serde(rename = "type")]
    pub type_: String,
}

impl Verification {
    /// Known method for this entry, `None` for types this client ignores.
    pub fn method(&self) -> Option<AuthMethod> {
        AuthMethod::from_str(&self.type_).ok()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AuthTicketResponse {
    #[serde(default)]
    pub auth_ticket: String,
}

/// Device credentials issued by a completed registration.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRegistration {
    pub device_access_key: String,
    pub device_secret_key: String,
    #[serde(default)]
    pub server_key: Option<String>,
    #[serde(default)]
    pub sso_server_key: Option<String>,
}

impl std::fmt::Debug for DeviceRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceRegistration")
            .field("device_access_key", &self.device_access_key)
            .field("device_secret_key", &"[REDACTED]")
            .field("server_key", &self.server_key.as_ref().map(|_| "[REDACTED]"))
            .field(
                "sso_server_key",
                &self.sso_server_key.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// Transactions newer than the requested timestamp.
#[derive(Debug, Clone, Deserialize)]
pub struct LatestContent {
    pub timestamp: u64,
    #[serde(default)]
    pub transactions: Vec<RawTransaction>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTransaction {
    pub action: String,
    pub identifier: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub backup_date: u64,
    #[serde(default)]
    pub time: u64,
    #[serde(default)]
    pub content: Option<String>,
}

impl RawTransaction {
    /// Parsed action, `None` for actions this client does not know.
    pub fn action(&self) -> Option<TransactionAction> {
        TransactionAction::from_str(&self.action).ok()
    }
}
