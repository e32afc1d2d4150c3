// SPDX-FileCopyrightText: 2026 Vaultline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error type shared by every Vaultline crate.
//!
//! Each variant maps to a stable numeric code. Codes are grouped by family:
//! `1xx` asks the caller for more input, `2xx` means the session must be
//! recreated, `3xx` rejects user-supplied data, `4xx` is an interface misuse
//! and `5xx` is an internal or remote failure. Code `0` is reserved for
//! success and has no variant.

use strum::EnumIter;
use thiserror::Error;

/// The primary error type returned by all Vaultline operations.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum VaultlineError {
    /// The master password must be assigned before the operation can continue.
    #[error("the session requires the master password to be set to continue")]
    RequireMasterPassword,

    /// A two-factor code must be assigned before the operation can continue.
    #[error("the session requires the 2FA code to be set to continue")]
    Require2FACode,

    /// An email token must be assigned before the operation can continue.
    #[error("the session requires the email token to be set to continue")]
    RequireEmailToken,

    #[error("the provided session is invalid")]
    InvalidContext,

    #[error("cannot create a session with an empty login")]
    MissingOrInvalidLogin,

    #[error("cannot create a session without valid app keys")]
    MissingOrInvalidAppKeys,

    #[error("the two-factor authentication code provided is invalid")]
    Invalid2FACode,

    #[error("the email token provided is invalid")]
    InvalidEmailToken,

    #[error("the master password provided is invalid")]
    InvalidMasterPassword,

    #[error("Duo push verification failed")]
    DuoPushVerificationFailed,

    #[error("authenticator app verification failed")]
    AuthenticatorVerificationFailed,

    #[error("failed to register device (incorrect authentication?)")]
    DeviceRegistrationFailed,

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("an invalid parameter was provided to a library function")]
    InvalidParameter,

    #[error("this device has not been registered, this function is not available")]
    DeviceNotRegistered,

    #[error("an internal error occurred and the API request failed")]
    InvalidApiRequest,

    #[error("no authentication methods available that are supported by this application")]
    NoSupportedAuth,

    #[error("failed to open the local database (invalid path?)")]
    FailedDatabaseConnection,

    #[error("failed to create tables or communicate with the local database")]
    FailedDatabaseCreation,

    #[error("the secret store is not available on this system")]
    KeychainUnavailable,

    #[error("failed to update the device configuration in the local database")]
    UpdateConfigFailed,

    #[error("encryption or serialization failed")]
    InternalEncryptFailure,

    #[error("decryption or deserialization failed")]
    InternalDecryptFailure,

    #[error("SSO authentication is not supported")]
    SsoAuthenticationUnsupported,

    #[error("failed to execute a transaction against the local database")]
    DatabaseTransactionFailure,

    #[error("the request could not be delivered to the server (connection issue?)")]
    UnknownRequestError,

    /// The server rejected the request timestamp (clock skew).
    #[error("the request timestamp was rejected as out of bounds")]
    ApiTimeoutError,

    #[error("the API did not accept the request authentication header")]
    ApiAuthenticationError,

    #[error("the API did not recognize the device key for this user")]
    ApiDeviceKeyError,

    #[error("the requested API endpoint does not exist")]
    ApiEndpointError,
}

impl VaultlineError {
    /// Numeric code of this error.
    pub fn code(&self) -> u32 {
        match self {
            Self::RequireMasterPassword => 100,
            Self::Require2FACode => 101,
            Self::RequireEmailToken => 102,

            Self::InvalidContext => 200,
            Self::MissingOrInvalidLogin => 201,
            Self::MissingOrInvalidAppKeys => 202,

            Self::Invalid2FACode => 300,
            Self::InvalidEmailToken => 301,
            Self::InvalidMasterPassword => 302,
            Self::DuoPushVerificationFailed => 303,
            Self::AuthenticatorVerificationFailed => 304,
            Self::DeviceRegistrationFailed => 305,
            Self::AuthenticationFailed => 306,

            Self::InvalidParameter => 400,
            Self::DeviceNotRegistered => 401,

            Self::InvalidApiRequest => 500,
            Self::NoSupportedAuth => 501,
            Self::FailedDatabaseConnection => 502,
            Self::FailedDatabaseCreation => 503,
            Self::KeychainUnavailable => 504,
            Self::UpdateConfigFailed => 505,
            Self::InternalEncryptFailure => 506,
            Self::InternalDecryptFailure => 507,
            Self::SsoAuthenticationUnsupported => 508,
            Self::DatabaseTransactionFailure => 509,
            Self::UnknownRequestError => 510,
            Self::ApiTimeoutError => 511,
            Self::ApiAuthenticationError => 512,
            Self::ApiDeviceKeyError => 513,
            Self::ApiEndpointError => 514,
        }
    }

    /// Human-readable description, identical to the `Display` output.
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Looks up the error for a numeric code. Returns `None` for `0` and
    /// for unknown codes.
    pub fn from_code(code: u32) -> Option<Self> {
        use strum::IntoEnumIterator;
        Self::iter().find(|e| e.code() == code)
    }

    /// True for errors the caller resolves by supplying more input and
    /// re-issuing the same call.
    pub fn is_continuation(&self) -> bool {
        matches!(
            self,
            Self::RequireMasterPassword | Self::Require2FACode | Self::RequireEmailToken
        )
    }

    /// True for errors caused by a wrong master password, email token or
    /// two-factor code. The caller should prompt again.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::InvalidMasterPassword | Self::InvalidEmailToken | Self::Invalid2FACode
        )
    }
}

/// Human-readable message for a numeric code, including `0`.
pub fn error_message(code: u32) -> String {
    match code {
        0 => "function executed successfully".to_string(),
        other => VaultlineError::from_code(other)
            .map(|e| e.to_string())
            .unwrap_or_else(|| "unknown error code".to_string()),
    }
}
