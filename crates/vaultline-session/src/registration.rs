// SPDX-FileCopyrightText: 2026 Vaultline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Device registration with second-factor verification.

use tracing::{debug, info, warn};
use vaultline_api::DeviceDescription;
use vaultline_core::{AuthMethod, VaultlineError};
use zeroize::{Zeroize, Zeroizing};

use crate::session::Session;

impl Session {
    /// Registers this device using the first verification method the
    /// service offers.
    ///
    /// Email-token and TOTP flows need input: the first call fails with
    /// `RequireEmailToken` (after asking the service to send the email) or
    /// `Require2FACode`, and the caller retries once the value is assigned.
    pub(crate) async fn register_device(&mut self) -> Result<(), VaultlineError> {
        let methods = self.api.get_authentication_methods(&self.credentials()).await?;
        let Some(method) = methods.into_iter().find(|m| *m != AuthMethod::U2f) else {
            return Err(VaultlineError::NoSupportedAuth);
        };
        debug!(%method, "verification method selected");

        let ticket = match method {
            AuthMethod::DuoPush => {
                info!("waiting for Duo push approval");
                self.api
                    .perform_duo_push_verification(&self.credentials())
                    .await
                    .map_err(|e| rejected_as(e, VaultlineError::DuoPushVerificationFailed))?
            }
            AuthMethod::DashlaneAuthenticator => {
                info!("waiting for authenticator app approval");
                self.api
                    .perform_authenticator_verification(&self.credentials())
                    .await
                    .map_err(|e| rejected_as(e, VaultlineError::AuthenticatorVerificationFailed))?
            }
            AuthMethod::Totp => self.verify_totp().await?,
            AuthMethod::EmailToken => self.verify_email_token().await?,
            AuthMethod::Sso => return Err(VaultlineError::SsoAuthenticationUnsupported),
            AuthMethod::U2f => return Err(VaultlineError::NoSupportedAuth),
        };

        if ticket.is_empty() {
            warn!(%method, "verification returned no auth ticket");
            return Err(VaultlineError::DeviceRegistrationFailed);
        }

        let device = DeviceDescription {
            device_name: &self.config.device_name,
            app_version: &self.config.app_version,
        };
        let registration = self
            .api
            .complete_device_registration(&self.credentials(), device, &ticket)
            .await
            .map_err(|e| rejected_as(e, VaultlineError::DeviceRegistrationFailed))?;

        self.secrets.device_access_key = registration.device_access_key;
        self.secrets.device_secret_key = Zeroizing::new(registration.device_secret_key);
        self.secrets.server_key.zeroize();
        if let Some(server_key) = registration.server_key.filter(|k| !k.is_empty()) {
            self.secrets.server_key = Zeroizing::new(server_key);
        }
        self.registered_with = Some(method);
        info!(%method, access_key = %self.secrets.device_access_key, "device registered");
        Ok(())
    }

    async fn verify_totp(&mut self) -> Result<String, VaultlineError> {
        if self.secrets.two_factor_code.is_empty() {
            return Err(VaultlineError::Require2FACode);
        }
        let result = self
            .api
            .perform_totp_verification(&self.credentials(), &self.secrets.two_factor_code)
            .await;
        if answered(&result) {
            self.secrets.two_factor_code.zeroize();
        }
        result.map_err(|e| rejected_as(e, VaultlineError::Invalid2FACode))
    }

    async fn verify_email_token(&mut self) -> Result<String, VaultlineError> {
        if self.secrets.email_token.is_empty() {
            self.api.request_email_token(&self.credentials()).await?;
            info!("verification email requested");
            return Err(VaultlineError::RequireEmailToken);
        }
        let result = self
            .api
            .perform_email_token_verification(&self.credentials(), &self.secrets.email_token)
            .await;
        if answered(&result) {
            self.secrets.email_token.zeroize();
        }
        result.map_err(|e| rejected_as(e, VaultlineError::InvalidEmailToken))
    }
}

/// One-time inputs are spent once the service has accepted or rejected
/// them. Transport failures keep them for a retry.
fn answered(result: &Result<String, VaultlineError>) -> bool {
    matches!(result, Ok(_) | Err(VaultlineError::AuthenticationFailed))
}

/// Replaces a verification rejection with the flow-specific error.
fn rejected_as(error: VaultlineError, rejected: VaultlineError) -> VaultlineError {
    match error {
        VaultlineError::AuthenticationFailed => rejected,
        other => other,
    }
}
