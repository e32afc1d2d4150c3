// SPDX-FileCopyrightText: 2026 Vaultline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed wrappers over the service endpoints used for device registration
//! and sync.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error};
use vaultline_core::{AuthMethod, VaultlineError};

use crate::client::{ApiClient, Deadline};
use crate::signing::Credentials;
use crate::types::{
    AuthMethodsRequest, AuthTicketResponse, CompleteRegistrationRequest, DeviceInfo,
    DeviceRegistration, EmailTokenRequest, LatestContent, LatestContentRequest, LoginRequest,
    SUPPORTED_METHODS, TotpRequest, Verifications,
};

/// Device description sent when registering.
#[derive(Debug, Clone, Copy)]
pub struct DeviceDescription<'a> {
    pub device_name: &'a str,
    pub app_version: &'a str,
}

fn parse<T: DeserializeOwned>(path: &str, data: Value) -> Result<T, VaultlineError> {
    serde_json::from_value(data).map_err(|e| {
        error!(path, error = %e, "unexpected API response shape");
        VaultlineError::InvalidApiRequest
    })
}

impl ApiClient {
    /// Verification methods the service offers for this login and device,
    /// in server order. Types this client does not know are dropped.
    pub async fn get_authentication_methods(
        &self,
        credentials: &Credentials<'_>,
    ) -> Result<Vec<AuthMethod>, VaultlineError> {
        const PATH: &str = "authentication/GetAuthenticationMethodsForDevice";
        let request = AuthMethodsRequest {
            login: credentials.login,
            methods: SUPPORTED_METHODS,
        };
        let data = self
            .request_api(credentials, PATH, &request, Deadline::Standard)
            .await?;
        let verifications: Verifications = parse(PATH, data)?;
        let methods: Vec<AuthMethod> = verifications
            .verifications
            .iter()
            .filter_map(|v| v.method())
            .collect();
        debug!(?methods, "authentication methods received");
        Ok(methods)
    }

    /// Asks the service to email a verification token.
    pub async fn request_email_token(
        &self,
        credentials: &Credentials<'_>,
    ) -> Result<(), VaultlineError> {
        let request = LoginRequest {
            login: credentials.login,
        };
        self.request_api(
            credentials,
            "authentication/RequestEmailTokenVerification",
            &request,
            Deadline::Standard,
        )
        .await?;
        Ok(())
    }

    pub async fn perform_email_token_verification(
        &self,
        credentials: &Credentials<'_>,
        token: &str,
    ) -> Result<String, VaultlineError> {
        let request = EmailTokenRequest {
            login: credentials.login,
            token,
        };
        self.auth_ticket(
            credentials,
            "authentication/PerformEmailTokenVerification",
            &request,
            Deadline::Standard,
        )
        .await
    }

    pub async fn perform_totp_verification(
        &self,
        credentials: &Credentials<'_>,
        otp: &str,
    ) -> Result<String, VaultlineError> {
        let request = TotpRequest {
            login: credentials.login,
            otp,
            activation_flow: false,
        };
        self.auth_ticket(
            credentials,
            "authentication/PerformTotpVerification",
            &request,
            Deadline::Standard,
        )
        .await
    }

    /// Blocks until the user answers the Duo push or the verification
    /// timeout elapses.
    pub async fn perform_duo_push_verification(
        &self,
        credentials: &Credentials<'_>,
    ) -> Result<String, VaultlineError> {
        let request = LoginRequest {
            login: credentials.login,
        };
        self.auth_ticket(
            credentials,
            "authentication/PerformDuoPushVerification",
            &request,
            Deadline::Verification,
        )
        .await
    }

    /// Blocks until the user answers in the authenticator app or the
    /// verification timeout elapses.
    pub async fn perform_authenticator_verification(
        &self,
        credentials: &Credentials<'_>,
    ) -> Result<String, VaultlineError> {
        let request = LoginRequest {
            login: credentials.login,
        };
        self.auth_ticket(
            credentials,
            "authentication/PerformDashlaneAuthenticatorVerification",
            &request,
            Deadline::Verification,
        )
        .await
    }

    /// Exchanges an auth ticket for device credentials.
    pub async fn complete_device_registration(
        &self,
        credentials: &Credentials<'_>,
        device: DeviceDescription<'_>,
        auth_ticket: &str,
    ) -> Result<DeviceRegistration, VaultlineError> {
        const PATH: &str = "authentication/CompleteDeviceRegistrationWithAuthTicket";
        let request = CompleteRegistrationRequest {
            device: DeviceInfo {
                device_name: device.device_name,
                app_version: device.app_version,
                platform: "server_standalone",
                os_country: "en_US",
                os_language: "en_US",
                temporary: false,
            },
            login: credentials.login,
            auth_ticket,
        };
        let data = self
            .request_api(credentials, PATH, &request, Deadline::Standard)
            .await?;
        parse(PATH, data)
    }

    /// Transactions changed since `timestamp` (`0` for a full download).
    pub async fn get_latest_content(
        &self,
        credentials: &Credentials<'_>,
        timestamp: u64,
    ) -> Result<LatestContent, VaultlineError> {
        const PATH: &str = "sync/GetLatestContent";
        let request = LatestContentRequest {
            timestamp,
            needs_keys: false,
            team_admin_groups: false,
            transactions: Vec::new(),
        };
        let data = self
            .request_api(credentials, PATH, &request, Deadline::Standard)
            .await?;
        parse(PATH, data)
    }

    async fn auth_ticket<T: serde::Serialize>(
        &self,
        credentials: &Credentials<'_>,
        path: &str,
        request: &T,
        deadline: Deadline,
    ) -> Result<String, VaultlineError> {
        let data = self.request_api(credentials, path, request, deadline).await?;
        let response: AuthTicketResponse = parse(path, data)?;
        Ok(response.auth_ticket)
    }
}
