// SPDX-FileCopyrightText: 2026 Vaultline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the remote vault service.
//!
//! Provides [`ApiClient`] which signs every request with DL1-HMAC-SHA256,
//! posts JSON under `{base_url}/v1/`, and maps service error envelopes onto
//! [`VaultlineError`].

use std::time::Duration;

use reqwest::Url;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, warn};
use vaultline_config::model::ApiConfig;
use vaultline_core::VaultlineError;

use crate::signing::{Credentials, Method, SignedRequest};
use crate::types::ApiErrorResponse;

/// Outcome of delivering a signed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// `false` when the request never got a response.
    pub success: bool,
    /// HTTP status, `0` on transport failure.
    pub status: u16,
    /// Response body, or the transport error text on failure.
    pub body: Vec<u8>,
}

/// Which timeout applies to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deadline {
    Standard,
    /// Push verifications that wait on the user's phone.
    Verification,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: Url,
    user_agent: String,
    request_timeout: Duration,
    verification_timeout: Duration,
    clock: fn() -> u64,
}

impl ApiClient {
    /// Builds a client for `config`, sending `user_agent` on every request.
    pub fn new(config: &ApiConfig, user_agent: &str) -> Result<Self, VaultlineError> {
        let base_url = Url::parse(config.base_url.trim_end_matches('/')).map_err(|e| {
            error!(url = %config.base_url, error = %e, "invalid API base URL");
            VaultlineError::InvalidParameter
        })?;
        if base_url.host_str().is_none() {
            error!(url = %config.base_url, "API base URL has no host");
            return Err(VaultlineError::InvalidParameter);
        }

        let client = reqwest::Client::builder()
            .min_tls_version(reqwest::tls::Version::TLS_1_2)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| {
                error!("failed to build HTTP client: {e}");
                VaultlineError::UnknownRequestError
            })?;

        Ok(Self {
            client,
            base_url,
            user_agent: user_agent.to_string(),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            verification_timeout: Duration::from_secs(config.verification_timeout_secs),
            clock: unix_now,
        })
    }

    /// Replaces the signing clock.
    pub fn with_clock(mut self, clock: fn() -> u64) -> Self {
        self.clock = clock;
        self
    }

    /// `host[:port]` as sent in the `host` header.
    fn host(&self) -> String {
        let host = self.base_url.host_str().unwrap_or_default();
        match self.base_url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        }
    }

    fn timeout(&self, deadline: Deadline) -> Duration {
        match deadline {
            Deadline::Standard => self.request_timeout,
            Deadline::Verification => self.verification_timeout,
        }
    }

    /// Signs and delivers `request`. Transport failures come back as an
    /// unsuccessful [`ApiResponse`] rather than an error.
    pub async fn submit(
        &self,
        mut request: SignedRequest,
        credentials: &Credentials<'_>,
        deadline: Deadline,
    ) -> ApiResponse {
        request.add_default_headers();
        let authorization = request.authorization(credentials, (self.clock)());

        let mut url = self.base_url.clone();
        url.set_path(request.path());
        if request.query().next().is_some() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in request.query() {
                pairs.append_pair(key, value);
            }
        }

        let method = match request.method() {
            Method::Get if request.payload().is_empty() => reqwest::Method::GET,
            _ => reqwest::Method::POST,
        };
        let mut builder = self
            .client
            .request(method, url)
            .timeout(self.timeout(deadline))
            .header(reqwest::header::AUTHORIZATION, authorization);
        for (key, value) in request.headers() {
            builder = builder.header(key, value);
        }
        if !request.payload().is_empty() || request.method() == Method::Post {
            builder = builder.body(request.payload().to_vec());
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => return transport_failure(e),
        };
        let status = response.status().as_u16();
        match response.bytes().await {
            Ok(body) => ApiResponse {
                success: true,
                status,
                body: body.to_vec(),
            },
            Err(e) => transport_failure(e),
        }
    }

    /// POSTs `payload` as JSON to `/v1/{path}` and returns the `data` object
    /// of the response.
    pub async fn request_api<T: Serialize + ?Sized>(
        &self,
        credentials: &Credentials<'_>,
        path: &str,
        payload: &T,
        deadline: Deadline,
    ) -> Result<Value, VaultlineError> {
        let body = serde_json::to_vec(payload).map_err(|e| {
            error!(path, error = %e, "failed to serialize request payload");
            VaultlineError::InvalidApiRequest
        })?;

        let mut request = SignedRequest::new(Method::Post, self.host(), format!("/v1/{path}"));
        request.add_header("user-agent", self.user_agent.clone(), true);
        request.set_payload(body);

        debug!(path, ?deadline, "calling API");
        let response = self.submit(request, credentials, deadline).await;
        if !response.success {
            warn!(
                path,
                error = %String::from_utf8_lossy(&response.body),
                "API request was not delivered"
            );
            return Err(VaultlineError::UnknownRequestError);
        }

        let mut output: Value = serde_json::from_slice(&response.body).map_err(|e| {
            error!(path, status = response.status, error = %e, "API response is not JSON");
            VaultlineError::InvalidApiRequest
        })?;

        if output.get("errors").is_some() {
            let envelope: ApiErrorResponse = serde_json::from_value(output).map_err(|e| {
                error!(path, error = %e, "malformed API error envelope");
                VaultlineError::InvalidApiRequest
            })?;
            let Some(first) = envelope.errors.first() else {
                return Err(VaultlineError::InvalidApiRequest);
            };
            let mapped = map_api_error(&first.type_, &first.code);
            warn!(
                path,
                kind = %first.type_,
                code = %first.code,
                message = %first.message,
                mapped = mapped.code(),
                "API returned an error"
            );
            return Err(mapped);
        }

        match output.get_mut("data") {
            Some(data) => Ok(data.take()),
            None => {
                error!(path, "API response has neither data nor errors");
                Err(VaultlineError::InvalidApiRequest)
            }
        }
    }
}

/// Maps the first entry of a service error envelope.
pub fn map_api_error(kind: &str, code: &str) -> VaultlineError {
    match (kind, code) {
        ("invalid_request_error", "invalid_authentication") => {
            VaultlineError::ApiAuthenticationError
        }
        ("invalid_request_error", "out_of_bounds_timestamp") => VaultlineError::ApiTimeoutError,
        ("invalid_request_error", "unknown_userdevice_key") => VaultlineError::ApiDeviceKeyError,
        ("invalid_request_error", "invalid_endpoint") => VaultlineError::ApiEndpointError,
        ("business_error", "verification_failed") => VaultlineError::AuthenticationFailed,
        _ => VaultlineError::InvalidApiRequest,
    }
}

fn transport_failure(e: reqwest::Error) -> ApiResponse {
    ApiResponse {
        success: false,
        status: 0,
        body: e.to_string().into_bytes(),
    }
}

fn unix_now() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_url: &str) -> ApiConfig {
        ApiConfig {
            base_url: base_url.to_string(),
            ..ApiConfig::default()
        }
    }

    #[test]
    fn error_table() {
        let cases = [
            (
                "invalid_request_error",
                "invalid_authentication",
                VaultlineError::ApiAuthenticationError,
            ),
            ("invalid_request_error", "out_of_bounds_timestamp", VaultlineError::ApiTimeoutError),
            ("invalid_request_error", "unknown_userdevice_key", VaultlineError::ApiDeviceKeyError),
            ("invalid_request_error", "invalid_endpoint", VaultlineError::ApiEndpointError),
            ("invalid_request_error", "something_else", VaultlineError::InvalidApiRequest),
            ("business_error", "verification_failed", VaultlineError::AuthenticationFailed),
            ("business_error", "invalid_endpoint", VaultlineError::InvalidApiRequest),
            ("other", "verification_failed", VaultlineError::InvalidApiRequest),
        ];
        for (kind, code, expected) in cases {
            assert_eq!(map_api_error(kind, code), expected, "{kind}/{code}");
        }
    }

    #[test]
    fn host_includes_explicit_port() {
        let client = ApiClient::new(&config("http://127.0.0.1:8080/"), "ua").unwrap();
        assert_eq!(client.host(), "127.0.0.1:8080");

        let client = ApiClient::new(&config("https://api.example.com"), "ua").unwrap();
        assert_eq!(client.host(), "api.example.com");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert_eq!(
            ApiClient::new(&config("not a url"), "ua").unwrap_err(),
            VaultlineError::InvalidParameter
        );
    }

    #[test]
    fn deadlines_pick_configured_timeouts() {
        let client = ApiClient::new(&config("https://api.example.com"), "ua").unwrap();
        assert_eq!(client.timeout(Deadline::Standard), Duration::from_secs(30));
        assert_eq!(client.timeout(Deadline::Verification), Duration::from_secs(300));
    }
}
