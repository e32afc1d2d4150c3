// SPDX-FileCopyrightText: 2026 Vaultline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock remote vault service.
//!
//! `MockVault` wraps a `wiremock` server and mounts canned responses for the
//! endpoints the session uses. When two mounts match a request the first
//! one wins; use [`MockVault::reset`] to swap responses mid-test.

use std::io::Write;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use flate2::Compression;
use flate2::write::DeflateEncoder;
use serde_json::{Value, json};
use vaultline_crypto::{Argon2Config, KeyDerivation, cipher, derive};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const AUTH_METHODS: &str = "authentication/GetAuthenticationMethodsForDevice";
pub const REQUEST_EMAIL_TOKEN: &str = "authentication/RequestEmailTokenVerification";
pub const EMAIL_TOKEN: &str = "authentication/PerformEmailTokenVerification";
pub const TOTP: &str = "authentication/PerformTotpVerification";
pub const DUO_PUSH: &str = "authentication/PerformDuoPushVerification";
pub const AUTHENTICATOR: &str = "authentication/PerformDashlaneAuthenticatorVerification";
pub const COMPLETE_REGISTRATION: &str = "authentication/CompleteDeviceRegistrationWithAuthTicket";
pub const LATEST_CONTENT: &str = "sync/GetLatestContent";

/// Cheap Argon2d parameters standing in for the server's.
const TEST_DERIVATION: Argon2Config = Argon2Config {
    salt_length: 16,
    time_cost: 1,
    memory_cost: 64,
    parallelism: 1,
};

pub struct MockVault {
    server: MockServer,
}

impl MockVault {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Drops every mount and recorded request.
    pub async fn reset(&self) {
        self.server.reset().await;
    }

    /// Answers `POST /v1/{endpoint}` with `{"data": data}`.
    pub async fn respond(&self, endpoint: &str, data: Value) {
        Mock::given(method("POST"))
            .and(path(format!("/v1/{endpoint}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": data})))
            .mount(&self.server)
            .await;
    }

    /// Answers `POST /v1/{endpoint}` with a service error envelope.
    pub async fn fail(&self, endpoint: &str, kind: &str, code: &str) {
        Mock::given(method("POST"))
            .and(path(format!("/v1/{endpoint}")))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "errors": [{"type": kind, "code": code, "message": "mock failure"}]
            })))
            .mount(&self.server)
            .await;
    }

    /// Rejects the verification with `business_error/verification_failed`.
    pub async fn reject(&self, endpoint: &str) {
        self.fail(endpoint, "business_error", "verification_failed").await;
    }

    pub async fn auth_methods(&self, methods: &[&str]) {
        let verifications: Vec<Value> = methods.iter().map(|m| json!({"type": m})).collect();
        self.respond(AUTH_METHODS, json!({"verifications": verifications}))
            .await;
    }

    /// Issues `ticket` for the verification endpoint.
    pub async fn ticket(&self, endpoint: &str, ticket: &str) {
        self.respond(endpoint, json!({"authTicket": ticket})).await;
    }

    /// Issues `ticket` only when the request body contains `body`.
    pub async fn ticket_for(&self, endpoint: &str, body: Value, ticket: &str) {
        Mock::given(method("POST"))
            .and(path(format!("/v1/{endpoint}")))
            .and(body_partial_json(body))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"data": {"authTicket": ticket}})),
            )
            .mount(&self.server)
            .await;
    }

    pub async fn registration(
        &self,
        access_key: &str,
        secret_key_hex: &str,
        server_key: Option<&str>,
    ) {
        let mut data = json!({
            "deviceAccessKey": access_key,
            "deviceSecretKey": secret_key_hex,
            "numberOfDevices": 1
        });
        if let Some(server_key) = server_key {
            data["serverKey"] = json!(server_key);
        }
        self.respond(COMPLETE_REGISTRATION, data).await;
    }

    pub async fn latest_content(&self, timestamp: u64, transactions: Vec<Value>) {
        self.respond(
            LATEST_CONTENT,
            json!({"timestamp": timestamp, "transactions": transactions}),
        )
        .await;
    }

    /// Requests received for `POST /v1/{endpoint}`.
    pub async fn requests_to(&self, endpoint: &str) -> Vec<wiremock::Request> {
        let target = format!("/v1/{endpoint}");
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|r| r.url.path() == target)
            .collect()
    }

    pub async fn calls(&self, endpoint: &str) -> usize {
        self.requests_to(endpoint).await.len()
    }
}

/// Transaction content as the service sends it: header, raw DEFLATE XML,
/// encrypted under a key derived from `password`, then base64.
pub fn server_content(password: &str, xml: &str) -> String {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(xml.as_bytes())
        .expect("deflate into memory");
    let mut plaintext = b"\x00\x00\x00\x00KW".to_vec();
    plaintext.extend(encoder.finish().expect("deflate into memory"));

    let derivation = KeyDerivation::Argon2d(TEST_DERIVATION);
    let salt = vec![7u8; derivation.salt_length()];
    let key = derive(&derivation, &salt, password.as_bytes()).expect("derive test key");
    let mut data = cipher::encrypt(&key, &plaintext).expect("encrypt test content");
    data.key_derivation = derivation;
    data.cipher_data.salt = salt;
    STANDARD.encode(data.encode())
}

/// XML for a credential entry with the given fields.
pub fn authentifiant_xml(fields: &[(&str, &str)]) -> String {
    let items: String = fields
        .iter()
        .map(|(k, v)| format!(r#"<KWDataItem key="{k}"><![CDATA[{v}]]></KWDataItem>"#))
        .collect();
    format!("<root><KWAuthentifiant>{items}</KWAuthentifiant></root>")
}

/// A `BACKUP_EDIT` transaction with server-encrypted content.
pub fn edit(identifier: &str, kind: &str, content: String) -> Value {
    json!({
        "action": "BACKUP_EDIT",
        "identifier": identifier,
        "type": kind,
        "backupDate": 1,
        "time": 1,
        "content": content
    })
}

pub fn remove(identifier: &str, kind: &str) -> Value {
    json!({
        "action": "BACKUP_REMOVE",
        "identifier": identifier,
        "type": kind,
        "backupDate": 2,
        "time": 2
    })
}
