// SPDX-FileCopyrightText: 2026 Vaultline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! DL1-HMAC-SHA256 request signing.
//!
//! A [`SignedRequest`] accumulates the method, path, query, headers and
//! payload of a request and produces the `Authorization` header value for a
//! given timestamp and set of [`Credentials`]. Headers and queries are kept
//! in sorted maps so the canonical form is independent of insertion order.

use std::collections::{BTreeMap, BTreeSet};

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use ring::{digest, hmac};

/// Signature algorithm name, also the first line of the string to sign.
pub const ALGORITHM: &str = "DL1-HMAC-SHA256";

/// User agent used when the caller sets none.
pub const DEFAULT_USER_AGENT: &str = "CI";

/// Everything except unreserved characters is escaped.
const URI_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

/// Keys identifying the application and, once registered, the device.
///
/// An empty `device_access_key` means the request authenticates as the
/// application only.
#[derive(Clone, Copy)]
pub struct Credentials<'a> {
    pub login: &'a str,
    pub app_access_key: &'a str,
    pub app_secret_key: &'a str,
    pub device_access_key: &'a str,
    pub device_secret_key: &'a str,
}

impl Credentials<'_> {
    fn authentication(&self) -> String {
        if self.device_access_key.is_empty() {
            format!("AppAccessKey={}", self.app_access_key)
        } else {
            format!(
                "Login={},AppAccessKey={},DeviceAccessKey={}",
                self.login, self.app_access_key, self.device_access_key
            )
        }
    }

    fn signing_key(&self) -> Vec<u8> {
        let mut key = self.app_secret_key.as_bytes().to_vec();
        if !self.device_secret_key.is_empty() {
            key.push(b'\n');
            key.extend_from_slice(self.device_secret_key.as_bytes());
        }
        key
    }
}

impl std::fmt::Debug for Credentials<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("app_access_key", &self.app_access_key)
            .field("device_access_key", &self.device_access_key)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct SignedRequest {
    method: Method,
    host: String,
    path: String,
    query: BTreeMap<String, String>,
    headers: BTreeMap<String, String>,
    signable: BTreeSet<String>,
    payload: Vec<u8>,
}

impl SignedRequest {
    pub fn new(method: Method, host: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method,
            host: host.into(),
            path: path.into(),
            query: BTreeMap::new(),
            headers: BTreeMap::new(),
            signable: BTreeSet::new(),
            payload: Vec::new(),
        }
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn set_payload(&mut self, payload: Vec<u8>) {
        self.payload = payload;
    }

    /// Headers in sorted order, excluding `Authorization`.
    pub fn headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Query parameters in sorted order.
    pub fn query(&self) -> impl Iterator<Item = (&str, &str)> {
        self.query.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Adds a header under its lowercased name. Returns `false`, leaving
    /// the request untouched, if the header is already present.
    pub fn add_header(&mut self, key: &str, value: impl Into<String>, signable: bool) -> bool {
        let key = key.to_ascii_lowercase();
        if self.headers.contains_key(&key) {
            return false;
        }
        if signable {
            self.signable.insert(key.clone());
        }
        self.headers.insert(key, value.into());
        true
    }

    /// Adds a query parameter. Returns `false` if the key is already present.
    pub fn add_query(&mut self, key: impl Into<String>, value: impl Into<String>) -> bool {
        let key = key.into();
        if self.query.contains_key(&key) {
            return false;
        }
        self.query.insert(key, value.into());
        true
    }

    /// Adds the headers every request carries: a user agent (unless one is
    /// set), the JSON content type, and the unsigned host.
    pub fn add_default_headers(&mut self) {
        self.add_header("user-agent", DEFAULT_USER_AGENT, true);
        self.add_header("content-type", "application/json", true);
        let host = self.host.clone();
        self.add_header("host", host, false);
    }

    /// `;`-joined names of the signed headers.
    pub fn signed_headers(&self) -> String {
        self.signable
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(";")
    }

    pub fn canonical_request(&self) -> String {
        let payload_hash = match self.method {
            Method::Post => hex::encode(digest::digest(&digest::SHA256, &self.payload)),
            Method::Get => String::new(),
        };
        [
            self.method.as_str().to_string(),
            self.encoded_path(),
            self.encoded_query(),
            self.headers_block(),
            self.signed_headers(),
            payload_hash,
        ]
        .join("\n")
    }

    /// Hex HMAC-SHA256 of the string to sign.
    pub fn signature(&self, credentials: &Credentials<'_>, timestamp: u64) -> String {
        let canonical_hash = hex::encode(digest::digest(
            &digest::SHA256,
            self.canonical_request().as_bytes(),
        ));
        let string_to_sign = format!("{ALGORITHM}\n{timestamp}\n{canonical_hash}");
        let key = hmac::Key::new(hmac::HMAC_SHA256, &credentials.signing_key());
        hex::encode(hmac::sign(&key, string_to_sign.as_bytes()))
    }

    /// Value of the `Authorization` header.
    pub fn authorization(&self, credentials: &Credentials<'_>, timestamp: u64) -> String {
        format!(
            "{ALGORITHM} {},Timestamp={timestamp},SignedHeaders={},Signature={}",
            credentials.authentication(),
            self.signed_headers(),
            self.signature(credentials, timestamp),
        )
    }

    fn encoded_path(&self) -> String {
        self.path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(|segment| format!("/{}", uri_encode(segment)))
            .collect()
    }

    fn encoded_query(&self) -> String {
        self.query
            .iter()
            .map(|(k, v)| format!("{}={}", uri_encode(k), uri_encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }

    fn headers_block(&self) -> String {
        self.signable
            .iter()
            .filter_map(|key| self.headers.get(key).map(|value| format!("{key}:{value}\n")))
            .collect()
    }
}

/// Percent-encodes everything except `A-Z a-z 0-9 - . _ ~`.
pub fn uri_encode(input: &str) -> String {
    utf8_percent_encode(input, URI_ESCAPE).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const APP_ONLY: Credentials<'static> = Credentials {
        login: "alice@example.com",
        app_access_key: "APPKEY",
        app_secret_key: "app-secret",
        device_access_key: "",
        device_secret_key: "",
    };

    const WITH_DEVICE: Credentials<'static> = Credentials {
        login: "alice@example.com",
        app_access_key: "APPKEY",
        app_secret_key: "app-secret",
        device_access_key: "DEVKEY",
        device_secret_key: "device-secret",
    };

    fn sample() -> SignedRequest {
        let mut request = SignedRequest::new(
            Method::Post,
            "api.example.com",
            "/v1/authentication/GetAuthenticationMethodsForDevice",
        );
        request.add_header("User-Agent", "Vaultline CLI v1.0", true);
        request.set_payload(br#"{"login":"alice@example.com"}"#.to_vec());
        request.add_default_headers();
        request
    }

    #[test]
    fn uri_encoding_keeps_only_unreserved() {
        assert_eq!(uri_encode("AZaz09-._~"), "AZaz09-._~");
        assert_eq!(uri_encode("a b/c"), "a%20b%2Fc");
        assert_eq!(uri_encode("alice@example.com"), "alice%40example.com");
        assert_eq!(uri_encode("é"), "%C3%A9");
    }

    #[test]
    fn header_first_write_wins_and_is_lowercased() {
        let mut request = SignedRequest::new(Method::Get, "h", "/");
        assert!(request.add_header("X-Custom", "one", true));
        assert!(!request.add_header("x-custom", "two", true));
        assert!(request.add_query("k", "1"));
        assert!(!request.add_query("k", "2"));
        let headers: Vec<_> = request.headers().collect();
        assert_eq!(headers, vec![("x-custom", "one")]);
        let query: Vec<_> = request.query().collect();
        assert_eq!(query, vec![("k", "1")]);
    }

    #[test]
    fn explicit_user_agent_survives_defaults() {
        let request = sample();
        let headers: Vec<_> = request.headers().collect();
        assert_eq!(
            headers,
            vec![
                ("content-type", "application/json"),
                ("host", "api.example.com"),
                ("user-agent", "Vaultline CLI v1.0"),
            ]
        );
        assert_eq!(request.signed_headers(), "content-type;user-agent");
    }

    #[test]
    fn canonical_post_request_layout() {
        let expected = "POST\n\
            /v1/authentication/GetAuthenticationMethodsForDevice\n\
            \n\
            content-type:application/json\n\
            user-agent:Vaultline CLI v1.0\n\
            \n\
            content-type;user-agent\n\
            8487454d7c1619b06212e4aa7377412c7ec54c11f0c3610decf8f14f77ece9c0";
        assert_eq!(sample().canonical_request(), expected);
    }

    #[test]
    fn canonical_get_encodes_path_and_sorted_query() {
        let mut request = SignedRequest::new(Method::Get, "h", "//v1/a b//c/");
        request.add_query("zeta", "last one");
        request.add_query("alpha", "x/y");
        request.add_default_headers();
        let expected = "GET\n\
            /v1/a%20b/c\n\
            alpha=x%2Fy&zeta=last%20one\n\
            content-type:application/json\n\
            user-agent:CI\n\
            \n\
            content-type;user-agent\n";
        assert_eq!(request.canonical_request(), expected);
    }

    #[test]
    fn signature_is_stable() {
        let request = sample();
        assert_eq!(
            request.signature(&APP_ONLY, 1_700_000_000),
            "3af444d3e0e6ce63742ed5b8ab767ce6fe0f0de748a4bab29b9f2db275bcb0ed"
        );
        assert_eq!(
            request.signature(&APP_ONLY, 1_700_000_000),
            request.signature(&APP_ONLY, 1_700_000_000)
        );
    }

    #[test]
    fn device_secret_changes_signature() {
        let request = sample();
        assert_eq!(
            request.signature(&WITH_DEVICE, 1_700_000_000),
            "66e88490186785d951a83c446b3b60215d5d5b9615ff06700b962eea3d6a4142"
        );
        assert_ne!(
            request.signature(&WITH_DEVICE, 1_700_000_000),
            request.signature(&APP_ONLY, 1_700_000_000)
        );
    }

    #[test]
    fn signature_depends_on_timestamp_and_signed_headers() {
        let request = sample();
        let base = request.signature(&APP_ONLY, 1_700_000_000);
        assert_ne!(base, request.signature(&APP_ONLY, 1_700_000_001));

        let mut changed = SignedRequest::new(
            Method::Post,
            "api.example.com",
            "/v1/authentication/GetAuthenticationMethodsForDevice",
        );
        changed.add_header("User-Agent", "Other Agent", true);
        changed.set_payload(br#"{"login":"alice@example.com"}"#.to_vec());
        changed.add_default_headers();
        assert_ne!(base, changed.signature(&APP_ONLY, 1_700_000_000));

        // The host header is not signed.
        let mut other_host = SignedRequest::new(
            Method::Post,
            "elsewhere.example.com",
            "/v1/authentication/GetAuthenticationMethodsForDevice",
        );
        other_host.add_header("User-Agent", "Vaultline CLI v1.0", true);
        other_host.set_payload(br#"{"login":"alice@example.com"}"#.to_vec());
        other_host.add_default_headers();
        assert_eq!(base, other_host.signature(&APP_ONLY, 1_700_000_000));
    }

    #[test]
    fn authorization_header_formats() {
        let request = sample();
        let app = request.authorization(&APP_ONLY, 1_700_000_000);
        assert_eq!(
            app,
            format!(
                "DL1-HMAC-SHA256 AppAccessKey=APPKEY,Timestamp=1700000000,\
                 SignedHeaders=content-type;user-agent,Signature={}",
                request.signature(&APP_ONLY, 1_700_000_000)
            )
        );

        let device = request.authorization(&WITH_DEVICE, 1_700_000_000);
        assert!(device.starts_with(
            "DL1-HMAC-SHA256 Login=alice@example.com,AppAccessKey=APPKEY,DeviceAccessKey=DEVKEY,Timestamp=1700000000,"
        ));
    }

    #[test]
    fn credentials_debug_hides_secrets() {
        let debug = format!("{WITH_DEVICE:?}");
        assert!(!debug.contains("app-secret"));
        assert!(!debug.contains("device-secret"));
    }
}
