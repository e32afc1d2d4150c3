// SPDX-FileCopyrightText: 2026 Vaultline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Remote vault service client.
//!
//! Requests are signed with the DL1-HMAC-SHA256 scheme ([`signing`]),
//! delivered over rustls with TLS 1.2 or newer ([`client`]), and wrapped in
//! typed endpoint calls ([`endpoints`]).

pub mod client;
pub mod endpoints;
pub mod signing;
pub mod types;

pub use client::{ApiClient, ApiResponse, Deadline, map_api_error};
pub use endpoints::DeviceDescription;
pub use signing::{Credentials, Method, SignedRequest};
pub use types::{DeviceRegistration, LatestContent, RawTransaction};
