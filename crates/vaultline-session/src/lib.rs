// SPDX-FileCopyrightText: 2026 Vaultline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session engine for the Vaultline vault client.
//!
//! A [`Session`] ties one login to its local storage, secret store and the
//! remote service. It recovers the local key, registers the device when
//! needed, synchronizes the encrypted transaction log and answers
//! [`Query`]s over the decrypted entries.

pub mod config;
mod keychain;
mod preferences;
pub mod query;
mod registration;
pub mod reset;
mod secrets;
pub mod session;
pub mod sync;
pub mod transform;

pub use config::SessionConfig;
pub use query::{Filter, Query};
pub use reset::ResetScope;
pub use session::Session;
pub use sync::SyncReport;
