// SPDX-FileCopyrightText: 2026 Vaultline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits consumed by the session engine.
//!
//! Both traits use `#[async_trait]` so implementations can be held as
//! `Arc<dyn Trait>`.

pub mod secrets;
pub mod storage;

pub use secrets::SecretStore;
pub use storage::LocalStorage;
