// SPDX-FileCopyrightText: 2026 Vaultline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Vaultline integration tests.
//!
//! # Components
//!
//! - [`MemorySecretStore`] - in-memory secret store with failure injection
//! - [`MockVault`] - mock remote vault service on a local port
//! - [`TestHarness`] - temp SQLite storage, secret store and mock service
//!   wired into a ready-to-use session

pub mod harness;
pub mod memory_secret_store;
pub mod mock_vault;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use memory_secret_store::MemorySecretStore;
pub use mock_vault::{MockVault, authentifiant_xml, edit, remove, server_content};
