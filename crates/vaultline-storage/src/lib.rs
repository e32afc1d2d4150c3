// SPDX-FileCopyrightText: 2026 Vaultline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Vaultline vault client.
//!
//! Provides WAL-mode SQLite storage with embedded migrations and a
//! single-writer concurrency model via `tokio-rusqlite`. [`SqliteStorage`]
//! holds the synchronized transaction log, device configurations and sync
//! timestamps; [`SqliteSecretStore`] keeps keychain-style secrets in a
//! separate file.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod queries;
pub mod secret_store;

pub use adapter::SqliteStorage;
pub use database::Database;
pub use migrations::Schema;
pub use secret_store::SqliteSecretStore;
