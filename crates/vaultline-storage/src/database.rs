// SPDX-FileCopyrightText: 2026 Vaultline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All statements run on tokio-rusqlite's single background thread. Do NOT
//! open additional connections to the same file for writes.

use std::path::Path;

use tracing::{debug, error};
use vaultline_core::VaultlineError;

use crate::migrations::{self, Schema};

/// An open SQLite database with its schema migrated.
pub struct Database {
    conn: tokio_rusqlite::Connection,
    schema: Schema,
}

impl Database {
    /// Opens (creating if needed) the database at `path` and migrates it.
    ///
    /// Parent directories are created. Failing to open the file yields
    /// `FailedDatabaseConnection`; failing to configure or migrate it
    /// yields `FailedDatabaseCreation`.
    pub async fn open(path: &str, wal_mode: bool, schema: Schema) -> Result<Self, VaultlineError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                error!(path, error = %e, "failed to create database directory");
                VaultlineError::FailedDatabaseConnection
            })?;
        }

        let conn = tokio_rusqlite::Connection::open(path).await.map_err(|e| {
            error!(path, error = %e, "failed to open database");
            VaultlineError::FailedDatabaseConnection
        })?;

        conn.call(move |conn| -> Result<(), String> {
            let journal = if wal_mode { "WAL" } else { "DELETE" };
            conn.execute_batch(&format!(
                "PRAGMA journal_mode = {journal};
                 PRAGMA synchronous = NORMAL;
                 PRAGMA busy_timeout = 5000;
                 PRAGMA foreign_keys = ON;"
            ))
            .map_err(|e| e.to_string())?;
            migrations::run(conn, schema)
        })
        .await
        .map_err(|e| {
            error!(path, error = %e, "failed to initialize database schema");
            VaultlineError::FailedDatabaseCreation
        })?;

        debug!(path, ?schema, wal_mode, "database opened");
        Ok(Self { conn, schema })
    }

    /// Returns a reference to the underlying async connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoints the WAL so the main file is self-contained.
    pub async fn close(&self) -> Result<(), VaultlineError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err(VaultlineError::FailedDatabaseCreation))?;
        debug!(schema = ?self.schema, "WAL checkpoint complete");
        Ok(())
    }

    /// Drops every table of this schema together with the migration history,
    /// so the next [`Database::open`] recreates them.
    pub async fn drop_all(&self) -> Result<(), VaultlineError> {
        let tables = self.schema.tables();
        self.conn
            .call(move |conn| -> Result<(), rusqlite::Error> {
                let tx = conn.transaction()?;
                for table in tables.iter().copied().chain([migrations::HISTORY_TABLE]) {
                    tx.execute_batch(&format!("DROP TABLE IF EXISTS {table};"))?;
                }
                tx.commit()
            })
            .await
            .map_err(map_tr_err(VaultlineError::DatabaseTransactionFailure))
    }
}

/// Builds a mapper that logs a tokio-rusqlite error and collapses it into
/// `kind`.
pub(crate) fn map_tr_err(
    kind: VaultlineError,
) -> impl FnOnce(tokio_rusqlite::Error<rusqlite::Error>) -> VaultlineError {
    move |e| {
        error!(error = %e, code = kind.code(), "database operation failed");
        kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn open_creates_parent_directories_and_schema() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/deeper/vault.db");
        let db = Database::open(path.to_str().unwrap(), true, Schema::Vault)
            .await
            .unwrap();
        assert!(path.exists());

        let tables: Vec<String> = db
            .connection()
            .call(|conn| -> Result<Vec<String>, rusqlite::Error> {
                let mut stmt = conn.prepare(
                    "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
                )?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .unwrap();
        for table in ["device", "sync_updates", "transactions"] {
            assert!(tables.iter().any(|t| t == table), "missing {table}: {tables:?}");
        }
    }

    #[tokio::test]
    async fn wal_mode_is_applied() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wal.db");
        let db = Database::open(path.to_str().unwrap(), true, Schema::Vault)
            .await
            .unwrap();
        let mode: String = db
            .connection()
            .call(|conn| -> Result<String, rusqlite::Error> {
                conn.query_row("PRAGMA journal_mode;", [], |row| row.get(0))
            })
            .await
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn reopening_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("reopen.db");
        let path = path.to_str().unwrap();
        Database::open(path, false, Schema::Vault).await.unwrap();
        Database::open(path, false, Schema::Vault).await.unwrap();
    }

    #[tokio::test]
    async fn drop_all_removes_tables_and_history() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("drop.db");
        let path = path.to_str().unwrap();
        let db = Database::open(path, false, Schema::Vault).await.unwrap();
        db.drop_all().await.unwrap();

        let count: i64 = db
            .connection()
            .call(|conn| -> Result<i64, rusqlite::Error> {
                conn.query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'",
                    [],
                    |row| row.get(0),
                )
            })
            .await
            .unwrap();
        assert_eq!(count, 0);
        drop(db);

        // Migrations run again on the next open.
        let db = Database::open(path, false, Schema::Vault).await.unwrap();
        let count: i64 = db
            .connection()
            .call(|conn| -> Result<i64, rusqlite::Error> {
                conn.query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))
            })
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn unopenable_path_is_connection_failure() {
        let dir = tempdir().unwrap();
        // A directory cannot be opened as a database file.
        let result = Database::open(dir.path().to_str().unwrap(), false, Schema::Vault).await;
        assert!(matches!(
            result,
            Err(VaultlineError::FailedDatabaseConnection | VaultlineError::FailedDatabaseCreation)
        ));
    }
}
