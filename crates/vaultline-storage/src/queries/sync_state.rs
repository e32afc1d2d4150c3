// SPDX-FileCopyrightText: 2026 Vaultline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-login sync timestamps.

use rusqlite::params;
use vaultline_core::VaultlineError;

use super::{from_timestamp, to_timestamp};
use crate::database::{Database, map_tr_err};

/// Timestamps recorded by the last successful sync.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncState {
    /// Server timestamp to send on the next sync.
    pub last_server_sync: u64,
    /// Local clock when the last sync completed.
    pub last_client_sync: u64,
}

/// Sync state for `login`; all zero if it never synced.
pub async fn get(db: &Database, login: &str) -> Result<SyncState, VaultlineError> {
    let login = login.to_string();
    db.connection()
        .call(move |conn| -> Result<SyncState, rusqlite::Error> {
            let result = conn.query_row(
                "SELECT last_server_sync_timestamp, last_client_sync_timestamp
                 FROM sync_updates WHERE login = ?1",
                params![login],
                |row| {
                    Ok(SyncState {
                        last_server_sync: to_timestamp(row.get(0)?),
                        last_client_sync: to_timestamp(row.get(1)?),
                    })
                },
            );
            match result {
                Ok(state) => Ok(state),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(SyncState::default()),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err(VaultlineError::FailedDatabaseCreation))
}

/// Records a completed sync.
pub async fn update(db: &Database, login: &str, state: SyncState) -> Result<(), VaultlineError> {
    let login = login.to_string();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO sync_updates (login, last_server_sync_timestamp, last_client_sync_timestamp)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(login) DO UPDATE SET
                    last_server_sync_timestamp = excluded.last_server_sync_timestamp,
                    last_client_sync_timestamp = excluded.last_client_sync_timestamp",
                params![
                    login,
                    from_timestamp(state.last_server_sync),
                    from_timestamp(state.last_client_sync),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err(VaultlineError::DatabaseTransactionFailure))
}
