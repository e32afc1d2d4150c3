// SPDX-FileCopyrightText: 2026 Vaultline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for the vault tables.

pub mod devices;
pub mod sync_state;
pub mod transactions;

use rusqlite::params;
use vaultline_core::VaultlineError;

use crate::database::{Database, map_tr_err};

/// Deletes every row belonging to `login` in one transaction.
pub async fn remove_login(db: &Database, login: &str) -> Result<(), VaultlineError> {
    let login = login.to_string();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM transactions WHERE login = ?1", params![login])?;
            tx.execute("DELETE FROM sync_updates WHERE login = ?1", params![login])?;
            tx.execute("DELETE FROM device WHERE login = ?1", params![login])?;
            tx.commit()
        })
        .await
        .map_err(map_tr_err(VaultlineError::DatabaseTransactionFailure))
}

/// Converts a stored integer timestamp, treating negatives as zero.
pub(crate) fn to_timestamp(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

/// Converts a timestamp to the integer column type, saturating.
pub(crate) fn from_timestamp(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
