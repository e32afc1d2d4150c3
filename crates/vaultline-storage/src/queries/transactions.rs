// SPDX-FileCopyrightText: 2026 Vaultline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transaction log operations.

use std::str::FromStr;

use rusqlite::types::Type;
use rusqlite::{Row, params, params_from_iter};
use vaultline_core::{TransactionAction, TransactionRow, TransactionTypes, VaultlineError};

use crate::database::{Database, map_tr_err};

/// Upserts `rows` in a single transaction keyed by `(login, identifier)`.
pub async fn upsert(db: &Database, rows: &[TransactionRow]) -> Result<(), VaultlineError> {
    let rows = rows.to_vec();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO transactions (login, identifier, type, action, content)
                     VALUES (?1, ?2, ?3, ?4, ?5)
                     ON CONFLICT(login, identifier) DO UPDATE SET
                        type = excluded.type,
                        action = excluded.action,
                        content = excluded.content",
                )?;
                for row in &rows {
                    stmt.execute(params![
                        row.login,
                        row.identifier,
                        row.kind,
                        row.action.to_string(),
                        row.content,
                    ])?;
                }
            }
            tx.commit()
        })
        .await
        .map_err(map_tr_err(VaultlineError::DatabaseTransactionFailure))
}

/// `BACKUP_EDIT` rows for `login` restricted to `types` (all when empty),
/// in insertion order.
pub async fn query_edits(
    db: &Database,
    login: &str,
    types: TransactionTypes,
) -> Result<Vec<TransactionRow>, VaultlineError> {
    let mut values = vec![
        login.to_string(),
        TransactionAction::BackupEdit.to_string(),
    ];
    let mut sql = String::from(
        "SELECT login, identifier, type, action, content FROM transactions
         WHERE login = ?1 AND action = ?2",
    );
    if !types.is_empty() {
        let tags = types.tags();
        let placeholders: Vec<String> = (0..tags.len()).map(|i| format!("?{}", i + 3)).collect();
        sql.push_str(&format!(" AND type IN ({})", placeholders.join(", ")));
        values.extend(tags.into_iter().map(str::to_string));
    }
    sql.push_str(" ORDER BY rowid");

    db.connection()
        .call(move |conn| -> Result<Vec<TransactionRow>, rusqlite::Error> {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(values.iter()), row_to_transaction)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await
        .map_err(map_tr_err(VaultlineError::FailedDatabaseCreation))
}

fn row_to_transaction(row: &Row<'_>) -> Result<TransactionRow, rusqlite::Error> {
    let action: String = row.get(3)?;
    let action = TransactionAction::from_str(&action)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;
    Ok(TransactionRow {
        login: row.get(0)?,
        identifier: row.get(1)?,
        kind: row.get(2)?,
        action,
        content: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::Schema;
    use tempfile::tempdir;

    fn row(id: &str, kind: &str, action: TransactionAction, content: &str) -> TransactionRow {
        TransactionRow {
            login: "alice@example.com".into(),
            identifier: id.into(),
            kind: kind.into(),
            action,
            content: content.into(),
        }
    }

    async fn open(dir: &tempfile::TempDir) -> Database {
        let path = dir.path().join("tx.db");
        Database::open(path.to_str().unwrap(), false, Schema::Vault)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn latest_write_wins() {
        let dir = tempdir().unwrap();
        let db = open(&dir).await;
        upsert(&db, &[row("a", "AUTHENTIFIANT", TransactionAction::BackupEdit, "v1")])
            .await
            .unwrap();
        upsert(&db, &[row("a", "AUTHENTIFIANT", TransactionAction::BackupEdit, "v2")])
            .await
            .unwrap();

        let rows = query_edits(&db, "alice@example.com", TransactionTypes::empty())
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].content, "v2");
    }

    #[tokio::test]
    async fn removals_are_excluded_from_queries() {
        let dir = tempdir().unwrap();
        let db = open(&dir).await;
        upsert(
            &db,
            &[
                row("a", "AUTHENTIFIANT", TransactionAction::BackupEdit, "x"),
                row("b", "AUTHENTIFIANT", TransactionAction::BackupEdit, "y"),
            ],
        )
        .await
        .unwrap();
        upsert(&db, &[row("a", "AUTHENTIFIANT", TransactionAction::BackupRemove, "")])
            .await
            .unwrap();

        let rows = query_edits(&db, "alice@example.com", TransactionTypes::empty())
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].identifier, "b");
    }

    #[tokio::test]
    async fn type_mask_filters_rows() {
        let dir = tempdir().unwrap();
        let db = open(&dir).await;
        upsert(
            &db,
            &[
                row("a", "AUTHENTIFIANT", TransactionAction::BackupEdit, "x"),
                row("b", "SECURENOTE", TransactionAction::BackupEdit, "y"),
                row("c", "EMAIL", TransactionAction::BackupEdit, "z"),
            ],
        )
        .await
        .unwrap();

        let notes = query_edits(&db, "alice@example.com", TransactionTypes::SECURE_NOTE)
            .await
            .unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].kind, "SECURENOTE");

        let both = query_edits(
            &db,
            "alice@example.com",
            TransactionTypes::SECURE_NOTE | TransactionTypes::AUTHENTIFIANT,
        )
        .await
        .unwrap();
        let ids: Vec<_> = both.iter().map(|r| r.identifier.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn rows_are_scoped_by_login() {
        let dir = tempdir().unwrap();
        let db = open(&dir).await;
        let mut other = row("a", "AUTHENTIFIANT", TransactionAction::BackupEdit, "bob's");
        other.login = "bob@example.com".into();
        upsert(
            &db,
            &[row("a", "AUTHENTIFIANT", TransactionAction::BackupEdit, "alice's"), other],
        )
        .await
        .unwrap();

        let rows = query_edits(&db, "bob@example.com", TransactionTypes::empty())
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].content, "bob's");
    }
}
