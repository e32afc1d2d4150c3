// SPDX-FileCopyrightText: 2026 Vaultline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pulling the transaction log from the service into local storage.

use tracing::{debug, info, warn};
use vaultline_core::{TransactionAction, TransactionRow, VaultlineError};
use vaultline_crypto::Envelope;

use crate::session::Session;

/// What one [`Session::synchronize`] call stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncReport {
    pub edits: usize,
    pub removals: usize,
    /// Server timestamp the next sync starts from.
    pub server_timestamp: u64,
}

impl Session {
    /// Fetches transactions newer than the last sync, re-encrypts edited
    /// entries under the local key and stores the batch atomically.
    pub async fn synchronize(&mut self) -> Result<SyncReport, VaultlineError> {
        self.ensure_secrets().await?;

        let login = self.config.login.clone();
        let since = self.storage.last_server_sync_time(&login).await?;
        debug!(since, "fetching latest content");
        let content = self.api.get_latest_content(&self.credentials(), since).await?;

        let rows = match self.seal_transactions(&login, content.transactions).await {
            Ok(rows) => rows,
            Err(e) => return Err(self.forget_password_on(e).await),
        };

        let mut report = SyncReport {
            server_timestamp: content.timestamp,
            ..SyncReport::default()
        };
        for row in &rows {
            match row.action {
                TransactionAction::BackupEdit => report.edits += 1,
                TransactionAction::BackupRemove => report.removals += 1,
            }
        }

        self.storage.upsert_transactions(&rows).await?;
        self.storage
            .update_last_sync_time(&login, content.timestamp)
            .await?;
        self.persist_if_dirty().await?;

        info!(
            edits = report.edits,
            removals = report.removals,
            server_timestamp = report.server_timestamp,
            "vault synchronized"
        );
        Ok(report)
    }

    async fn seal_transactions(
        &self,
        login: &str,
        transactions: Vec<vaultline_api::RawTransaction>,
    ) -> Result<Vec<TransactionRow>, VaultlineError> {
        let password = self.secrets.vault_password();
        let envelope = Envelope::new(&self.secrets.local_key, password.as_bytes(), &self.key_cache);

        let mut rows = Vec::with_capacity(transactions.len());
        for transaction in transactions {
            let Some(action) = transaction.action() else {
                debug!(action = %transaction.action, "skipping unknown transaction action");
                continue;
            };
            let content = match action {
                TransactionAction::BackupEdit => {
                    let Some(content) = transaction.content.filter(|c| !c.is_empty()) else {
                        warn!(
                            identifier = %transaction.identifier,
                            "edit without content, skipping"
                        );
                        continue;
                    };
                    envelope.recrypt(&content).await.map_err(|_| {
                        warn!(
                            identifier = %transaction.identifier,
                            "entry did not decrypt with the master password"
                        );
                        VaultlineError::InvalidMasterPassword
                    })?
                }
                TransactionAction::BackupRemove => String::new(),
            };
            rows.push(TransactionRow {
                login: login.to_string(),
                identifier: transaction.identifier,
                kind: transaction.kind,
                action,
                content,
            });
        }
        Ok(rows)
    }
}
