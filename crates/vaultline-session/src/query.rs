// SPDX-FileCopyrightText: 2026 Vaultline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Decrypting and filtering locally stored vault entries.

use std::time::Duration;

use serde_json::{Map, Value};
use tracing::{debug, info};
use vaultline_core::{TransactionTypes, VaultlineError};
use vaultline_crypto::Envelope;

use crate::session::Session;
use crate::transform;

/// A field filter. An empty needle matches entries where any field value
/// contains `name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub name: String,
    pub needle: String,
}

impl Filter {
    pub fn matches(&self, entry: &Map<String, Value>) -> bool {
        if self.needle.is_empty() {
            entry
                .values()
                .any(|value| value.as_str().is_some_and(|v| contains_ignore_case(v, &self.name)))
        } else {
            entry
                .get(&self.name)
                .and_then(Value::as_str)
                .is_some_and(|v| contains_ignore_case(v, &self.needle))
        }
    }
}

/// Selection of entries to decrypt.
///
/// ```no_run
/// # use vaultline_core::TransactionTypes;
/// # use vaultline_session::Query;
/// let mut query = Query::new();
/// query.add_types(TransactionTypes::AUTHENTIFIANT);
/// query.add_filter("Url", "example.com").unwrap();
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    types: TransactionTypes,
    filters: Vec<Filter>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds categories to select. No categories selects all of them.
    pub fn add_types(&mut self, types: TransactionTypes) -> &mut Self {
        self.types |= types;
        self
    }

    pub fn add_filter(
        &mut self,
        name: impl Into<String>,
        needle: impl Into<String>,
    ) -> Result<&mut Self, VaultlineError> {
        let name = name.into();
        if name.is_empty() {
            return Err(VaultlineError::InvalidParameter);
        }
        self.filters.push(Filter {
            name,
            needle: needle.into(),
        });
        Ok(self)
    }

    pub fn types(&self) -> TransactionTypes {
        self.types
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// Without filters every entry matches, otherwise any one filter must.
    pub fn matches(&self, entry: &Map<String, Value>) -> bool {
        self.filters.is_empty() || self.filters.iter().any(|f| f.matches(entry))
    }
}

impl Session {
    /// Decrypts the entries selected by `query` and hands each match to
    /// `writer`. Returns the number of matches.
    ///
    /// Synchronizes first when auto-sync applies and the last sync is older
    /// than the configured interval.
    pub async fn query<W>(&mut self, query: &Query, mut writer: W) -> Result<usize, VaultlineError>
    where
        W: FnMut(&Value),
    {
        self.ensure_secrets().await?;
        self.sync_if_stale().await?;

        let rows = self
            .storage
            .query_transactions(&self.config.login, query.types())
            .await?;
        debug!(rows = rows.len(), types = ?query.types(), "decrypting entries");

        let mut matched = 0;
        let envelope = Envelope::new(&self.secrets.local_key, b"", &self.key_cache);
        for row in &rows {
            let plaintext = envelope.deserialize_and_decrypt(&row.content).await?;
            let entry = transform::transaction_to_json(&plaintext);
            if query.matches(&entry) {
                matched += 1;
                writer(&Value::Object(entry));
            }
        }

        self.persist_if_dirty().await?;
        info!(matched, total = rows.len(), "query complete");
        Ok(matched)
    }

    async fn sync_if_stale(&mut self) -> Result<(), VaultlineError> {
        let login = &self.config.login;
        let auto_sync = self
            .storage
            .get_device_config(login)
            .await?
            .is_none_or(|config| config.auto_sync);
        if !auto_sync {
            return Ok(());
        }

        let last_sync = Duration::from_secs(self.storage.last_sync_time(login).await?);
        let now = Duration::from_secs(u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0));
        if last_sync + self.config.auto_sync_interval < now {
            debug!(last_sync = last_sync.as_secs(), "vault is stale, synchronizing");
            self.synchronize().await?;
        }
        Ok(())
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn entry(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn empty_filter_name_is_rejected() {
        let mut query = Query::new();
        assert_eq!(
            query.add_filter("", "x").unwrap_err(),
            VaultlineError::InvalidParameter
        );
        assert!(query.filters().is_empty());
    }

    #[test]
    fn types_accumulate() {
        let mut query = Query::new();
        query
            .add_types(TransactionTypes::AUTHENTIFIANT)
            .add_types(TransactionTypes::SECURE_NOTE);
        assert_eq!(
            query.types(),
            TransactionTypes::AUTHENTIFIANT | TransactionTypes::SECURE_NOTE
        );
    }

    #[test]
    fn filters_match_as_documented() {
        let github = entry(json!({
            "Title": "GitHub",
            "Url": "https://GitHub.com",
            "Login": "alice"
        }));
        let bank = entry(json!({"Title": "Bank", "Url": "https://bank.example", "Login": "bob"}));

        let mut query = Query::new();
        assert!(query.matches(&github));

        query.add_filter("Url", "github").unwrap();
        assert!(query.matches(&github));
        assert!(!query.matches(&bank));

        // Needle-less filter searches every value for the name.
        let mut any = Query::new();
        any.add_filter("BOB", "").unwrap();
        assert!(any.matches(&bank));
        assert!(!any.matches(&github));

        // Any filter matching is enough.
        query.add_filter("Login", "BO").unwrap();
        assert!(query.matches(&bank));

        let mut missing = Query::new();
        missing.add_filter("Password", "x").unwrap();
        assert!(!missing.matches(&github));
    }
}
