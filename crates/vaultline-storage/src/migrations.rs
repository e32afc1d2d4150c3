// SPDX-FileCopyrightText: 2026 Vaultline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded database migrations using refinery.
//!
//! SQL migration files are compiled into the binary at build time via
//! `embed_migrations!`. Migrations run automatically on database open.

mod vault {
    use refinery::embed_migrations;
    embed_migrations!("migrations/vault");
}

mod secrets {
    use refinery::embed_migrations;
    embed_migrations!("migrations/secrets");
}

/// Refinery tracks applied migrations in this table.
pub const HISTORY_TABLE: &str = "refinery_schema_history";

/// Which set of tables a database file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schema {
    /// Transactions, device configuration and sync state.
    Vault,
    /// The secret store.
    Secrets,
}

impl Schema {
    /// Tables created by this schema's migrations.
    pub fn tables(self) -> &'static [&'static str] {
        match self {
            Schema::Vault => &["transactions", "sync_updates", "device"],
            Schema::Secrets => &["secrets"],
        }
    }
}

/// Run all pending migrations for `schema` against the given connection.
pub fn run(conn: &mut rusqlite::Connection, schema: Schema) -> Result<(), String> {
    let report = match schema {
        Schema::Vault => vault::migrations::runner().run(conn),
        Schema::Secrets => secrets::migrations::runner().run(conn),
    }
    .map_err(|e| e.to_string())?;
    tracing::debug!(
        ?schema,
        applied = report.applied_migrations().len(),
        "migrations complete"
    );
    Ok(())
}
