// SPDX-FileCopyrightText: 2026 Vaultline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `vaultline password` command implementation.

use clap::ValueEnum;
use serde_json::Value;
use vaultline_core::{TransactionTypes, VaultlineError};
use vaultline_session::{Query, Session};

use crate::prompt::Prompter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// The password of each matching credential, one per line.
    Password,
    /// Every matching credential as a JSON array.
    Json,
}

/// Builds the credential query from `name=needle` filters. A bare word
/// matches entries where any field contains it.
pub fn build_query(filters: &[String]) -> Result<Query, VaultlineError> {
    let mut query = Query::new();
    query.add_types(TransactionTypes::AUTHENTIFIANT);
    for filter in filters {
        match filter.split_once('=') {
            Some((name, needle)) => query.add_filter(name, needle)?,
            None => query.add_filter(filter.as_str(), "")?,
        };
    }
    Ok(query)
}

pub async fn run_password(
    session: &mut Session,
    prompter: &mut Prompter,
    filters: &[String],
    output: OutputFormat,
) -> Result<(), VaultlineError> {
    let query = build_query(filters)?;
    let entries = loop {
        let mut entries = Vec::new();
        match session.query(&query, |entry| entries.push(entry.clone())).await {
            Ok(_) => break entries,
            Err(e) => prompter.answer(session, e)?,
        }
    };
    if entries.is_empty() {
        eprintln!("No matching credentials.");
    }
    print!("{}", render(&entries, output));
    Ok(())
}

pub fn render(entries: &[Value], output: OutputFormat) -> String {
    match output {
        OutputFormat::Password => entries
            .iter()
            .filter_map(|entry| entry.get("Password").and_then(Value::as_str))
            .map(|password| format!("{password}\n"))
            .collect(),
        OutputFormat::Json => {
            let array = Value::Array(entries.to_vec());
            serde_json::to_string_pretty(&array).map_or_else(|_| String::new(), |s| s + "\n")
        }
    }
}
