// SPDX-FileCopyrightText: 2026 Vaultline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vaultline - a local-first password vault client.
//!
//! This is the binary entry point: it loads configuration, opens local
//! storage and drives a session, prompting for whatever the session asks.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod password;
mod prompt;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use vaultline_api::ApiClient;
use vaultline_config::VaultlineConfig;
use vaultline_core::VaultlineError;
use vaultline_crypto::KeyCache;
use vaultline_session::{ResetScope, Session, SessionConfig};
use vaultline_storage::{SqliteSecretStore, SqliteStorage};

use crate::password::OutputFormat;
use crate::prompt::Prompter;

/// Vaultline - a local-first password vault client.
#[derive(Parser, Debug)]
#[command(name = "vaultline", version, about, long_about = None)]
struct Cli {
    /// Configuration file to use instead of the XDG lookup.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Account login. Falls back to `[headless] login`, then a prompt.
    #[arg(long, global = true)]
    login: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print credentials matching the filters (`name=value` or a bare word).
    #[command(alias = "p")]
    Password {
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Password)]
        output: OutputFormat,
        filters: Vec<String>,
    },
    /// Download the latest vault changes.
    Sync,
    /// Delete local keys and vault data for the login.
    Reset,
    /// Delete local keys and vault data for every login.
    ResetAll,
    /// Change a stored preference.
    Configure {
        #[command(subcommand)]
        setting: Setting,
    },
}

#[derive(Subcommand, Debug)]
enum Setting {
    /// Keep the master password, encrypted, between runs.
    StoreMasterPassword { value: Toggle },
    /// Synchronize before queries once the vault is stale.
    AutoSync { value: Toggle },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Toggle {
    On,
    Off,
}

impl Toggle {
    fn enabled(self) -> bool {
        self == Toggle::On
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => vaultline_config::load_and_validate_path(path),
        None => vaultline_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            vaultline_config::render_errors(&errors);
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&config.logging.level);

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("vaultline: error {}: {}", e.code(), e.message());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: VaultlineConfig) -> Result<(), VaultlineError> {
    let mut prompter = Prompter::new(&config.headless);
    let login = prompter.login(cli.login, &config.headless)?;
    let (mut session, storage) = open_session(&config, login).await?;

    let result = match cli.command {
        Commands::Password { output, filters } => {
            password::run_password(&mut session, &mut prompter, &filters, output).await
        }
        Commands::Sync => {
            let report = loop {
                match session.synchronize().await {
                    Ok(report) => break report,
                    Err(e) => prompter.answer(&mut session, e)?,
                }
            };
            eprintln!(
                "Synchronized: {} updated, {} removed.",
                report.edits, report.removals
            );
            Ok(())
        }
        Commands::Reset => session.reset(ResetScope::CurrentLogin).await,
        Commands::ResetAll => session.reset(ResetScope::AllLogins).await,
        Commands::Configure { setting } => match setting {
            Setting::StoreMasterPassword { value } => {
                session.set_store_master_password(value.enabled()).await
            }
            Setting::AutoSync { value } => session.set_auto_sync(value.enabled()).await,
        },
    };

    let closed = storage.close().await;
    result.and(closed)
}

async fn open_session(
    config: &VaultlineConfig,
    login: String,
) -> Result<(Session, Arc<SqliteStorage>), VaultlineError> {
    let storage = Arc::new(SqliteStorage::open(config.storage.clone()).await?);
    let secret_store = Arc::new(
        SqliteSecretStore::open(&config.storage.secrets_path, config.storage.wal_mode).await?,
    );
    let api = ApiClient::new(&config.api, &config.client.application_name)?;
    let key_cache = Arc::new(KeyCache::new(config.kdf.cache_capacity));

    info!(%login, api = %config.api.base_url, "opening session");
    let session = Session::new(
        SessionConfig::from_config(config, login),
        storage.clone(),
        secret_store,
        api,
        key_cache,
    )?;
    Ok((session, storage))
}

/// Initializes the tracing subscriber on stderr with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("vaultline={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}
