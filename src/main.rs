use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use couch_fs::{CouchClient, CouchConfig};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{Cli, Command};

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(err) = init_tracing(&cli.log_level) {
        eprintln!("{:#}", err);
        return ExitCode::from(2);
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

/// `RUST_LOG` wins over `--log` when set.
fn init_tracing(level: &str) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(log_directive(level))
            .with_context(|| format!("invalid log level {:?}", level))?,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))
}

/// Lowercases `level`; `fatal` has no tracing counterpart and maps to `error`.
fn log_directive(level: &str) -> String {
    match level.to_lowercase().as_str() {
        "fatal" => "error".to_owned(),
        other => other.to_owned(),
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = CouchConfig::from(cli.server);
    let database = config.database.clone();
    let client = CouchClient::new(config).context("creating http client")?;

    match cli.command {
        Command::Download { id } => {
            let dir = couch_fs::download(&client, &cli.path, &database, &id)
                .with_context(|| format!("downloading {}", id))?;
            tracing::info!("downloaded {} to {}", id, dir.display());
        }
        Command::Upload { id, ignore_rev } => {
            let receipt = couch_fs::upload(&client, &cli.path, &database, &id, ignore_rev)
                .with_context(|| format!("uploading {}", id))?;
            tracing::info!("uploaded {} at revision {}", receipt.id, receipt.rev);
        }
    }
    Ok(())
}

////////////////////////////////////////////////////////////////////////////////
