//! Sitebook CLI - Construction company back-office ledger
//!
//! Usage:
//!   sitebook init                              Initialize database
//!   sitebook import --file F --kind purchases  Import an RRA CSV export
//!   sitebook report --from 2024-01-01          Print the tax summary
//!   sitebook serve --port 3000                 Start web server

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db, cli.no_encrypt),
        Commands::Import { file, kind } => {
            commands::cmd_import(&cli.db, &file, kind, cli.no_encrypt)
        }
        Commands::Report { from, to } => {
            commands::cmd_report(&cli.db, from.as_deref(), to.as_deref(), cli.no_encrypt)
        }
        Commands::Export { kind, output } => {
            commands::cmd_export(&cli.db, kind, &output, cli.no_encrypt)
        }
        Commands::Status => commands::cmd_status(&cli.db, cli.no_encrypt),
        Commands::Serve {
            port,
            host,
            no_auth,
            static_dir,
        } => {
            commands::cmd_serve(
                &cli.db,
                &host,
                port,
                no_auth,
                cli.no_encrypt,
                static_dir.as_deref(),
            )
            .await
        }
    }
}
