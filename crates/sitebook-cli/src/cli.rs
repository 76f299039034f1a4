//! CLI argument definitions using clap
//!
//! This module contains the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Sitebook - Construction company back-office ledger
#[derive(Parser)]
#[command(name = "sitebook")]
#[command(about = "Self-hosted construction ledger and tax tracker", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "sitebook.db", global = true)]
    pub db: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable database encryption (not recommended for production)
    ///
    /// By default, the database is encrypted using SQLCipher.
    /// Set SITEBOOK_DB_KEY environment variable with your passphrase.
    /// Use --no-encrypt only for development or testing.
    #[arg(long, global = true)]
    pub no_encrypt: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Which RRA export a CSV file holds
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ImportKindArg {
    Purchases,
    Sales,
}

/// What to export
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ExportKindArg {
    Purchases,
    Sales,
    Expenses,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Import an RRA CSV export (reconciles against existing records)
    Import {
        /// CSV file to import
        #[arg(short, long)]
        file: PathBuf,

        /// Which export the file holds
        #[arg(short, long, value_enum)]
        kind: ImportKindArg,
    },

    /// Print the tax summary (VAT position and withholding) for a window
    Report {
        /// Start date (YYYY-MM-DD, inclusive)
        #[arg(long)]
        from: Option<String>,

        /// End date (YYYY-MM-DD, inclusive)
        #[arg(long)]
        to: Option<String>,
    },

    /// Export records to a CSV file
    Export {
        /// What to export
        #[arg(short, long, value_enum)]
        kind: ExportKindArg,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Show database status (encryption, size, record counts)
    Status,

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Disable authentication (for local development only)
        ///
        /// WARNING: Do not use this flag when exposing the server to a network.
        /// By default, the server requires Cloudflare Access authentication headers.
        #[arg(long)]
        no_auth: bool,

        /// Directory containing static files to serve (e.g., ui/dist)
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },
}
