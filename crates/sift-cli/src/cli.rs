//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI
//! arguments. The actual command implementations are in the `commands`
//! module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Sift - Turn bank statement PDFs into a financial dashboard
#[derive(Parser)]
#[command(name = "sift")]
#[command(about = "Self-hosted bank statement extraction and dashboard", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "sift.db", global = true)]
    pub db: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable database encryption (not recommended for production)
    ///
    /// By default, the database is encrypted using SQLCipher.
    /// Set SIFT_DB_KEY environment variable with your passphrase.
    /// Use --no-encrypt only for development or testing.
    #[arg(long, global = true)]
    pub no_encrypt: bool,

    /// Owner identifier used for statement scoping
    #[arg(long, default_value = "local-dev", global = true)]
    pub owner: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Import a statement PDF
    Import {
        /// PDF file to import
        #[arg(short, long)]
        file: PathBuf,

        /// Display name (defaults to the file name)
        #[arg(short, long)]
        name: Option<String>,

        /// Run the extraction pipeline immediately after import
        #[arg(long)]
        process: bool,

        /// Skip insight generation when processing
        #[arg(long)]
        no_insights: bool,
    },

    /// Run the extraction pipeline on an uploaded statement
    Process {
        /// Statement ID
        id: i64,

        /// Skip insight generation
        #[arg(long)]
        no_insights: bool,
    },

    /// List statements with summary metrics
    List,

    /// Show full details for a statement
    Show {
        /// Statement ID
        id: i64,
    },

    /// Delete a statement and all derived data
    Delete {
        /// Statement ID
        id: i64,
    },

    /// Check the extraction backend
    Extract {
        #[command(subcommand)]
        action: ExtractAction,
    },

    /// Show database status (encryption, counts)
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
        /// WARNING: Do not use this flag when exposing the server to a
        /// network. By default, the server requires a proxy identity header
        /// or an API key.
        #[arg(long)]
        no_auth: bool,
    },
}

#[derive(Subcommand)]
pub enum ExtractAction {
    /// Check extraction backend connectivity
    Health,
}
