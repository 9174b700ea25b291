//! Sift CLI - Bank statement extraction and dashboard
//!
//! Usage:
//!   sift init                          Initialize database
//!   sift import --file s.pdf --process Import and extract a statement
//!   sift list                          List statements
//!   sift serve --port 3000             Start web server

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
        Commands::Import {
            file,
            name,
            process,
            no_insights,
        } => {
            commands::cmd_import(
                &cli.db,
                &file,
                name.as_deref(),
                &cli.owner,
                process,
                no_insights,
                cli.no_encrypt,
            )
            .await
        }
        Commands::Process { id, no_insights } => {
            commands::cmd_process(&cli.db, id, &cli.owner, no_insights, cli.no_encrypt).await
        }
        Commands::List => commands::cmd_list(&cli.db, &cli.owner, cli.no_encrypt),
        Commands::Show { id } => commands::cmd_show(&cli.db, id, &cli.owner, cli.no_encrypt),
        Commands::Delete { id } => commands::cmd_delete(&cli.db, id, &cli.owner, cli.no_encrypt),
        Commands::Extract { action } => match action {
            ExtractAction::Health => commands::cmd_extract_health().await,
        },
        Commands::Status => commands::cmd_status(&cli.db, &cli.owner, cli.no_encrypt),
        Commands::Serve {
            port,
            host,
            no_auth,
        } => commands::cmd_serve(&cli.db, &host, port, no_auth, cli.no_encrypt).await,
    }
}
