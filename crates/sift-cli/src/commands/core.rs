//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_db` - Shared utility to open the database
//! - `cmd_init` - Initialize the database
//! - `cmd_status` - Show database status

use std::path::Path;

use anyhow::{Context, Result};
use sift_core::db::Database;
use sift_core::models::ProcessStage;

/// Open database with encryption by default, or unencrypted if --no-encrypt
pub fn open_db(db_path: &Path, no_encrypt: bool) -> Result<Database> {
    let path_str = db_path.to_str().context("Database path is not UTF-8")?;
    if no_encrypt {
        Database::new_unencrypted(path_str).context("Failed to open database (unencrypted)")
    } else {
        Database::new(path_str).context("Failed to open database")
    }
}

pub fn cmd_init(db_path: &Path, no_encrypt: bool) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    let _db = open_db(db_path, no_encrypt)?;

    if no_encrypt {
        println!("   ⚠️  Encryption: DISABLED (--no-encrypt)");
    } else {
        println!("   🔒 Encryption: ENABLED");
    }

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Import a statement: sift import --file statement.pdf --process");
    println!("  2. Start the web server: sift serve");

    Ok(())
}

pub fn cmd_status(db_path: &Path, owner: &str, no_encrypt: bool) -> Result<()> {
    let db = open_db(db_path, no_encrypt)?;

    println!("📊 Database status");
    println!("   Path: {}", db.path());
    println!(
        "   Encryption: {}",
        if db.is_encrypted()? {
            "enabled"
        } else {
            "disabled"
        }
    );

    let statements = db.list_statements(owner)?;
    let completed = statements
        .iter()
        .filter(|s| s.process_stage == ProcessStage::Completed)
        .count();
    let failed = statements
        .iter()
        .filter(|s| s.process_stage == ProcessStage::Failed)
        .count();

    println!("   Statements ({}): {}", owner, statements.len());
    println!("     completed: {}", completed);
    println!("     failed: {}", failed);
    println!(
        "     pending: {}",
        statements.len() - completed - failed
    );

    Ok(())
}
