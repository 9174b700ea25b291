//! CLI command tests

use clap::Parser;
use tempfile::TempDir;

use sift_core::db::Database;

use crate::cli::{Cli, Commands};
use crate::commands::{self, truncate};

fn temp_db_path(dir: &TempDir) -> std::path::PathBuf {
    dir.path().join("test.db")
}

// ========== Argument Parsing Tests ==========

#[test]
fn test_parse_init() {
    let cli = Cli::try_parse_from(["sift", "init"]).unwrap();
    assert!(matches!(cli.command, Commands::Init));
    assert_eq!(cli.owner, "local-dev");
    assert!(!cli.no_encrypt);
}

#[test]
fn test_parse_import_with_flags() {
    let cli = Cli::try_parse_from([
        "sift",
        "--owner",
        "alice@example.com",
        "import",
        "--file",
        "jan.pdf",
        "--name",
        "January",
        "--process",
        "--no-insights",
    ])
    .unwrap();

    assert_eq!(cli.owner, "alice@example.com");
    match cli.command {
        Commands::Import {
            file,
            name,
            process,
            no_insights,
        } => {
            assert_eq!(file.to_str(), Some("jan.pdf"));
            assert_eq!(name.as_deref(), Some("January"));
            assert!(process);
            assert!(no_insights);
        }
        _ => panic!("expected import command"),
    }
}

#[test]
fn test_parse_serve_defaults() {
    let cli = Cli::try_parse_from(["sift", "serve"]).unwrap();
    match cli.command {
        Commands::Serve {
            port,
            host,
            no_auth,
        } => {
            assert_eq!(port, 3000);
            assert_eq!(host, "127.0.0.1");
            assert!(!no_auth);
        }
        _ => panic!("expected serve command"),
    }
}

#[test]
fn test_parse_import_requires_file() {
    assert!(Cli::try_parse_from(["sift", "import"]).is_err());
}

// ========== Command Tests ==========

#[test]
fn test_cmd_init_creates_database() {
    let dir = TempDir::new().unwrap();
    let path = temp_db_path(&dir);

    commands::cmd_init(&path, true).unwrap();
    assert!(path.exists());
}

#[test]
fn test_cmd_list_empty() {
    let dir = TempDir::new().unwrap();
    let path = temp_db_path(&dir);
    commands::cmd_init(&path, true).unwrap();

    let result = commands::cmd_list(&path, "local-dev", true);
    assert!(result.is_ok());
}

#[test]
fn test_cmd_show_and_delete() {
    let dir = TempDir::new().unwrap();
    let path = temp_db_path(&dir);

    let db = Database::new_unencrypted(path.to_str().unwrap()).unwrap();
    let id = db
        .create_statement("local-dev", Some("January"), "statement text")
        .unwrap();
    drop(db);

    commands::cmd_show(&path, id, "local-dev", true).unwrap();
    commands::cmd_delete(&path, id, "local-dev", true).unwrap();

    // Gone now
    assert!(commands::cmd_show(&path, id, "local-dev", true).is_err());
    assert!(commands::cmd_delete(&path, id, "local-dev", true).is_err());
}

#[test]
fn test_cmd_show_respects_owner() {
    let dir = TempDir::new().unwrap();
    let path = temp_db_path(&dir);

    let db = Database::new_unencrypted(path.to_str().unwrap()).unwrap();
    let id = db
        .create_statement("alice@example.com", None, "statement text")
        .unwrap();
    drop(db);

    assert!(commands::cmd_show(&path, id, "alice@example.com", true).is_ok());
    assert!(commands::cmd_show(&path, id, "mallory@example.com", true).is_err());
}

#[tokio::test]
async fn test_cmd_import_rejects_non_pdf() {
    let dir = TempDir::new().unwrap();
    let path = temp_db_path(&dir);

    let not_pdf = dir.path().join("notes.txt");
    std::fs::write(&not_pdf, "plain text").unwrap();

    let result = commands::cmd_import(
        &path,
        &not_pdf,
        None,
        "local-dev",
        false,
        false,
        true,
    )
    .await;
    assert!(result.is_err());
}

#[test]
fn test_cmd_status() {
    let dir = TempDir::new().unwrap();
    let path = temp_db_path(&dir);
    commands::cmd_init(&path, true).unwrap();

    let result = commands::cmd_status(&path, "local-dev", true);
    assert!(result.is_ok());
}

// ========== Utility Tests ==========

#[test]
fn test_truncate() {
    assert_eq!(truncate("short", 10), "short");
    assert_eq!(truncate("exactly-10", 10), "exactly-10");
    assert_eq!(truncate("this is too long", 10), "this is...");
}

#[test]
fn test_truncate_multibyte() {
    // Counts chars, never splits a multibyte character
    assert_eq!(truncate("übersicht", 9), "übersicht");
    assert_eq!(truncate("überweisung januar", 10), "überwei...");
    assert_eq!(truncate("日本語の明細書です", 6), "日本語...");
}
