//! Statement PDF import command

use std::path::Path;

use anyhow::{bail, Context, Result};
use sift_core::ai::{ExtractionBackend, ExtractionClient};
use sift_core::pdf;
use sift_core::processor::{ProcessOptions, StatementProcessor};

use super::open_db;

#[allow(clippy::too_many_arguments)]
pub async fn cmd_import(
    db_path: &Path,
    file: &Path,
    name: Option<&str>,
    owner: &str,
    process: bool,
    no_insights: bool,
    no_encrypt: bool,
) -> Result<()> {
    println!("📄 Importing {}...", file.display());

    let bytes = std::fs::read(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    if !pdf::is_pdf(&bytes) {
        bail!("{} is not a PDF file", file.display());
    }

    let text = pdf::extract_statement_text(&bytes)?;

    let display_name = name
        .map(|s| s.to_string())
        .or_else(|| {
            file.file_name()
                .map(|f| f.to_string_lossy().into_owned())
        });

    let db = open_db(db_path, no_encrypt)?;
    let id = db.create_statement(owner, display_name.as_deref(), &text)?;

    db.log_audit(
        owner,
        "upload",
        Some("statement"),
        Some(id),
        Some(&format!("chars={}", text.len())),
    )?;

    println!("   Statement {} created ({} characters)", id, text.len());

    if !process {
        println!("✅ Imported. Run `sift process {}` to extract data.", id);
        return Ok(());
    }

    let Some(client) = ExtractionClient::from_env() else {
        bail!(
            "No extraction backend configured. Set OPENROUTER_API_KEY or OLLAMA_HOST, \
            or re-run without --process."
        );
    };

    println!("🤖 Extracting with {} ({})...", client.model(), client.host());

    let processor = StatementProcessor::with_options(
        db,
        client,
        ProcessOptions {
            generate_insights: !no_insights,
        },
    );
    let outcome = processor.process(id, owner).await?;

    println!(
        "✅ Processed: {} transactions, {} insights, {} loans",
        outcome.transaction_count, outcome.insight_count, outcome.loan_count
    );

    Ok(())
}
