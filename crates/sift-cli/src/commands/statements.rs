//! Statement commands (process, list, show, delete)

use std::path::Path;

use anyhow::{bail, Result};
use sift_core::ai::{ExtractionBackend, ExtractionClient};
use sift_core::money;
use sift_core::processor::{ProcessOptions, StatementProcessor};

use super::{open_db, truncate};

pub async fn cmd_process(
    db_path: &Path,
    id: i64,
    owner: &str,
    no_insights: bool,
    no_encrypt: bool,
) -> Result<()> {
    let db = open_db(db_path, no_encrypt)?;

    let Some(client) = ExtractionClient::from_env() else {
        bail!("No extraction backend configured. Set OPENROUTER_API_KEY or OLLAMA_HOST.");
    };

    println!(
        "🤖 Processing statement {} with {} ({})...",
        id,
        client.model(),
        client.host()
    );

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
    println!(
        "   Deposits: {:.2}  Withdrawals: {:.2}  Balance: {:.2}",
        money::to_decimal(outcome.metrics.total_deposits_minor),
        money::to_decimal(outcome.metrics.total_withdrawals_minor),
        money::to_decimal(outcome.metrics.balance_minor),
    );

    Ok(())
}

pub fn cmd_list(db_path: &Path, owner: &str, no_encrypt: bool) -> Result<()> {
    let db = open_db(db_path, no_encrypt)?;
    let statements = db.list_statements(owner)?;

    if statements.is_empty() {
        println!("No statements. Import one with: sift import --file statement.pdf");
        return Ok(());
    }

    println!(
        "{:<6} {:<12} {:<28} {:>12} {:>12} {:>12}",
        "ID", "STAGE", "NAME", "DEPOSITS", "WITHDRAWALS", "BALANCE"
    );
    for s in statements {
        let fmt_opt = |v: Option<f64>| match v {
            Some(v) => format!("{:.2}", v),
            None => "-".to_string(),
        };
        println!(
            "{:<6} {:<12} {:<28} {:>12} {:>12} {:>12}",
            s.id,
            s.process_stage.to_string(),
            truncate(s.display_name.as_deref().unwrap_or("(unnamed)"), 28),
            fmt_opt(s.total_deposits),
            fmt_opt(s.total_withdrawals),
            fmt_opt(s.balance),
        );
    }

    Ok(())
}

pub fn cmd_show(db_path: &Path, id: i64, owner: &str, no_encrypt: bool) -> Result<()> {
    let db = open_db(db_path, no_encrypt)?;

    let Some(details) = db.get_statement_details(id, owner)? else {
        bail!("Statement {} not found", id);
    };

    println!(
        "📄 Statement {} ({})",
        details.id,
        details.display_name.as_deref().unwrap_or("unnamed")
    );
    println!("   Stage: {}", details.process_stage);
    println!("   Uploaded: {}", details.created_at.format("%Y-%m-%d %H:%M"));
    if let Some(processed) = details.processed_at {
        println!("   Processed: {}", processed.format("%Y-%m-%d %H:%M"));
    }

    if let Some(metrics) = &details.metrics {
        println!();
        println!(
            "   Deposits: {:.2}  Withdrawals: {:.2}  Balance: {:.2}",
            money::to_decimal(metrics.total_deposits_minor),
            money::to_decimal(metrics.total_withdrawals_minor),
            money::to_decimal(metrics.balance_minor),
        );
        match (metrics.period_start, metrics.period_end) {
            (Some(start), Some(end)) => println!("   Period: {} to {}", start, end),
            _ => println!("   Period: (no transactions)"),
        }
        if metrics.outstanding_loans > 0 {
            println!("   Outstanding loans: {}", metrics.outstanding_loans);
        }
    }

    if !details.transactions.is_empty() {
        println!();
        println!("   {:<12} {:<40} {:>12}", "DATE", "DESCRIPTION", "AMOUNT");
        for tx in &details.transactions {
            println!(
                "   {:<12} {:<40} {:>12.2}",
                tx.date.to_string(),
                truncate(&tx.description, 40),
                money::to_decimal(tx.amount_minor),
            );
        }
    }

    if !details.loans.is_empty() {
        println!();
        println!("   Loans:");
        for loan in &details.loans {
            println!(
                "   - {} {:.2} at {:.2}% ({:.2} remaining)",
                loan.loan_type,
                money::to_decimal(loan.amount_minor),
                loan.interest_rate_bp as f64 / 100.0,
                money::to_decimal(loan.remaining_minor),
            );
        }
    }

    if !details.insights.is_empty() {
        println!();
        println!("   Insights:");
        for insight in &details.insights {
            println!("   [{}] {}", insight.category, insight.insight);
        }
    }

    Ok(())
}

pub fn cmd_delete(db_path: &Path, id: i64, owner: &str, no_encrypt: bool) -> Result<()> {
    let db = open_db(db_path, no_encrypt)?;

    if db.delete_statement(id, owner)? {
        db.log_audit(owner, "delete", Some("statement"), Some(id), None)?;
        println!("🗑️  Statement {} deleted", id);
        Ok(())
    } else {
        bail!("Statement {} not found", id);
    }
}
