//! Extraction backend commands

use anyhow::Result;
use sift_core::ai::{ExtractionBackend, ExtractionClient};

pub async fn cmd_extract_health() -> Result<()> {
    match ExtractionClient::from_env() {
        Some(client) => {
            println!("🔎 Checking {} ({})...", client.model(), client.host());
            if client.health_check().await {
                println!("✅ Extraction backend is reachable");
            } else {
                println!("❌ Extraction backend is not responding");
            }
        }
        None => {
            println!("ℹ️  No extraction backend configured");
            println!("   Set OPENROUTER_API_KEY (or OLLAMA_HOST with EXTRACT_BACKEND=ollama)");
        }
    }

    Ok(())
}
