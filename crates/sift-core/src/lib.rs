//! Sift Core Library
//!
//! Shared functionality for the Sift statement dashboard:
//! - Database access and migrations (encrypted SQLite)
//! - PDF text extraction and upload validation
//! - Pluggable extraction backends (OpenRouter, Ollama)
//! - Minor-unit money handling and metric derivation
//! - The statement processing pipeline

pub mod ai;
pub mod db;
pub mod error;
pub mod models;
pub mod money;
pub mod pdf;
pub mod processor;

pub use ai::{
    ExtractedInsight, ExtractedLoan, ExtractedMetrics, ExtractedStatement, ExtractedTransaction,
    ExtractionBackend, ExtractionClient, MockBackend, OllamaBackend, OpenRouterBackend,
};
pub use db::{AuditEntry, Database};
pub use error::{Error, Result};
pub use models::{
    InsightCategory, Loan, ProcessStage, Statement, StatementDetails, StatementInsight,
    StatementMetrics, StatementSummary, StatementTransaction, TransactionKind,
};
pub use processor::{ProcessOptions, ProcessOutcome, StatementProcessor};
