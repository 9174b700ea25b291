//! Typed payloads exchanged with the extraction service
//!
//! These mirror the JSON schema the prompts ask the model to produce.
//! Everything arriving from the service is untrusted until it has passed
//! through `parsing`.

use serde::{Deserialize, Serialize};

use crate::models::InsightCategory;

/// One transaction as reported by the extraction model.
/// Amounts are decimal currency: positive for deposits, negative for
/// withdrawals. Normalization to minor units happens in the processor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedTransaction {
    pub date: String,
    pub description: String,
    pub amount: f64,
}

/// Summary metrics as reported by the extraction model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedMetrics {
    #[serde(rename = "totalDeposits")]
    pub total_deposits: f64,
    #[serde(rename = "totalWithdrawals")]
    pub total_withdrawals: f64,
    pub balance: f64,
    #[serde(rename = "outstandingLoans", default)]
    pub outstanding_loans: i64,
}

/// A loan spotted on the statement (best-effort)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedLoan {
    #[serde(rename = "type")]
    pub loan_type: String,
    pub amount: f64,
    /// Annual percentage rate, e.g. 5.49
    #[serde(rename = "interestRate", default)]
    pub interest_rate: f64,
    #[serde(rename = "remainingBalance", default)]
    pub remaining_balance: f64,
}

/// Full structured-extraction result for one statement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedStatement {
    pub transactions: Vec<ExtractedTransaction>,
    pub metrics: ExtractedMetrics,
    #[serde(default)]
    pub loans: Vec<ExtractedLoan>,
}

/// One generated insight
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedInsight {
    pub category: InsightCategory,
    pub insight: String,
}
