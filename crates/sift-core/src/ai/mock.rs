//! Mock backend for testing
//!
//! Returns canned extraction results without network access. Failure modes
//! are scriptable so processor and server tests can exercise error paths.

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::models::InsightCategory;

use super::types::{
    ExtractedInsight, ExtractedMetrics, ExtractedStatement, ExtractedTransaction,
};
use super::ExtractionBackend;

/// Mock extraction backend
#[derive(Clone)]
pub struct MockBackend {
    healthy: bool,
    fail_extraction: bool,
    fail_insights: bool,
    statement: Option<ExtractedStatement>,
}

impl MockBackend {
    /// Create a healthy mock returning the canned extraction
    pub fn new() -> Self {
        Self {
            healthy: true,
            fail_extraction: false,
            fail_insights: false,
            statement: None,
        }
    }

    /// Mock that reports unhealthy
    pub fn unhealthy() -> Self {
        Self {
            healthy: false,
            ..Self::new()
        }
    }

    /// Mock whose extraction call fails
    pub fn failing_extraction() -> Self {
        Self {
            fail_extraction: true,
            ..Self::new()
        }
    }

    /// Mock whose insight call fails
    pub fn failing_insights() -> Self {
        Self {
            fail_insights: true,
            ..Self::new()
        }
    }

    /// Mock returning a specific extraction result
    pub fn with_statement(statement: ExtractedStatement) -> Self {
        Self {
            statement: Some(statement),
            ..Self::new()
        }
    }

    fn canned_statement() -> ExtractedStatement {
        ExtractedStatement {
            transactions: vec![
                ExtractedTransaction {
                    date: "2024-01-05".into(),
                    description: "PAYROLL ACME CORP".into(),
                    amount: 1250.00,
                },
                ExtractedTransaction {
                    date: "2024-01-08".into(),
                    description: "GROCERY MART #42".into(),
                    amount: -85.25,
                },
            ],
            metrics: ExtractedMetrics {
                total_deposits: 1250.00,
                total_withdrawals: 85.25,
                balance: 1164.75,
                outstanding_loans: 0,
            },
            loans: vec![],
        }
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExtractionBackend for MockBackend {
    async fn extract_statement(&self, _statement_text: &str) -> Result<ExtractedStatement> {
        if self.fail_extraction {
            return Err(Error::Extraction("Mock extraction failure".into()));
        }
        Ok(self
            .statement
            .clone()
            .unwrap_or_else(Self::canned_statement))
    }

    async fn generate_insights(
        &self,
        extraction: &ExtractedStatement,
    ) -> Result<Vec<ExtractedInsight>> {
        if self.fail_insights {
            return Err(Error::Extraction("Mock insight failure".into()));
        }
        Ok(vec![
            ExtractedInsight {
                category: InsightCategory::Stability,
                insight: "Income arrives on a regular schedule".into(),
            },
            ExtractedInsight {
                category: InsightCategory::Ratio,
                insight: format!(
                    "Deposits of {:.2} against withdrawals of {:.2}",
                    extraction.metrics.total_deposits, extraction.metrics.total_withdrawals
                ),
            },
        ])
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}
