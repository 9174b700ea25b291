//! Statement processing pipeline
//!
//! Drives a statement from `uploaded` to `completed`: claims it with a
//! compare-and-set stage transition, calls the extraction backend, normalizes
//! amounts to minor units, derives summary metrics, generates insights, and
//! persists everything in one database transaction. Any failure moves the
//! statement to `failed` and leaves no derived rows behind.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::ai::{ExtractedLoan, ExtractedTransaction, ExtractionBackend, ExtractionClient};
use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{
    NewInsight, NewLoan, NewTransaction, ProcessStage, StatementMetrics, TransactionKind,
};
use crate::money;

/// Pipeline options
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    /// Run the second model call that generates insights
    pub generate_insights: bool,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            generate_insights: true,
        }
    }
}

/// Result of a completed pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct ProcessOutcome {
    pub statement_id: i64,
    pub transaction_count: usize,
    pub insight_count: usize,
    pub loan_count: usize,
    pub metrics: StatementMetrics,
}

/// Runs the extraction pipeline for uploaded statements
#[derive(Clone)]
pub struct StatementProcessor {
    db: Database,
    client: ExtractionClient,
    options: ProcessOptions,
}

impl StatementProcessor {
    pub fn new(db: Database, client: ExtractionClient) -> Self {
        Self {
            db,
            client,
            options: ProcessOptions::default(),
        }
    }

    pub fn with_options(db: Database, client: ExtractionClient, options: ProcessOptions) -> Self {
        Self {
            db,
            client,
            options,
        }
    }

    /// Process one statement owned by `owner_id`.
    ///
    /// Returns `Error::NotFound` if the statement does not exist for this
    /// owner and `Error::StageConflict` if it is not in the `uploaded`
    /// stage (already processing, completed, or failed).
    pub async fn process(&self, statement_id: i64, owner_id: &str) -> Result<ProcessOutcome> {
        let statement = self
            .db
            .get_statement_for_owner(statement_id, owner_id)?
            .ok_or_else(|| Error::NotFound(format!("Statement {} not found", statement_id)))?;

        // Claim the statement. A concurrent processor loses the CAS here.
        self.db
            .transition_stage(statement_id, ProcessStage::Uploaded, ProcessStage::Processing)?;

        info!(
            statement_id,
            model = self.client.model(),
            host = self.client.host(),
            "Processing statement"
        );

        match self.run_pipeline(statement_id, &statement.raw_content).await {
            Ok(outcome) => {
                self.db.transition_stage(
                    statement_id,
                    ProcessStage::Processing,
                    ProcessStage::Completed,
                )?;
                info!(
                    statement_id,
                    transactions = outcome.transaction_count,
                    insights = outcome.insight_count,
                    "Statement processed"
                );
                Ok(outcome)
            }
            Err(e) => {
                error!(statement_id, error = %e, "Statement processing failed");
                if let Err(te) = self.db.transition_stage(
                    statement_id,
                    ProcessStage::Processing,
                    ProcessStage::Failed,
                ) {
                    error!(statement_id, error = %te, "Failed to mark statement as failed");
                }
                Err(e)
            }
        }
    }

    async fn run_pipeline(&self, statement_id: i64, raw_content: &str) -> Result<ProcessOutcome> {
        let extracted = self.client.extract_statement(raw_content).await?;

        let transactions = normalize_transactions(&extracted.transactions)?;
        let totals = money::derive_totals(&transactions);

        // Trust our own arithmetic over the model's reported totals
        let reported_balance = money::to_minor_units(extracted.metrics.balance);
        if reported_balance != totals.balance_minor {
            warn!(
                statement_id,
                reported = reported_balance,
                derived = totals.balance_minor,
                "Extractor-reported balance disagrees with derived balance"
            );
        }

        let period = money::period_range(&transactions);
        let metrics = StatementMetrics {
            statement_id,
            total_deposits_minor: totals.total_deposits_minor,
            total_withdrawals_minor: totals.total_withdrawals_minor,
            balance_minor: totals.balance_minor,
            outstanding_loans: extracted.metrics.outstanding_loans,
            period_start: period.map(|(start, _)| start),
            period_end: period.map(|(_, end)| end),
        };

        let loans = normalize_loans(&extracted.loans);

        let insights = if self.options.generate_insights {
            self.client
                .generate_insights(&extracted)
                .await?
                .into_iter()
                .map(|i| NewInsight {
                    insight: i.insight,
                    category: i.category,
                })
                .collect()
        } else {
            Vec::new()
        };

        self.db
            .persist_extraction(statement_id, &transactions, &metrics, &loans, &insights)?;

        Ok(ProcessOutcome {
            statement_id,
            transaction_count: transactions.len(),
            insight_count: insights.len(),
            loan_count: loans.len(),
            metrics,
        })
    }
}

/// Normalize extracted transactions: validate amounts, parse dates, convert
/// to minor units, and derive the kind from the sign.
fn normalize_transactions(extracted: &[ExtractedTransaction]) -> Result<Vec<NewTransaction>> {
    extracted
        .iter()
        .map(|tx| {
            if !tx.amount.is_finite() {
                return Err(Error::Extraction(format!(
                    "Non-finite amount for transaction '{}'",
                    tx.description
                )));
            }
            let date: NaiveDate = tx.date.parse().map_err(|_| {
                Error::Extraction(format!(
                    "Unparseable date '{}' for transaction '{}'",
                    tx.date, tx.description
                ))
            })?;
            let amount_minor = money::to_minor_units(tx.amount);
            Ok(NewTransaction {
                date,
                description: tx.description.clone(),
                amount_minor,
                kind: TransactionKind::from_amount_minor(amount_minor),
            })
        })
        .collect()
}

/// Normalize extracted loans. Interest rates become basis points.
fn normalize_loans(extracted: &[ExtractedLoan]) -> Vec<NewLoan> {
    extracted
        .iter()
        .map(|loan| NewLoan {
            loan_type: loan.loan_type.clone(),
            amount_minor: money::to_minor_units(loan.amount),
            interest_rate_bp: (loan.interest_rate * 100.0).round() as i64,
            remaining_minor: money::to_minor_units(loan.remaining_balance),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{ExtractedMetrics, ExtractedStatement, MockBackend};

    fn processor_with(db: &Database, backend: MockBackend) -> StatementProcessor {
        StatementProcessor::new(db.clone(), ExtractionClient::Mock(backend))
    }

    fn upload(db: &Database) -> i64 {
        db.create_statement("alice@example.com", Some("January"), "statement text")
            .unwrap()
    }

    #[tokio::test]
    async fn happy_path_completes_statement() {
        let db = Database::in_memory().unwrap();
        let id = upload(&db);
        let processor = processor_with(&db, MockBackend::new());

        let outcome = processor.process(id, "alice@example.com").await.unwrap();
        assert_eq!(outcome.transaction_count, 2);
        assert_eq!(outcome.insight_count, 2);
        // 1250.00 deposited, 85.25 withdrawn
        assert_eq!(outcome.metrics.total_deposits_minor, 125_000);
        assert_eq!(outcome.metrics.total_withdrawals_minor, 8_525);
        assert_eq!(outcome.metrics.balance_minor, 116_475);

        let statement = db.get_statement(id).unwrap().unwrap();
        assert_eq!(statement.process_stage, ProcessStage::Completed);
        assert!(statement.processed_at.is_some());

        let transactions = db.list_statement_transactions(id).unwrap();
        assert_eq!(transactions.len(), 2);
        for tx in &transactions {
            assert_eq!(tx.kind, TransactionKind::from_amount_minor(tx.amount_minor));
        }
    }

    #[tokio::test]
    async fn extraction_failure_marks_failed_without_rows() {
        let db = Database::in_memory().unwrap();
        let id = upload(&db);
        let processor = processor_with(&db, MockBackend::failing_extraction());

        let err = processor.process(id, "alice@example.com").await.unwrap_err();
        assert!(matches!(err, Error::Extraction(_)));

        let statement = db.get_statement(id).unwrap().unwrap();
        assert_eq!(statement.process_stage, ProcessStage::Failed);
        assert_eq!(db.count_statement_transactions(id).unwrap(), 0);
        assert!(db.get_statement_metrics(id).unwrap().is_none());
    }

    #[tokio::test]
    async fn insight_failure_marks_failed_without_rows() {
        let db = Database::in_memory().unwrap();
        let id = upload(&db);
        let processor = processor_with(&db, MockBackend::failing_insights());

        assert!(processor.process(id, "alice@example.com").await.is_err());

        let statement = db.get_statement(id).unwrap().unwrap();
        assert_eq!(statement.process_stage, ProcessStage::Failed);
        // The extraction succeeded but nothing may be persisted
        assert_eq!(db.count_statement_transactions(id).unwrap(), 0);
    }

    #[tokio::test]
    async fn insights_can_be_skipped() {
        let db = Database::in_memory().unwrap();
        let id = upload(&db);
        let processor = StatementProcessor::with_options(
            db.clone(),
            ExtractionClient::Mock(MockBackend::failing_insights()),
            ProcessOptions {
                generate_insights: false,
            },
        );

        // The failing insight backend is never called
        let outcome = processor.process(id, "alice@example.com").await.unwrap();
        assert_eq!(outcome.insight_count, 0);
        assert!(db.list_statement_insights(id).unwrap().is_empty());
    }

    #[tokio::test]
    async fn second_process_attempt_conflicts() {
        let db = Database::in_memory().unwrap();
        let id = upload(&db);
        let processor = processor_with(&db, MockBackend::new());

        processor.process(id, "alice@example.com").await.unwrap();

        let err = processor.process(id, "alice@example.com").await.unwrap_err();
        match err {
            Error::StageConflict { actual, .. } => {
                assert_eq!(actual, ProcessStage::Completed);
            }
            other => panic!("expected StageConflict, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn failed_statement_is_terminal() {
        let db = Database::in_memory().unwrap();
        let id = upload(&db);

        let failing = processor_with(&db, MockBackend::failing_extraction());
        assert!(failing.process(id, "alice@example.com").await.is_err());

        // A retry with a working backend still conflicts
        let working = processor_with(&db, MockBackend::new());
        let err = working.process(id, "alice@example.com").await.unwrap_err();
        assert!(matches!(err, Error::StageConflict { .. }));
    }

    #[tokio::test]
    async fn wrong_owner_is_not_found() {
        let db = Database::in_memory().unwrap();
        let id = upload(&db);
        let processor = processor_with(&db, MockBackend::new());

        let err = processor.process(id, "mallory@example.com").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));

        // Statement untouched
        let statement = db.get_statement(id).unwrap().unwrap();
        assert_eq!(statement.process_stage, ProcessStage::Uploaded);
    }

    #[tokio::test]
    async fn empty_extraction_persists_null_period() {
        let db = Database::in_memory().unwrap();
        let id = upload(&db);
        let empty = ExtractedStatement {
            transactions: vec![],
            metrics: ExtractedMetrics {
                total_deposits: 0.0,
                total_withdrawals: 0.0,
                balance: 0.0,
                outstanding_loans: 0,
            },
            loans: vec![],
        };
        let processor = processor_with(&db, MockBackend::with_statement(empty));

        let outcome = processor.process(id, "alice@example.com").await.unwrap();
        assert_eq!(outcome.transaction_count, 0);
        assert!(outcome.metrics.period_start.is_none());
        assert!(outcome.metrics.period_end.is_none());
        assert_eq!(outcome.metrics.balance_minor, 0);
    }

    #[tokio::test]
    async fn bad_extracted_date_fails_pipeline() {
        let db = Database::in_memory().unwrap();
        let id = upload(&db);
        let bad = ExtractedStatement {
            transactions: vec![ExtractedTransaction {
                date: "01/05/2024".into(),
                description: "PAYROLL".into(),
                amount: 50.0,
            }],
            metrics: ExtractedMetrics {
                total_deposits: 50.0,
                total_withdrawals: 0.0,
                balance: 50.0,
                outstanding_loans: 0,
            },
            loans: vec![],
        };
        let processor = processor_with(&db, MockBackend::with_statement(bad));

        let err = processor.process(id, "alice@example.com").await.unwrap_err();
        assert!(matches!(err, Error::Extraction(_)));
        assert_eq!(
            db.get_statement(id).unwrap().unwrap().process_stage,
            ProcessStage::Failed
        );
    }

    #[test]
    fn loan_normalization_uses_basis_points() {
        let loans = vec![ExtractedLoan {
            loan_type: "auto".into(),
            amount: 15000.0,
            interest_rate: 5.49,
            remaining_balance: 9000.0,
        }];
        let normalized = normalize_loans(&loans);
        assert_eq!(normalized[0].amount_minor, 1_500_000);
        assert_eq!(normalized[0].interest_rate_bp, 549);
        assert_eq!(normalized[0].remaining_minor, 900_000);
    }

    #[test]
    fn zero_amount_is_a_deposit() {
        let txs = vec![ExtractedTransaction {
            date: "2024-01-05".into(),
            description: "ADJUSTMENT".into(),
            amount: 0.0,
        }];
        let normalized = normalize_transactions(&txs).unwrap();
        assert_eq!(normalized[0].kind, TransactionKind::Deposit);
    }
}
