//! Statement database operations

use rusqlite::{params, OptionalExtension, Row};
use sha2::{Digest, Sha256};
use tracing::debug;

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{
    NewInsight, NewLoan, NewTransaction, ProcessStage, Statement, StatementDetails,
    StatementMetrics, StatementSummary,
};
use crate::money;

/// SHA-256 of statement content, hex-encoded. Used for upload dedup.
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

fn row_to_statement(row: &Row) -> rusqlite::Result<Statement> {
    let stage: String = row.get(4)?;
    let stage: ProcessStage = stage.parse().map_err(|e: String| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, e.into())
    })?;
    let processed_at: Option<String> = row.get(5)?;
    let created_at: String = row.get(6)?;

    Ok(Statement {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        display_name: row.get(2)?,
        raw_content: row.get(3)?,
        process_stage: stage,
        processed_at: processed_at.as_deref().map(parse_datetime),
        created_at: parse_datetime(&created_at),
    })
}

const STATEMENT_COLUMNS: &str =
    "id, owner_id, display_name, raw_content, process_stage, processed_at, created_at";

impl Database {
    /// Create a statement row in the `uploaded` stage.
    ///
    /// Rejects content the owner has already uploaded (by SHA-256) with
    /// `Error::DuplicateDocument` so the upload endpoint can answer 409.
    pub fn create_statement(
        &self,
        owner_id: &str,
        display_name: Option<&str>,
        raw_content: &str,
    ) -> Result<i64> {
        let conn = self.conn()?;
        let hash = content_hash(raw_content);

        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM statements WHERE owner_id = ? AND content_hash = ?",
                params![owner_id, hash],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(existing_id) = existing {
            return Err(Error::DuplicateDocument { existing_id });
        }

        conn.execute(
            r#"
            INSERT INTO statements (owner_id, display_name, raw_content, content_hash, process_stage)
            VALUES (?, ?, ?, ?, 'uploaded')
            "#,
            params![owner_id, display_name, raw_content, hash],
        )?;

        let id = conn.last_insert_rowid();
        debug!(statement_id = id, owner = owner_id, "Created statement");
        Ok(id)
    }

    /// Get a statement by id, regardless of owner
    pub fn get_statement(&self, id: i64) -> Result<Option<Statement>> {
        let conn = self.conn()?;
        let statement = conn
            .query_row(
                &format!("SELECT {} FROM statements WHERE id = ?", STATEMENT_COLUMNS),
                params![id],
                row_to_statement,
            )
            .optional()?;
        Ok(statement)
    }

    /// Get a statement by id, scoped to its owner
    pub fn get_statement_for_owner(&self, id: i64, owner_id: &str) -> Result<Option<Statement>> {
        let conn = self.conn()?;
        let statement = conn
            .query_row(
                &format!(
                    "SELECT {} FROM statements WHERE id = ? AND owner_id = ?",
                    STATEMENT_COLUMNS
                ),
                params![id, owner_id],
                row_to_statement,
            )
            .optional()?;
        Ok(statement)
    }

    /// List an owner's statements joined with their metrics, newest first.
    /// Monetary fields are converted to decimal currency here, at the
    /// presentation boundary.
    pub fn list_statements(&self, owner_id: &str) -> Result<Vec<StatementSummary>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT s.id, s.display_name, s.process_stage, s.created_at,
                   m.total_deposits_minor, m.total_withdrawals_minor, m.balance_minor
            FROM statements s
            LEFT JOIN statement_metrics m ON m.statement_id = s.id
            WHERE s.owner_id = ?
            ORDER BY s.created_at DESC, s.id DESC
            "#,
        )?;

        let rows = stmt.query_map(params![owner_id], |row| {
            let stage: String = row.get(2)?;
            let stage: ProcessStage = stage.parse().map_err(|e: String| {
                rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, e.into())
            })?;
            let created_at: String = row.get(3)?;
            let deposits: Option<i64> = row.get(4)?;
            let withdrawals: Option<i64> = row.get(5)?;
            let balance: Option<i64> = row.get(6)?;

            Ok(StatementSummary {
                id: row.get(0)?,
                display_name: row.get(1)?,
                process_stage: stage,
                created_at: parse_datetime(&created_at),
                total_deposits: deposits.map(money::to_decimal),
                total_withdrawals: withdrawals.map(money::to_decimal),
                balance: balance.map(money::to_decimal),
            })
        })?;

        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    /// Full denormalized view of a statement, scoped to its owner.
    /// Returns None when the statement does not exist or belongs to
    /// someone else.
    pub fn get_statement_details(
        &self,
        id: i64,
        owner_id: &str,
    ) -> Result<Option<StatementDetails>> {
        let statement = match self.get_statement_for_owner(id, owner_id)? {
            Some(s) => s,
            None => return Ok(None),
        };

        Ok(Some(StatementDetails {
            id: statement.id,
            display_name: statement.display_name,
            process_stage: statement.process_stage,
            created_at: statement.created_at,
            processed_at: statement.processed_at,
            metrics: self.get_statement_metrics(id)?,
            transactions: self.list_statement_transactions(id)?,
            insights: self.list_statement_insights(id)?,
            loans: self.list_statement_loans(id)?,
        }))
    }

    /// Compare-and-swap stage transition.
    ///
    /// The UPDATE is keyed on the current stage, so exactly one of any
    /// number of concurrent callers wins; losers get `StageConflict`.
    /// Transitions outside the allowed-transition table are rejected
    /// before touching the database.
    pub fn transition_stage(&self, id: i64, from: ProcessStage, to: ProcessStage) -> Result<()> {
        if !from.can_transition_to(to) {
            return Err(Error::InvalidData(format!(
                "Illegal stage transition: {} -> {}",
                from, to
            )));
        }

        let conn = self.conn()?;
        let updated = if to == ProcessStage::Completed {
            conn.execute(
                r#"
                UPDATE statements
                SET process_stage = ?, processed_at = datetime('now')
                WHERE id = ? AND process_stage = ?
                "#,
                params![to.as_str(), id, from.as_str()],
            )?
        } else {
            conn.execute(
                "UPDATE statements SET process_stage = ? WHERE id = ? AND process_stage = ?",
                params![to.as_str(), id, from.as_str()],
            )?
        };

        if updated == 0 {
            let current = self
                .get_statement(id)?
                .ok_or_else(|| Error::NotFound(format!("Statement {}", id)))?;
            return Err(Error::StageConflict {
                expected: from,
                actual: current.process_stage,
            });
        }

        debug!(statement_id = id, from = %from, to = %to, "Stage transition");
        Ok(())
    }

    /// Write all derived rows for a statement in one transaction.
    ///
    /// Either every transaction, the metrics row, every loan, and every
    /// insight land together, or none of them do.
    pub fn persist_extraction(
        &self,
        statement_id: i64,
        transactions: &[NewTransaction],
        metrics: &StatementMetrics,
        loans: &[NewLoan],
        insights: &[NewInsight],
    ) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        {
            let mut insert_tx = tx.prepare(
                r#"
                INSERT INTO transactions (statement_id, date, description, amount_minor, kind)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )?;
            for t in transactions {
                insert_tx.execute(params![
                    statement_id,
                    t.date.format("%Y-%m-%d").to_string(),
                    t.description,
                    t.amount_minor,
                    t.kind.as_str(),
                ])?;
            }

            tx.execute(
                r#"
                INSERT INTO statement_metrics (
                    statement_id, total_deposits_minor, total_withdrawals_minor,
                    balance_minor, outstanding_loans, period_start, period_end
                ) VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
                params![
                    statement_id,
                    metrics.total_deposits_minor,
                    metrics.total_withdrawals_minor,
                    metrics.balance_minor,
                    metrics.outstanding_loans,
                    metrics.period_start.map(|d| d.format("%Y-%m-%d").to_string()),
                    metrics.period_end.map(|d| d.format("%Y-%m-%d").to_string()),
                ],
            )?;

            let mut insert_loan = tx.prepare(
                r#"
                INSERT INTO loans (statement_id, loan_type, amount_minor, interest_rate_bp, remaining_minor)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )?;
            for loan in loans {
                insert_loan.execute(params![
                    statement_id,
                    loan.loan_type,
                    loan.amount_minor,
                    loan.interest_rate_bp,
                    loan.remaining_minor,
                ])?;
            }

            let mut insert_insight = tx.prepare(
                "INSERT INTO statement_insights (statement_id, insight, category) VALUES (?, ?, ?)",
            )?;
            for insight in insights {
                insert_insight.execute(params![
                    statement_id,
                    insight.insight,
                    insight.category.as_str(),
                ])?;
            }
        }

        tx.commit()?;
        debug!(
            statement_id,
            transactions = transactions.len(),
            loans = loans.len(),
            insights = insights.len(),
            "Persisted extraction results"
        );
        Ok(())
    }

    /// Delete a statement and (via cascade) all of its derived rows.
    /// Returns false when no owned statement matched.
    pub fn delete_statement(&self, id: i64, owner_id: &str) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM statements WHERE id = ? AND owner_id = ?",
            params![id, owner_id],
        )?;
        Ok(deleted > 0)
    }
}
