//! Statement metrics database operations

use rusqlite::{params, OptionalExtension};

use super::{parse_date, Database};
use crate::error::Result;
use crate::models::StatementMetrics;

impl Database {
    /// Metrics row for a statement, if processing has completed
    pub fn get_statement_metrics(&self, statement_id: i64) -> Result<Option<StatementMetrics>> {
        let conn = self.conn()?;
        let metrics = conn
            .query_row(
                r#"
                SELECT statement_id, total_deposits_minor, total_withdrawals_minor,
                       balance_minor, outstanding_loans, period_start, period_end
                FROM statement_metrics
                WHERE statement_id = ?
                "#,
                params![statement_id],
                |row| {
                    let period_start: Option<String> = row.get(5)?;
                    let period_end: Option<String> = row.get(6)?;

                    Ok(StatementMetrics {
                        statement_id: row.get(0)?,
                        total_deposits_minor: row.get(1)?,
                        total_withdrawals_minor: row.get(2)?,
                        balance_minor: row.get(3)?,
                        outstanding_loans: row.get(4)?,
                        period_start: period_start
                            .as_deref()
                            .map(|s| parse_date(5, s))
                            .transpose()?,
                        period_end: period_end
                            .as_deref()
                            .map(|s| parse_date(6, s))
                            .transpose()?,
                    })
                },
            )
            .optional()?;
        Ok(metrics)
    }
}
