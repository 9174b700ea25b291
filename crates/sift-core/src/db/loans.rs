//! Loan database operations

use rusqlite::params;

use super::Database;
use crate::error::Result;
use crate::models::Loan;

impl Database {
    /// Loans detected on a statement
    pub fn list_statement_loans(&self, statement_id: i64) -> Result<Vec<Loan>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, statement_id, loan_type, amount_minor, interest_rate_bp, remaining_minor
            FROM loans
            WHERE statement_id = ?
            ORDER BY id
            "#,
        )?;

        let rows = stmt.query_map(params![statement_id], |row| {
            Ok(Loan {
                id: row.get(0)?,
                statement_id: row.get(1)?,
                loan_type: row.get(2)?,
                amount_minor: row.get(3)?,
                interest_rate_bp: row.get(4)?,
                remaining_minor: row.get(5)?,
            })
        })?;

        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }
}
