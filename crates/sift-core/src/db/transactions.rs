//! Extracted transaction database operations

use rusqlite::params;

use super::{parse_date, Database};
use crate::error::Result;
use crate::models::{StatementTransaction, TransactionKind};

impl Database {
    /// Transactions for a statement, ordered by date then insert order
    pub fn list_statement_transactions(
        &self,
        statement_id: i64,
    ) -> Result<Vec<StatementTransaction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, statement_id, date, description, amount_minor, kind
            FROM transactions
            WHERE statement_id = ?
            ORDER BY date, id
            "#,
        )?;

        let rows = stmt.query_map(params![statement_id], |row| {
            let date: String = row.get(2)?;
            let kind: String = row.get(5)?;
            let kind: TransactionKind = kind.parse().map_err(|e: String| {
                rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, e.into())
            })?;

            Ok(StatementTransaction {
                id: row.get(0)?,
                statement_id: row.get(1)?,
                date: parse_date(2, &date)?,
                description: row.get(3)?,
                amount_minor: row.get(4)?,
                kind,
            })
        })?;

        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    /// Number of transactions stored for a statement
    pub fn count_statement_transactions(&self, statement_id: i64) -> Result<i64> {
        let conn = self.conn()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM transactions WHERE statement_id = ?",
            params![statement_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
