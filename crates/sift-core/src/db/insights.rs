//! Statement insight database operations

use rusqlite::params;

use super::Database;
use crate::error::Result;
use crate::models::{InsightCategory, StatementInsight};

impl Database {
    /// Insights for a statement, oldest first
    pub fn list_statement_insights(&self, statement_id: i64) -> Result<Vec<StatementInsight>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, statement_id, insight, category
            FROM statement_insights
            WHERE statement_id = ?
            ORDER BY id
            "#,
        )?;

        let rows = stmt.query_map(params![statement_id], |row| {
            let category: String = row.get(3)?;
            let category: InsightCategory = category.parse().map_err(|e: String| {
                rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, e.into())
            })?;

            Ok(StatementInsight {
                id: row.get(0)?,
                statement_id: row.get(1)?,
                insight: row.get(2)?,
                category,
            })
        })?;

        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }
}
