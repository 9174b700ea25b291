//! Prompt builders for statement extraction and insight generation

use super::types::ExtractedStatement;

/// Build the structured-extraction prompt for raw statement text
pub fn extraction_prompt(statement_text: &str) -> String {
    format!(
        r#"You are a financial data extraction engine. Analyze the bank statement text below and return ONLY a JSON object, no prose, no code fences.

The JSON object must have this exact shape:
{{
  "transactions": [
    {{"date": "YYYY-MM-DD", "description": "string", "amount": 0.00}}
  ],
  "metrics": {{
    "totalDeposits": 0.00,
    "totalWithdrawals": 0.00,
    "balance": 0.00,
    "outstandingLoans": 0
  }},
  "loans": [
    {{"type": "string", "amount": 0.00, "interestRate": 0.00, "remainingBalance": 0.00}}
  ]
}}

Rules:
- Amounts are decimal currency. Deposits are positive, withdrawals are negative.
- totalWithdrawals is the positive sum of withdrawal magnitudes.
- outstandingLoans is the count of loans visible on the statement.
- If no loans are visible, return an empty "loans" array and 0 for outstandingLoans.
- Normalize every date to YYYY-MM-DD.

Bank statement text:
{statement_text}"#
    )
}

/// Build the insight-generation prompt from an extraction result
pub fn insights_prompt(extraction: &ExtractedStatement) -> String {
    // Serialization of our own typed structs cannot fail
    let data = serde_json::to_string_pretty(extraction).unwrap_or_default();

    format!(
        r#"You are a personal finance analyst. Given the extracted statement data below, write short actionable insights. Return ONLY a JSON object, no prose, no code fences:
{{
  "insights": [
    {{"category": "stability|expense|debt|ratio|recommendation", "insight": "one or two sentences"}}
  ]
}}

Cover income stability, notable expense patterns, debt posture, the deposit/withdrawal ratio, and one concrete recommendation. Use only the listed categories.

Extracted statement data:
{data}"#
    )
}
