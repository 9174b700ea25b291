//! Domain models for Sift

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle stage of a statement's processing pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessStage {
    /// Created by the upload endpoint, not yet processed
    Uploaded,
    /// A processor owns this statement and is running the pipeline
    Processing,
    /// Pipeline finished; derived rows are persisted
    Completed,
    /// Extraction or persistence failed; no derived rows exist
    Failed,
}

impl ProcessStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uploaded => "uploaded",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Allowed-transition table. Transitions are one-directional:
    /// uploaded -> processing -> completed | failed. Completed and failed
    /// are terminal.
    pub fn can_transition_to(&self, next: ProcessStage) -> bool {
        matches!(
            (self, next),
            (Self::Uploaded, Self::Processing)
                | (Self::Processing, Self::Completed)
                | (Self::Processing, Self::Failed)
        )
    }
}

impl std::str::FromStr for ProcessStage {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "uploaded" => Ok(Self::Uploaded),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Unknown process stage: {}", s)),
        }
    }
}

impl std::fmt::Display for ProcessStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Direction of money movement in a statement transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::Withdrawal => "withdrawal",
        }
    }

    /// Derive the kind from a signed minor-unit amount.
    /// Non-negative amounts are deposits (zero counts as a deposit).
    pub fn from_amount_minor(amount_minor: i64) -> Self {
        if amount_minor < 0 {
            Self::Withdrawal
        } else {
            Self::Deposit
        }
    }
}

impl std::str::FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "deposit" => Ok(Self::Deposit),
            "withdrawal" => Ok(Self::Withdrawal),
            _ => Err(format!("Unknown transaction kind: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Category of a generated statement insight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightCategory {
    Stability,
    Expense,
    Debt,
    Ratio,
    Recommendation,
}

impl InsightCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stability => "stability",
            Self::Expense => "expense",
            Self::Debt => "debt",
            Self::Ratio => "ratio",
            Self::Recommendation => "recommendation",
        }
    }
}

impl std::str::FromStr for InsightCategory {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "stability" => Ok(Self::Stability),
            "expense" => Ok(Self::Expense),
            "debt" => Ok(Self::Debt),
            "ratio" => Ok(Self::Ratio),
            "recommendation" => Ok(Self::Recommendation),
            _ => Err(format!("Unknown insight category: {}", s)),
        }
    }
}

impl std::fmt::Display for InsightCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One uploaded bank statement and its lifecycle state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Statement {
    pub id: i64,
    pub owner_id: String,
    pub display_name: Option<String>,
    /// Text extracted from the uploaded PDF
    pub raw_content: String,
    pub process_stage: ProcessStage,
    pub processed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A transaction extracted from a statement
///
/// Invariant: `kind` agrees with the sign of `amount_minor`
/// (non-negative amounts are deposits).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementTransaction {
    pub id: i64,
    pub statement_id: i64,
    pub date: NaiveDate,
    pub description: String,
    /// Signed amount in minor units (cents)
    pub amount_minor: i64,
    pub kind: TransactionKind,
}

/// Derived summary metrics, at most one row per statement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementMetrics {
    pub statement_id: i64,
    pub total_deposits_minor: i64,
    pub total_withdrawals_minor: i64,
    pub balance_minor: i64,
    pub outstanding_loans: i64,
    /// Min/max transaction date; None when the statement has no transactions
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
}

/// A generated insight attached to a statement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementInsight {
    pub id: i64,
    pub statement_id: i64,
    pub insight: String,
    pub category: InsightCategory,
}

/// A loan detected on a statement (best-effort extraction)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Loan {
    pub id: i64,
    pub statement_id: i64,
    pub loan_type: String,
    pub amount_minor: i64,
    /// Annual interest rate in basis points
    pub interest_rate_bp: i64,
    pub remaining_minor: i64,
}

/// New transaction row, pre-insert
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub date: NaiveDate,
    pub description: String,
    pub amount_minor: i64,
    pub kind: TransactionKind,
}

/// New loan row, pre-insert
#[derive(Debug, Clone)]
pub struct NewLoan {
    pub loan_type: String,
    pub amount_minor: i64,
    pub interest_rate_bp: i64,
    pub remaining_minor: i64,
}

/// New insight row, pre-insert
#[derive(Debug, Clone)]
pub struct NewInsight {
    pub insight: String,
    pub category: InsightCategory,
}

/// Owner-scoped list row: statement joined with its metrics (if processed)
#[derive(Debug, Clone, Serialize)]
pub struct StatementSummary {
    pub id: i64,
    pub display_name: Option<String>,
    pub process_stage: ProcessStage,
    pub created_at: DateTime<Utc>,
    /// Decimal currency, present once processing completed
    pub total_deposits: Option<f64>,
    pub total_withdrawals: Option<f64>,
    pub balance: Option<f64>,
}

/// Full denormalized view of a processed statement
#[derive(Debug, Clone, Serialize)]
pub struct StatementDetails {
    pub id: i64,
    pub display_name: Option<String>,
    pub process_stage: ProcessStage,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub metrics: Option<StatementMetrics>,
    pub transactions: Vec<StatementTransaction>,
    pub insights: Vec<StatementInsight>,
    pub loans: Vec<Loan>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_transition_table() {
        use ProcessStage::*;
        assert!(Uploaded.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Completed));
        assert!(Processing.can_transition_to(Failed));

        // Everything else is illegal
        assert!(!Uploaded.can_transition_to(Completed));
        assert!(!Uploaded.can_transition_to(Failed));
        assert!(!Processing.can_transition_to(Uploaded));
        assert!(!Completed.can_transition_to(Processing));
        assert!(!Failed.can_transition_to(Processing));
        assert!(!Failed.can_transition_to(Uploaded));
    }

    #[test]
    fn stage_round_trips_through_str() {
        for stage in [
            ProcessStage::Uploaded,
            ProcessStage::Processing,
            ProcessStage::Completed,
            ProcessStage::Failed,
        ] {
            assert_eq!(stage.as_str().parse::<ProcessStage>().unwrap(), stage);
        }
    }

    #[test]
    fn kind_from_sign() {
        assert_eq!(
            TransactionKind::from_amount_minor(5000),
            TransactionKind::Deposit
        );
        assert_eq!(
            TransactionKind::from_amount_minor(-2000),
            TransactionKind::Withdrawal
        );
        assert_eq!(
            TransactionKind::from_amount_minor(0),
            TransactionKind::Deposit
        );
    }
}
