//! Minor-unit currency conversion and metric derivation
//!
//! All monetary values are stored as signed integer minor units (cents).
//! Decimal conversion happens only at the presentation boundary.

use chrono::NaiveDate;

use crate::models::{NewTransaction, TransactionKind};

/// Convert a decimal currency amount to signed minor units (cents),
/// rounding half away from zero.
pub fn to_minor_units(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

/// Convert minor units back to decimal currency for display.
pub fn to_decimal(amount_minor: i64) -> f64 {
    amount_minor as f64 / 100.0
}

/// Totals derived from a batch of normalized transactions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedTotals {
    pub total_deposits_minor: i64,
    pub total_withdrawals_minor: i64,
    pub balance_minor: i64,
}

/// Derive deposit/withdrawal totals and net balance from normalized
/// transactions. Withdrawals are reported as a non-negative magnitude.
pub fn derive_totals(transactions: &[NewTransaction]) -> DerivedTotals {
    let mut deposits = 0i64;
    let mut withdrawals = 0i64;

    for tx in transactions {
        match tx.kind {
            TransactionKind::Deposit => deposits += tx.amount_minor,
            TransactionKind::Withdrawal => withdrawals += tx.amount_minor.abs(),
        }
    }

    DerivedTotals {
        total_deposits_minor: deposits,
        total_withdrawals_minor: withdrawals,
        balance_minor: deposits - withdrawals,
    }
}

/// Min/max transaction date for the statement period.
/// Returns None for an empty batch.
pub fn period_range(transactions: &[NewTransaction]) -> Option<(NaiveDate, NaiveDate)> {
    let start = transactions.iter().map(|t| t.date).min()?;
    let end = transactions.iter().map(|t| t.date).max()?;
    Some((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(date: &str, amount_minor: i64) -> NewTransaction {
        NewTransaction {
            date: date.parse().unwrap(),
            description: "test".into(),
            amount_minor,
            kind: TransactionKind::from_amount_minor(amount_minor),
        }
    }

    #[test]
    fn minor_units_rounding() {
        assert_eq!(to_minor_units(12.34), 1234);
        assert_eq!(to_minor_units(-12.34), -1234);
        assert_eq!(to_minor_units(0.005), 1);
        assert_eq!(to_minor_units(-0.005), -1);
        assert_eq!(to_minor_units(0.0), 0);
        // Binary float artifacts must not shift cents
        assert_eq!(to_minor_units(19.99), 1999);
        assert_eq!(to_minor_units(0.1 + 0.2), 30);
    }

    #[test]
    fn minor_units_round_trip_within_a_cent() {
        for amount in [0.01, 1.0, 12.34, 99.99, 1234.56, -567.89] {
            let minor = to_minor_units(amount);
            assert!((to_decimal(minor) - amount).abs() < 0.01);
        }
    }

    #[test]
    fn derived_totals_match_worked_example() {
        // [{amount:-2000},{amount:5000}] => withdrawals 2000, deposits 5000,
        // balance 3000 (minor units)
        let txs = vec![tx("2024-01-02", -2000), tx("2024-01-05", 5000)];
        let totals = derive_totals(&txs);
        assert_eq!(totals.total_withdrawals_minor, 2000);
        assert_eq!(totals.total_deposits_minor, 5000);
        assert_eq!(totals.balance_minor, 3000);
    }

    #[test]
    fn derived_totals_empty_batch() {
        let totals = derive_totals(&[]);
        assert_eq!(totals.total_deposits_minor, 0);
        assert_eq!(totals.total_withdrawals_minor, 0);
        assert_eq!(totals.balance_minor, 0);
    }

    #[test]
    fn period_range_is_min_max_not_first_last() {
        let txs = vec![
            tx("2024-01-15", 100),
            tx("2024-01-03", -50),
            tx("2024-01-28", 200),
        ];
        let (start, end) = period_range(&txs).unwrap();
        assert_eq!(start, "2024-01-03".parse::<NaiveDate>().unwrap());
        assert_eq!(end, "2024-01-28".parse::<NaiveDate>().unwrap());
    }

    #[test]
    fn period_range_empty_is_none() {
        assert!(period_range(&[]).is_none());
    }
}
