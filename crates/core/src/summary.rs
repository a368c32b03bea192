use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use super::money::Money;
use super::transaction::{Flow, Transaction};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SummaryError {
    #[error("Total for category '{0}' is out of range")]
    Overflow(String),
}

/// Totals per category, largest first. Equal totals sort by name so the
/// output is stable across runs.
pub fn summarize(transactions: &[Transaction]) -> Result<Vec<CategoryTotal>, SummaryError> {
    totals(transactions.iter())
}

/// Same as [`summarize`], restricted to one flow direction.
pub fn summarize_flow(
    transactions: &[Transaction],
    flow: Flow,
) -> Result<Vec<CategoryTotal>, SummaryError> {
    totals(transactions.iter().filter(|tx| tx.flow == flow))
}

fn totals<'a>(
    transactions: impl Iterator<Item = &'a Transaction>,
) -> Result<Vec<CategoryTotal>, SummaryError> {
    let mut by_category: BTreeMap<&str, Money> = BTreeMap::new();
    for tx in transactions {
        let entry = by_category.entry(tx.category.as_str()).or_insert_with(Money::zero);
        *entry = entry
            .checked_add(tx.amount)
            .ok_or_else(|| SummaryError::Overflow(tx.category.clone()))?;
    }

    let mut out: Vec<CategoryTotal> = by_category
        .into_iter()
        .map(|(category, total)| CategoryTotal {
            category: category.to_string(),
            total,
        })
        .collect();
    // BTreeMap already yields names ascending; a stable sort keeps that for ties.
    out.sort_by(|a, b| b.total.cmp(&a.total));
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn tx(category: &str, cents: i64, flow: Flow) -> Transaction {
        Transaction::new(
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            "x",
            Money::from_cents(cents),
            flow,
        )
        .with_category(category)
    }

    fn pairs(totals: &[CategoryTotal]) -> Vec<(&str, Money)> {
        totals
            .iter()
            .map(|t| (t.category.as_str(), t.total))
            .collect()
    }

    fn m(cents: i64) -> Money {
        Money::from_cents(cents)
    }

    #[test]
    fn groups_and_sorts_descending() {
        let txs = vec![
            tx("Food", 1000, Flow::Debit),
            tx("Food", 550, Flow::Debit),
            tx("Transport", 325, Flow::Debit),
        ];
        assert_eq!(pairs(&summarize(&txs).unwrap()), [("Food", m(1550)), ("Transport", m(325))]);
    }

    #[test]
    fn ties_break_by_name() {
        let txs = vec![
            tx("Rent", 500, Flow::Debit),
            tx("Bills", 500, Flow::Debit),
            tx("Uncategorized", 900, Flow::Debit),
        ];
        assert_eq!(
            pairs(&summarize(&txs).unwrap()),
            [("Uncategorized", m(900)), ("Bills", m(500)), ("Rent", m(500))]
        );
    }

    #[test]
    fn empty_input_gives_empty_summary() {
        assert!(summarize(&[]).unwrap().is_empty());
    }

    #[test]
    fn flow_filter_excludes_other_direction() {
        let txs = vec![
            tx("Food", 1000, Flow::Debit),
            tx("Salary", 500_000, Flow::Credit),
        ];
        assert_eq!(pairs(&summarize_flow(&txs, Flow::Debit).unwrap()), [("Food", m(1000))]);
        assert_eq!(pairs(&summarize_flow(&txs, Flow::Credit).unwrap()), [("Salary", m(500_000))]);
    }

    #[test]
    fn overflowing_total_is_an_error() {
        let huge = Money::from_decimal(rust_decimal::Decimal::MAX);
        let mut txs = vec![tx("Food", 100, Flow::Debit), tx("Rent", 100, Flow::Debit)];
        txs[0].amount = huge;
        assert!(summarize(&txs).is_ok());

        txs[1].category = "Food".into();
        assert_eq!(
            summarize(&txs),
            Err(SummaryError::Overflow("Food".into()))
        );
    }
}
