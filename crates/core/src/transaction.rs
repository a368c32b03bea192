use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::money::Money;
use super::rules::UNCATEGORIZED;

/// Direction of a statement line as reported by the bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Flow {
    Debit,
    Credit,
}

impl fmt::Display for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Flow::Debit => write!(f, "Debit"),
            Flow::Credit => write!(f, "Credit"),
        }
    }
}

impl FromStr for Flow {
    type Err = String;

    /// Exact, case-sensitive: statements spell these the same way every time.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Debit" => Ok(Flow::Debit),
            "Credit" => Ok(Flow::Credit),
            other => Err(format!("expected 'Debit' or 'Credit', got '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: NaiveDate,
    pub description: String,
    pub amount: Money,
    pub flow: Flow,
    pub category: String,
}

impl Transaction {
    pub fn new(date: NaiveDate, description: &str, amount: Money, flow: Flow) -> Self {
        Transaction {
            date,
            description: description.to_string(),
            amount,
            flow,
            category: UNCATEGORIZED.to_string(),
        }
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.category = category.to_string();
        self
    }

    pub fn is_uncategorized(&self) -> bool {
        self.category == UNCATEGORIZED
    }
}

/// Splits a statement into its debit and credit lines, keeping input order.
pub fn partition_by_flow(transactions: &[Transaction]) -> (Vec<Transaction>, Vec<Transaction>) {
    transactions
        .iter()
        .cloned()
        .partition(|tx| tx.flow == Flow::Debit)
}
