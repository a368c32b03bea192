use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Largest magnitude accepted from a statement line. Far below `Decimal`'s
/// range, so totals over any realistic statement cannot overflow.
pub const MAX_STATEMENT_AMOUNT: i64 = 1_000_000_000_000_000;

/// Fixed-point amount, always held at two decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(Decimal);

impl Money {
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::new(cents, 2))
    }

    pub fn from_decimal(decimal: Decimal) -> Self {
        Money(decimal.round_dp(2))
    }

    /// Parses a statement amount such as `"1,234.50"`. Thousands separators
    /// are stripped; anything non-numeric or beyond
    /// [`MAX_STATEMENT_AMOUNT`] is rejected.
    pub fn parse_statement(s: &str) -> Option<Self> {
        let cleaned = s.trim().replace(',', "");
        Decimal::from_str(&cleaned)
            .ok()
            .filter(|d| d.abs() <= Decimal::from(MAX_STATEMENT_AMOUNT))
            .map(Money::from_decimal)
    }

    pub fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    /// `None` when the sum leaves `Decimal`'s range.
    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}
