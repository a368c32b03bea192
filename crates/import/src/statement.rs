use chrono::NaiveDate;
use std::io::Read;
use tally_core::{Flow, Money, Transaction};
use thiserror::Error;

pub const DATE_COLUMN: &str = "Date";
pub const DETAILS_COLUMN: &str = "Details";
pub const AMOUNT_COLUMN: &str = "Amount";
pub const FLOW_COLUMN: &str = "Debit/Credit";

/// Statement dates look like `05 Jan 2024`.
pub const DATE_FORMAT: &str = "%d %b %Y";

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Schema error: {0}")]
    Schema(String),
    #[error("Format error in row {row}: {message}")]
    Format { row: usize, message: String },
}

/// Positions of the required columns in one particular export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColumnLayout {
    date: usize,
    details: usize,
    amount: usize,
    flow: usize,
}

impl ColumnLayout {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, LoadError> {
        let names: Vec<&str> = headers.iter().map(str::trim).collect();
        let find = |wanted: &str| {
            names
                .iter()
                .position(|h| *h == wanted)
                .ok_or_else(|| LoadError::Schema(format!("missing required column '{wanted}'")))
        };
        Ok(ColumnLayout {
            date: find(DATE_COLUMN)?,
            details: find(DETAILS_COLUMN)?,
            amount: find(AMOUNT_COLUMN)?,
            flow: find(FLOW_COLUMN)?,
        })
    }
}

pub struct StatementLoader;

impl StatementLoader {
    /// Parses a full statement. Any bad row rejects the whole file.
    pub fn parse<R: Read>(data: R) -> Result<Vec<Transaction>, LoadError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(data);
        let headers = reader
            .headers()
            .map_err(|e| LoadError::Schema(format!("unreadable header: {e}")))?;
        let layout = ColumnLayout::from_headers(headers)?;

        let mut transactions = Vec::new();
        for (idx, result) in reader.records().enumerate() {
            let row = idx + 1;
            let record = result.map_err(|e| LoadError::Format {
                row,
                message: e.to_string(),
            })?;
            transactions.push(parse_row(&record, layout, row)?);
        }

        tracing::debug!(rows = transactions.len(), "parsed statement");
        Ok(transactions)
    }
}

fn parse_row(
    record: &csv::StringRecord,
    layout: ColumnLayout,
    row: usize,
) -> Result<Transaction, LoadError> {
    let field = |col: usize| record.get(col).unwrap_or_default();

    let date = parse_date(field(layout.date)).ok_or_else(|| LoadError::Format {
        row,
        message: format!("unparseable date '{}'", field(layout.date)),
    })?;
    let amount = Money::parse_statement(field(layout.amount)).ok_or_else(|| LoadError::Format {
        row,
        message: format!("invalid amount '{}'", field(layout.amount)),
    })?;
    let flow: Flow = field(layout.flow)
        .parse()
        .map_err(|e| LoadError::Schema(format!("row {row}: {e}")))?;

    Ok(Transaction::new(date, field(layout.details), amount, flow))
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok()
}

pub fn load_statement(bytes: &[u8]) -> Result<Vec<Transaction>, LoadError> {
    StatementLoader::parse(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── parse_date ────────────────────────────────────────────────────────────

    #[test]
    fn parse_date_day_month_year() {
        assert_eq!(
            parse_date("05 Jan 2024"),
            NaiveDate::from_ymd_opt(2024, 1, 5)
        );
        assert_eq!(
            parse_date(" 31 Dec 2023 "),
            NaiveDate::from_ymd_opt(2023, 12, 31)
        );
    }

    #[test]
    fn parse_date_rejects_other_formats() {
        assert!(parse_date("2024-01-05").is_none());
        assert!(parse_date("05/01/2024").is_none());
        assert!(parse_date("31 Feb 2024").is_none());
    }

    // ── full statement ────────────────────────────────────────────────────────

    #[test]
    fn load_basic_statement() {
        let data = b"Date,Details,Amount,Debit/Credit\n\
05 Jan 2024,Whole Foods,\"1,234.50\",Debit\n\
06 Jan 2024,Salary,500.00,Credit\n";
        let txs = load_statement(data).unwrap();
        assert_eq!(txs.len(), 2);
        assert_eq!(txs[0].description, "Whole Foods");
        assert_eq!(txs[0].amount, Money::from_cents(123450));
        assert_eq!(txs[0].flow, Flow::Debit);
        assert_eq!(txs[0].date, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        assert!(txs[0].is_uncategorized());
        assert_eq!(txs[1].flow, Flow::Credit);
    }

    #[test]
    fn header_whitespace_is_trimmed_and_extra_columns_ignored() {
        let data = b" Date , Details,Status, Amount ,Debit/Credit \n\
05 Jan 2024,Uber,SETTLED,12.00,Debit\n";
        let txs = load_statement(data).unwrap();
        assert_eq!(txs[0].description, "Uber");
        assert_eq!(txs[0].amount, Money::from_cents(1200));
    }

    #[test]
    fn missing_amount_column_is_schema_error() {
        let data = b"Date,Details,Debit/Credit\n05 Jan 2024,Uber,Debit\n";
        assert!(matches!(load_statement(data), Err(LoadError::Schema(_))));
    }

    #[test]
    fn header_names_are_case_sensitive() {
        let data = b"date,Details,Amount,Debit/Credit\n05 Jan 2024,Uber,1.00,Debit\n";
        assert!(matches!(load_statement(data), Err(LoadError::Schema(_))));
    }

    #[test]
    fn empty_input_is_schema_error() {
        assert!(matches!(load_statement(b""), Err(LoadError::Schema(_))));
    }

    #[test]
    fn non_numeric_amount_names_the_row() {
        let data = b"Date,Details,Amount,Debit/Credit\n\
05 Jan 2024,Uber,12.00,Debit\n\
06 Jan 2024,Taxi,abc,Debit\n";
        match load_statement(data) {
            Err(LoadError::Format { row, message }) => {
                assert_eq!(row, 2);
                assert!(message.contains("abc"));
            }
            other => panic!("expected format error, got {other:?}"),
        }
    }

    #[test]
    fn bad_date_is_format_error() {
        let data = b"Date,Details,Amount,Debit/Credit\n2024-01-05,Uber,12.00,Debit\n";
        assert!(matches!(
            load_statement(data),
            Err(LoadError::Format { row: 1, .. })
        ));
    }

    #[test]
    fn unknown_flow_is_schema_error() {
        let data = b"Date,Details,Amount,Debit/Credit\n05 Jan 2024,Uber,12.00,Refund\n";
        assert!(matches!(load_statement(data), Err(LoadError::Schema(_))));
    }

    #[test]
    fn header_only_yields_no_transactions() {
        let data = b"Date,Details,Amount,Debit/Credit\n";
        assert!(load_statement(data).unwrap().is_empty());
    }

    #[test]
    fn ragged_row_is_format_error() {
        let data = b"Date,Details,Amount,Debit/Credit\n\
05 Jan 2024,Uber,12.00,Debit\n\
06 Jan 2024,Taxi,3.00\n";
        assert!(matches!(
            load_statement(data),
            Err(LoadError::Format { row: 2, .. })
        ));
    }

    #[test]
    fn invalid_utf8_in_a_row_is_format_error() {
        let data = b"Date,Details,Amount,Debit/Credit\n05 Jan 2024,Caf\xe9,4.00,Debit\n";
        assert!(matches!(
            load_statement(&data[..]),
            Err(LoadError::Format { row: 1, .. })
        ));
    }

    #[test]
    fn invalid_utf8_in_header_is_schema_error() {
        let data = b"Date,Det\xffails,Amount,Debit/Credit\n05 Jan 2024,Uber,4.00,Debit\n";
        assert!(matches!(load_statement(&data[..]), Err(LoadError::Schema(_))));
    }

    #[test]
    fn amount_beyond_limit_is_format_error() {
        let data = b"Date,Details,Amount,Debit/Credit\n\
05 Jan 2024,Wire,79228162514264337593543950335,Credit\n";
        assert!(matches!(
            load_statement(data),
            Err(LoadError::Format { row: 1, .. })
        ));
    }
}
