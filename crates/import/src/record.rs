use chrono::NaiveDate;
use outflow_core::{Money, MoneyError, Transaction, Weight};
use thiserror::Error;

use crate::layout::{AmountIndex, ColumnIndex, StatementLayout};

/// A row that could not be turned into a transaction. Skipped, not fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{file}, row {row}: {kind}")]
pub struct MalformedRecord {
    pub file: String,
    pub row: usize,
    pub kind: RecordErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordErrorKind {
    #[error("expected {expected} columns, found {found}")]
    ColumnCount { expected: usize, found: usize },
    #[error("missing value for '{column}'")]
    MissingField { column: String },
    #[error("invalid date '{raw}' in '{column}'")]
    InvalidDate { column: String, raw: String },
    #[error("invalid amount '{raw}' in '{column}': {reason}")]
    InvalidAmount {
        column: String,
        raw: String,
        reason: MoneyError,
    },
    #[error("unreadable row: {0}")]
    Unreadable(String),
}

/// Decodes data rows of one file against its bound layout.
pub struct RecordDecoder<'a> {
    layout: &'a StatementLayout,
    columns: &'a ColumnIndex,
    source: &'a str,
}

impl<'a> RecordDecoder<'a> {
    pub fn new(layout: &'a StatementLayout, columns: &'a ColumnIndex, source: &'a str) -> Self {
        Self { layout, columns, source }
    }

    /// Decode one row. `row` is the 1-based line number used in errors and
    /// kept on the transaction. The weight is left at one; the loader
    /// attaches the file's weight.
    pub fn decode<'r, I>(&self, fields: I, row: usize) -> Result<Transaction, MalformedRecord>
    where
        I: IntoIterator<Item = &'r str>,
    {
        let fields: Vec<&str> = fields.into_iter().map(str::trim).collect();
        self.decode_fields(&fields, row).map_err(|kind| MalformedRecord {
            file: self.source.to_string(),
            row,
            kind,
        })
    }

    fn decode_fields(&self, fields: &[&str], row: usize) -> Result<Transaction, RecordErrorKind> {
        let columns = self.columns;
        if fields.len() != columns.width {
            return Err(RecordErrorKind::ColumnCount {
                expected: columns.width,
                found: fields.len(),
            });
        }

        let text = |idx: Option<usize>| -> String {
            idx.and_then(|i| fields.get(i)).copied().unwrap_or_default().to_string()
        };

        let date = self.parse_date(fields[columns.date])?;
        let amount = self.parse_amount(fields)?;
        let currency = match text(columns.currency) {
            c if c.is_empty() => self.layout.default_currency.clone(),
            c => c,
        };

        Ok(Transaction {
            date,
            description: text(columns.description),
            beneficiary: text(columns.beneficiary),
            amount,
            currency,
            transaction_type: text(columns.transaction_type),
            weight: Weight::ONE,
            source: self.source.to_string(),
            row,
        })
    }

    fn parse_date(&self, raw: &str) -> Result<NaiveDate, RecordErrorKind> {
        let column = &self.layout.date_column;
        if raw.is_empty() {
            return Err(RecordErrorKind::MissingField { column: column.clone() });
        }
        self.layout
            .date_formats
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
            .ok_or_else(|| RecordErrorKind::InvalidDate {
                column: column.clone(),
                raw: raw.to_string(),
            })
    }

    fn parse_amount(&self, fields: &[&str]) -> Result<Money, RecordErrorKind> {
        let (column, raw) = match &self.columns.amount {
            AmountIndex::Signed(col) => {
                if fields[col.index].is_empty() {
                    return Err(RecordErrorKind::MissingField { column: col.name.clone() });
                }
                (col, fields[col.index])
            }
            AmountIndex::DebitCredit { debit, credit } => {
                match (fields[debit.index], fields[credit.index]) {
                    ("", "") => {
                        return Err(RecordErrorKind::MissingField {
                            column: format!("{}/{}", debit.name, credit.name),
                        })
                    }
                    ("", c) => (credit, c),
                    (d, _) => (debit, d),
                }
            }
        };

        Money::parse_localized(raw, self.layout.decimal_separator).map_err(|reason| {
            RecordErrorKind::InvalidAmount {
                column: column.name.clone(),
                raw: raw.to_string(),
                reason,
            }
        })
    }
}
