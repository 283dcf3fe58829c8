use outflow_core::DecimalSeparator;
use serde::{Deserialize, Serialize};

/// Field delimiter of every supported statement export.
pub const DELIMITER: u8 = b';';

/// Where the signed amount of a row comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AmountColumns {
    /// One column holding a signed amount.
    Signed { column: String },
    /// Separate columns; the debit side is already negative in the export.
    /// The debit value wins when both are filled.
    DebitCredit { debit: String, credit: String },
}

/// Header names and formats of one bank's semicolon export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementLayout {
    pub name: String,
    /// Header cells that identify this layout. The first line of a file
    /// containing all of them is taken as its header row.
    pub detect: Vec<String>,
    pub date_column: String,
    /// Tried in order; the first that parses wins.
    pub date_formats: Vec<String>,
    pub description_column: String,
    pub beneficiary_column: String,
    pub amount: AmountColumns,
    pub currency_column: String,
    #[serde(default = "default_currency")]
    pub default_currency: String,
    pub type_column: String,
    #[serde(default)]
    pub decimal_separator: DecimalSeparator,
}

fn default_currency() -> String {
    "EUR".to_string()
}

/// Column positions of a layout resolved against a concrete header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnIndex {
    pub width: usize,
    pub date: usize,
    pub description: Option<usize>,
    pub beneficiary: Option<usize>,
    pub amount: AmountIndex,
    pub currency: Option<usize>,
    pub transaction_type: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AmountIndex {
    Signed(BoundColumn),
    DebitCredit { debit: BoundColumn, credit: BoundColumn },
}

/// A header name together with its position in the row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundColumn {
    pub index: usize,
    pub name: String,
}

impl BoundColumn {
    pub fn new(index: usize, name: &str) -> Self {
        Self { index, name: name.to_string() }
    }
}

/// Normalizes a raw header cell: surrounding whitespace, quotes and a
/// byte-order mark are ignored.
pub fn clean_cell(cell: &str) -> &str {
    cell.trim_matches(|c: char| c.is_whitespace() || c == '"' || c == '\u{feff}')
}

impl StatementLayout {
    /// Sparkasse / CAMT V8 export.
    pub fn camt_v8() -> Self {
        Self {
            name: "camt-v8".to_string(),
            detect: vec!["Buchungstag".to_string()],
            date_column: "Buchungstag".to_string(),
            date_formats: vec!["%d.%m.%y".to_string(), "%d.%m.%Y".to_string()],
            description_column: "Verwendungszweck".to_string(),
            beneficiary_column: "Beguenstigter/Zahlungspflichtiger".to_string(),
            amount: AmountColumns::Signed { column: "Betrag".to_string() },
            currency_column: "Waehrung".to_string(),
            default_currency: default_currency(),
            type_column: "Buchungstext".to_string(),
            decimal_separator: DecimalSeparator::Comma,
        }
    }

    /// Deutsche Bank English-language export.
    pub fn deutsche_bank() -> Self {
        Self {
            name: "deutsche-bank".to_string(),
            detect: vec!["Booking date".to_string(), "Transaction Type".to_string()],
            date_column: "Booking date".to_string(),
            date_formats: vec!["%m/%d/%Y".to_string()],
            description_column: "Payment Details".to_string(),
            beneficiary_column: "Beneficiary / Originator".to_string(),
            amount: AmountColumns::DebitCredit {
                debit: "Debit".to_string(),
                credit: "Credit".to_string(),
            },
            currency_column: "Currency".to_string(),
            default_currency: default_currency(),
            type_column: "Transaction Type".to_string(),
            decimal_separator: DecimalSeparator::Comma,
        }
    }

    pub fn builtin() -> Vec<Self> {
        vec![Self::deutsche_bank(), Self::camt_v8()]
    }

    /// Whether `line` looks like this layout's header row.
    pub fn matches_header(&self, line: &str) -> bool {
        let cells: Vec<&str> = line.split(DELIMITER as char).map(clean_cell).collect();
        !self.detect.is_empty()
            && self
                .detect
                .iter()
                .all(|wanted| cells.iter().any(|cell| cell == wanted))
    }

    /// Resolve column names to positions. Fails with the first required
    /// column (date or amount) the header lacks.
    pub fn bind<'h, I>(&self, header: I) -> Result<ColumnIndex, String>
    where
        I: IntoIterator<Item = &'h str>,
    {
        let cells: Vec<&str> = header.into_iter().map(clean_cell).collect();
        let find = |name: &str| cells.iter().position(|c| *c == name);
        let require = |name: &str| find(name).ok_or_else(|| name.to_string());
        let bound = |name: &str| require(name).map(|index| BoundColumn::new(index, name));

        let amount = match &self.amount {
            AmountColumns::Signed { column } => AmountIndex::Signed(bound(column.as_str())?),
            AmountColumns::DebitCredit { debit, credit } => AmountIndex::DebitCredit {
                debit: bound(debit.as_str())?,
                credit: bound(credit.as_str())?,
            },
        };

        Ok(ColumnIndex {
            width: cells.len(),
            date: require(self.date_column.as_str())?,
            description: find(self.description_column.as_str()),
            beneficiary: find(self.beneficiary_column.as_str()),
            amount,
            currency: find(self.currency_column.as_str()),
            transaction_type: find(self.type_column.as_str()),
        })
    }
}
