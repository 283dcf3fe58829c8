use outflow_core::{AggregateResult, Money, Month};
use rust_decimal::{Decimal, RoundingStrategy};
use std::io::{self, Write};

const RULE_WIDTH: usize = 50;
const NAME_WIDTH: usize = 20;

/// Human-facing category name: `eating_out` becomes `Eating Out`.
pub fn display_name(category: &str) -> String {
    category
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Share of `whole` taken by `part`, in percent, one decimal place.
pub(crate) fn percent_of(part: Money, whole: Money) -> Decimal {
    if whole.is_zero() {
        return Decimal::ZERO;
    }
    (part.amount() * Decimal::ONE_HUNDRED / whole.amount())
        .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryLine {
    pub category: String,
    pub total: Money,
    pub percent: Decimal,
}

/// Ranked category totals of one aggregation, ready to print or chart.
///
/// Only named categories with a non-zero total appear; percentages are
/// shares of their sum, so the uncategorized bucket never dilutes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub lines: Vec<SummaryLine>,
    pub total: Money,
}

impl Summary {
    pub fn of(result: &AggregateResult) -> Self {
        let total = result.categorized_total();
        let lines = result
            .ranked()
            .into_iter()
            .map(|(category, amount)| SummaryLine {
                category: category.to_string(),
                total: amount,
                percent: percent_of(amount, total),
            })
            .collect();
        Summary { lines, total }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn write<W: Write>(&self, out: &mut W, month: Option<Month>, symbol: &str) -> io::Result<()> {
        let title = match month {
            Some(month) => format!("EXPENSE SUMMARY BY CATEGORY - {month}"),
            None => "EXPENSE SUMMARY BY CATEGORY".to_string(),
        };
        writeln!(out)?;
        writeln!(out, "{}", "=".repeat(RULE_WIDTH))?;
        writeln!(out, "{title}")?;
        writeln!(out, "{}", "=".repeat(RULE_WIDTH))?;

        for line in &self.lines {
            writeln!(
                out,
                "{:<NAME_WIDTH$}: {symbol}{:>8} ({:>5}%)",
                display_name(&line.category),
                line.total.to_string(),
                format!("{:.1}", line.percent),
            )?;
        }

        writeln!(out, "{}", "-".repeat(RULE_WIDTH))?;
        writeln!(out, "{:<NAME_WIDTH$}: {symbol}{:>8}", "Total Expenses", self.total.to_string())
    }
}
