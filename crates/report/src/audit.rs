use outflow_core::{AggregateResult, Money, Month, Transaction};
use std::io::{self, Write};

const WIDE_RULE: usize = 80;
const SECTION_RULE: usize = 40;

fn clip(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

fn audit_line<W: Write>(out: &mut W, tx: &Transaction, symbol: &str) -> io::Result<()> {
    writeln!(
        out,
        "  {} | {symbol}{:>7} | {:<30} | {}",
        tx.date,
        tx.amount.abs().to_string(),
        clip(&tx.beneficiary, 30),
        clip(&tx.description, 40),
    )
}

/// Every category with its outflows, alphabetically, then the outflows that
/// matched nothing. Used to review keyword tables.
pub fn write_audit<W: Write>(out: &mut W, result: &AggregateResult, symbol: &str) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "=".repeat(WIDE_RULE))?;
    writeln!(out, "CATEGORY AUDIT")?;
    writeln!(out, "{}", "=".repeat(WIDE_RULE))?;

    for (name, bucket) in result.categories() {
        writeln!(out)?;
        writeln!(out, "{}:", name.replace('_', " ").to_uppercase())?;
        writeln!(out, "{}", "-".repeat(SECTION_RULE))?;
        writeln!(out, "Total: {symbol}{} ({} transactions)", bucket.total, bucket.transactions.len())?;
        writeln!(out)?;
        for tx in bucket.outflows() {
            audit_line(out, tx, symbol)?;
        }
    }

    let uncategorized: Vec<&Transaction> = result.uncategorized().iter().filter(|t| t.is_outflow()).collect();
    if !uncategorized.is_empty() {
        writeln!(out)?;
        writeln!(out, "UNCATEGORIZED:")?;
        writeln!(out, "{}", "-".repeat(SECTION_RULE))?;
        writeln!(
            out,
            "Total: {symbol}{} ({} transactions)",
            result.uncategorized_total(),
            uncategorized.len()
        )?;
        writeln!(out)?;
        for tx in uncategorized {
            audit_line(out, tx, symbol)?;
        }
    }
    Ok(())
}

/// Lists every uncategorized transaction, inflows included, with the
/// fields needed to write a new keyword for it.
pub fn write_uncategorized<W: Write>(
    out: &mut W,
    transactions: &[Transaction],
    month: Option<Month>,
    symbol: &str,
) -> io::Result<()> {
    if transactions.is_empty() {
        writeln!(out)?;
        return writeln!(out, "All transactions were successfully categorized!");
    }

    let heading = match month {
        Some(month) => format!("UNCATEGORIZED TRANSACTIONS - {month}"),
        None => "UNCATEGORIZED TRANSACTIONS".to_string(),
    };
    writeln!(out)?;
    writeln!(out, "{}", "=".repeat(WIDE_RULE))?;
    writeln!(out, "{heading}")?;
    writeln!(out, "{}", "=".repeat(WIDE_RULE))?;
    writeln!(out, "These transactions couldn't be confidently categorized:")?;
    writeln!(out)?;

    for tx in transactions {
        writeln!(out, "Date: {}", tx.date)?;
        writeln!(out, "Amount: {symbol}{} {}", tx.amount, tx.currency)?;
        writeln!(out, "Description: {}", tx.description)?;
        writeln!(out, "Beneficiary: {}", tx.beneficiary)?;
        writeln!(out, "Type: {}", tx.transaction_type)?;
        if !tx.weight.is_one() {
            let counted: Money = tx.amount * tx.weight;
            writeln!(out, "Weight: {} (counts as {symbol}{counted})", tx.weight)?;
        }
        writeln!(out, "Source: {}, row {}", tx.source, tx.row)?;
        writeln!(out, "{}", "-".repeat(WIDE_RULE))?;
    }
    Ok(())
}
