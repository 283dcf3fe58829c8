use anyhow::{Context, Result};
use outflow_core::{AggregateResult, Aggregator, Month, MonthEndRule};
use outflow_import::{CategoryRules, LoadError, LoadReport, StatementLoader};
use outflow_report::{
    group_small, legend, write_audit, write_uncategorized, ChartSink, ChartSlice, Summary,
};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use tracing::info;

use crate::config::ReportSection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// One summary over every transaction.
    #[default]
    Summary,
    /// One summary per calendar month.
    Monthly,
    /// Every category with its transactions.
    Audit,
}

/// Result of one pass over a statements directory.
#[derive(Debug)]
pub struct Analysis {
    pub load: LoadReport,
    pub overall: AggregateResult,
    /// Keyed by attributed month, so late month-end bookings count toward
    /// the month they pay for.
    pub months: BTreeMap<Month, AggregateResult>,
}

/// Scan `dir`, categorize every transaction and fold it into the overall
/// and the per-month aggregations.
pub fn analyze(
    dir: &Path,
    loader: &StatementLoader,
    rules: &CategoryRules,
    month_end: &MonthEndRule,
) -> Result<Analysis, LoadError> {
    let mut load = LoadReport::default();
    let mut overall = Aggregator::new();
    let mut months: BTreeMap<Month, Aggregator> = BTreeMap::new();

    for tx in loader.scan(dir)?.transactions(&mut load) {
        let category = rules.categorize(&tx);
        months
            .entry(month_end.attributed_month(&tx))
            .or_default()
            .add(category, tx.clone());
        overall.add(category, tx);
    }

    let overall = overall.finish();
    info!(
        transactions = overall.transaction_count(),
        files = load.files.len(),
        failed = load.failures.len(),
        skipped_rows = load.skipped.len(),
        "analysis complete"
    );

    Ok(Analysis {
        load,
        overall,
        months: months.into_iter().map(|(m, agg)| (m, agg.finish())).collect(),
    })
}

/// Print the report for `mode` to `out`, drawing charts through `chart`
/// when one is given.
pub fn write_report<W: Write>(
    out: &mut W,
    analysis: &Analysis,
    mode: Mode,
    style: &ReportSection,
    chart: Option<&dyn ChartSink>,
) -> Result<()> {
    let symbol = style.currency_symbol.as_str();
    writeln!(out, "Loaded {} transactions", analysis.overall.transaction_count())?;

    match mode {
        Mode::Audit => write_audit(out, &analysis.overall, symbol)?,
        Mode::Summary => {
            let summary = Summary::of(&analysis.overall);
            summary.write(out, None, symbol)?;
            draw(out, chart, &summary, None, style)?;
            write_uncategorized(out, analysis.overall.uncategorized(), None, symbol)?;
        }
        Mode::Monthly => {
            writeln!(out, "Found data for {} months", analysis.months.len())?;
            for (month, result) in &analysis.months {
                writeln!(out)?;
                writeln!(out, "{}", "=".repeat(60))?;
                writeln!(out, "Processing {month}")?;
                writeln!(out, "{}", "=".repeat(60))?;
                writeln!(out, "Transactions for {month}: {}", result.transaction_count())?;

                let summary = Summary::of(result);
                if summary.is_empty() {
                    writeln!(out, "No expenses found for {month}")?;
                } else {
                    summary.write(out, Some(*month), symbol)?;
                    draw(out, chart, &summary, Some(*month), style)?;
                }
                if !result.uncategorized().is_empty() {
                    write_uncategorized(out, result.uncategorized(), Some(*month), symbol)?;
                }
            }
        }
    }

    write_diagnostics(out, &analysis.load)
}

fn draw<W: Write>(
    out: &mut W,
    chart: Option<&dyn ChartSink>,
    summary: &Summary,
    month: Option<Month>,
    style: &ReportSection,
) -> Result<()> {
    let Some(sink) = chart else {
        return Ok(());
    };
    let slices = group_small(&ChartSlice::from_summary(summary), style.chart_other_threshold);
    let Some(path) = sink.render(month, &slices).context("write expense chart")? else {
        return Ok(());
    };

    writeln!(out)?;
    writeln!(out, "Chart saved as {}", path.display())?;
    for line in legend(&slices, &style.currency_symbol) {
        writeln!(out, "  {line}")?;
    }
    Ok(())
}

/// Failed files and skipped rows, after the report so they are not missed.
fn write_diagnostics<W: Write>(out: &mut W, load: &LoadReport) -> Result<()> {
    if !load.has_problems() {
        return Ok(());
    }
    writeln!(out)?;
    writeln!(out, "{}", "=".repeat(80))?;
    writeln!(out, "DIAGNOSTICS")?;
    writeln!(out, "{}", "=".repeat(80))?;
    for failure in &load.failures {
        writeln!(out, "Skipped file {failure}")?;
    }
    for row in &load.skipped {
        writeln!(out, "Skipped row {row}")?;
    }
    Ok(())
}
