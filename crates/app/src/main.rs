use anyhow::Result;
use clap::Parser;
use outflow::{analyze, write_report, Config, Mode};
use outflow_import::StatementLoader;
use outflow_report::{ChartSink, PieChart};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "outflow", version, about = "Categorize bank statement exports and total the spending")]
struct Cli {
    /// Directory of statement exports (overrides `statements_dir`)
    dir: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// List every category with its transactions instead of the summary
    #[arg(long, conflicts_with = "monthly")]
    audit_categories: bool,

    /// One summary and chart per calendar month
    #[arg(long)]
    monthly: bool,

    /// Skip writing PNG charts
    #[arg(long)]
    no_chart: bool,
}

fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the report.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    let dir = cli.dir.unwrap_or_else(|| config.statements_dir.clone());

    let loader = StatementLoader::new(config.loader_config()?);
    let rules = config.category_rules()?;
    let analysis = analyze(&dir, &loader, &rules, &config.month_end_rule())?;

    let mode = if cli.audit_categories {
        Mode::Audit
    } else if cli.monthly {
        Mode::Monthly
    } else {
        Mode::Summary
    };

    let pie = PieChart::new(&config.report.chart_dir);
    let chart: Option<&dyn ChartSink> = (config.report.chart && !cli.no_chart).then_some(&pie as &dyn ChartSink);

    let mut out = io::stdout().lock();
    write_report(&mut out, &analysis, mode, &config.report, chart)?;
    out.flush()?;
    Ok(())
}
