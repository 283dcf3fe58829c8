use anyhow::{Context, Result};
use outflow_core::MonthEndRule;
use outflow_import::{CategoryRule, CategoryRules, EncodingChain, LoaderConfig, StatementLayout};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Run configuration. Every key is optional; missing keys take the
/// built-in defaults, and a present list replaces the default list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub statements_dir: PathBuf,
    pub extension: String,
    /// WHATWG encoding labels, tried in order per file.
    pub encodings: Vec<String>,
    pub layouts: Vec<StatementLayout>,
    /// Declaration order is match priority.
    pub categories: Vec<CategoryRule>,
    pub end_of_month_keywords: Vec<String>,
    pub report: ReportSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSection {
    pub currency_symbol: String,
    pub chart: bool,
    pub chart_dir: PathBuf,
    /// Slices under this share (percent) are merged into "Other".
    pub chart_other_threshold: Decimal,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            statements_dir: PathBuf::from("statements"),
            extension: "csv".to_string(),
            encodings: vec!["utf-8".to_string(), "windows-1252".to_string()],
            layouts: StatementLayout::builtin(),
            categories: CategoryRules::default().rules().to_vec(),
            end_of_month_keywords: vec!["sev petten".to_string()],
            report: ReportSection::default(),
        }
    }
}

impl Default for ReportSection {
    fn default() -> Self {
        Self {
            currency_symbol: "€".to_string(),
            chart: true,
            chart_dir: PathBuf::from("."),
            chart_other_threshold: Decimal::from(3),
        }
    }
}

impl Config {
    /// Defaults when `path` is `None`; otherwise the file must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(p) = path else {
            return Ok(Config::default());
        };
        let s = fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?;
        Self::from_toml_str(&s).with_context(|| format!("parse {}", p.display()))
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn loader_config(&self) -> Result<LoaderConfig> {
        let encodings = EncodingChain::from_labels(&self.encodings).context("encodings")?;
        Ok(LoaderConfig {
            extension: self.extension.clone(),
            encodings,
            layouts: self.layouts.clone(),
        })
    }

    pub fn category_rules(&self) -> Result<CategoryRules> {
        CategoryRules::new(self.categories.clone()).context("categories")
    }

    pub fn month_end_rule(&self) -> MonthEndRule {
        MonthEndRule::new(&self.end_of_month_keywords)
    }
}
