pub mod config;
pub mod pipeline;

pub use config::{Config, ReportSection};
pub use pipeline::{analyze, write_report, Analysis, Mode};
