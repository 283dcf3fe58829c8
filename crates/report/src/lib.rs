pub mod audit;
pub mod chart;
pub mod summary;

pub use audit::{write_audit, write_uncategorized};
pub use chart::{group_small, legend, ChartError, ChartSink, ChartSlice, PieChart};
pub use summary::{display_name, Summary, SummaryLine};
