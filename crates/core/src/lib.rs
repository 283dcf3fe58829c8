pub mod aggregate;
pub mod money;
pub mod period;
pub mod transaction;
pub mod weight;

pub use aggregate::{AggregateResult, Aggregator, CategoryBucket, UNCATEGORIZED};
pub use money::{DecimalSeparator, Money, MoneyError};
pub use period::{Month, MonthEndRule};
pub use transaction::Transaction;
pub use weight::{Weight, WeightError};
