pub mod encoding;
pub mod layout;
pub mod loader;
pub mod record;
pub mod rules;
pub mod source;

pub use encoding::{EncodingChain, UnknownEncoding};
pub use layout::{AmountColumns, StatementLayout};
pub use loader::{
    FileError, FileSummary, LoadError, LoadReport, LoadedFile, LoaderConfig, Scan, StatementLoader,
};
pub use record::{MalformedRecord, RecordErrorKind};
pub use rules::{CategoryRule, CategoryRules, RuleError, DEFAULT_CATEGORIES};
pub use source::{InvalidPrefix, SourceName};
