use outflow_core::{Transaction, Weight};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::encoding::EncodingChain;
use crate::layout::{StatementLayout, DELIMITER};
use crate::record::{MalformedRecord, RecordDecoder, RecordErrorKind};
use crate::source::{InvalidPrefix, SourceName};

/// The statements directory itself could not be read. Aborts the run.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("statement directory {} is unavailable: {cause}", .dir.display())]
    SourceUnavailable {
        dir: PathBuf,
        #[source]
        cause: std::io::Error,
    },
}

/// A single file could not be loaded. The remaining files are still read.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("{file}: {cause}")]
    InvalidWeight {
        file: String,
        #[source]
        cause: InvalidPrefix,
    },
    #[error("{file}: could not decode as any of {}", .tried.join(", "))]
    EncodingUnresolved { file: String, tried: Vec<String> },
    #[error("{file}: no header row matches a known statement layout")]
    UnknownLayout { file: String },
    #[error("{file}: header for layout '{layout}' has no '{column}' column")]
    MissingColumn {
        file: String,
        layout: String,
        column: String,
    },
    #[error("{file}: {cause}")]
    Io {
        file: String,
        #[source]
        cause: std::io::Error,
    },
    #[error("{file}: {cause}")]
    Csv {
        file: String,
        #[source]
        cause: csv::Error,
    },
}

impl FileError {
    pub fn file(&self) -> &str {
        match self {
            FileError::InvalidWeight { file, .. }
            | FileError::EncodingUnresolved { file, .. }
            | FileError::UnknownLayout { file }
            | FileError::MissingColumn { file, .. }
            | FileError::Io { file, .. }
            | FileError::Csv { file, .. } => file,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// File extension to pick up, compared case-insensitively.
    pub extension: String,
    pub encodings: EncodingChain,
    /// Tried in order against every line until one matches a header.
    pub layouts: Vec<StatementLayout>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            extension: "csv".to_string(),
            encodings: EncodingChain::default(),
            layouts: StatementLayout::builtin(),
        }
    }
}

/// Everything decoded from one statement file.
#[derive(Debug, Clone)]
pub struct LoadedFile {
    pub file: String,
    pub source: String,
    pub weight: Weight,
    pub encoding: &'static str,
    pub layout: String,
    pub transactions: Vec<Transaction>,
    pub skipped: Vec<MalformedRecord>,
}

/// Per-file bookkeeping gathered while a scan is consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSummary {
    pub file: String,
    pub weight: Weight,
    pub encoding: &'static str,
    pub layout: String,
    pub transactions: usize,
    pub skipped: usize,
}

#[derive(Debug, Default)]
pub struct LoadReport {
    pub files: Vec<FileSummary>,
    pub failures: Vec<FileError>,
    pub skipped: Vec<MalformedRecord>,
}

impl LoadReport {
    pub fn transaction_count(&self) -> usize {
        self.files.iter().map(|f| f.transactions).sum()
    }

    pub fn has_problems(&self) -> bool {
        !self.failures.is_empty() || !self.skipped.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct StatementLoader {
    config: LoaderConfig,
}

impl StatementLoader {
    pub fn new(config: LoaderConfig) -> Self {
        Self { config }
    }

    /// Statement files in `dir`, sorted by file name.
    pub fn discover(&self, dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
        let unavailable = |cause: std::io::Error| LoadError::SourceUnavailable { dir: dir.to_path_buf(), cause };
        let mut files = Vec::new();

        for entry in fs::read_dir(dir).map_err(unavailable)? {
            let entry = entry.map_err(unavailable)?;
            let path = entry.path();
            let wanted = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case(&self.config.extension));
            if wanted && path.is_file() {
                files.push(path);
            }
        }

        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(files)
    }

    /// Start a fresh pass over `dir`. Files are read one at a time as the
    /// returned iterator is advanced; calling `scan` again re-reads the
    /// directory.
    pub fn scan(&self, dir: &Path) -> Result<Scan, LoadError> {
        let files = self.discover(dir)?;
        info!(dir = %dir.display(), files = files.len(), "scanning statements");
        Ok(Scan { loader: self.clone(), files: files.into_iter() })
    }

    pub fn load_file(&self, path: &Path) -> Result<LoadedFile, FileError> {
        let file = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let source = SourceName::parse(&file).map_err(|cause| FileError::InvalidWeight {
            file: file.clone(),
            cause,
        })?;

        let bytes = fs::read(path).map_err(|cause| FileError::Io { file: file.clone(), cause })?;

        let (text, encoding) =
            self.config
                .encodings
                .decode(&bytes)
                .ok_or_else(|| FileError::EncodingUnresolved {
                    file: file.clone(),
                    tried: self.config.encodings.names(),
                })?;

        let mut loaded = self.parse_text(&file, &source, &text)?;
        loaded.encoding = encoding.name();
        info!(
            file = %file,
            encoding = loaded.encoding,
            weight = %source.weight,
            layout = %loaded.layout,
            transactions = loaded.transactions.len(),
            skipped = loaded.skipped.len(),
            "read statement"
        );
        Ok(loaded)
    }

    /// Decode already-decoded statement text. Preamble lines before the
    /// first recognized header are ignored.
    pub fn parse_text(
        &self,
        file: &str,
        source: &SourceName,
        text: &str,
    ) -> Result<LoadedFile, FileError> {
        let (header_line, offset, layout) = self
            .find_header(text)
            .ok_or_else(|| FileError::UnknownLayout { file: file.to_string() })?;

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(DELIMITER)
            .has_headers(true)
            .flexible(true)
            .from_reader(text[offset..].as_bytes());

        let headers = reader
            .headers()
            .map_err(|cause| FileError::Csv { file: file.to_string(), cause })?
            .clone();
        let columns = layout.bind(headers.iter()).map_err(|column| FileError::MissingColumn {
            file: file.to_string(),
            layout: layout.name.clone(),
            column,
        })?;

        let decoder = RecordDecoder::new(layout, &columns, &source.name);
        let mut transactions = Vec::new();
        let mut skipped = Vec::new();

        for result in reader.records() {
            let decoded = match result {
                Ok(record) => {
                    let row = header_line + record.position().map_or(0, |p| p.line() as usize);
                    decoder.decode(record.iter(), row)
                }
                Err(e) => Err(MalformedRecord {
                    file: file.to_string(),
                    row: header_line + e.position().map_or(0, |p| p.line() as usize),
                    kind: RecordErrorKind::Unreadable(e.to_string()),
                }),
            };

            match decoded {
                Ok(tx) => transactions.push(tx.with_weight(source.weight)),
                Err(mut bad) => {
                    bad.file = file.to_string();
                    warn!("skipping row: {bad}");
                    skipped.push(bad);
                }
            }
        }

        Ok(LoadedFile {
            file: file.to_string(),
            source: source.name.clone(),
            weight: source.weight,
            encoding: "",
            layout: layout.name.clone(),
            transactions,
            skipped,
        })
    }

    /// 0-based header line, its byte offset, and the layout it matched.
    fn find_header(&self, text: &str) -> Option<(usize, usize, &StatementLayout)> {
        let mut offset = 0;
        for (idx, line) in text.split_inclusive('\n').enumerate() {
            if let Some(layout) = self.config.layouts.iter().find(|l| l.matches_header(line)) {
                return Some((idx, offset, layout));
            }
            offset += line.len();
        }
        None
    }
}

/// Lazy pass over the statement files of one directory.
#[derive(Debug)]
pub struct Scan {
    loader: StatementLoader,
    files: std::vec::IntoIter<PathBuf>,
}

impl Iterator for Scan {
    type Item = Result<LoadedFile, FileError>;

    fn next(&mut self) -> Option<Self::Item> {
        let path = self.files.next()?;
        Some(self.loader.load_file(&path))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.files.size_hint()
    }
}

impl Scan {
    /// Flatten the scan into its transactions. Failed files and skipped
    /// rows are recorded in `report` instead of interrupting the stream.
    pub fn transactions(self, report: &mut LoadReport) -> impl Iterator<Item = Transaction> + '_ {
        self.flat_map(move |result| match result {
            Ok(loaded) => {
                report.files.push(FileSummary {
                    file: loaded.file,
                    weight: loaded.weight,
                    encoding: loaded.encoding,
                    layout: loaded.layout,
                    transactions: loaded.transactions.len(),
                    skipped: loaded.skipped.len(),
                });
                report.skipped.extend(loaded.skipped);
                loaded.transactions
            }
            Err(e) => {
                warn!("skipping file: {e}");
                report.failures.push(e);
                Vec::new()
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(name: &str) -> SourceName {
        SourceName::parse(name).unwrap()
    }

    const CAMT: &str = "Buchungstag;Verwendungszweck;Beguenstigter/Zahlungspflichtiger;Betrag;Waehrung;Buchungstext\n\
        01.01.2024;Supermarkt ABC;ABC GmbH;-45,30;EUR;LASTSCHRIFT\n";

    #[test]
    fn parses_rows_after_header() {
        let loaded = StatementLoader::default()
            .parse_text("account.csv", &plain("account.csv"), CAMT)
            .unwrap();
        assert_eq!(loaded.layout, "camt-v8");
        assert_eq!(loaded.transactions.len(), 1);
        assert_eq!(loaded.transactions[0].row, 2);
        assert!(loaded.skipped.is_empty());
    }

    #[test]
    fn skips_preamble_before_header() {
        let text = "Kontoumsaetze;;\nZeitraum: 01.01.2024 - 31.01.2024;;\n\n".to_string() + CAMT;
        let loaded = StatementLoader::default()
            .parse_text("account.csv", &plain("account.csv"), &text)
            .unwrap();
        assert_eq!(loaded.transactions.len(), 1);
        assert_eq!(loaded.transactions[0].row, 5);
    }

    #[test]
    fn bad_rows_are_skipped_with_row_numbers() {
        let text = format!("{CAMT}02.01.2024;too;few\n03.01.2024;Kino;UFA;-9,50;EUR;KARTE\n");
        let loaded = StatementLoader::default()
            .parse_text("account.csv", &plain("account.csv"), &text)
            .unwrap();
        assert_eq!(loaded.transactions.len(), 2);
        assert_eq!(loaded.skipped.len(), 1);
        assert_eq!(loaded.skipped[0].row, 3);
        assert_eq!(loaded.skipped[0].file, "account.csv");
        assert!(matches!(loaded.skipped[0].kind, RecordErrorKind::ColumnCount { expected: 6, found: 3 }));
    }

    #[test]
    fn weight_is_attached_to_every_row() {
        let source = plain("0.5x_joint.csv");
        let loaded = StatementLoader::default()
            .parse_text("0.5x_joint.csv", &source, CAMT)
            .unwrap();
        assert_eq!(loaded.source, "joint.csv");
        assert!(loaded.transactions.iter().all(|t| t.weight == source.weight));
        assert_eq!(loaded.transactions[0].source, "joint.csv");
    }

    #[test]
    fn unknown_layout_is_a_file_error() {
        let err = StatementLoader::default()
            .parse_text("notes.csv", &plain("notes.csv"), "a;b;c\n1;2;3\n")
            .unwrap_err();
        assert!(matches!(err, FileError::UnknownLayout { .. }));
        assert_eq!(err.file(), "notes.csv");
    }

    #[test]
    fn quoted_crlf_export() {
        let text = "\"Buchungstag\";\"Verwendungszweck\";\"Beguenstigter/Zahlungspflichtiger\";\"Betrag\";\"Waehrung\";\"Buchungstext\"\r\n\
            \"01.01.24\";\"Miete; Januar\";\"Vermieter\";\"-800,00\";\"EUR\";\"UEBERWEISUNG\"\r\n";
        let loaded = StatementLoader::default()
            .parse_text("account.csv", &plain("account.csv"), text)
            .unwrap();
        assert_eq!(loaded.transactions.len(), 1);
        assert_eq!(loaded.transactions[0].description, "Miete; Januar");
        assert_eq!(loaded.transactions[0].transaction_type, "UEBERWEISUNG");
    }

    // ── directory scans ──

    const LATIN1_CAMT: &[u8] = b"Buchungstag;Verwendungszweck;Beguenstigter/Zahlungspflichtiger;Betrag;Waehrung;Buchungstext\n\
        02.01.2024;B\xe4ckerei M\xfcller;M\xfcller;-3,20;EUR;KARTE\n";

    fn write(dir: &Path, name: &str, bytes: &[u8]) {
        fs::write(dir.join(name), bytes).unwrap();
    }

    #[test]
    fn scan_reads_every_statement_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "account.csv", CAMT.as_bytes());
        write(
            dir.path(),
            "0.5x_joint.csv",
            b"Buchungstag;Verwendungszweck;Beguenstigter/Zahlungspflichtiger;Betrag;Waehrung;Buchungstext\n\
              03.01.2024;Miete;Vermieter;-800,00;EUR;DAUERAUFTRAG\n",
        );
        write(dir.path(), "notes.txt", b"not a statement");

        let loader = StatementLoader::default();
        let mut report = LoadReport::default();
        let txs: Vec<Transaction> = loader.scan(dir.path()).unwrap().transactions(&mut report).collect();

        assert_eq!(txs.len(), 2);
        assert_eq!(txs[0].source, "joint.csv");
        assert_eq!(txs[0].weight.to_string(), "0.5");
        assert_eq!(txs[1].source, "account.csv");
        assert_eq!(txs[1].weight, Weight::ONE);
        assert_eq!(report.files.len(), 2);
        assert_eq!(report.transaction_count(), 2);
        assert!(!report.has_problems());
    }

    #[test]
    fn latin1_and_utf8_files_decode_alike() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.csv", LATIN1_CAMT);
        let utf8 = "Buchungstag;Verwendungszweck;Beguenstigter/Zahlungspflichtiger;Betrag;Waehrung;Buchungstext\n\
            02.01.2024;Bäckerei Müller;Müller;-3,20;EUR;KARTE\n";
        write(dir.path(), "b.csv", utf8.as_bytes());

        let files: Vec<LoadedFile> = StatementLoader::default()
            .scan(dir.path())
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(files[0].encoding, "windows-1252");
        assert_eq!(files[1].encoding, "UTF-8");
        assert_eq!(files[0].transactions[0].description, "Bäckerei Müller");
        assert_eq!(files[0].transactions[0].description, files[1].transactions[0].description);
    }

    #[test]
    fn missing_directory_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = StatementLoader::default().scan(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, LoadError::SourceUnavailable { .. }));
    }

    #[test]
    fn failing_file_does_not_stop_the_scan() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "0x_broken.csv", CAMT.as_bytes());
        write(dir.path(), "account.csv", CAMT.as_bytes());
        write(dir.path(), "random.csv", b"hello;world\n1;2\n");

        let mut report = LoadReport::default();
        let txs: Vec<Transaction> = StatementLoader::default()
            .scan(dir.path())
            .unwrap()
            .transactions(&mut report)
            .collect();

        assert_eq!(txs.len(), 1);
        assert_eq!(report.failures.len(), 2);
        assert!(matches!(report.failures[0], FileError::InvalidWeight { .. }));
        assert!(matches!(report.failures[1], FileError::UnknownLayout { .. }));
        assert_eq!(report.failures[1].file(), "random.csv");
        assert!(report.has_problems());
    }

    #[test]
    fn undecodable_file_names_the_encodings_tried() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.csv", LATIN1_CAMT);
        let loader = StatementLoader::new(LoaderConfig {
            encodings: EncodingChain::from_labels(&["utf-8"]).unwrap(),
            ..LoaderConfig::default()
        });

        let err = loader.load_file(&dir.path().join("a.csv")).unwrap_err();
        match err {
            FileError::EncodingUnresolved { file, tried } => {
                assert_eq!(file, "a.csv");
                assert_eq!(tried, vec!["UTF-8".to_string()]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn scan_is_restartable() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "account.csv", CAMT.as_bytes());
        let loader = StatementLoader::default();

        let first: Vec<_> = loader.scan(dir.path()).unwrap().transactions(&mut LoadReport::default()).collect();
        let second: Vec<_> = loader.scan(dir.path()).unwrap().transactions(&mut LoadReport::default()).collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 1);
    }

    #[test]
    fn extension_match_ignores_case() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "UPPER.CSV", CAMT.as_bytes());
        let files = StatementLoader::default().discover(dir.path()).unwrap();
        assert_eq!(files.len(), 1);
    }
}
