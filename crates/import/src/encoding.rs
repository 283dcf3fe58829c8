use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown text encoding label '{0}'")]
pub struct UnknownEncoding(pub String);

/// Ordered candidate encodings; the first one that decodes a whole file
/// without a malformed sequence is used for that file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodingChain {
    candidates: Vec<&'static Encoding>,
}

impl Default for EncodingChain {
    fn default() -> Self {
        Self { candidates: vec![UTF_8, WINDOWS_1252] }
    }
}

impl EncodingChain {
    pub fn new(candidates: Vec<&'static Encoding>) -> Self {
        Self { candidates }
    }

    /// Build from WHATWG labels such as `utf-8`, `latin1` or `cp1252`.
    pub fn from_labels<S: AsRef<str>>(labels: &[S]) -> Result<Self, UnknownEncoding> {
        let candidates = labels
            .iter()
            .map(|label| {
                let label = label.as_ref();
                Encoding::for_label(label.trim().as_bytes())
                    .ok_or_else(|| UnknownEncoding(label.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { candidates })
    }

    pub fn names(&self) -> Vec<String> {
        self.candidates.iter().map(|e| e.name().to_string()).collect()
    }

    /// Decode `bytes` with the first candidate that accepts all of them.
    /// A leading byte-order mark is dropped from the result.
    pub fn decode(&self, bytes: &[u8]) -> Option<(String, &'static Encoding)> {
        for &encoding in &self.candidates {
            match encoding.decode_without_bom_handling_and_without_replacement(bytes) {
                Some(decoded) => {
                    let decoded: &str = &decoded;
                    let text = decoded.strip_prefix('\u{feff}').unwrap_or(decoded).to_string();
                    return Some((text, encoding));
                }
                None => debug!(encoding = encoding.name(), "malformed input, trying next encoding"),
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LATIN1_ROW: &[u8] = b"01.01.2024;B\xe4ckerei M\xfcller;-3,20";

    #[test]
    fn utf8_is_preferred() {
        let (text, enc) = EncodingChain::default().decode("Bäckerei".as_bytes()).unwrap();
        assert_eq!(text, "Bäckerei");
        assert_eq!(enc, UTF_8);
    }

    #[test]
    fn falls_back_to_single_byte() {
        let (text, enc) = EncodingChain::default().decode(LATIN1_ROW).unwrap();
        assert_eq!(text, "01.01.2024;Bäckerei Müller;-3,20");
        assert_eq!(enc, WINDOWS_1252);
    }

    #[test]
    fn same_text_from_either_encoding() {
        let chain = EncodingChain::default();
        let (from_latin1, _) = chain.decode(LATIN1_ROW).unwrap();
        let (from_utf8, _) = chain.decode("01.01.2024;Bäckerei Müller;-3,20".as_bytes()).unwrap();
        assert_eq!(from_latin1, from_utf8);
    }

    #[test]
    fn unresolved_when_no_candidate_fits() {
        let chain = EncodingChain::from_labels(&["utf-8"]).unwrap();
        assert!(chain.decode(LATIN1_ROW).is_none());
    }

    #[test]
    fn strips_byte_order_mark() {
        let (text, _) = EncodingChain::default().decode(b"\xef\xbb\xbfBuchungstag").unwrap();
        assert_eq!(text, "Buchungstag");
    }

    #[test]
    fn labels_resolve_to_whatwg_names() {
        let chain = EncodingChain::from_labels(&["UTF-8", "latin1", "cp1252"]).unwrap();
        assert_eq!(chain.names(), vec!["UTF-8", "windows-1252", "windows-1252"]);
        assert_eq!(
            EncodingChain::from_labels(&["klingon"]),
            Err(UnknownEncoding("klingon".to_string()))
        );
    }
}
