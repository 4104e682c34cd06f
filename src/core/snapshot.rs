//! Immutable dictionary snapshots and the line parser that builds them.

use crate::error::{DictError, Result};
use std::collections::HashMap;
use std::io::BufRead;

/// Lower bound reported by [`DictionarySnapshot::max_key_len`].
pub const MIN_MAX_KEY_LEN: usize = 2;

const COMMENT: char = '#';
const SEPARATOR: char = '=';
const VARIANT_SEPARATOR: char = ' ';
const BOM: &[u8] = b"\xEF\xBB\xBF";

/// One complete, immutable version of the variant dictionary.
///
/// Maps a key (a character or short token) to its ordered list of variants,
/// e.g. the admissible readings of a polyphonic character. A snapshot is
/// always built in full before anyone can see it and is never mutated
/// afterwards; hot reloads replace the whole snapshot.
///
/// # Examples
///
/// ```rust
/// use hotswap_dict::core::DictionarySnapshot;
///
/// let snapshot = DictionarySnapshot::parse_str("行=xíng háng\n# comment\n");
/// assert_eq!(snapshot.variants("行"), Some(&["xíng".to_string(), "háng".to_string()][..]));
/// assert_eq!(snapshot.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct DictionarySnapshot {
    entries: HashMap<String, Vec<String>>,
    max_key_len: usize,
    skipped_lines: usize,
}

impl DictionarySnapshot {
    /// A snapshot with no entries.
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
            max_key_len: MIN_MAX_KEY_LEN,
            skipped_lines: 0,
        }
    }

    /// Build a snapshot from `(key, variants)` pairs. Later duplicates win.
    pub fn from_entries<I, K, V, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut snapshot = Self::empty();
        for (key, variants) in entries {
            snapshot.insert(key.into(), variants.into_iter().map(Into::into).collect());
        }
        snapshot
    }

    /// Parse dictionary text held in memory.
    pub fn parse_str(text: &str) -> Self {
        let mut parser = SnapshotParser::new();
        parser.feed(text.as_bytes());
        parser.finish()
    }

    /// Parse dictionary text from a buffered reader.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader fails part way through. The partially
    /// parsed entries are discarded.
    pub fn from_reader<R: BufRead>(mut reader: R) -> Result<Self> {
        let mut parser = SnapshotParser::new();
        loop {
            let chunk = reader.fill_buf()?;
            if chunk.is_empty() {
                break;
            }
            let len = chunk.len();
            parser.feed(chunk);
            reader.consume(len);
        }
        Ok(parser.finish())
    }

    /// The variants recorded for `key`, in file order.
    pub fn variants(&self, key: &str) -> Option<&[String]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    /// Whether `key` has an entry.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the snapshot has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(key, variants)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(key, variants)| (key.as_str(), variants.as_slice()))
    }

    /// Longest key length in characters, never below [`MIN_MAX_KEY_LEN`].
    ///
    /// Tokenizers use this as the window for maximal-match scanning.
    pub fn max_key_len(&self) -> usize {
        self.max_key_len
    }

    /// Number of malformed lines that were skipped while parsing.
    pub fn skipped_lines(&self) -> usize {
        self.skipped_lines
    }

    fn insert(&mut self, key: String, variants: Vec<String>) {
        self.max_key_len = self.max_key_len.max(key.chars().count());
        self.entries.insert(key, variants);
    }
}

impl Default for DictionarySnapshot {
    fn default() -> Self {
        Self::empty()
    }
}

impl PartialEq for DictionarySnapshot {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Eq for DictionarySnapshot {}

/// Incremental line parser fed with raw byte chunks.
///
/// Lines may be split across chunks; the partial tail is buffered until the
/// next newline or [`SnapshotParser::finish`].
pub(crate) struct SnapshotParser {
    snapshot: DictionarySnapshot,
    pending: Vec<u8>,
    line_no: usize,
}

impl SnapshotParser {
    pub(crate) fn new() -> Self {
        Self {
            snapshot: DictionarySnapshot::empty(),
            pending: Vec::new(),
            line_no: 0,
        }
    }

    pub(crate) fn feed(&mut self, chunk: &[u8]) {
        let mut buf = std::mem::take(&mut self.pending);
        buf.extend_from_slice(chunk);

        let mut start = 0;
        while let Some(offset) = buf[start..].iter().position(|&b| b == b'\n') {
            self.parse_line(&buf[start..start + offset]);
            start += offset + 1;
        }
        buf.drain(..start);
        self.pending = buf;
    }

    pub(crate) fn finish(mut self) -> DictionarySnapshot {
        if !self.pending.is_empty() {
            let tail = std::mem::take(&mut self.pending);
            self.parse_line(&tail);
        }
        self.snapshot
    }

    fn parse_line(&mut self, raw: &[u8]) {
        self.line_no += 1;

        let mut raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        if self.line_no == 1 {
            raw = raw.strip_prefix(BOM).unwrap_or(raw);
        }

        match parse_entry(raw) {
            Ok(Some((key, variants))) => self.snapshot.insert(key, variants),
            Ok(None) => {}
            Err(reason) => {
                self.snapshot.skipped_lines += 1;
                let err = DictError::Parse {
                    line: self.line_no,
                    reason,
                };
                tracing::debug!(error = %err, "skipping dictionary line");
            }
        }
    }
}

/// Parse a single line. `Ok(None)` means blank or comment.
fn parse_entry(raw: &[u8]) -> std::result::Result<Option<(String, Vec<String>)>, &'static str> {
    let line = std::str::from_utf8(raw).map_err(|_| "invalid UTF-8")?;
    if line.is_empty() || line.starts_with(COMMENT) {
        return Ok(None);
    }

    let (key, rest) = line.split_once(SEPARATOR).ok_or("missing '='")?;
    if key.is_empty() {
        return Err("empty key");
    }

    let variants: Vec<String> = rest
        .split(VARIANT_SEPARATOR)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect();
    if variants.is_empty() {
        return Err("no variants");
    }

    Ok(Some((key.to_string(), variants)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufReader, Read};

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_parse_basic_entry() {
        let snapshot = DictionarySnapshot::parse_str("行=xíng háng dāo\n");
        assert_eq!(snapshot.variants("行").unwrap(), strings(&["xíng", "háng", "dāo"]));
        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn test_comments_and_blank_lines_ignored() {
        let snapshot = DictionarySnapshot::parse_str("# header\n\n行=xíng\n#行=háng\n");
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.variants("行").unwrap(), strings(&["xíng"]));
        assert_eq!(snapshot.skipped_lines(), 0);
    }

    #[test]
    fn test_lines_without_separator_are_skipped() {
        let snapshot = DictionarySnapshot::parse_str("garbage\n行=xíng\nkey=\n=orphan\n");
        assert_eq!(snapshot.len(), 1);
        assert!(!snapshot.contains_key("garbage"));
        assert!(!snapshot.contains_key("key"));
        assert!(!snapshot.contains_key(""));
        assert_eq!(snapshot.skipped_lines(), 3);
    }

    #[test]
    fn test_split_on_first_separator_only() {
        let snapshot = DictionarySnapshot::parse_str("a=b=c d\n");
        assert_eq!(snapshot.variants("a").unwrap(), strings(&["b=c", "d"]));
    }

    #[test]
    fn test_consecutive_spaces_do_not_yield_empty_variants() {
        let snapshot = DictionarySnapshot::parse_str("长=cháng  zhǎng \n");
        assert_eq!(snapshot.variants("长").unwrap(), strings(&["cháng", "zhǎng"]));
    }

    #[test]
    fn test_crlf_and_bom() {
        let snapshot = DictionarySnapshot::parse_str("\u{feff}重=zhòng chóng\r\n乐=lè yuè\r\n");
        assert_eq!(snapshot.variants("重").unwrap(), strings(&["zhòng", "chóng"]));
        assert_eq!(snapshot.variants("乐").unwrap(), strings(&["lè", "yuè"]));
    }

    #[test]
    fn test_duplicate_key_last_wins() {
        let snapshot = DictionarySnapshot::parse_str("行=xíng\n行=háng\n");
        assert_eq!(snapshot.variants("行").unwrap(), strings(&["háng"]));
    }

    #[test]
    fn test_max_key_len_floor_and_growth() {
        assert_eq!(DictionarySnapshot::parse_str("行=xíng\n").max_key_len(), 2);
        let snapshot = DictionarySnapshot::parse_str("行=xíng\n银行行长=yín háng háng zhǎng\n");
        assert_eq!(snapshot.max_key_len(), 4);
    }

    #[test]
    fn test_invalid_utf8_line_skipped() {
        let mut parser = SnapshotParser::new();
        parser.feed(b"\xff\xfe=bad\n");
        parser.feed("行=xíng\n".as_bytes());
        let snapshot = parser.finish();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.skipped_lines(), 1);
    }

    #[test]
    fn test_lines_split_across_chunks() {
        let text = "行=xíng háng\n长=cháng zhǎng\n";
        let bytes = text.as_bytes();
        let mut parser = SnapshotParser::new();
        for chunk in bytes.chunks(3) {
            parser.feed(chunk);
        }
        let snapshot = parser.finish();
        assert_eq!(snapshot, DictionarySnapshot::parse_str(text));
    }

    #[test]
    fn test_last_line_without_newline() {
        let snapshot = DictionarySnapshot::parse_str("行=xíng\n长=cháng");
        assert!(snapshot.contains_key("长"));
    }

    #[test]
    fn test_from_reader() {
        let reader = BufReader::with_capacity(4, "行=xíng háng\n".as_bytes());
        let snapshot = DictionarySnapshot::from_reader(reader).unwrap();
        assert_eq!(snapshot.variants("行").unwrap(), strings(&["xíng", "háng"]));
    }

    struct FailingReader {
        served: bool,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.served {
                return Err(std::io::Error::other("connection reset"));
            }
            self.served = true;
            let data = b"a=b\n";
            buf[..data.len()].copy_from_slice(data);
            Ok(data.len())
        }
    }

    #[test]
    fn test_from_reader_error_discards_partial() {
        let reader = BufReader::new(FailingReader { served: false });
        let result = DictionarySnapshot::from_reader(reader);
        assert!(matches!(result, Err(DictError::Io(_))));
    }

    #[test]
    fn test_from_entries_and_equality() {
        let built = DictionarySnapshot::from_entries([("行", ["xíng", "háng"])]);
        let parsed = DictionarySnapshot::parse_str("行=xíng háng\n");
        assert_eq!(built, parsed);
    }
}
