//! Word lists and cyclic word cursors
//!
//! A word list is loaded once into a single immutable buffer holding only
//! the usable words, each terminated by `\n`. A [`WordSource`] is a cheap
//! cursor over that buffer; cloning it duplicates the cursor, never the
//! words, so several markers fed from the same file advance independently.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// The word substituted when a list cannot be used
pub const FALLBACK_WORD: &str = "FUZZ";

const FALLBACK_ORIGIN: &str = "<fallback>";

/// Errors raised while loading a word list
#[derive(Debug, thiserror::Error)]
pub enum WordlistError {
    /// The file could not be read
    #[error("failed to read word list {}: {source}", .path.display())]
    Io {
        /// Path that was opened
        path: PathBuf,
        /// Underlying IO failure
        #[source]
        source: std::io::Error,
    },

    /// The file contained no usable words
    #[error("word list {} contains no usable words", .path.display())]
    Empty {
        /// Path that was opened
        path: PathBuf,
    },
}

/// Immutable backing storage shared by every cursor over one list
#[derive(Debug)]
pub struct WordBuffer {
    text: Box<str>,
    total: usize,
    origin: String,
}

impl WordBuffer {
    /// Build a buffer from raw file contents, skipping comments, blank
    /// lines and lines that start with a control character.
    ///
    /// Returns `None` if nothing usable remains.
    pub fn parse(origin: impl Into<String>, raw: &[u8]) -> Option<Self> {
        let mut text = String::with_capacity(raw.len() + 1);
        let mut total = 0;

        for line in raw.split(|b| *b == b'\n') {
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            match line.first() {
                None => continue,
                Some(b'#') => continue,
                Some(first) if first.is_ascii_control() => continue,
                Some(_) => {}
            }
            text.push_str(&String::from_utf8_lossy(line));
            text.push('\n');
            total += 1;
        }

        if total == 0 {
            return None;
        }

        Some(Self {
            text: text.into_boxed_str(),
            total,
            origin: origin.into(),
        })
    }

    /// Number of words in the buffer
    pub fn total(&self) -> usize {
        self.total
    }

    /// Where the words came from (a path, or `<fallback>`)
    pub fn origin(&self) -> &str {
        &self.origin
    }

    fn word_len_at(&self, offset: usize) -> usize {
        self.text.as_bytes()[offset..]
            .iter()
            .position(|b| *b == b'\n')
            .unwrap_or(self.text.len() - offset)
    }
}

/// Cyclic cursor over a [`WordBuffer`]
#[derive(Debug, Clone)]
pub struct WordSource {
    buffer: Arc<WordBuffer>,
    offset: usize,
    length: usize,
    index: usize,
}

impl WordSource {
    /// Create a cursor positioned on the first word of `buffer`
    pub fn new(buffer: Arc<WordBuffer>) -> Self {
        let length = buffer.word_len_at(0);
        Self {
            buffer,
            offset: 0,
            length,
            index: 0,
        }
    }

    /// Build an in-memory source from a list of words
    ///
    /// Falls back to [`WordSource::fallback`] if no word survives the
    /// usual line rules.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = words
            .into_iter()
            .map(|w| w.as_ref().to_owned())
            .collect::<Vec<_>>()
            .join("\n");
        match WordBuffer::parse("<inline>", joined.as_bytes()) {
            Some(buffer) => Self::new(Arc::new(buffer)),
            None => Self::fallback(),
        }
    }

    /// Single-word source whose only word is [`FALLBACK_WORD`]
    pub fn fallback() -> Self {
        let buffer = WordBuffer {
            text: format!("{FALLBACK_WORD}\n").into_boxed_str(),
            total: 1,
            origin: FALLBACK_ORIGIN.to_string(),
        };
        Self::new(Arc::new(buffer))
    }

    /// The word under the cursor
    pub fn current(&self) -> &str {
        &self.buffer.text[self.offset..self.offset + self.length]
    }

    /// The word under the cursor as raw bytes
    pub fn current_bytes(&self) -> &[u8] {
        self.current().as_bytes()
    }

    /// Move to the next word, wrapping to the first after the last
    pub fn advance(&mut self) {
        if self.at_last() {
            self.offset = 0;
            self.index = 0;
        } else {
            self.offset += self.length + 1;
            self.index += 1;
        }
        self.length = self.buffer.word_len_at(self.offset);
    }

    /// Cursor is on the first word
    pub fn at_first(&self) -> bool {
        self.index == 0
    }

    /// Cursor is on the last word
    pub fn at_last(&self) -> bool {
        self.index + 1 == self.buffer.total
    }

    /// Number of words in the underlying list
    pub fn total(&self) -> usize {
        self.buffer.total
    }

    /// Zero-based position of the cursor
    pub fn index(&self) -> usize {
        self.index
    }

    /// Where the words came from
    pub fn origin(&self) -> &str {
        self.buffer.origin()
    }

    /// True if this is the `FUZZ` placeholder source
    pub fn is_fallback(&self) -> bool {
        self.buffer.origin == FALLBACK_ORIGIN
    }

    /// True if both cursors read the same backing buffer
    pub fn shares_buffer_with(&self, other: &WordSource) -> bool {
        Arc::ptr_eq(&self.buffer, &other.buffer)
    }
}

/// Loads word lists, caching each file by path
///
/// Opening the same path twice yields two independent cursors over one
/// shared buffer.
#[derive(Debug, Default)]
pub struct WordlistRegistry {
    buffers: HashMap<PathBuf, Arc<WordBuffer>>,
}

impl WordlistRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a word list, reusing the cached buffer for known paths
    pub fn open(&mut self, path: impl AsRef<Path>) -> Result<WordSource, WordlistError> {
        let path = path.as_ref();
        if let Some(buffer) = self.buffers.get(path) {
            return Ok(WordSource::new(Arc::clone(buffer)));
        }

        let raw = std::fs::read(path).map_err(|source| WordlistError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let buffer = WordBuffer::parse(path.display().to_string(), &raw).ok_or_else(|| {
            WordlistError::Empty {
                path: path.to_path_buf(),
            }
        })?;
        let buffer = Arc::new(buffer);

        tracing::debug!(
            path = %path.display(),
            words = buffer.total(),
            bytes = raw.len(),
            "Loaded word list"
        );

        self.buffers.insert(path.to_path_buf(), Arc::clone(&buffer));
        Ok(WordSource::new(buffer))
    }

    /// Open a word list, degrading to the `FUZZ` placeholder on failure
    pub fn open_or_fallback(&mut self, path: impl AsRef<Path>) -> WordSource {
        match self.open(path) {
            Ok(source) => source,
            Err(e) => {
                tracing::warn!(error = %e, "Word list unusable, substituting placeholder");
                WordSource::fallback()
            }
        }
    }

    /// Number of distinct files loaded
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    /// True if nothing has been loaded yet
    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn wordlist_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    fn collect(source: &mut WordSource) -> Vec<String> {
        let mut words = Vec::new();
        for _ in 0..source.total() {
            words.push(source.current().to_string());
            source.advance();
        }
        words
    }

    #[test]
    fn test_parse_skips_comments_blank_and_control_lines() {
        let raw = b"admin\n# comment\n\n\x01binary\r\nlogin\r\n\tindent\nbackup";
        let buffer = WordBuffer::parse("test", raw).unwrap();
        let mut source = WordSource::new(Arc::new(buffer));

        assert_eq!(source.total(), 3);
        assert_eq!(collect(&mut source), vec!["admin", "login", "backup"]);
    }

    #[test]
    fn test_parse_nothing_usable() {
        assert!(WordBuffer::parse("test", b"# only\n\n").is_none());
        assert!(WordBuffer::parse("test", b"").is_none());
    }

    #[test]
    fn test_advance_total_times_returns_to_start() {
        let mut source = WordSource::from_words(["a", "bb", "ccc", "dddd"]);
        assert!(source.at_first());
        for _ in 0..source.total() {
            source.advance();
        }
        assert!(source.at_first());
        assert_eq!(source.index(), 0);
        assert_eq!(source.current(), "a");
    }

    #[test]
    fn test_at_last_and_wrap() {
        let mut source = WordSource::from_words(["x", "y"]);
        assert!(!source.at_last());
        source.advance();
        assert!(source.at_last());
        assert_eq!(source.current(), "y");
        source.advance();
        assert!(source.at_first());
        assert_eq!(source.current(), "x");
    }

    #[test]
    fn test_single_word_is_first_and_last() {
        let mut source = WordSource::from_words(["only"]);
        assert!(source.at_first());
        assert!(source.at_last());
        source.advance();
        assert_eq!(source.current(), "only");
    }

    #[test]
    fn test_fallback_source() {
        let source = WordSource::fallback();
        assert!(source.is_fallback());
        assert_eq!(source.total(), 1);
        assert_eq!(source.current(), FALLBACK_WORD);
        assert_eq!(source.current_bytes(), b"FUZZ");
    }

    #[test]
    fn test_from_words_empty_falls_back() {
        let source = WordSource::from_words(Vec::<String>::new());
        assert!(source.is_fallback());
    }

    #[test]
    fn test_registry_open_reads_file() {
        let file = wordlist_file("one\ntwo\nthree\n");
        let mut registry = WordlistRegistry::new();
        let mut source = registry.open(file.path()).unwrap();

        assert_eq!(source.total(), 3);
        assert_eq!(collect(&mut source), vec!["one", "two", "three"]);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_registry_deduplicates_by_path() {
        let file = wordlist_file("one\ntwo\n");
        let mut registry = WordlistRegistry::new();
        let mut first = registry.open(file.path()).unwrap();
        let second = registry.open(file.path()).unwrap();

        assert!(first.shares_buffer_with(&second));
        assert_eq!(registry.len(), 1);

        first.advance();
        assert_eq!(first.current(), "two");
        assert_eq!(second.current(), "one");
    }

    #[test]
    fn test_registry_missing_file_errors() {
        let mut registry = WordlistRegistry::new();
        let err = registry.open("/definitely/not/here.txt").unwrap_err();
        assert!(matches!(err, WordlistError::Io { .. }));
    }

    #[test]
    fn test_registry_empty_file_errors() {
        let file = wordlist_file("# nothing\n\n");
        let mut registry = WordlistRegistry::new();
        let err = registry.open(file.path()).unwrap_err();
        assert!(matches!(err, WordlistError::Empty { .. }));
    }

    #[test]
    fn test_open_or_fallback_degrades() {
        let mut registry = WordlistRegistry::new();
        let source = registry.open_or_fallback("/definitely/not/here.txt");
        assert!(source.is_fallback());
        assert!(registry.is_empty());
    }
}
