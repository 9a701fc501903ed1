//! Response statistics and reported results

use serde::{Deserialize, Serialize};

/// Statistics for one completed request
///
/// `code` is 0 when the request failed at the transport level, in which
/// case `transport_error` carries the reason.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseStat {
    /// HTTP status code
    pub code: u16,

    /// Body size in bytes
    pub size_bytes: u64,

    /// Whitespace-separated words in the body
    pub word_count: u64,

    /// Lines in the body
    pub line_count: u64,

    /// Time from submission to completion
    pub duration_ms: u64,

    /// Connect/timeout/DNS failure description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transport_error: Option<String>,
}

impl ResponseStat {
    /// Stat for a response that arrived
    pub fn from_body(code: u16, body: &BodyStats, duration_ms: u64) -> Self {
        Self {
            code,
            size_bytes: body.size(),
            word_count: body.words(),
            line_count: body.lines(),
            duration_ms,
            transport_error: None,
        }
    }

    /// Stat for a request that never produced a response
    pub fn from_error(error: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            duration_ms,
            transport_error: Some(error.into()),
            ..Default::default()
        }
    }

    /// True if the request failed at the transport level
    pub fn is_error(&self) -> bool {
        self.transport_error.is_some()
    }
}

/// Streaming accumulator for body size, word and line counts
///
/// Fed chunk by chunk while the body downloads; counts are identical no
/// matter where chunk boundaries fall. A line is a `\n`-terminated run,
/// plus a trailing unterminated run if the body does not end in `\n`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BodyStats {
    bytes: u64,
    words: u64,
    newlines: u64,
    in_word: bool,
    ends_with_newline: bool,
}

impl BodyStats {
    /// Empty accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a whole body at once
    pub fn from_bytes(body: &[u8]) -> Self {
        let mut stats = Self::new();
        stats.feed(body);
        stats
    }

    /// Account for the next body chunk
    pub fn feed(&mut self, chunk: &[u8]) {
        if chunk.is_empty() {
            return;
        }
        self.bytes += chunk.len() as u64;

        for &byte in chunk {
            if byte == b'\n' {
                self.newlines += 1;
            }
            if byte.is_ascii_whitespace() {
                self.in_word = false;
            } else if !self.in_word {
                self.in_word = true;
                self.words += 1;
            }
        }

        self.ends_with_newline = chunk.last() == Some(&b'\n');
    }

    /// Bytes seen
    pub fn size(&self) -> u64 {
        self.bytes
    }

    /// Words seen
    pub fn words(&self) -> u64 {
        self.words
    }

    /// Lines seen
    pub fn lines(&self) -> u64 {
        if self.bytes > 0 && !self.ends_with_newline {
            self.newlines + 1
        } else {
            self.newlines
        }
    }
}

/// A result handed to the output callback
#[derive(Debug, Clone, Serialize)]
pub struct FuzzResult<'a> {
    /// Admission order of the request, starting at 1
    pub sequence: u64,

    /// Rendered request URL
    pub url: &'a str,

    /// Words substituted into the markers, left to right
    pub fuzz_values: &'a [String],

    /// Response statistics
    pub stat: &'a ResponseStat,

    /// Completion time
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl FuzzResult<'_> {
    /// True if the request failed at the transport level
    pub fn is_error(&self) -> bool {
        self.stat.is_error()
    }
}
