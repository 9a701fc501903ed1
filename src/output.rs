//! Result printers

use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use wordstorm_core::FuzzResult;

/// Line format for reported results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One human-readable line per result
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Writes each reported result as one line
pub struct ResultPrinter<W: Write> {
    out: W,
    format: OutputFormat,
    failed: bool,
}

impl<W: Write> ResultPrinter<W> {
    /// Printer writing `format` lines to `out`
    pub fn new(out: W, format: OutputFormat) -> Self {
        Self {
            out,
            format,
            failed: false,
        }
    }

    /// Write one result
    pub fn print(&mut self, result: &FuzzResult<'_>) -> io::Result<()> {
        match self.format {
            OutputFormat::Text => self.print_text(result)?,
            OutputFormat::Json => {
                serde_json::to_writer(&mut self.out, result)?;
                self.out.write_all(b"\n")?;
            }
        }
        self.out.flush()
    }

    /// Write one result, logging the first write failure instead of returning it
    pub fn print_or_log(&mut self, result: &FuzzResult<'_>) {
        if let Err(e) = self.print(result) {
            if !self.failed {
                tracing::error!(error = %e, "Failed to write result");
                self.failed = true;
            }
        }
    }

    fn print_text(&mut self, result: &FuzzResult<'_>) -> io::Result<()> {
        let words = result.fuzz_values.join(",");
        let stat = result.stat;
        match &stat.transport_error {
            Some(error) => writeln!(
                self.out,
                "[ERR] {} [{}] {} ({}ms)",
                result.url, words, error, stat.duration_ms
            ),
            None => writeln!(
                self.out,
                "[{}] size={} words={} lines={} time={}ms {} [{}]",
                stat.code,
                stat.size_bytes,
                stat.word_count,
                stat.line_count,
                stat.duration_ms,
                result.url,
                words
            ),
        }
    }

    /// Consume the printer, returning the writer
    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}
