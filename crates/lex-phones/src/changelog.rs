//! Substitution change log.
//!
//! The log file is truncated when a run starts. Each run writes a
//! `<lang> CHANGE LOG` header, a separator, one `original -> normalized`
//! line per changed transcription and a trailing blank line.

use crate::error::Result;
use crate::types::ChangeLogEntry;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

const SEPARATOR: &str = "----------------";

/// Line-oriented writer for change log entries.
pub struct ChangeLog<W: Write> {
    writer: W,
    entries: usize,
}

impl ChangeLog<BufWriter<File>> {
    /// Create (or truncate) the log file at `path`.
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(Self::new(BufWriter::new(File::create(path)?)))
    }
}

impl<W: Write> ChangeLog<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, entries: 0 }
    }

    /// Write the header that opens a language section.
    pub fn begin(&mut self, language: &str) -> Result<()> {
        writeln!(self.writer, "{} CHANGE LOG", language)?;
        writeln!(self.writer, "{}", SEPARATOR)?;
        Ok(())
    }

    pub fn record(&mut self, entry: &ChangeLogEntry) -> Result<()> {
        writeln!(self.writer, "{}", entry)?;
        self.entries += 1;
        Ok(())
    }

    /// Number of entries written so far.
    pub fn entries(&self) -> usize {
        self.entries
    }

    /// Close the section with a blank line and flush.
    pub fn finish(mut self) -> Result<W> {
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(self.writer)
    }
}
