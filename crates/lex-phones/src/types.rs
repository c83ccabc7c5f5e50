use serde::{Deserialize, Serialize};
use std::fmt;

/// An orthographic word paired with its space-delimited phonetic transcription.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Record {
    pub source: String,
    pub target: String,
}

impl Record {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    /// Iterate over the phones of the target transcription.
    pub fn phones(&self) -> impl Iterator<Item = &str> {
        self.target.split(' ').filter(|phone| !phone.is_empty())
    }
}

pub type RecordSet = Vec<Record>;

/// One of the three dataset splits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitKind {
    Train,
    Val,
    Test,
}

impl SplitKind {
    pub const ALL: [SplitKind; 3] = [SplitKind::Train, SplitKind::Val, SplitKind::Test];

    /// Directory and file-name suffix used for the split on disk.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Train => "train",
            Self::Val => "val",
            Self::Test => "test",
        }
    }

    /// `<lang>_<split>.tsv`
    pub fn file_name(&self, language: &str) -> String {
        format!("{}_{}.tsv", language, self.as_str())
    }
}

impl fmt::Display for SplitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transcription whose normalized form differs from the original.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeLogEntry {
    pub original: String,
    pub normalized: String,
}

impl fmt::Display for ChangeLogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.original, self.normalized)
    }
}

/// Result of normalizing a single transcription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub text: String,
    pub changed: bool,
}
