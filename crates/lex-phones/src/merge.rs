//! Orthography datasets: every language split under an orthography
//! directory concatenated into one split per kind.
//!
//! For orthography `cyrl` located at `tsv/cyrl`, the train files of all
//! languages below it (`tsv/cyrl/**/train/*.tsv`) are merged into
//! `tsv/cyrl/cyrl/train/cyrl_train.tsv`, and likewise for val and test.
//! The merged file itself is never read back as an input, so re-running a
//! merge is idempotent.

use crate::error::{PhonesError, Result, ResultExt};
use crate::io;
use crate::report::{MergeReport, MergeSummary, timestamp};
use crate::types::{RecordSet, SplitKind};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Output path of the merged `kind` split for `orthography`.
pub fn merged_split_path(orth_dir: &Path, orthography: &str, kind: SplitKind) -> PathBuf {
    io::split_path(&orth_dir.join(orthography), orthography, kind)
}

/// Merge the language splits below `orth_dir` into one dataset per split.
///
/// Files are concatenated in sorted path order. Every split kind needs at
/// least one input file, and all inputs are read before anything is
/// written.
pub fn merge_orthography(orth_dir: &Path, orthography: &str) -> Result<MergeReport> {
    let mut merged: Vec<(SplitKind, Vec<PathBuf>, RecordSet)> = Vec::new();

    for kind in SplitKind::ALL {
        let output = merged_split_path(orth_dir, orthography, kind);
        let inputs: Vec<PathBuf> = io::find_split_files(orth_dir, kind)
            .into_iter()
            .filter(|path| *path != output)
            .collect();

        if inputs.is_empty() {
            return Err(PhonesError::MissingResource(orth_dir.join(kind.as_str())));
        }

        let mut records = RecordSet::new();
        for path in &inputs {
            let split = io::read_split(path).context(format!("Reading {}", path.display()))?;
            debug!("{} rows from {}", split.len(), path.display());
            records.extend(split);
        }
        merged.push((kind, inputs, records));
    }

    let mut splits = Vec::with_capacity(merged.len());
    for (kind, inputs, records) in merged {
        let path = merged_split_path(orth_dir, orthography, kind);
        io::write_records(&path, &records).context(format!("Writing {}", path.display()))?;
        info!(
            "Merged {} {} files into {} ({} rows)",
            inputs.len(),
            kind,
            path.display(),
            records.len()
        );

        splits.push(MergeSummary {
            split: kind,
            inputs: inputs.iter().map(|p| p.display().to_string()).collect(),
            rows: records.len(),
            path: path.display().to_string(),
        });
    }

    Ok(MergeReport {
        generated_at: timestamp(),
        orthography: orthography.to_string(),
        splits,
    })
}
