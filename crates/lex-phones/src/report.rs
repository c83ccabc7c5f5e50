//! Run reports for the `split` and `diff` commands.
//!
//! Both reports serialize to JSON for the `--json` CLI flag and have a
//! human-readable rendering for the default terminal output.

use crate::types::SplitKind;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Current local time, formatted the same way in every report.
pub fn timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Per-split outcome of a split run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitSummary {
    pub split: SplitKind,
    pub rows: usize,
    /// Number of transcriptions changed by normalization.
    pub changes: usize,
    pub path: String,
}

/// Summary of a complete split run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitReport {
    /// Timestamp when the report was generated
    pub generated_at: String,
    pub input_file: String,
    pub language: String,
    pub seed: u64,
    pub rows_read: usize,
    /// Rows left after source deduplication (equals `rows_read` when disabled)
    pub rows_after_dedupe: usize,
    /// Rows handed to the partitioner
    pub rows_partitioned: usize,
    pub cleaned: bool,
    pub splits: Vec<SplitSummary>,
    pub change_log: String,
    pub duration_ms: u64,
}

impl SplitReport {
    pub fn total_changes(&self) -> usize {
        self.splits.iter().map(|s| s.changes).sum()
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let rule = "=".repeat(60);

        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out, "SPLIT COMPLETE ({})", self.language);
        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out, "Input:  {}", self.input_file);
        let _ = writeln!(
            out,
            "Rows:   {} read, {} after dedupe, {} partitioned",
            self.rows_read, self.rows_after_dedupe, self.rows_partitioned
        );
        let _ = writeln!(out, "Seed:   {}", self.seed);
        let _ = writeln!(out);
        for split in &self.splits {
            let _ = writeln!(
                out,
                "  {:<6} {:>7} rows  {:>5} changed  {}",
                split.split.as_str(),
                split.rows,
                split.changes,
                split.path
            );
        }
        let _ = writeln!(out);
        if self.cleaned {
            let _ = writeln!(
                out,
                "Normalized {} transcriptions, see {}",
                self.total_changes(),
                self.change_log
            );
        } else {
            let _ = writeln!(out, "Normalization disabled (use --clean)");
        }
        let _ = writeln!(out, "Duration: {}ms", self.duration_ms);
        let _ = write!(out, "{rule}");
        out
    }
}

/// Phone coverage of one split against the gold phone set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitInventory {
    pub split: SplitKind,
    pub rows: usize,
    pub observed: Vec<String>,
    pub unseen: Vec<String>,
}

/// Coverage report produced by the `diff` command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryReport {
    pub generated_at: String,
    pub language: String,
    pub gold_phones: Vec<String>,
    pub splits: Vec<SplitInventory>,
}

impl InventoryReport {
    /// Union of unseen phones across all splits.
    pub fn unseen(&self) -> Vec<String> {
        let mut all: Vec<String> = self
            .splits
            .iter()
            .flat_map(|s| s.unseen.iter().cloned())
            .collect();
        all.sort();
        all.dedup();
        all
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "gold phones ({}): {}",
            self.gold_phones.len(),
            self.gold_phones.join(" ")
        );
        for split in &self.splits {
            let _ = writeln!(
                out,
                "{} data phones ({}): {}",
                split.split,
                split.observed.len(),
                split.observed.join(" ")
            );
            let _ = writeln!(
                out,
                "{} set difference ({}): {}",
                split.split,
                split.unseen.len(),
                split.unseen.join(" ")
            );
        }
        out
    }
}

/// One merged split of an orthography dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeSummary {
    pub split: SplitKind,
    /// Language split files concatenated, in order
    pub inputs: Vec<String>,
    pub rows: usize,
    pub path: String,
}

/// Report produced by the `merge` command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeReport {
    pub generated_at: String,
    pub orthography: String,
    pub splits: Vec<MergeSummary>,
}

impl MergeReport {
    pub fn total_rows(&self) -> usize {
        self.splits.iter().map(|s| s.rows).sum()
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Merged {} rows for orthography {}",
            self.total_rows(),
            self.orthography
        );
        for split in &self.splits {
            let _ = writeln!(
                out,
                "  {:<6} {:>7} rows from {} files  {}",
                split.split.as_str(),
                split.rows,
                split.inputs.len(),
                split.path
            );
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split_report() -> SplitReport {
        SplitReport {
            generated_at: timestamp(),
            input_file: "rus.tsv".into(),
            language: "rus".into(),
            seed: 42,
            rows_read: 12,
            rows_after_dedupe: 10,
            rows_partitioned: 10,
            cleaned: true,
            splits: vec![
                SplitSummary {
                    split: SplitKind::Train,
                    rows: 8,
                    changes: 3,
                    path: "out/train/rus_train.tsv".into(),
                },
                SplitSummary {
                    split: SplitKind::Val,
                    rows: 1,
                    changes: 0,
                    path: "out/val/rus_val.tsv".into(),
                },
                SplitSummary {
                    split: SplitKind::Test,
                    rows: 1,
                    changes: 1,
                    path: "out/test/rus_test.tsv".into(),
                },
            ],
            change_log: "logs/change_phones.log".into(),
            duration_ms: 5,
        }
    }

    #[test]
    fn test_total_changes() {
        assert_eq!(split_report().total_changes(), 4);
    }

    #[test]
    fn test_split_report_json_uses_snake_case_splits() {
        let json = serde_json::to_string(&split_report()).unwrap();
        assert!(json.contains(r#""split":"val""#));
        assert!(json.contains(r#""rows_partitioned":10"#));
    }

    #[test]
    fn test_render_mentions_change_log() {
        let text = split_report().render();
        assert!(text.contains("SPLIT COMPLETE (rus)"));
        assert!(text.contains("Normalized 4 transcriptions"));
    }

    #[test]
    fn test_merge_report_render() {
        let report = MergeReport {
            generated_at: timestamp(),
            orthography: "cyrl".into(),
            splits: vec![MergeSummary {
                split: SplitKind::Train,
                inputs: vec!["rus/train/rus_train.tsv".into(), "ukr/train/ukr_train.tsv".into()],
                rows: 7,
                path: "cyrl/train/cyrl_train.tsv".into(),
            }],
        };
        assert_eq!(report.total_rows(), 7);
        let text = report.render();
        assert!(text.contains("Merged 7 rows for orthography cyrl"));
        assert!(text.contains("from 2 files"));
    }

    #[test]
    fn test_inventory_unseen_union() {
        let report = InventoryReport {
            generated_at: timestamp(),
            language: "rus".into(),
            gold_phones: vec!["a".into()],
            splits: vec![
                SplitInventory {
                    split: SplitKind::Train,
                    rows: 2,
                    observed: vec!["a".into(), "x".into()],
                    unseen: vec!["x".into()],
                },
                SplitInventory {
                    split: SplitKind::Test,
                    rows: 1,
                    observed: vec!["a".into(), "x".into(), "y".into()],
                    unseen: vec!["x".into(), "y".into()],
                },
            ],
        };
        assert_eq!(report.unseen(), vec!["x".to_string(), "y".to_string()]);
        assert!(report.render().contains("test set difference (2): x y"));
    }
}
