//! Split pipeline driver.
//!
//! Reads a two-column TSV, optionally deduplicates and samples it,
//! partitions it into train/val/test, optionally normalizes each split's
//! transcriptions and writes the three split files plus the change log.

use crate::changelog::ChangeLog;
use crate::config::SplitConfig;
use crate::error::{PhonesError, Result, ResultExt};
use crate::inventory::{GoldPhoneSet, phone_inventory, unseen_phones};
use crate::io;
use crate::normalizer::PhoneNormalizer;
use crate::partition::{Partition, dedupe_by_source, partition, sample};
use crate::report::{InventoryReport, SplitInventory, SplitReport, SplitSummary, timestamp};
use crate::schema::PhoneSchema;
use crate::types::{ChangeLogEntry, RecordSet, SplitKind};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// In-memory result of splitting a record set.
#[derive(Debug, Clone)]
pub struct SplitOutcome {
    pub partition: Partition,
    /// Normalization changes in processing order (train, val, test).
    pub changes: Vec<(SplitKind, ChangeLogEntry)>,
    pub rows_read: usize,
    pub rows_after_dedupe: usize,
}

impl SplitOutcome {
    pub fn changes_in(&self, kind: SplitKind) -> usize {
        self.changes.iter().filter(|(k, _)| *k == kind).count()
    }
}

/// The split pipeline.
///
/// Use [`SplitPipeline::builder()`] to create a pipeline.
///
/// # Example
///
/// ```rust,ignore
/// use lex_phones::{SplitConfig, SplitPipeline};
///
/// let config = SplitConfig::builder()
///     .language("rus")
///     .dedupe(true)
///     .sample_size(3000)
///     .clean(true)
///     .output_dir("tsv/slavic/rus")
///     .build()?;
///
/// let report = SplitPipeline::builder()
///     .config(config)
///     .build()?
///     .run(Path::new("scraped/rus.tsv"))?;
/// ```
#[derive(Debug)]
pub struct SplitPipeline {
    config: SplitConfig,
    normalizer: Option<PhoneNormalizer>,
}

impl SplitPipeline {
    pub fn builder() -> SplitPipelineBuilder {
        SplitPipelineBuilder::default()
    }

    pub fn config(&self) -> &SplitConfig {
        &self.config
    }

    /// Dedupe, sample, partition and normalize `records` without touching disk.
    ///
    /// A single generator seeded from the config drives sampling and both
    /// partition shuffles, in that order.
    pub fn split_records(&self, records: RecordSet) -> Result<SplitOutcome> {
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let rows_read = records.len();

        let records = if self.config.dedupe {
            let deduped = dedupe_by_source(records);
            info!(
                "Deduplicated by source: {} -> {} rows",
                rows_read,
                deduped.len()
            );
            deduped
        } else {
            records
        };
        let rows_after_dedupe = records.len();

        let records = match self.config.sample_size {
            Some(n) => {
                let sampled = sample(records, n, &mut rng).context("Sampling records")?;
                info!("Sampled {} of {} rows", n, rows_after_dedupe);
                sampled
            }
            None => records,
        };

        let mut split = partition(records, &self.config.ratios, &mut rng);
        info!(
            "Split into train={}, val={}, test={}",
            split.train.len(),
            split.validation.len(),
            split.test.len()
        );

        let mut changes = Vec::new();
        if let Some(normalizer) = &self.normalizer {
            for kind in SplitKind::ALL {
                let split_changes = normalizer.normalize_records(split.get_mut(kind));
                debug!("Normalized {} {} transcriptions", split_changes.len(), kind);
                changes.extend(split_changes.into_iter().map(|entry| (kind, entry)));
            }
        }

        Ok(SplitOutcome {
            partition: split,
            changes,
            rows_read,
            rows_after_dedupe,
        })
    }

    /// Run the full pipeline on `input`, writing the splits and change log.
    pub fn run(&self, input: &Path) -> Result<SplitReport> {
        let start = Instant::now();
        let language = &self.config.language;

        info!("Loading records from: {}", input.display());
        let records = io::read_records(input).context(format!("Reading {}", input.display()))?;
        info!("Loaded {} records", records.len());

        let outcome = self.split_records(records)?;

        let mut log = ChangeLog::create(&self.config.log_path)
            .context(format!("Opening {}", self.config.log_path.display()))?;
        log.begin(language)?;
        for (_, entry) in &outcome.changes {
            log.record(entry)?;
        }
        log.finish()?;

        let mut splits = Vec::with_capacity(SplitKind::ALL.len());
        for kind in SplitKind::ALL {
            let path = io::split_path(&self.config.output_dir, language, kind);
            let records = outcome.partition.get(kind);
            io::write_records(&path, records).context(format!("Writing {}", path.display()))?;
            info!("Wrote {} rows to {}", records.len(), path.display());

            splits.push(SplitSummary {
                split: kind,
                rows: records.len(),
                changes: outcome.changes_in(kind),
                path: path.display().to_string(),
            });
        }

        Ok(SplitReport {
            generated_at: timestamp(),
            input_file: input.display().to_string(),
            language: language.clone(),
            seed: self.config.seed,
            rows_read: outcome.rows_read,
            rows_after_dedupe: outcome.rows_after_dedupe,
            rows_partitioned: outcome.partition.len(),
            cleaned: self.normalizer.is_some(),
            splits,
            change_log: self.config.log_path.display().to_string(),
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}

/// Builder for [`SplitPipeline`].
#[derive(Debug, Default)]
pub struct SplitPipelineBuilder {
    config: Option<SplitConfig>,
    schema: Option<PhoneSchema>,
}

impl SplitPipelineBuilder {
    pub fn config(mut self, config: SplitConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Use an in-memory schema instead of loading `<phones_dir>/<lang>.json`.
    pub fn schema(mut self, schema: PhoneSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Validate the config and load the phone schema when cleaning.
    ///
    /// Resources are resolved here so a missing schema fails before any
    /// output is written.
    pub fn build(self) -> Result<SplitPipeline> {
        let config = self
            .config
            .ok_or_else(|| PhonesError::InvalidConfig("no configuration provided".into()))?;
        config.validate()?;

        let normalizer = if config.clean {
            let schema = match self.schema {
                Some(schema) => schema,
                None => {
                    let path = config.schema_path();
                    PhoneSchema::load(&path).context("Loading phone schema")?
                }
            };
            Some(PhoneNormalizer::with_filters(schema, config.filters()))
        } else {
            if self.schema.is_some() {
                warn!("Phone schema provided but cleaning is disabled; ignoring it");
            }
            None
        };

        Ok(SplitPipeline { config, normalizer })
    }
}

/// Compare the phones of each split in `dir` against the gold phone set.
///
/// Missing split files are skipped with a warning; at least one must exist.
pub fn inventory_report(
    dir: &Path,
    language: &str,
    gold: &GoldPhoneSet,
) -> Result<InventoryReport> {
    let mut splits = Vec::new();

    for kind in SplitKind::ALL {
        let path = io::split_path(dir, language, kind);
        if !path.exists() {
            warn!("Skipping {}: not found", path.display());
            continue;
        }
        let records = io::read_split(&path).context(format!("Reading {}", path.display()))?;

        splits.push(SplitInventory {
            split: kind,
            rows: records.len(),
            observed: phone_inventory(&records).into_iter().collect(),
            unseen: unseen_phones(gold, &records).into_iter().collect(),
        });
    }

    if splits.is_empty() {
        return Err(PhonesError::MissingResource(io::split_path(
            dir,
            language,
            SplitKind::Train,
        )));
    }

    Ok(InventoryReport {
        generated_at: timestamp(),
        language: language.to_string(),
        gold_phones: gold.phones().iter().cloned().collect(),
        splits,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Record;
    use std::collections::HashSet;

    fn config() -> crate::config::SplitConfigBuilder {
        SplitConfig::builder().language("eng")
    }

    fn records(n: usize) -> RecordSet {
        (0..n)
            .map(|i| Record::new(format!("w{i}"), "pʰ a"))
            .collect()
    }

    #[test]
    fn test_build_without_config_fails() {
        let err = SplitPipeline::builder().build().unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CONFIG");
    }

    #[test]
    fn test_build_clean_without_schema_file_fails() {
        let err = SplitPipeline::builder()
            .config(config().clean(true).phones_dir("/nonexistent").build().unwrap())
            .build()
            .unwrap_err();
        assert_eq!(err.error_code(), "MISSING_RESOURCE");
    }

    #[test]
    fn test_split_records_counts() {
        let pipeline = SplitPipeline::builder()
            .config(config().build().unwrap())
            .build()
            .unwrap();
        let outcome = pipeline.split_records(records(50)).unwrap();

        assert_eq!(outcome.rows_read, 50);
        assert_eq!(outcome.partition.len(), 50);
        assert_eq!(outcome.partition.train.len(), 40);
        assert_eq!(outcome.partition.validation.len(), 5);
        assert_eq!(outcome.partition.test.len(), 5);
        assert!(outcome.changes.is_empty());
    }

    #[test]
    fn test_split_records_dedupe_and_sample() {
        let mut input = records(30);
        input.extend(records(30));
        let pipeline = SplitPipeline::builder()
            .config(config().dedupe(true).sample_size(20).build().unwrap())
            .build()
            .unwrap();
        let outcome = pipeline.split_records(input).unwrap();

        assert_eq!(outcome.rows_read, 60);
        assert_eq!(outcome.rows_after_dedupe, 30);
        assert_eq!(outcome.partition.len(), 20);

        let sources: HashSet<&str> = SplitKind::ALL
            .iter()
            .flat_map(|k| outcome.partition.get(*k))
            .map(|r| r.source.as_str())
            .collect();
        assert_eq!(sources.len(), 20);
    }

    #[test]
    fn test_split_records_sample_larger_than_input() {
        let pipeline = SplitPipeline::builder()
            .config(config().sample_size(100).build().unwrap())
            .build()
            .unwrap();
        let err = pipeline.split_records(records(10)).unwrap_err();
        assert_eq!(err.error_code(), "INSUFFICIENT_RECORDS");
    }

    #[test]
    fn test_split_records_normalizes_every_split() {
        let schema = PhoneSchema::from_json_str(r#"{"p": ["p", "pʰ"]}"#).unwrap();
        let pipeline = SplitPipeline::builder()
            .config(config().clean(true).build().unwrap())
            .schema(schema)
            .build()
            .unwrap();
        let outcome = pipeline.split_records(records(20)).unwrap();

        assert_eq!(outcome.changes.len(), 20);
        for kind in SplitKind::ALL {
            assert_eq!(
                outcome.changes_in(kind),
                outcome.partition.get(kind).len()
            );
            assert!(outcome.partition.get(kind).iter().all(|r| r.target == "p a"));
        }
        // train changes are logged before val and test
        assert_eq!(outcome.changes[0].0, SplitKind::Train);
    }

    #[test]
    fn test_split_records_is_deterministic() {
        let pipeline = SplitPipeline::builder()
            .config(config().dedupe(true).sample_size(40).seed(9).build().unwrap())
            .build()
            .unwrap();
        let a = pipeline.split_records(records(100)).unwrap();
        let b = pipeline.split_records(records(100)).unwrap();
        assert_eq!(a.partition, b.partition);
    }
}
