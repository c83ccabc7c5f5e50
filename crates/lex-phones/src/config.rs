//! Configuration types for the split pipeline.
//!
//! This module provides configuration options using the builder pattern
//! for flexible and ergonomic pipeline setup.

use crate::normalizer::default_filters;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Proportions of the train, validation and test splits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitRatios {
    pub train: f64,
    pub validation: f64,
    pub test: f64,
}

impl Default for SplitRatios {
    fn default() -> Self {
        Self {
            train: 0.8,
            validation: 0.1,
            test: 0.1,
        }
    }
}

impl SplitRatios {
    /// Share of the held-out pool that goes to the test split.
    pub fn test_share_of_holdout(&self) -> f64 {
        self.test / (self.test + self.validation)
    }

    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        for (field, value) in [
            ("train", self.train),
            ("validation", self.validation),
            ("test", self.test),
        ] {
            if !(value > 0.0 && value < 1.0) {
                return Err(ConfigValidationError::InvalidRatio {
                    field: field.to_string(),
                    value,
                });
            }
        }

        let sum = self.train + self.validation + self.test;
        if (sum - 1.0).abs() > 1e-6 {
            return Err(ConfigValidationError::RatioSum(sum));
        }
        Ok(())
    }
}

/// Configuration for a single split run.
///
/// Use [`SplitConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use lex_phones::config::SplitConfig;
///
/// let config = SplitConfig::builder()
///     .language("rus")
///     .dedupe(true)
///     .sample_size(3000)
///     .clean(true)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Language code, used for file names, schema lookup and cleanup rules.
    pub language: String,

    /// Directory receiving `train/`, `val/` and `test/` subdirectories.
    /// Default: "output"
    pub output_dir: PathBuf,

    /// Directory holding `<lang>.json` schemas and `<lang>.txt` phone sets.
    /// Default: "phones"
    pub phones_dir: PathBuf,

    /// Change log path, truncated at the start of every run.
    /// Default: "logs/change_phones.log"
    pub log_path: PathBuf,

    /// Drop rows whose source was already seen.
    /// Default: false
    pub dedupe: bool,

    /// Number of rows sampled (without replacement) before splitting.
    /// `None` keeps every row.
    /// Default: None
    pub sample_size: Option<usize>,

    /// Seed for sampling and both shuffles.
    /// Default: 42
    pub seed: u64,

    /// Split proportions.
    /// Default: 0.8 / 0.1 / 0.1
    pub ratios: SplitRatios,

    /// Normalize targets against the language's phone schema.
    /// Default: false
    pub clean: bool,

    /// Superscript sequences stripped from phones when cleaning.
    /// If None, the built-in filters for `language` are used.
    /// Default: None
    pub superscript_filters: Option<Vec<String>>,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            language: String::new(),
            output_dir: PathBuf::from("output"),
            phones_dir: PathBuf::from("phones"),
            log_path: PathBuf::from("logs/change_phones.log"),
            dedupe: false,
            sample_size: None,
            seed: 42,
            ratios: SplitRatios::default(),
            clean: false,
            superscript_filters: None,
        }
    }
}

impl SplitConfig {
    /// Create a new configuration builder.
    pub fn builder() -> SplitConfigBuilder {
        SplitConfigBuilder::default()
    }

    /// `<phones_dir>/<lang>.json`
    pub fn schema_path(&self) -> PathBuf {
        self.phones_dir.join(format!("{}.json", self.language))
    }

    /// Effective cleanup filters for the configured language.
    pub fn filters(&self) -> Vec<String> {
        self.superscript_filters
            .clone()
            .unwrap_or_else(|| default_filters(&self.language))
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.language.trim().is_empty() {
            return Err(ConfigValidationError::MissingLanguage);
        }

        if self.sample_size == Some(0) {
            return Err(ConfigValidationError::ZeroSampleSize);
        }

        self.ratios.validate()
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("A language identifier is required")]
    MissingLanguage,

    #[error("Invalid ratio for '{field}': {value} (must be between 0.0 and 1.0 exclusive)")]
    InvalidRatio { field: String, value: f64 },

    #[error("Split ratios must sum to 1.0, got {0}")]
    RatioSum(f64),

    #[error("Sample size must be at least 1")]
    ZeroSampleSize,
}

impl From<ConfigValidationError> for crate::error::PhonesError {
    fn from(err: ConfigValidationError) -> Self {
        crate::error::PhonesError::InvalidConfig(err.to_string())
    }
}

/// Builder for [`SplitConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct SplitConfigBuilder {
    language: Option<String>,
    output_dir: Option<PathBuf>,
    phones_dir: Option<PathBuf>,
    log_path: Option<PathBuf>,
    dedupe: Option<bool>,
    sample_size: Option<usize>,
    seed: Option<u64>,
    ratios: Option<SplitRatios>,
    clean: Option<bool>,
    superscript_filters: Option<Vec<String>>,
}

impl SplitConfigBuilder {
    /// Set the language identifier (e.g. "rus").
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    pub fn phones_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.phones_dir = Some(path.into());
        self
    }

    pub fn log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = Some(path.into());
        self
    }

    /// Enable or disable dropping rows with a repeated source.
    pub fn dedupe(mut self, dedupe: bool) -> Self {
        self.dedupe = Some(dedupe);
        self
    }

    /// Sample exactly `n` rows before splitting.
    pub fn sample_size(mut self, n: usize) -> Self {
        self.sample_size = Some(n);
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn ratios(mut self, ratios: SplitRatios) -> Self {
        self.ratios = Some(ratios);
        self
    }

    /// Enable or disable phone normalization.
    pub fn clean(mut self, clean: bool) -> Self {
        self.clean = Some(clean);
        self
    }

    /// Override the built-in superscript filters.
    pub fn superscript_filters(mut self, filters: Vec<String>) -> Self {
        self.superscript_filters = Some(filters);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `SplitConfig` or an error if validation fails.
    pub fn build(self) -> Result<SplitConfig, ConfigValidationError> {
        let defaults = SplitConfig::default();
        let config = SplitConfig {
            language: self.language.unwrap_or_default(),
            output_dir: self.output_dir.unwrap_or(defaults.output_dir),
            phones_dir: self.phones_dir.unwrap_or(defaults.phones_dir),
            log_path: self.log_path.unwrap_or(defaults.log_path),
            dedupe: self.dedupe.unwrap_or(false),
            sample_size: self.sample_size,
            seed: self.seed.unwrap_or(defaults.seed),
            ratios: self.ratios.unwrap_or_default(),
            clean: self.clean.unwrap_or(false),
            superscript_filters: self.superscript_filters,
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SplitConfig::default();
        assert_eq!(config.seed, 42);
        assert_eq!(config.ratios, SplitRatios::default());
        assert!(!config.dedupe);
        assert!(!config.clean);
        assert_eq!(config.sample_size, None);
    }

    #[test]
    fn test_builder_requires_language() {
        let result = SplitConfig::builder().build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::MissingLanguage
        ));
    }

    #[test]
    fn test_builder_custom_values() {
        let config = SplitConfig::builder()
            .language("rus")
            .dedupe(true)
            .sample_size(3000)
            .seed(7)
            .clean(true)
            .phones_dir("data/phones")
            .build()
            .unwrap();

        assert_eq!(config.language, "rus");
        assert!(config.dedupe);
        assert!(config.clean);
        assert_eq!(config.sample_size, Some(3000));
        assert_eq!(config.seed, 7);
        assert_eq!(config.schema_path(), PathBuf::from("data/phones/rus.json"));
    }

    #[test]
    fn test_zero_sample_size_rejected() {
        let result = SplitConfig::builder().language("eng").sample_size(0).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::ZeroSampleSize
        ));
    }

    #[test]
    fn test_ratios_must_sum_to_one() {
        let ratios = SplitRatios {
            train: 0.7,
            validation: 0.1,
            test: 0.1,
        };
        assert!(matches!(
            ratios.validate().unwrap_err(),
            ConfigValidationError::RatioSum(_)
        ));
    }

    #[test]
    fn test_ratio_out_of_range() {
        let ratios = SplitRatios {
            train: 1.0,
            validation: 0.0,
            test: 0.0,
        };
        assert!(matches!(
            ratios.validate().unwrap_err(),
            ConfigValidationError::InvalidRatio { .. }
        ));
    }

    #[test]
    fn test_test_share_of_holdout() {
        assert!((SplitRatios::default().test_share_of_holdout() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_filters_default_by_language() {
        let rus = SplitConfig::builder().language("rus").build().unwrap();
        assert_eq!(rus.filters().len(), 3);

        let eng = SplitConfig::builder().language("eng").build().unwrap();
        assert!(eng.filters().is_empty());

        let custom = SplitConfig::builder()
            .language("eng")
            .superscript_filters(vec!["ˀ".into()])
            .build()
            .unwrap();
        assert_eq!(custom.filters(), vec!["ˀ".to_string()]);
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "language": "deu",
            "output_dir": "tsv/deu",
            "phones_dir": "phones",
            "log_path": "logs/change_phones.log",
            "dedupe": true,
            "sample_size": 3000,
            "seed": 42,
            "ratios": {"train": 0.8, "validation": 0.1, "test": 0.1},
            "clean": true,
            "superscript_filters": null
        }"#;

        let config: SplitConfig = serde_json::from_str(json).expect("valid config JSON");
        assert!(config.validate().is_ok());
        assert_eq!(config.language, "deu");
        assert_eq!(config.output_dir.to_str().unwrap(), "tsv/deu");
        assert_eq!(config.sample_size, Some(3000));
    }
}
