//! Pronunciation Dataset Split & Phone Normalization Library
//!
//! Prepares scraped word → pronunciation pairs for grapheme-to-phoneme
//! training.
//!
//! # Overview
//!
//! - **Partitioning**: seeded 80/10/10 train/validation/test splits, with
//!   optional deduplication by source word and fixed-size sampling
//! - **Canonicalization**: fold phone variants onto a gold phone schema
//! - **Normalization**: per-phone canonicalization plus language-specific
//!   superscript cleanup, with a change log of every rewritten transcription
//! - **Inventory Differences**: report phones that a dataset uses but the
//!   gold phone set lacks
//! - **Orthography merge**: concatenate the splits of every language sharing
//!   an orthography into one dataset per split
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use lex_phones::{SplitConfig, SplitPipeline};
//! use std::path::Path;
//!
//! let config = SplitConfig::builder()
//!     .language("rus")
//!     .dedupe(true)
//!     .sample_size(3000)
//!     .clean(true)
//!     .phones_dir("data/phones")
//!     .output_dir("data/tsv/slavic/rus")
//!     .build()?;
//!
//! let report = SplitPipeline::builder()
//!     .config(config)
//!     .build()?
//!     .run(Path::new("scraped/rus.tsv"))?;
//!
//! println!("{}", report.render());
//! ```
//!
//! # Using the core directly
//!
//! ```rust,ignore
//! use lex_phones::{PhoneNormalizer, PhoneSchema, SplitRatios, partition};
//! use rand::{SeedableRng, rngs::StdRng};
//!
//! let schema = PhoneSchema::from_json_str(r#"{"p": ["p", "pʰ"]}"#)?;
//! let normalizer = PhoneNormalizer::for_language(schema, "eng");
//! assert_eq!(normalizer.normalize("pʰ a").text, "p a");
//!
//! let mut rng = StdRng::seed_from_u64(42);
//! let split = partition::partition(records, &SplitRatios::default(), &mut rng);
//! ```

pub mod changelog;
pub mod config;
pub mod error;
pub mod inventory;
pub mod io;
pub mod merge;
pub mod normalizer;
pub mod partition;
pub mod pipeline;
pub mod report;
pub mod schema;
pub mod types;

// Re-exports for convenient access
pub use changelog::ChangeLog;
pub use config::{ConfigValidationError, SplitConfig, SplitConfigBuilder, SplitRatios};
pub use error::{PhonesError, Result as PhonesResult, ResultExt};
pub use inventory::{GoldPhoneSet, phone_inventory, unseen_phones};
pub use merge::{merge_orthography, merged_split_path};
pub use normalizer::PhoneNormalizer;
pub use partition::{Partition, SplitAssignment, SplitSizes};
pub use pipeline::{SplitOutcome, SplitPipeline, SplitPipelineBuilder, inventory_report};
pub use report::{
    InventoryReport, MergeReport, MergeSummary, SplitInventory, SplitReport, SplitSummary,
};
pub use schema::PhoneSchema;
pub use types::{ChangeLogEntry, Normalized, Record, RecordSet, SplitKind};
