//! CLI entry point for the split and phone inventory tools.

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use lex_phones::{
    GoldPhoneSet, SplitConfig, SplitPipeline, inventory_report, io, merge_orthography,
};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(
    author = "Lex Machina Team",
    version,
    about = "Pronunciation dataset splitting and phone normalization",
    long_about = "Splits word/pronunciation TSV files into train, validation and test sets \
                  and normalizes phones against a gold inventory.\n\n\
                  EXAMPLES:\n  \
                  # Dedupe, sample 3000 rows, normalize and split\n  \
                  lex-phones split --infile rus.tsv --language rus --dedupe --clean --data-root tsv\n\n  \
                  # Split everything without sampling\n  \
                  lex-phones split --infile deu.tsv --language deu --no-sample -o out/deu\n\n  \
                  # Report phones missing from the gold phone set\n  \
                  lex-phones diff --language rus --data-root tsv\n\n  \
                  # Merge the splits of every Cyrillic-script language\n  \
                  lex-phones merge --orth cyrl --data-root tsv"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Suppress progress output (only show errors and final result)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output JSON to stdout instead of a human-readable summary
    ///
    /// Disables all logs; only the final JSON report is printed.
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Split a TSV into train/val/test files
    Split(SplitArgs),
    /// Compare the phones of written splits against the gold phone set
    Diff(DiffArgs),
    /// Merge the splits of every language under an orthography directory
    Merge(MergeArgs),
}

/// Where split files live: an explicit directory, or the directory named
/// after the language somewhere under a data root.
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct Location {
    /// Directory receiving (or holding) the train/, val/ and test/ subdirectories,
    /// or the orthography directory for `merge`
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Search this tree for a directory named after the language or orthography
    #[arg(long)]
    data_root: Option<PathBuf>,
}

impl Location {
    fn resolve(&self, language: &str) -> Result<PathBuf> {
        match (&self.output_dir, &self.data_root) {
            (Some(dir), _) => Ok(dir.clone()),
            (None, Some(root)) => Ok(io::locate_language_dir(root, language)?),
            (None, None) => Err(anyhow!("either --output-dir or --data-root is required")),
        }
    }
}

#[derive(Args, Debug)]
struct SplitArgs {
    /// Path to the two-column TSV (with header) to split
    #[arg(long)]
    infile: PathBuf,

    /// Language identifier, e.g. "rus"
    #[arg(long)]
    language: String,

    #[command(flatten)]
    location: Location,

    /// Drop rows whose source word was already seen
    #[arg(long)]
    dedupe: bool,

    /// Normalize phones against <phones-dir>/<language>.json
    #[arg(long)]
    clean: bool,

    /// Number of rows sampled before splitting
    #[arg(long, default_value = "3000", conflicts_with = "no_sample")]
    sample_size: usize,

    /// Keep every row instead of sampling
    #[arg(long)]
    no_sample: bool,

    /// Seed for sampling and shuffling
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Directory holding <language>.json schemas and <language>.txt phone sets
    #[arg(long, default_value = "phones")]
    phones_dir: PathBuf,

    /// Change log path (truncated on every run)
    #[arg(long, default_value = "logs/change_phones.log")]
    log_file: PathBuf,
}

#[derive(Args, Debug)]
struct DiffArgs {
    /// Language identifier, e.g. "rus"
    #[arg(long)]
    language: String,

    #[command(flatten)]
    location: Location,

    /// Directory holding <language>.txt phone sets
    #[arg(long, default_value = "phones")]
    phones_dir: PathBuf,
}

#[derive(Args, Debug)]
struct MergeArgs {
    /// Orthography identifier, e.g. "cyrl"
    #[arg(long)]
    orth: String,

    #[command(flatten)]
    location: Location,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is disabled so stdout only carries
/// the JSON report.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_level, cli.quiet, cli.json);

    let result = match &cli.command {
        Command::Split(args) => run_split(args, cli.json),
        Command::Diff(args) => run_diff(args, cli.json),
        Command::Merge(args) => run_merge(args, cli.json),
    };

    if let Err(ref e) = result {
        error!("{:#}", e);
    }
    result
}

fn run_split(args: &SplitArgs, json: bool) -> Result<()> {
    if !args.infile.exists() {
        return Err(anyhow!("Input file not found: {}", args.infile.display()));
    }

    let output_dir = args.location.resolve(&args.language)?;

    let mut builder = SplitConfig::builder()
        .language(&args.language)
        .output_dir(&output_dir)
        .phones_dir(&args.phones_dir)
        .log_path(&args.log_file)
        .dedupe(args.dedupe)
        .clean(args.clean)
        .seed(args.seed);

    if !args.no_sample {
        builder = builder.sample_size(args.sample_size);
    }

    let config = builder.build()?;
    info!(
        "Splitting {} ({}) into {}",
        args.infile.display(),
        args.language,
        output_dir.display()
    );

    let report = SplitPipeline::builder()
        .config(config)
        .build()?
        .run(&args.infile)
        .with_context(|| format!("Split failed for {}", args.infile.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report.render());
    }
    Ok(())
}

fn run_diff(args: &DiffArgs, json: bool) -> Result<()> {
    let dir = args.location.resolve(&args.language)?;
    let gold_path = GoldPhoneSet::path_for(&args.phones_dir, &args.language);
    let gold = GoldPhoneSet::load(&gold_path)
        .with_context(|| format!("Loading gold phone set {}", gold_path.display()))?;
    info!("Loaded {} gold phones", gold.len());

    let report = inventory_report(&dir, &args.language, &gold)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report.render());
    }
    Ok(())
}

fn run_merge(args: &MergeArgs, json: bool) -> Result<()> {
    let orth_dir = args.location.resolve(&args.orth)?;
    info!("Merging {} datasets under {}", args.orth, orth_dir.display());

    let report = merge_orthography(&orth_dir, &args.orth)
        .with_context(|| format!("Merge failed for {}", orth_dir.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report.render());
    }
    Ok(())
}
