//! Command-line interface definitions for Article Harvest.
//!
//! Every flag is optional: unset flags fall back to the YAML config file (if
//! given) and then to the built-in defaults in [`crate::config`]. Each flag can
//! also be supplied through an `ARTICLE_HARVEST_*` environment variable.

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the Article Harvest application.
///
/// # Examples
///
/// ```sh
/// # Process 10% of the default dataset into clean_articles.csv
/// article_harvest
///
/// # Explicit paths, reproducible sample, lower concurrency
/// article_harvest -i events.csv -o articles.csv --seed 7 --concurrency 8
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// CSV dataset holding candidate URLs
    #[arg(short, long, env = "ARTICLE_HARVEST_INPUT")]
    pub input: Option<PathBuf>,

    /// Name of the dataset column that holds the URLs
    #[arg(long, env = "ARTICLE_HARVEST_COLUMN")]
    pub column: Option<String>,

    /// Append-only CSV file extracted articles are written to
    #[arg(short, long, env = "ARTICLE_HARVEST_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Optional path to a YAML config file
    #[arg(short, long, env = "ARTICLE_HARVEST_CONFIG")]
    pub config: Option<PathBuf>,

    /// Maximum number of extractions in flight at once
    #[arg(long, env = "ARTICLE_HARVEST_CONCURRENCY")]
    pub concurrency: Option<usize>,

    /// Fraction of candidate URLs sampled per run (0.0 - 1.0)
    #[arg(long, env = "ARTICLE_HARVEST_SAMPLE_FRACTION")]
    pub sample_fraction: Option<f64>,

    /// Seed for reproducible sampling
    #[arg(long, env = "ARTICLE_HARVEST_SEED")]
    pub seed: Option<u64>,

    /// Timeout in seconds for the structural fallback fetch
    #[arg(long, env = "ARTICLE_HARVEST_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// User-Agent header for the structural fallback fetch
    #[arg(long, env = "ARTICLE_HARVEST_USER_AGENT")]
    pub user_agent: Option<String>,
}
