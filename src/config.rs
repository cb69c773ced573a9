//! Pipeline configuration.
//!
//! Settings are layered: built-in defaults, then an optional YAML file, then
//! command-line flags. The resolved [`PipelineConfig`] is validated once at
//! startup and passed by reference to everything that needs it.
//!
//! # Example YAML
//!
//! ```yaml
//! input_path: data/events.csv
//! url_column: SOURCEURL
//! output_path: out/clean_articles.csv
//! concurrency: 30
//! sample_fraction: 0.1
//! seed: 42
//! structural:
//!   timeout_secs: 10
//!   user_agent: Mozilla/5.0
//! article:
//!   timeout_secs: 7
//! ```

use crate::cli::Cli;
use crate::error::ConfigError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Ceiling on simultaneously in-flight extractions.
pub const DEFAULT_CONCURRENCY: usize = 30;
/// Share of candidate URLs attempted per run.
pub const DEFAULT_SAMPLE_FRACTION: f64 = 0.10;

/// HTTP settings for one fetching strategy.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct HttpSettings {
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Value of the `User-Agent` header.
    pub user_agent: String,
}

impl HttpSettings {
    fn structural() -> Self {
        Self {
            timeout_secs: 10,
            user_agent: "Mozilla/5.0".to_string(),
        }
    }

    fn article() -> Self {
        Self {
            timeout_secs: 7,
            user_agent: concat!("article_harvest/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self::structural()
    }
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    /// CSV dataset holding candidate URLs.
    pub input_path: PathBuf,
    /// Column of `input_path` that carries the URLs.
    pub url_column: String,
    /// Append-only CSV record store.
    pub output_path: PathBuf,
    pub concurrency: usize,
    pub sample_fraction: f64,
    /// Fixed RNG seed for reproducible sampling.
    pub seed: Option<u64>,
    /// Log progress every N completed attempts.
    pub progress_every: usize,
    /// Shared client used by the structural fallback.
    pub structural: HttpSettings,
    /// Client owned by the paragraph-cluster extractor.
    pub article: HttpSettings,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("dataset4_cleaned.csv"),
            url_column: "SOURCEURL".to_string(),
            output_path: PathBuf::from("clean_articles.csv"),
            concurrency: DEFAULT_CONCURRENCY,
            sample_fraction: DEFAULT_SAMPLE_FRACTION,
            seed: None,
            progress_every: 50,
            structural: HttpSettings::structural(),
            article: HttpSettings::article(),
        }
    }
}

impl PipelineConfig {
    /// Parse a YAML document; missing keys fall back to defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Read and parse a YAML config file.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path)?;
        let config = Self::from_yaml(&yaml)?;
        info!("Loaded configuration file");
        Ok(config)
    }

    /// Resolve defaults, the optional config file and CLI overrides.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let mut config = match &cli.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_cli(cli);
        config.validate()?;
        debug!(?config, "Resolved configuration");
        Ok(config)
    }

    /// Overlay any flags that were given on the command line.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(input) = &cli.input {
            self.input_path = input.clone();
        }
        if let Some(column) = &cli.column {
            self.url_column = column.clone();
        }
        if let Some(output) = &cli.output {
            self.output_path = output.clone();
        }
        if let Some(concurrency) = cli.concurrency {
            self.concurrency = concurrency;
        }
        if let Some(fraction) = cli.sample_fraction {
            self.sample_fraction = fraction;
        }
        if cli.seed.is_some() {
            self.seed = cli.seed;
        }
        if let Some(timeout) = cli.timeout_secs {
            self.structural.timeout_secs = timeout;
        }
        if let Some(agent) = &cli.user_agent {
            self.structural.user_agent = agent.clone();
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::invalid("concurrency must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.sample_fraction) {
            return Err(ConfigError::invalid(format!(
                "sample_fraction must be within [0, 1], got {}",
                self.sample_fraction
            )));
        }
        if self.url_column.trim().is_empty() {
            return Err(ConfigError::invalid("url_column must not be empty"));
        }
        for (name, http) in [("structural", &self.structural), ("article", &self.article)] {
            if http.timeout_secs == 0 {
                return Err(ConfigError::invalid(format!(
                    "{name}.timeout_secs must be at least 1"
                )));
            }
        }
        if self.progress_every == 0 {
            return Err(ConfigError::invalid("progress_every must be at least 1"));
        }
        Ok(())
    }
}
