//! Error types for the harvesting pipeline.
//!
//! Per-URL failures ([`FetchError`]) never leave the extraction strategies;
//! they are logged and folded into [`crate::models::ExtractionResult::Failure`].
//! Store, dataset and configuration errors are the ones that reach `main`.

use thiserror::Error;

/// A network fetch that did not produce a usable HTML body.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Connection, TLS, timeout or body-decoding failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("{url} returned status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
}

/// Failure to read or append to the record store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The store's header row does not carry a required column.
    #[error("store header is missing the '{0}' column")]
    MissingColumn(&'static str),
}

/// Failure to load the candidate URL dataset.
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("dataset has no column named '{0}'")]
    MissingColumn(String),
}

/// Failure to load or validate the pipeline configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error reading config: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }
}
