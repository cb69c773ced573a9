//! # Article Harvest
//!
//! Fetches news pages listed in a CSV dataset, extracts each page's title and
//! main article text, and appends the results to a CSV store. Runs are
//! resumable: URLs already in the store are never fetched again.
//!
//! ## Usage
//!
//! ```sh
//! article_harvest -i dataset4_cleaned.csv -o clean_articles.csv
//! ```
//!
//! ## Architecture
//!
//! 1. **Loading**: read the URL column of the input dataset
//! 2. **Sampling**: draw a fixed fraction of the distinct candidates
//! 3. **Resume**: skip URLs already present in the output store
//! 4. **Harvesting**: extract articles concurrently (30 in flight by default),
//!    trying a paragraph-cluster heuristic first and a structural container
//!    lookup second, appending each success as one CSV row
//!
//! Ctrl-C stops new fetches, lets in-flight ones finish and exits cleanly;
//! the next run picks up where this one stopped.

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod dataset;
mod error;
mod extractors;
mod http;
mod models;
mod pipeline;
mod pool;
mod selection;
mod store;
mod utils;

use cli::Cli;
use config::PipelineConfig;
use pipeline::{RunOutcome, interrupt_signal, run_pipeline};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("article_harvest starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let config = match PipelineConfig::load(&args) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };

    let outcome = match run_pipeline(&config, interrupt_signal()).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(error = %e, "Run failed");
            return Err(e);
        }
    };

    match outcome {
        RunOutcome::NothingToDo => {
            println!("All URLs are already processed. Nothing to do!");
        }
        RunOutcome::Completed(summary) => {
            println!(
                "Processed {} URLs: {} articles saved, {} failed. Output: {}",
                summary.attempted,
                summary.saved,
                summary.failed,
                config.output_path.display()
            );
        }
        RunOutcome::Interrupted(summary) => {
            println!(
                "Process interrupted after {} of {} URLs. {} articles saved to {}.",
                summary.attempted,
                summary.total,
                summary.saved,
                config.output_path.display()
            );
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}
