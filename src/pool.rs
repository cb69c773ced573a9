//! Bounded-concurrency fetch-and-extract worker pool.
//!
//! Every pending URL becomes one unit of work: run the extractor, append the
//! record on success, count the attempt either way. Units run concurrently on
//! the current task through `buffer_unordered`, which admits at most
//! `concurrency` of them at a time; a new unit starts only when a running one
//! finishes.
//!
//! # Interruption
//!
//! The shutdown future is polled next to the running units for the whole run,
//! including the final drain after the last URL has been scheduled. Once it
//! resolves no further URLs are started. Units already in flight run to
//! completion, bounded by their HTTP timeouts, and the run returns a summary
//! flagged as interrupted. Records appended so far are complete rows, so
//! nothing else needs cleaning up.

use crate::error::StoreError;
use crate::extractors::ArticleExtractor;
use crate::models::{ExtractionResult, Record};
use crate::store::RecordStore;
use futures::FutureExt;
use futures::stream::{self, StreamExt};
use std::future::{Future, ready};
use std::pin::pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument, warn};

/// Outcome counters for one pool run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// URLs handed to the pool.
    pub total: usize,
    /// Units that ran to completion, successful or not.
    pub attempted: usize,
    /// Records appended to the store.
    pub saved: usize,
    /// Attempts where every strategy failed.
    pub failed: usize,
    /// The run stopped early because of an interrupt.
    pub interrupted: bool,
    pub elapsed: Duration,
}

/// Attempt counter, logged every `every` completions and at the end.
#[derive(Debug)]
struct Progress {
    total: usize,
    every: usize,
    attempted: usize,
    saved: usize,
}

impl Progress {
    fn new(total: usize, every: usize) -> Self {
        Self {
            total,
            every: every.max(1),
            attempted: 0,
            saved: 0,
        }
    }

    fn record(&mut self, saved: bool) {
        self.attempted += 1;
        if saved {
            self.saved += 1;
        }
        if self.attempted % self.every == 0 || self.attempted == self.total {
            info!(
                completed = self.attempted,
                total = self.total,
                saved = self.saved,
                "Processing URLs"
            );
        }
    }
}

/// Runs the extractor over many URLs under a fixed concurrency ceiling.
pub struct FetchWorkerPool<'a, E> {
    extractor: E,
    store: &'a RecordStore,
    concurrency: usize,
    progress_every: usize,
}

impl<'a, E> FetchWorkerPool<'a, E>
where
    E: ArticleExtractor,
{
    /// `concurrency` is clamped to at least one in-flight unit.
    pub fn new(extractor: E, store: &'a RecordStore, concurrency: usize) -> Self {
        Self {
            extractor,
            store,
            concurrency: concurrency.max(1),
            progress_every: 50,
        }
    }

    pub fn with_progress_every(mut self, every: usize) -> Self {
        self.progress_every = every;
        self
    }

    /// Process every URL in `pending` until done or `shutdown` resolves.
    ///
    /// Per-URL extraction failures are counted, never returned. A failed
    /// store append is fatal: it is logged and returned, dropping any units
    /// still in flight.
    #[instrument(level = "info", skip_all, fields(total = pending.len(), concurrency = self.concurrency))]
    pub async fn run<F>(&self, pending: Vec<String>, shutdown: F) -> Result<RunSummary, StoreError>
    where
        F: Future<Output = ()>,
    {
        let started = Instant::now();
        let total = pending.len();
        let interrupted = AtomicBool::new(false);
        let mut shutdown = pin!(shutdown.fuse());

        let mut progress = Progress::new(total, self.progress_every);
        let mut units = pin!(
            stream::iter(pending)
                .take_while(|_| ready(!interrupted.load(Ordering::SeqCst)))
                .map(|url| self.process(url))
                .buffer_unordered(self.concurrency)
        );

        loop {
            tokio::select! {
                biased;
                () = &mut shutdown => {
                    interrupted.store(true, Ordering::SeqCst);
                    warn!(
                        completed = progress.attempted,
                        "Interrupt received; finishing in-flight URLs without starting new ones"
                    );
                }
                outcome = units.next() => match outcome {
                    Some(Ok(saved)) => progress.record(saved),
                    Some(Err(e)) => {
                        error!(
                            error = %e,
                            path = %self.store.path().display(),
                            attempted = progress.attempted,
                            saved = progress.saved,
                            "Record store write failed; aborting run"
                        );
                        return Err(e);
                    }
                    None => break,
                },
            }
        }

        let summary = RunSummary {
            total,
            attempted: progress.attempted,
            saved: progress.saved,
            failed: progress.attempted - progress.saved,
            interrupted: interrupted.load(Ordering::SeqCst),
            elapsed: started.elapsed(),
        };
        info!(
            attempted = summary.attempted,
            saved = summary.saved,
            failed = summary.failed,
            interrupted = summary.interrupted,
            elapsed = ?summary.elapsed,
            "Worker pool finished"
        );
        Ok(summary)
    }

    /// One unit: extract, then append on success. Returns whether a record was saved.
    async fn process(&self, url: String) -> Result<bool, StoreError> {
        match self.extractor.extract(&url).await {
            ExtractionResult::Success(article) => {
                let record = Record::new(url, article);
                self.store.append(&record)?;
                debug!(url = %record.url, "Saved article");
                Ok(true)
            }
            ExtractionResult::Failure => Ok(false),
        }
    }
}
