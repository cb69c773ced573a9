//! Per-run work selection: random sampling and resume de-duplication.

use itertools::Itertools;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use std::collections::HashSet;
use tracing::{debug, info};

/// Number of URLs drawn from `candidates` at `fraction`, rounded down.
pub fn sample_size(candidates: usize, fraction: f64) -> usize {
    ((candidates as f64) * fraction).floor() as usize
}

/// Draw `floor(fraction × n)` distinct URLs, without replacement.
///
/// Candidates are de-duplicated and sorted before drawing so that a given
/// `seed` always selects the same URLs regardless of input order. Without a
/// seed the draw is seeded from OS entropy.
pub fn sample_urls(candidates: &[String], fraction: f64, seed: Option<u64>) -> Vec<String> {
    let mut pool: Vec<&String> = candidates.iter().collect();
    pool.sort();
    pool.dedup();

    let size = sample_size(pool.len(), fraction);
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let sampled: Vec<String> = pool
        .choose_multiple(&mut rng, size)
        .map(|url| (*url).clone())
        .collect();

    info!(
        candidates = pool.len(),
        fraction,
        sampled = sampled.len(),
        seeded = seed.is_some(),
        "Sampled candidate URLs"
    );
    sampled
}

/// URLs of `sampled` that are not yet in `done`, each listed once.
pub fn pending_urls(sampled: &[String], done: &HashSet<String>) -> Vec<String> {
    let pending: Vec<String> = sampled
        .iter()
        .filter(|url| !done.contains(*url))
        .unique()
        .cloned()
        .collect();
    debug!(
        sampled = sampled.len(),
        done = done.len(),
        pending = pending.len(),
        "Computed pending URLs"
    );
    pending
}
