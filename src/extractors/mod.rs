//! Article extraction strategies.
//!
//! Each strategy turns a URL into an [`ExtractionResult`]. Failures are values,
//! never errors: network, status and parse problems are logged inside the
//! strategy and reported as [`ExtractionResult::Failure`].
//!
//! # Strategies
//!
//! | Strategy | Module | Fetch | Heuristic |
//! |----------|--------|-------|-----------|
//! | Paragraph clusters | [`article`] | own client | scores `p`/`pre`/`td` blocks by stop-word density |
//! | Structural | [`structural`] | shared client | first `article`, `div.article-content`, `div#main-content` |
//!
//! [`FallbackChain`] composes two strategies so the second one only runs when
//! the first fails.

use crate::models::ExtractionResult;
use std::fmt;
use tracing::{debug, instrument, warn};

pub mod article;
pub mod structural;

pub use article::ParagraphExtractor;
pub use structural::StructuralExtractor;

/// Something that can turn a URL into a title and body text.
pub trait ArticleExtractor {
    /// Short strategy name used in logs.
    fn name(&self) -> &'static str;

    /// Attempt an extraction. Never fails with an error; see [`ExtractionResult`].
    async fn extract(&self, url: &str) -> ExtractionResult;
}

/// Ordered fallback between two strategies.
///
/// `secondary` is only consulted when `primary` returns
/// [`ExtractionResult::Failure`].
pub struct FallbackChain<P, S> {
    primary: P,
    secondary: S,
}

impl<P, S> FallbackChain<P, S>
where
    P: ArticleExtractor,
    S: ArticleExtractor,
{
    pub fn new(primary: P, secondary: S) -> Self {
        Self { primary, secondary }
    }
}

impl<P, S> fmt::Debug for FallbackChain<P, S>
where
    P: ArticleExtractor,
    S: ArticleExtractor,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FallbackChain")
            .field("primary", &self.primary.name())
            .field("secondary", &self.secondary.name())
            .finish()
    }
}

impl<P, S> ArticleExtractor for FallbackChain<P, S>
where
    P: ArticleExtractor,
    S: ArticleExtractor,
{
    fn name(&self) -> &'static str {
        "fallback-chain"
    }

    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn extract(&self, url: &str) -> ExtractionResult {
        let first = self.primary.extract(url).await;
        if first.is_success() {
            debug!(strategy = self.primary.name(), "Extracted article");
            return first;
        }

        debug!(
            failed = self.primary.name(),
            next = self.secondary.name(),
            "Primary extraction failed; falling back"
        );
        let second = self.secondary.extract(url).await;
        if second.is_success() {
            debug!(strategy = self.secondary.name(), "Extracted article");
        } else {
            warn!(%url, "All extraction strategies failed; skipping URL");
        }
        second
    }
}
