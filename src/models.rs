//! Data models shared by the extractors, the worker pool and the store.
//!
//! - [`Record`]: one persisted `(url, title, text)` row
//! - [`ExtractionResult`]: outcome of running a strategy against a URL
//!
//! The pool only builds a [`Record`] from a successful extraction, so a stored
//! row never carries an empty title or empty text.

use serde::Deserialize;

/// Title and body text produced by a successful extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedArticle {
    /// Page title, trimmed.
    pub title: String,
    /// Main body text.
    pub text: String,
}

/// Outcome of an extraction attempt.
///
/// There are no partial results: a title without text (or the reverse)
/// is a [`ExtractionResult::Failure`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionResult {
    Success(ExtractedArticle),
    Failure,
}

impl ExtractionResult {
    /// Build a result from optional parts, requiring both to be non-blank.
    ///
    /// The title is trimmed; the text is kept as-is apart from surrounding
    /// whitespace.
    pub fn from_parts(title: Option<String>, text: Option<String>) -> Self {
        let title = title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
        let text = text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
        match (title, text) {
            (Some(title), Some(text)) => Self::Success(ExtractedArticle { title, text }),
            _ => Self::Failure,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// A persisted article row.
///
/// Field order and names match the store header `URL,Title,Text`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Record {
    #[serde(rename = "URL")]
    pub url: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Text")]
    pub text: String,
}

impl Record {
    pub fn new(url: impl Into<String>, article: ExtractedArticle) -> Self {
        Self {
            url: url.into(),
            title: article.title,
            text: article.text,
        }
    }
}
