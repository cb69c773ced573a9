//! Paragraph-cluster article extraction.
//!
//! This is the general-purpose strategy. It fetches the page with its own
//! client, then looks for the container that holds the most "prose-like"
//! paragraphs:
//!
//! 1. Every `p`, `pre` and `td` element is a candidate paragraph, unless it
//!    sits inside a candidate that already counts.
//! 2. A paragraph counts when its text has at least [`MIN_STOPWORDS`] common
//!    English stop-words and is not dominated by link text.
//! 3. Each counting paragraph adds its stop-word count to its parent and half
//!    of it to its grandparent.
//! 4. The highest scoring element is the article body; its counting
//!    paragraphs, joined by blank lines, are the text.
//!
//! The title comes from `og:title`, then `<title>`, then the first `<h1>`.
//! Pages without counting paragraphs (for example, bodies that are bare text
//! in a `div`) fail here and are left to the structural fallback.

use super::ArticleExtractor;
use crate::config::HttpSettings;
use crate::error::FetchError;
use crate::http::{build_client, fetch_html};
use crate::models::ExtractionResult;
use crate::utils::normalize_whitespace;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::{HashMap, HashSet};
use tracing::{debug, instrument};

/// Stop-words a paragraph needs before it is considered prose.
pub const MIN_STOPWORDS: usize = 2;

static PARAGRAPHS: Lazy<Selector> = Lazy::new(|| Selector::parse("p, pre, td").unwrap());
static LINKS: Lazy<Selector> = Lazy::new(|| Selector::parse("a").unwrap());
static OG_TITLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[property="og:title"]"#).unwrap());
static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("title").unwrap());
static H1: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").unwrap());
static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\p{L}']+").unwrap());

static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "about", "after", "again", "against", "all", "also", "am", "an", "and", "any",
        "are", "as", "at", "be", "because", "been", "before", "being", "between", "both",
        "but", "by", "can", "could", "did", "do", "does", "during", "each", "few", "for",
        "from", "further", "had", "has", "have", "he", "her", "here", "hers", "him", "his",
        "how", "i", "if", "in", "into", "is", "it", "its", "just", "more", "most", "my",
        "no", "nor", "not", "now", "of", "off", "on", "once", "only", "or", "other", "our",
        "out", "over", "own", "said", "same", "she", "should", "so", "some", "such", "than",
        "that", "the", "their", "them", "then", "there", "these", "they", "this", "those",
        "through", "to", "too", "under", "until", "up", "very", "was", "we", "were", "what",
        "when", "where", "which", "while", "who", "whom", "why", "will", "with", "would",
        "you", "your",
    ]
    .into_iter()
    .collect()
});

/// Count stop-words in `text`, case-insensitively.
pub fn stopword_count(text: &str) -> usize {
    WORD.find_iter(text)
        .filter(|m| STOPWORDS.contains(m.as_str().to_lowercase().as_str()))
        .count()
}

fn word_count(text: &str) -> usize {
    WORD.find_iter(text).count()
}

/// More than half of the paragraph's words sit inside links.
fn is_link_heavy(el: &ElementRef, words: usize) -> bool {
    let link_words: usize = el
        .select(&LINKS)
        .map(|a| word_count(&a.text().collect::<String>()))
        .sum();
    words > 0 && link_words * 2 > words
}

fn extract_title(document: &Html) -> Option<String> {
    let og = document
        .select(&OG_TITLE)
        .filter_map(|m| m.value().attr("content"))
        .map(normalize_whitespace)
        .find(|t| !t.is_empty());

    og.or_else(|| {
        [&*TITLE, &*H1].into_iter().find_map(|selector| {
            document
                .select(selector)
                .map(|el| normalize_whitespace(&el.text().collect::<String>()))
                .find(|t| !t.is_empty())
        })
    })
}

fn extract_body(document: &Html) -> Option<String> {
    let mut paragraphs = Vec::new();
    let mut scores = HashMap::new();
    let mut order = Vec::new();
    let mut counted = HashSet::new();

    for el in document.select(&PARAGRAPHS) {
        // A `p` inside a counted `td` is already part of that cell's text.
        if el.ancestors().any(|a| counted.contains(&a.id())) {
            continue;
        }
        let text = normalize_whitespace(&el.text().collect::<String>());
        let stopwords = stopword_count(&text);
        if stopwords < MIN_STOPWORDS || is_link_heavy(&el, word_count(&text)) {
            continue;
        }

        let score = stopwords as f64;
        let mut ancestors = el.ancestors().filter_map(ElementRef::wrap);
        for weight in [1.0, 0.5] {
            let Some(node) = ancestors.next() else { break };
            let entry = scores.entry(node.id()).or_insert_with(|| {
                order.push(node.id());
                0.0
            });
            *entry += score * weight;
        }
        counted.insert(el.id());
        paragraphs.push((el, text));
    }

    // First element in document order wins ties.
    let mut top = None;
    let mut best = 0.0;
    for id in order {
        let score = scores[&id];
        if score > best {
            best = score;
            top = Some(id);
        }
    }
    let top = top?;

    let text = paragraphs
        .into_iter()
        .filter(|(el, _)| el.ancestors().any(|a| a.id() == top))
        .map(|(_, text)| text)
        .collect::<Vec<_>>()
        .join("\n\n");
    Some(text)
}

/// Run the paragraph-cluster heuristic over an HTML document.
pub fn parse_article(html: &str) -> ExtractionResult {
    let document = Html::parse_document(html);
    let title = extract_title(&document);
    let text = extract_body(&document);
    ExtractionResult::from_parts(title, text)
}

/// General-purpose strategy that fetches pages with its own client.
#[derive(Debug, Clone)]
pub struct ParagraphExtractor {
    client: reqwest::Client,
}

impl ParagraphExtractor {
    pub fn new(settings: &HttpSettings) -> Result<Self, FetchError> {
        Ok(Self {
            client: build_client(settings)?,
        })
    }
}

impl ArticleExtractor for ParagraphExtractor {
    fn name(&self) -> &'static str {
        "paragraph-clusters"
    }

    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn extract(&self, url: &str) -> ExtractionResult {
        let html = match fetch_html(&self.client, url).await {
            Ok(html) => html,
            Err(e) => {
                debug!(error = %e, "Paragraph extractor fetch failed");
                return ExtractionResult::Failure;
            }
        };
        let result = parse_article(&html);
        if !result.is_success() {
            debug!("No paragraph cluster found");
        }
        result
    }
}
