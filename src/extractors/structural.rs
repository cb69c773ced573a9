//! Structural fallback extraction.
//!
//! Fetches raw HTML with the shared client from [`FetchContext`] and takes
//! the first element matching, in order:
//!
//! 1. `article`
//! 2. `div.article-content`
//! 3. `div#main-content`
//!
//! The title is the trimmed `<title>`; the text is every visible text node
//! of the matched container, trimmed and joined with single spaces.

use super::ArticleExtractor;
use crate::http::{FetchContext, fetch_html};
use crate::models::ExtractionResult;
use crate::utils::truncate_for_log;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument, warn};

static CONTAINERS: Lazy<[Selector; 3]> = Lazy::new(|| {
    ["article", "div.article-content", "div#main-content"].map(|s| Selector::parse(s).unwrap())
});
static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("title").unwrap());

/// Elements whose text is never rendered.
const INVISIBLE: [&str; 4] = ["script", "style", "noscript", "template"];

/// Visible text of `el`, one trimmed piece per text node, space separated.
fn visible_text(el: ElementRef) -> String {
    el.descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let hidden = node
                .ancestors()
                .filter_map(ElementRef::wrap)
                .take_while(|a| a.id() != el.id())
                .any(|a| INVISIBLE.contains(&a.value().name()));
            (!hidden).then(|| text.trim())
        })
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Run the container-lookup heuristic over an HTML document.
pub fn parse_structural(html: &str) -> ExtractionResult {
    let document = Html::parse_document(html);

    let Some(container) = CONTAINERS
        .iter()
        .find_map(|selector| document.select(selector).next())
    else {
        return ExtractionResult::Failure;
    };

    let title = document
        .select(&TITLE)
        .next()
        .map(|t| t.text().collect::<String>());
    ExtractionResult::from_parts(title, Some(visible_text(container)))
}

/// Fallback strategy built on the shared, pooled HTTP client.
#[derive(Debug, Clone)]
pub struct StructuralExtractor {
    client: reqwest::Client,
}

impl StructuralExtractor {
    pub fn new(context: &FetchContext) -> Self {
        Self {
            client: context.client.clone(),
        }
    }
}

impl ArticleExtractor for StructuralExtractor {
    fn name(&self) -> &'static str {
        "structural"
    }

    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn extract(&self, url: &str) -> ExtractionResult {
        let html = match fetch_html(&self.client, url).await {
            Ok(html) => html,
            Err(e) => {
                warn!(%url, error = %truncate_for_log(&e.to_string(), 300), "Error processing URL");
                return ExtractionResult::Failure;
            }
        };
        let result = parse_structural(&html);
        if !result.is_success() {
            debug!("No article container found");
        }
        result
    }
}
