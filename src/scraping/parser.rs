//! Extraction of ranked listings from tophub-style pages.
//!
//! A page holds a listing container with one "source card" per provider. Each
//! card carries a `node-` prefixed id, a display name and a scrollable block of
//! item anchors. Missing pieces degrade to empty fields; only a card without an
//! acceptable id or without a content block is dropped.

use scraper::{ElementRef, Html, Selector};

use crate::scraping::error::ScrapingError;
use crate::scraping::types::TrendEntry;

/// Path to the listing container.
const CONTAINER: &str = "#page > div.c-d.c-d-e > div.bc > div.bc-cc";
/// Class prefix identifying source cards.
const CARD_CLASS_PREFIX: &str = "cc-cd";
/// Required prefix of a card id.
const NODE_ID_PREFIX: &str = "node-";
const CARD_NAME: &str = "div.cc-cd-ih > div.cc-cd-is > a > div.cc-cd-lb";
const CARD_CONTENT: &str = "div.cc-cd-cb > div.nano-content";
const ITEM_ROW: &str = "div.cc-cd-cb-ll";

/// Compiled selectors for a listing page.
#[derive(Debug)]
pub struct TrendParser {
    container: Selector,
    div: Selector,
    card_name: Selector,
    card_content: Selector,
    anchor: Selector,
    item_row: Selector,
    rank: Selector,
    title: Selector,
    extra: Selector,
}

impl TrendParser {
    /// Compile the listing selectors.
    ///
    /// # Errors
    /// Returns an error if a built-in selector fails to parse.
    pub fn new() -> Result<Self, ScrapingError> {
        Ok(Self {
            container: selector(CONTAINER)?,
            div: selector("div")?,
            card_name: selector(CARD_NAME)?,
            card_content: selector(CARD_CONTENT)?,
            anchor: selector("a")?,
            item_row: selector(ITEM_ROW)?,
            rank: selector("span.s")?,
            title: selector("span.t")?,
            extra: selector("span.e")?,
        })
    }

    /// Extract every listing item of a page.
    ///
    /// Returns an empty list when the page has no listing container. The
    /// `scrape_time` and `page_url` fields are left empty for the caller to stamp.
    #[must_use]
    pub fn parse(&self, html: &str) -> Vec<TrendEntry> {
        let document = Html::parse_document(html);

        let Some(container) = document.select(&self.container).next() else {
            tracing::debug!("Listing container not found");
            return Vec::new();
        };

        let mut results = Vec::new();
        for card in container.select(&self.div).filter(is_source_card) {
            let node_id = card.value().attr("id").unwrap_or_default();
            if !node_id.starts_with(NODE_ID_PREFIX) {
                continue;
            }

            let node_name = first_text(card, &self.card_name);

            let Some(content) = card.select(&self.card_content).next() else {
                tracing::debug!("Card {node_id} has no content block");
                continue;
            };

            for anchor in content.select(&self.anchor) {
                // Anchors outside an item row are navigation, not listing items.
                let Some(row) = anchor.select(&self.item_row).next() else {
                    continue;
                };

                results.push(TrendEntry {
                    node_id: node_id.to_string(),
                    node_name: node_name.clone(),
                    rank: first_text(row, &self.rank),
                    title: first_text(row, &self.title),
                    link: anchor.value().attr("href").unwrap_or_default().trim().to_string(),
                    extra: first_text(row, &self.extra),
                    ..TrendEntry::default()
                });
            }
        }

        results
    }
}

fn selector(css: &str) -> Result<Selector, ScrapingError> {
    Selector::parse(css).map_err(|e| ScrapingError::HtmlParse(format!("Invalid selector {css}: {e:?}")))
}

fn is_source_card(element: &ElementRef<'_>) -> bool {
    element
        .value()
        .classes()
        .any(|class| class.starts_with(CARD_CLASS_PREFIX))
}

/// Text of the first match, each text node trimmed, or an empty string.
fn first_text(scope: ElementRef<'_>, selector: &Selector) -> String {
    scope
        .select(selector)
        .next()
        .map(|e| e.text().map(str::trim).collect::<String>())
        .unwrap_or_default()
}
