//! Tolerant extraction of offer blocks from listing markup.
//!
//! Block discovery and every per-field lookup are ordered strategy lists:
//! the first selector that matches wins. More specific automation
//! attributes come before generic class names and heading tags.

use std::collections::HashSet;
use std::sync::LazyLock;

use offerwatch_core::RawOffer;
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};

const BLOCK_SELECTORS: &[&str] = &[
    "[data-automation-id^='offer']",
    ".offer-card",
    "article.offer-card",
    "li.offer-card",
    ".searchResult",
    "article.searchResult",
];

const LINK_SELECTORS: &[&str] = &["a[href]"];

const TITLE_SELECTORS: &[&str] = &[
    "[data-automation-id='offerTitle']",
    ".offer-card__title",
    ".offerTitle",
    "h3",
    "h2",
];

const TEXT_SELECTORS: &[&str] = &[
    "[data-automation-id='offerDescription']",
    ".offer-card__content",
    ".cell.details ul",
    ".cell.details",
    "p",
];

const CATEGORY_SELECTORS: &[&str] = &[
    "[data-automation-id='offerCategory']",
    ".offer-card__category",
    ".detailsOfferTypes",
];

fn compile(selectors: &[&str]) -> Vec<Selector> {
    selectors
        .iter()
        .map(|s| Selector::parse(s).expect("valid offer selector"))
        .collect()
}

static BLOCKS: LazyLock<Vec<Selector>> = LazyLock::new(|| compile(BLOCK_SELECTORS));
static LINK: LazyLock<Vec<Selector>> = LazyLock::new(|| compile(LINK_SELECTORS));
static TITLE: LazyLock<Vec<Selector>> = LazyLock::new(|| compile(TITLE_SELECTORS));
static TEXT: LazyLock<Vec<Selector>> = LazyLock::new(|| compile(TEXT_SELECTORS));
static CATEGORY: LazyLock<Vec<Selector>> = LazyLock::new(|| compile(CATEGORY_SELECTORS));

/// Extracts raw offers from a listing page.
///
/// Never fails: markup that yields no recognizable blocks, or a base URL
/// that cannot be parsed, produces an empty vector. Blocks without a link,
/// title, or text element are skipped; category is optional.
#[must_use]
pub fn extract_offers(body: &str, base_url: &str) -> Vec<RawOffer> {
    let base = match Url::parse(base_url) {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!(base_url, error = %e, "cannot resolve offer links without a valid base URL");
            return Vec::new();
        }
    };

    let document = Html::parse_document(body);
    let blocks = collect_blocks(&document);

    let offers: Vec<RawOffer> = blocks
        .into_iter()
        .filter_map(|block| offer_from_block(block, &base))
        .collect();

    tracing::debug!(base_url, offers = offers.len(), "extracted offer blocks");
    offers
}

/// Applies every block selector and keeps each matched element once, in
/// first-match order. Several selectors routinely hit the same card.
fn collect_blocks(document: &Html) -> Vec<ElementRef<'_>> {
    let mut seen = HashSet::new();
    let mut blocks = Vec::new();
    for selector in BLOCKS.iter() {
        for element in document.select(selector) {
            if seen.insert(element.id()) {
                blocks.push(element);
            }
        }
    }
    blocks
}

fn first_match<'a>(block: ElementRef<'a>, chain: &[Selector]) -> Option<ElementRef<'a>> {
    chain
        .iter()
        .find_map(|selector| block.select(selector).next())
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect()
}

fn offer_from_block(block: ElementRef<'_>, base: &Url) -> Option<RawOffer> {
    let link_el = first_match(block, &LINK)?;
    let title_el = first_match(block, &TITLE)?;
    let text_el = first_match(block, &TEXT)?;

    let href = link_el.value().attr("href")?.trim();
    if href.is_empty() {
        return None;
    }
    let link = match base.join(href) {
        Ok(url) => url.to_string(),
        Err(e) => {
            tracing::debug!(href, error = %e, "skipping offer with unresolvable link");
            return None;
        }
    };

    Some(RawOffer {
        title: text_of(title_el),
        text: text_of(text_el),
        link,
        category: first_match(block, &CATEGORY).map(text_of),
    })
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
