//! Payload parsers for the two ranked-list shapes.
//!
//! Parsers only extract raw text; turning it into records is the
//! normalizer's job.

use harvest_core::{ChartEntry, RawListing};
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use url::Url;

use crate::ParseError;

const LIST_SELECTOR: &str = ".grid_view";
const COUNT_SELECTOR: &str = ".paginator .count, span.count";

struct ListingSelectors {
    list: Selector,
    item: Selector,
    title: Selector,
    rating: Selector,
    info: Selector,
    rank: Selector,
    link: Selector,
    cover: Selector,
    star_spans: Selector,
}

impl ListingSelectors {
    fn new() -> Option<Self> {
        Some(Self {
            list: Selector::parse(LIST_SELECTOR).ok()?,
            item: Selector::parse("li").ok()?,
            title: Selector::parse(".title").ok()?,
            rating: Selector::parse(".rating_num").ok()?,
            info: Selector::parse(".bd p").ok()?,
            rank: Selector::parse(".pic em").ok()?,
            link: Selector::parse(".hd a").ok()?,
            cover: Selector::parse(".pic img").ok()?,
            star_spans: Selector::parse(".star span").ok()?,
        })
    }
}

/// Parse one HTML list page into raw listings.
///
/// A page without the list container is a shape error; a container with no
/// items is an empty page.
pub fn parse_listing_page(html: &str, base_url: Option<&str>) -> Result<Vec<RawListing>, ParseError> {
    let selectors = ListingSelectors::new().ok_or(ParseError::MissingElement {
        selector: LIST_SELECTOR,
    })?;
    let doc = Html::parse_document(html);
    let list = doc
        .select(&selectors.list)
        .next()
        .ok_or(ParseError::MissingElement {
            selector: LIST_SELECTOR,
        })?;
    let base = base_url.and_then(|b| Url::parse(b).ok());

    Ok(list
        .select(&selectors.item)
        .map(|li| parse_listing(li, &selectors, base.as_ref()))
        .collect())
}

fn parse_listing(li: ElementRef, sel: &ListingSelectors, base: Option<&Url>) -> RawListing {
    // Several `.title` spans may exist (original + foreign title); the first is the display title.
    let title = first_text(li, &sel.title);
    let votes = li
        .select(&sel.star_spans)
        .map(element_text)
        .filter(|t| t.contains('评') || t.ends_with("votes"))
        .last();

    RawListing {
        rank: first_text(li, &sel.rank),
        title,
        rating: first_text(li, &sel.rating),
        info_block: li
            .select(&sel.info)
            .next()
            .map(|p| p.text().collect::<String>()),
        votes,
        url: first_attr(li, &sel.link, "href").and_then(|href| resolve(&href, base)),
        cover_url: first_attr(li, &sel.cover, "src").and_then(|src| resolve(&src, base)),
    }
}

fn first_text(el: ElementRef, sel: &Selector) -> Option<String> {
    el.select(sel).next().map(element_text)
}

fn element_text(el: ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn first_attr(el: ElementRef, sel: &Selector, attr: &str) -> Option<String> {
    el.select(sel)
        .next()
        .and_then(|node| node.value().attr(attr))
        .map(|v| v.trim().to_string())
}

fn resolve(reference: &str, base: Option<&Url>) -> Option<String> {
    if reference.is_empty() {
        return None;
    }
    if let Ok(url) = Url::parse(reference) {
        return Some(url.into());
    }
    base.and_then(|b| b.join(reference).ok()).map(Into::into)
}

/// Read the announced total from the HTML pager, e.g. `(共250条)`.
pub fn parse_listing_count(html: &str) -> Result<usize, ParseError> {
    let selector = Selector::parse(COUNT_SELECTOR).map_err(|_| ParseError::MissingElement {
        selector: COUNT_SELECTOR,
    })?;
    let doc = Html::parse_document(html);
    let text = doc
        .select(&selector)
        .next()
        .map(element_text)
        .ok_or(ParseError::MissingElement {
            selector: COUNT_SELECTOR,
        })?;
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    digits.parse().map_err(|_| ParseError::BadCount { text })
}

#[derive(Debug, Deserialize)]
struct CountPayload {
    total: usize,
}

/// Parse the JSON count endpoint (`{"total": N}`).
pub fn parse_chart_count(json: &str) -> Result<usize, ParseError> {
    let payload: CountPayload = serde_json::from_str(json)?;
    Ok(payload.total)
}

/// Parse one JSON chart page (an array of entries).
pub fn parse_chart_page(json: &str) -> Result<Vec<ChartEntry>, ParseError> {
    Ok(serde_json::from_str(json)?)
}
