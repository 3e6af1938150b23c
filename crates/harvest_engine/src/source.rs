use std::sync::{Arc, Mutex};

use harvest_core::RawItem;
use harvest_logging::harvest_debug;

use crate::decode::decode_payload;
use crate::fetch::{FetchRequest, Fetcher};
use crate::parse::{parse_chart_count, parse_chart_page, parse_listing_count, parse_listing_page};
use crate::HarvestError;

pub const DEFAULT_BASE_URL: &str = "https://movie.douban.com";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120 Safari/537.36";

/// A ranked list reachable page by page.
#[async_trait::async_trait]
pub trait PageSource: Send + Sync {
    /// Dedicated count query for the whole list.
    async fn total_count(&self) -> Result<usize, HarvestError>;

    /// Items in the window `[offset, offset + limit)`. An empty vector means
    /// the source has nothing more to give.
    async fn fetch_page(&self, offset: usize, limit: usize) -> Result<Vec<RawItem>, HarvestError>;
}

async fn fetch_text(fetcher: &dyn Fetcher, request: &FetchRequest) -> Result<String, HarvestError> {
    let output = fetcher.fetch(request).await?;
    harvest_debug!(
        "fetched {} ({} bytes, {:?})",
        output.metadata.final_url,
        output.metadata.byte_len,
        output.metadata.content_type
    );
    let decoded = decode_payload(&output.bytes, output.metadata.content_type.as_deref())
        .map_err(crate::ParseError::from)?;
    Ok(decoded.text)
}

/// The HTML "Top 250" list: `/top250?start=N`, fixed page size on the site.
///
/// The site always answers with up to [`Self::PAGE_SIZE`] items from `start`,
/// so a window of any other size is cut from (or stitched across) site pages.
pub struct Top250Source {
    fetcher: Arc<dyn Fetcher>,
    base_url: String,
    // Page `start=0` as fetched by the count query, handed to the first page request.
    first_page: Mutex<Option<String>>,
}

impl Top250Source {
    pub const PAGE_SIZE: usize = 25;

    pub fn new(fetcher: Arc<dyn Fetcher>, base_url: impl Into<String>) -> Self {
        Self {
            fetcher,
            base_url: trim_base(base_url.into()),
            first_page: Mutex::new(None),
        }
    }

    fn page_request(&self, offset: usize) -> FetchRequest {
        FetchRequest::new(format!("{}/top250", self.base_url))
            .query("start", offset)
            .headers(&[("User-Agent", USER_AGENT)])
    }

    async fn page_html(&self, request: &FetchRequest, start: usize) -> Result<String, HarvestError> {
        if start == 0 {
            let cached = self.first_page.lock().ok().and_then(|mut slot| slot.take());
            if let Some(html) = cached {
                harvest_debug!("reusing first page from the count query");
                return Ok(html);
            }
        }
        fetch_text(self.fetcher.as_ref(), request).await
    }
}

#[async_trait::async_trait]
impl PageSource for Top250Source {
    async fn total_count(&self) -> Result<usize, HarvestError> {
        let html = fetch_text(self.fetcher.as_ref(), &self.page_request(0)).await?;
        let total = parse_listing_count(&html)?;
        if let Ok(mut slot) = self.first_page.lock() {
            *slot = Some(html);
        }
        Ok(total)
    }

    async fn fetch_page(&self, offset: usize, limit: usize) -> Result<Vec<RawItem>, HarvestError> {
        let mut items = Vec::with_capacity(limit);
        let mut start = offset;
        while items.len() < limit {
            let request = self.page_request(start);
            let html = self.page_html(&request, start).await?;
            let listings = parse_listing_page(&html, Some(&request.url))?;
            let served = listings.len();
            let wanted = limit - items.len();
            items.extend(listings.into_iter().take(wanted).map(RawItem::Listing));
            // A short site page is the end of the list.
            if served < Self::PAGE_SIZE {
                break;
            }
            start += served.min(wanted);
        }
        Ok(items)
    }
}

/// The JSON type-ranking endpoints (`/j/chart/top_list_count`, `/j/chart/top_list`).
pub struct ChartSource {
    fetcher: Arc<dyn Fetcher>,
    base_url: String,
    type_id: u32,
    interval_id: String,
}

impl ChartSource {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        base_url: impl Into<String>,
        type_id: u32,
        interval_id: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            base_url: trim_base(base_url.into()),
            type_id,
            interval_id: interval_id.into(),
        }
    }

    fn request(&self, path: &str) -> FetchRequest {
        let referer = format!("{}/chart", self.base_url);
        FetchRequest::new(format!("{}{}", self.base_url, path))
            .query("type", self.type_id)
            .query("interval_id", &self.interval_id)
            .headers(&[
                ("User-Agent", USER_AGENT),
                ("Referer", referer.as_str()),
                ("Accept", "application/json, text/javascript, */*; q=0.01"),
                ("X-Requested-With", "XMLHttpRequest"),
            ])
    }
}

#[async_trait::async_trait]
impl PageSource for ChartSource {
    async fn total_count(&self) -> Result<usize, HarvestError> {
        let json = fetch_text(self.fetcher.as_ref(), &self.request("/j/chart/top_list_count")).await?;
        Ok(parse_chart_count(&json)?)
    }

    async fn fetch_page(&self, offset: usize, limit: usize) -> Result<Vec<RawItem>, HarvestError> {
        let request = self
            .request("/j/chart/top_list")
            .query("action", "")
            .query("start", offset)
            .query("limit", limit);
        let json = fetch_text(self.fetcher.as_ref(), &request).await?;
        let entries = parse_chart_page(&json)?;
        Ok(entries.into_iter().map(RawItem::Chart).collect())
    }
}

fn trim_base(mut base: String) -> String {
    while base.ends_with('/') {
        base.pop();
    }
    base
}
