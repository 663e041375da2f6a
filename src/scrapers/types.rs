use crate::models::Property;
use serde::Serialize;
use url::Url;

/// Listing data as found in the site's embedded models, enriched stage by stage.
pub type RawListing = serde_json::Map<String, serde_json::Value>;

/// One pending fetch and the continuation state it carries
#[derive(Debug, Clone)]
pub enum CrawlRequest {
    /// A result page. Only configured search URLs resolve further pages.
    SearchPage { url: Url, paginate: bool },
    /// A listing detail page
    DetailPage {
        url: Url,
        raw: RawListing,
        existing: Option<Property>,
    },
    /// The first floor-plan image of a listing
    FloorPlan {
        url: Url,
        raw: RawListing,
        existing: Option<Property>,
    },
}

impl CrawlRequest {
    pub fn url(&self) -> &Url {
        match self {
            CrawlRequest::SearchPage { url, .. }
            | CrawlRequest::DetailPage { url, .. }
            | CrawlRequest::FloorPlan { url, .. } => url,
        }
    }

    pub fn stage(&self) -> &'static str {
        match self {
            CrawlRequest::SearchPage { .. } => "search",
            CrawlRequest::DetailPage { .. } => "detail",
            CrawlRequest::FloorPlan { .. } => "floorplan",
        }
    }

    /// Listing id carried by detail and floor-plan requests.
    pub fn listing_id(&self) -> Option<&str> {
        match self {
            CrawlRequest::SearchPage { .. } => None,
            CrawlRequest::DetailPage { raw, .. } | CrawlRequest::FloorPlan { raw, .. } => {
                raw.get("id").and_then(|id| id.as_str())
            }
        }
    }
}

/// What handling one request produced
#[derive(Debug)]
pub enum Step {
    Follow(CrawlRequest),
    Emit(Property),
}

/// Counters for a finished crawl
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct CrawlStats {
    pub pages_fetched: usize,
    pub listings_seen: usize,
    pub banned_skipped: usize,
    pub properties_emitted: usize,
    pub failed_branches: usize,
    pub sink_failures: usize,
}
