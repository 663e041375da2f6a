use crate::error::{ScrapeError, ScrapeResult};
use crate::models::{Property, Source};
use crate::scrapers::floor_area::extract_floor_area;
use crate::scrapers::traits::{Fetcher, Ocr, PropertyLookup, RecordSink, ScraperTrait};
use crate::scrapers::types::{CrawlRequest, CrawlStats, RawListing, Step};
use crate::scrapers::{embedded, normalize, pagination};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};
use url::Url;

const SOURCE: Source = Source::Rightmove;

/// Result of handling one request
#[derive(Debug, Default)]
pub struct Outcome {
    pub steps: Vec<Step>,
    pub listings_seen: usize,
    pub banned_skipped: usize,
    pub failed_listings: usize,
}

struct Completed {
    stage: &'static str,
    url: Url,
    listing_id: Option<String>,
    result: ScrapeResult<Outcome>,
}

/// Rightmove spider: search pages, listing pages, then floor plans
///
/// Each listing is its own branch through the crawl. A branch that fails is
/// logged and dropped without touching its siblings.
#[derive(Clone)]
pub struct RightmoveSpider {
    fetcher: Arc<dyn Fetcher>,
    lookup: Arc<dyn PropertyLookup>,
    ocr: Option<Arc<dyn Ocr>>,
    searches: Vec<Url>,
    concurrency: usize,
}

impl RightmoveSpider {
    pub fn new(fetcher: Arc<dyn Fetcher>, lookup: Arc<dyn PropertyLookup>, searches: Vec<Url>) -> Self {
        Self {
            fetcher,
            lookup,
            ocr: None,
            searches,
            concurrency: 8,
        }
    }

    /// Enable the floor-plan stage
    pub fn with_ocr(mut self, ocr: Arc<dyn Ocr>) -> Self {
        self.ocr = Some(ocr);
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn start_requests(&self) -> Vec<CrawlRequest> {
        self.searches
            .iter()
            .map(|url| CrawlRequest::SearchPage {
                url: url.clone(),
                paginate: true,
            })
            .collect()
    }

    /// Run the crawl to completion, emitting every finished property to `sink`
    pub async fn crawl(&self, sink: &dyn RecordSink) -> Result<CrawlStats> {
        if self.searches.is_empty() {
            anyhow::bail!("No Rightmove searches configured");
        }

        info!(
            searches = self.searches.len(),
            concurrency = self.concurrency,
            ocr = self.ocr.is_some(),
            "Starting Rightmove crawl"
        );

        let permits = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();
        for request in self.start_requests() {
            self.spawn(&mut tasks, &permits, request);
        }

        let mut stats = CrawlStats::default();
        while let Some(joined) = tasks.join_next().await {
            let completed = match joined {
                Ok(completed) => completed,
                Err(e) => {
                    error!(error = %e, "Crawl task aborted");
                    stats.failed_branches += 1;
                    continue;
                }
            };

            let outcome = match completed.result {
                Ok(outcome) => outcome,
                Err(err) => {
                    stats.failed_branches += 1;
                    let listing_id = completed.listing_id.as_deref().unwrap_or("-");
                    if err.is_transport() {
                        warn!(stage = completed.stage, url = %completed.url, listing_id, error = %err, "Fetch failed");
                    } else {
                        stats.pages_fetched += 1;
                        error!(stage = completed.stage, url = %completed.url, listing_id, error = %err, "Page did not match the expected layout");
                    }
                    continue;
                }
            };

            stats.pages_fetched += 1;
            stats.listings_seen += outcome.listings_seen;
            stats.banned_skipped += outcome.banned_skipped;
            stats.failed_branches += outcome.failed_listings;

            for step in outcome.steps {
                match step {
                    Step::Follow(request) => self.spawn(&mut tasks, &permits, request),
                    Step::Emit(property) => match sink.emit(&property).await {
                        Ok(()) => {
                            stats.properties_emitted += 1;
                            debug!(listing_id = %property.id, "Emitted property");
                        }
                        Err(e) => {
                            stats.sink_failures += 1;
                            error!(listing_id = %property.id, error = %e, "Sink rejected property");
                        }
                    },
                }
            }
        }

        info!(
            pages = stats.pages_fetched,
            emitted = stats.properties_emitted,
            banned = stats.banned_skipped,
            failed = stats.failed_branches,
            "Rightmove crawl finished"
        );
        Ok(stats)
    }

    fn spawn(&self, tasks: &mut JoinSet<Completed>, permits: &Arc<Semaphore>, request: CrawlRequest) {
        let spider = self.clone();
        let permits = Arc::clone(permits);
        tasks.spawn(async move {
            let stage = request.stage();
            let url = request.url().clone();
            let listing_id = request.listing_id().map(str::to_string);
            let result = match permits.acquire_owned().await {
                Ok(_permit) => spider.handle(request).await,
                Err(e) => Err(ScrapeError::Transport {
                    url: url.to_string(),
                    message: e.to_string(),
                }),
            };
            Completed {
                stage,
                url,
                listing_id,
                result,
            }
        });
    }

    /// Perform one request and return what it leads to
    pub async fn handle(&self, request: CrawlRequest) -> ScrapeResult<Outcome> {
        match request {
            CrawlRequest::SearchPage { url, paginate } => self.parse_search_page(&url, paginate).await,
            CrawlRequest::DetailPage { url, raw, existing } => {
                self.parse_listing_page(&url, raw, existing).await
            }
            CrawlRequest::FloorPlan { url, raw, existing } => {
                self.parse_floor_plan(&url, raw, existing).await
            }
        }
    }

    async fn parse_search_page(&self, url: &Url, paginate: bool) -> ScrapeResult<Outcome> {
        let page = self.fetcher.fetch(url).await?;
        let model = embedded::search_model(&page.text())?;
        let mut outcome = Outcome::default();

        // Later pages are only resolved from a configured search, never from a later page.
        if paginate {
            for next in pagination::resolve_pages(&page.url, &model)? {
                outcome.steps.push(Step::Follow(CrawlRequest::SearchPage {
                    url: next,
                    paginate: false,
                }));
            }
        }

        let listings = model
            .get("properties")
            .and_then(Value::as_array)
            .ok_or_else(|| ScrapeError::schema("search", "properties missing"))?;

        debug!(url = %page.url, listings = listings.len(), "Parsed search page");

        for listing in listings {
            outcome.listings_seen += 1;
            let Value::Object(mut raw) = listing.clone() else {
                warn!(url = %page.url, "Listing entry is not an object");
                outcome.failed_listings += 1;
                continue;
            };

            let Some(id) = local_id(&raw).map(|local| SOURCE.namespaced_id(&local)) else {
                warn!(url = %page.url, "Listing without id");
                outcome.failed_listings += 1;
                continue;
            };
            raw.insert("id".to_string(), Value::String(id.clone()));

            let existing = match self.lookup.lookup(&id).await {
                Ok(existing) => existing,
                Err(e) => {
                    error!(listing_id = %id, error = %e, "Lookup of existing property failed");
                    outcome.failed_listings += 1;
                    continue;
                }
            };

            if existing.as_ref().is_some_and(|p| p.banned) {
                debug!(listing_id = %id, "Skipping banned listing");
                outcome.banned_skipped += 1;
                continue;
            }

            let href = raw.get("propertyUrl").and_then(Value::as_str).unwrap_or_default();
            let detail_url = match page.url.join(href) {
                Ok(url) if !href.is_empty() => url,
                _ => {
                    warn!(listing_id = %id, href, "Listing without usable propertyUrl");
                    outcome.failed_listings += 1;
                    continue;
                }
            };

            outcome.steps.push(Step::Follow(CrawlRequest::DetailPage {
                url: detail_url,
                raw,
                existing,
            }));
        }

        Ok(outcome)
    }

    async fn parse_listing_page(
        &self,
        url: &Url,
        mut raw: RawListing,
        existing: Option<Property>,
    ) -> ScrapeResult<Outcome> {
        let page = self.fetcher.fetch(url).await?;
        let model = embedded::page_model(&page.text())?;
        let property = model
            .get("propertyData")
            .ok_or_else(|| ScrapeError::schema("detail", "propertyData missing"))?;

        let floorplans = image_urls(property, "floorplans")?;
        raw.insert("propertyImages".to_string(), json!(image_urls(property, "images")?));
        raw.insert("floorplanImages".to_string(), json!(floorplans));
        raw.insert("lettingInformation".to_string(), Value::Object(letting_information(property)?));
        raw.insert("keyFeatures".to_string(), json!(key_features(property)?));
        raw.insert("summary".to_string(), json!(summary(property)?));

        let mut outcome = Outcome::default();
        match (floorplans.first(), &self.ocr) {
            (Some(first), Some(_)) => {
                let url = page.url.join(first)?;
                outcome.steps.push(Step::Follow(CrawlRequest::FloorPlan { url, raw, existing }));
            }
            _ => outcome.steps.push(Step::Emit(finalize(&raw, existing.as_ref())?)),
        }
        Ok(outcome)
    }

    async fn parse_floor_plan(
        &self,
        url: &Url,
        mut raw: RawListing,
        existing: Option<Property>,
    ) -> ScrapeResult<Outcome> {
        let image = self.fetcher.fetch(url).await?;
        debug!(url = %image.url, status = image.status, content_type = ?image.content_type, bytes = image.body.len(), "Fetched floor plan");

        if let Some(ocr) = &self.ocr {
            let floor_area = match ocr.recognize(&image.body).await {
                Ok(text) => extract_floor_area(&text),
                Err(e) => {
                    warn!(url = %url, error = %e, "OCR failed, floor area unknown");
                    0.0
                }
            };
            debug!(url = %url, floor_area, "Read floor plan");
            raw.insert("floorArea".to_string(), json!(floor_area));
        }

        Ok(Outcome {
            steps: vec![Step::Emit(finalize(&raw, existing.as_ref())?)],
            ..Outcome::default()
        })
    }
}

#[async_trait]
impl ScraperTrait for RightmoveSpider {
    async fn scrape(&self, sink: &dyn RecordSink) -> Result<CrawlStats> {
        self.crawl(sink).await
    }

    fn source_name(&self) -> &'static str {
        "rightmove"
    }
}

fn finalize(raw: &RawListing, existing: Option<&Property>) -> ScrapeResult<Property> {
    normalize::to_canonical(raw, existing, SOURCE)
}

fn local_id(raw: &RawListing) -> Option<String> {
    match raw.get("id")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn image_urls(property: &Value, key: &str) -> ScrapeResult<Vec<String>> {
    let images = property
        .get(key)
        .and_then(Value::as_array)
        .ok_or_else(|| ScrapeError::schema("detail", format!("{} missing", key)))?;
    images
        .iter()
        .map(|img| {
            img.get("url")
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| ScrapeError::schema("detail", format!("{} entry without url", key)))
        })
        .collect()
}

fn letting_information(property: &Value) -> ScrapeResult<serde_json::Map<String, Value>> {
    let lettings = match property.get("lettings") {
        Some(Value::Object(map)) => map,
        Some(Value::Null) => return Ok(serde_json::Map::new()),
        _ => return Err(ScrapeError::schema("detail", "lettings missing")),
    };
    Ok(lettings
        .iter()
        .filter_map(|(key, value)| {
            let text = match value {
                Value::Null => return None,
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            Some((key.clone(), Value::String(text)))
        })
        .collect())
}

fn key_features(property: &Value) -> ScrapeResult<Vec<String>> {
    let features = property
        .get("keyFeatures")
        .and_then(Value::as_array)
        .ok_or_else(|| ScrapeError::schema("detail", "keyFeatures missing"))?;
    Ok(features
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect())
}

fn summary(property: &Value) -> ScrapeResult<String> {
    property
        .pointer("/text/description")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ScrapeError::schema("detail", "text.description missing"))
}
