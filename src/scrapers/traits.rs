use crate::error::ScrapeResult;
use crate::models::Property;
use crate::scrapers::types::CrawlStats;
use anyhow::Result;
use async_trait::async_trait;
use url::Url;

/// A fetched resource
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects; relative links resolve against it.
    pub url: Url,
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl FetchedPage {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Fetches bytes at a URL. Timeouts and retries belong to implementations.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> ScrapeResult<FetchedPage>;
}

/// Turns image bytes into whatever text can be recognised in them.
#[async_trait]
pub trait Ocr: Send + Sync {
    async fn recognize(&self, image: &[u8]) -> ScrapeResult<String>;
}

/// Previously stored properties, looked up by namespaced id
#[async_trait]
pub trait PropertyLookup: Send + Sync {
    async fn lookup(&self, id: &str) -> Result<Option<Property>>;
}

/// Receives finished properties for persistence
#[async_trait]
pub trait RecordSink: Send + Sync {
    async fn emit(&self, property: &Property) -> Result<()>;
}

/// Common trait for all property scrapers
/// This allows easy addition of new sources in the future
#[async_trait]
pub trait ScraperTrait: Send + Sync {
    /// Crawl the source, handing every finished property to `sink`
    async fn scrape(&self, sink: &dyn RecordSink) -> Result<CrawlStats>;

    /// Get the name of the scraper source
    fn source_name(&self) -> &'static str;
}
