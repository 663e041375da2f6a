use crate::error::{ScrapeError, ScrapeResult};
use crate::scrapers::traits::{FetchedPage, Fetcher};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// reqwest-backed fetcher
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> ScrapeResult<FetchedPage> {
        debug!(url = %url, "Fetching");

        let transport = |message: String| ScrapeError::Transport {
            url: url.to_string(),
            message,
        };

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| transport(e.to_string()))?;

        if !response.status().is_success() {
            warn!(url = %url, status = %response.status(), "Non-success status");
            return Err(transport(format!("status {}", response.status())));
        }

        let status = response.status().as_u16();
        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .await
            .map_err(|e| transport(format!("reading body: {}", e)))?;

        debug!(url = %final_url, bytes = body.len(), "Downloaded");

        Ok(FetchedPage {
            url: final_url,
            status,
            content_type,
            body: body.to_vec(),
        })
    }
}
