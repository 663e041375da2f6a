mod cli;
mod config;
mod error;
mod models;
mod scrapers;
mod services;
mod storage;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use config::{Config, OcrSetting};
use models::Property;
use scrapers::{HttpFetcher, RightmoveSpider, ScraperTrait, TesseractOcr, SPIDERS};
use services::{FindQuery, PropertyService};
use std::sync::Arc;
use storage::{JsonFileRepository, MemoryRepository, PropertyRepository};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.verbose { "crib_scout=debug" } else { "crib_scout=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::from_env()?;
    let repository = Arc::new(JsonFileRepository::open(&config.data_dir).await?);
    debug!(dir = %repository.dir().display(), "Opened property store");
    let service = PropertyService::new(repository.clone());

    match cli.command {
        Command::Crawl { spider, dry_run } => {
            let properties = if dry_run {
                let snapshot = Arc::new(MemoryRepository::with_properties(repository.all().await?));
                crawl(&config, snapshot, &spider).await?
            } else {
                crawl(&config, repository, &spider).await?
            };
            for (i, property) in properties.iter().enumerate() {
                print_property(i + 1, property);
            }
        }
        Command::Spiders => {
            for name in SPIDERS {
                println!("{}", name);
            }
        }
        Command::Find {
            max_price,
            favorite,
            not_favorite,
            limit,
        } => {
            let query = FindQuery {
                max_price,
                favorite: Command::favorite_filter(favorite, not_favorite),
                limit,
            };
            let properties = service.find(&query).await?;
            for (i, property) in properties.iter().enumerate() {
                print_property(i + 1, property);
            }
            info!("Found {} properties", properties.len());
        }
        Command::Favorite { id, unset } => {
            service.favorite(&id, !unset).await?;
            println!("{} favorite: {}", id, !unset);
        }
        Command::Ban { id, unset } => {
            service.ban(&id, !unset).await?;
            println!("{} banned: {}", id, !unset);
        }
        Command::SetArea { id, sqm } => {
            service.set_area(&id, sqm).await?;
            println!("{} floor area: {} m²", id, sqm);
        }
        Command::Clear { banned, favorite } => {
            let removed = service.clear(banned, favorite).await?;
            println!("Deleted {} properties", removed);
        }
    }

    Ok(())
}

/// Run `spider` against `repository`, returning everything the repository holds afterwards
async fn crawl<R>(config: &Config, repository: Arc<R>, spider: &str) -> Result<Vec<Property>>
where
    R: PropertyRepository + 'static,
{
    if spider != "rightmove" {
        anyhow::bail!("Unknown spider {:?}, available: {}", spider, SPIDERS.join(", "));
    }

    info!("🏠 Crib Scout - Rightmove crawl");
    info!("==============================");

    let fetcher = Arc::new(
        HttpFetcher::new(&config.user_agent, config.http_timeout).context("Failed to set up fetcher")?,
    );
    let mut scraper = RightmoveSpider::new(fetcher, repository.clone(), config.searches.clone())
        .with_concurrency(config.concurrency);
    match &config.ocr {
        OcrSetting::Tesseract(binary) => scraper = scraper.with_ocr(Arc::new(TesseractOcr::new(binary))),
        OcrSetting::Disabled => warn!("OCR disabled, floor areas will not be read"),
    }

    let stats = scraper.scrape(repository.as_ref()).await?;

    info!(
        "✅ {} finished: {} properties saved",
        scraper.source_name(),
        stats.properties_emitted
    );
    println!("{}", serde_json::to_string_pretty(&stats)?);

    repository.all().await
}

fn print_property(position: usize, property: &Property) {
    println!(
        "{}. {} ({} {}/{})",
        position,
        property.display_address,
        property.price.amount,
        property.price.currency_code,
        property.price.frequency
    );
    println!(
        "   {} bedrooms, {} m²{}",
        property.bedrooms,
        property.floor_area,
        if property.favorite { ", ★ favorite" } else { "" }
    );
    println!("   ID: {}", property.id);
    println!("   Features: {}", property.key_features.join(", "));
    println!("   URL: {}", property.property_url);
    println!();
}
