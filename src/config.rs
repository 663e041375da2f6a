use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// How floor plans are read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OcrSetting {
    Disabled,
    Tesseract(PathBuf),
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Rightmove search result URLs to start crawling from
    pub searches: Vec<Url>,
    pub data_dir: PathBuf,
    pub concurrency: usize,
    pub http_timeout: Duration,
    pub user_agent: String,
    pub ocr: OcrSetting,
}

impl Config {
    /// Load configuration from the environment, after reading `.env` if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_vars(std::env::vars().collect())
    }

    fn from_vars(vars: HashMap<String, String>) -> Result<Self> {
        let get = |key: &str| vars.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());

        let searches = get("RIGHTMOVE_SEARCHES")
            .map(parse_searches)
            .transpose()?
            .unwrap_or_default();

        let concurrency = get("CRIB_CONCURRENCY")
            .map(|v| v.parse::<usize>().context("CRIB_CONCURRENCY must be a number"))
            .transpose()?
            .unwrap_or(8)
            .max(1);

        let timeout_secs = get("CRIB_HTTP_TIMEOUT_SECS")
            .map(|v| v.parse::<u64>().context("CRIB_HTTP_TIMEOUT_SECS must be a number"))
            .transpose()?
            .unwrap_or(30);

        let ocr = match get("CRIB_OCR") {
            None => OcrSetting::Tesseract(PathBuf::from("tesseract")),
            Some(v) if ["off", "none", "false", "0"].contains(&v.to_lowercase().as_str()) => {
                OcrSetting::Disabled
            }
            Some(v) => OcrSetting::Tesseract(PathBuf::from(v)),
        };

        Ok(Self {
            searches,
            data_dir: PathBuf::from(get("CRIB_DATA_DIR").unwrap_or("raw_scrape")),
            concurrency,
            http_timeout: Duration::from_secs(timeout_secs),
            user_agent: get("CRIB_USER_AGENT").unwrap_or(DEFAULT_USER_AGENT).to_string(),
            ocr,
        })
    }
}

fn parse_searches(value: &str) -> Result<Vec<Url>> {
    value
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(|s| Url::parse(s).with_context(|| format!("Invalid search URL in RIGHTMOVE_SEARCHES: {}", s)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn defaults() {
        let config = Config::from_vars(HashMap::new()).unwrap();
        assert!(config.searches.is_empty());
        assert_eq!(config.data_dir, PathBuf::from("raw_scrape"));
        assert_eq!(config.concurrency, 8);
        assert_eq!(config.http_timeout, Duration::from_secs(30));
        assert_eq!(config.ocr, OcrSetting::Tesseract(PathBuf::from("tesseract")));
    }

    #[test]
    fn reads_searches_and_overrides() {
        let config = Config::from_vars(vars(&[
            (
                "RIGHTMOVE_SEARCHES",
                "https://www.rightmove.co.uk/property-to-rent/find.html?locationIdentifier=REGION1,\n https://www.rightmove.co.uk/property-to-rent/find.html?locationIdentifier=REGION2",
            ),
            ("CRIB_CONCURRENCY", "0"),
            ("CRIB_OCR", "off"),
            ("CRIB_DATA_DIR", "/tmp/crib"),
        ]))
        .unwrap();

        assert_eq!(config.searches.len(), 2);
        assert_eq!(config.concurrency, 1);
        assert_eq!(config.ocr, OcrSetting::Disabled);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/crib"));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(Config::from_vars(vars(&[("CRIB_CONCURRENCY", "many")])).is_err());
        assert!(Config::from_vars(vars(&[("RIGHTMOVE_SEARCHES", "not a url")])).is_err());
    }
}
