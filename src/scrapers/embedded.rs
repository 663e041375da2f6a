//! Locations of the JSON models Rightmove embeds in its pages.
//!
//! Both live in `<script>` tags directly under `<body>` as a global
//! assignment. When the site layout changes, only these two functions
//! should need touching.

use crate::error::{ScrapeError, ScrapeResult};
use scraper::{Html, Selector};
use serde_json::Value;

const SEARCH_MODEL_SCRIPT: usize = 1;
const SEARCH_MODEL_PREFIX: &str = "window.jsonModel";

const PAGE_MODEL_SCRIPT: usize = 0;
const PAGE_MODEL_PREFIX: &str = "window.PAGE_MODEL";

/// Result-set model of a search page (second body script, `window.jsonModel`).
pub fn search_model(html: &str) -> ScrapeResult<Value> {
    embedded_model(html, SEARCH_MODEL_SCRIPT, SEARCH_MODEL_PREFIX)
}

/// Per-listing model of a detail page (first body script, `window.PAGE_MODEL`).
pub fn page_model(html: &str) -> ScrapeResult<Value> {
    embedded_model(html, PAGE_MODEL_SCRIPT, PAGE_MODEL_PREFIX)
}

fn embedded_model(html: &str, position: usize, variable: &str) -> ScrapeResult<Value> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("body > script")
        .map_err(|e| ScrapeError::EmbeddedModel(format!("bad selector: {}", e)))?;

    let script = document
        .select(&selector)
        .nth(position)
        .ok_or_else(|| {
            ScrapeError::EmbeddedModel(format!("no body script #{} for {}", position + 1, variable))
        })?
        .text()
        .collect::<String>();

    let assignment = script
        .trim_start()
        .strip_prefix(variable)
        .and_then(|rest| rest.trim_start().strip_prefix('='))
        .ok_or_else(|| {
            ScrapeError::EmbeddedModel(format!("body script #{} does not assign {}", position + 1, variable))
        })?;

    // Only the first JSON value counts; a trailing `;` or further statements are ignored.
    serde_json::Deserializer::from_str(assignment)
        .into_iter::<Value>()
        .next()
        .ok_or_else(|| ScrapeError::EmbeddedModel(format!("{} is empty", variable)))?
        .map_err(ScrapeError::from)
}
