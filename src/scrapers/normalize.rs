use crate::error::{ScrapeError, ScrapeResult};
use crate::models::{Property, Source};
use crate::scrapers::types::RawListing;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use serde_json::{json, Value};
use std::sync::LazyLock;

/// Keys copied out of a raw listing. Anything else is dropped.
pub const CANONICAL_KEYS: &[&str] = &[
    "bedrooms",
    "displayAddress",
    "featuredProperty",
    "feesApply",
    "feesApplyText",
    "firstVisibleDate",
    "floorplanImages",
    "id",
    "keyFeatures",
    "lettingInformation",
    "location",
    "price",
    "propertyImages",
    "propertySubType",
    "propertyTypeFullDescription",
    "propertyUrl",
    "students",
    "summary",
    "transactionType",
];

/// Build the canonical property for a finished raw listing.
///
/// `favorite` and `toWork` are never scraped; they come from `existing` only.
pub fn to_canonical(
    raw: &RawListing,
    existing: Option<&Property>,
    source: Source,
) -> ScrapeResult<Property> {
    let mut fields = serde_json::Map::new();
    for &key in CANONICAL_KEYS {
        let value = match (key, raw.get(key)) {
            ("feesApplyText", value) => fees_text(value),
            (_, Some(value)) => convert(key, value, source)?,
            (_, None) => return Err(ScrapeError::MissingField(key)),
        };
        fields.insert(key.to_string(), value);
    }

    let floor_area = raw.get("floorArea").and_then(Value::as_f64).unwrap_or(0.0);
    fields.insert("floorArea".to_string(), json!(floor_area));

    if let Some(existing) = existing {
        fields.insert("favorite".to_string(), Value::Bool(existing.favorite));
        if let Some(to_work) = &existing.to_work {
            fields.insert("toWork".to_string(), to_work.clone());
        }
    }

    serde_json::from_value(Value::Object(fields))
        .map_err(|e| ScrapeError::schema("normalize", e.to_string()))
}

fn convert(key: &'static str, value: &Value, source: Source) -> ScrapeResult<Value> {
    match key {
        "firstVisibleDate" => {
            let text = value.as_str().ok_or_else(|| invalid(key, "not a string"))?;
            let date = parse_listing_date(text, Utc::now())
                .ok_or_else(|| invalid(key, format!("unrecognised date {:?}", text)))?;
            Ok(json!(date))
        }
        "price" => to_monthly_price(value),
        "propertyUrl" => {
            let url = value.as_str().ok_or_else(|| invalid(key, "not a string"))?;
            Ok(Value::String(absolute_url(url, source)))
        }
        _ => Ok(value.clone()),
    }
}

fn fees_text(value: Option<&Value>) -> Value {
    match value {
        Some(Value::Null) | None => Value::String(String::new()),
        Some(value) => value.clone(),
    }
}

fn invalid(field: &'static str, message: impl Into<String>) -> ScrapeError {
    ScrapeError::InvalidField {
        field,
        message: message.into(),
    }
}

/// Copy amount, currency and frequency, turning weekly rents into monthly ones.
pub fn to_monthly_price(price: &Value) -> ScrapeResult<Value> {
    let amount = price
        .get("amount")
        .and_then(Value::as_f64)
        .ok_or_else(|| invalid("price", "amount missing"))?;
    let currency = price
        .get("currencyCode")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid("price", "currencyCode missing"))?;
    let frequency = price
        .get("frequency")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid("price", "frequency missing"))?;

    let (amount, frequency) = if frequency == "weekly" {
        ((amount * 52.0 / 12.0).trunc() as i64, "monthly")
    } else {
        (amount.trunc() as i64, frequency)
    };

    Ok(json!({
        "amount": amount,
        "currencyCode": currency,
        "frequency": frequency,
    }))
}

/// Prefix origin-relative URLs with the site origin.
pub fn absolute_url(url: &str, source: Source) -> String {
    if url.starts_with('/') && !url.starts_with("//") {
        format!("{}{}", source.base_url(), url)
    } else {
        url.to_string()
    }
}

static ORDINAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d{1,2})(st|nd|rd|th)\b").expect("ordinal pattern is valid"));

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%b %d %Y %H:%M:%S",
    "%b %d %Y %H:%M",
    "%B %d %Y %H:%M",
    "%b %d, %Y %H:%M",
    "%B %d, %Y %H:%M",
    "%d %B %Y %H:%M",
    "%d %b %Y %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d %B %Y",
    "%d %b %Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
];

const LEADING_PHRASES: &[&str] = &["added on", "reduced on", "added", "reduced"];

/// Parse the date strings Rightmove uses, from ISO timestamps to "Added on 2nd October 2019".
///
/// Date-only values are taken as midnight UTC. `now` anchors "today" and "yesterday".
pub fn parse_listing_date(text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let text = text.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.with_timezone(&Utc));
    }

    let mut cleaned = text.to_string();
    let lower = cleaned.to_lowercase();
    if let Some(phrase) = LEADING_PHRASES.iter().find(|p| lower.starts_with(*p)) {
        cleaned = cleaned[phrase.len()..].trim().to_string();
    }
    let cleaned = ORDINAL.replace_all(&cleaned, "$1").into_owned();

    match cleaned.to_lowercase().as_str() {
        "today" => return midnight(now.date_naive()),
        "yesterday" => return midnight((now - Duration::days(1)).date_naive()),
        _ => {}
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(&cleaned, format) {
            return Some(dt.and_utc());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(&cleaned, format) {
            return midnight(date);
        }
    }
    None
}

fn midnight(date: NaiveDate) -> Option<DateTime<Utc>> {
    date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc())
}
