use crate::error::{ScrapeError, ScrapeResult};
use serde_json::Value;
use url::Url;

/// Query parameter Rightmove uses as the result offset.
pub const PAGE_INDEX_PARAM: &str = "index";

/// URLs of every result page after the current one.
///
/// The first pagination option is the page being parsed, so it is skipped.
/// Each remaining option yields `current_url` with only the index parameter
/// replaced, in model order.
pub fn resolve_pages(current_url: &Url, result_model: &Value) -> ScrapeResult<Vec<Url>> {
    let options = result_model
        .pointer("/pagination/options")
        .and_then(Value::as_array)
        .ok_or_else(|| ScrapeError::schema("search", "pagination.options missing"))?;

    options
        .iter()
        .skip(1)
        .map(|option| {
            let index = option_value(option)?;
            Ok(with_page_index(current_url, &index))
        })
        .collect()
}

fn option_value(option: &Value) -> ScrapeResult<String> {
    match option.get("value") {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        _ => Err(ScrapeError::schema("search", "pagination option without value")),
    }
}

fn with_page_index(current_url: &Url, index: &str) -> Url {
    let mut pairs: Vec<(String, String)> = Vec::new();
    let mut replaced = false;
    for (key, value) in current_url.query_pairs() {
        if key == PAGE_INDEX_PARAM {
            if !replaced {
                pairs.push((key.into_owned(), index.to_string()));
                replaced = true;
            }
        } else {
            pairs.push((key.into_owned(), value.into_owned()));
        }
    }
    if !replaced {
        pairs.push((PAGE_INDEX_PARAM.to_string(), index.to_string()));
    }

    let mut url = current_url.clone();
    url.query_pairs_mut().clear().extend_pairs(pairs);
    url
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn model(values: &[&str]) -> Value {
        let options: Vec<Value> = values
            .iter()
            .map(|v| json!({"value": v, "description": format!("page {}", v)}))
            .collect();
        json!({"pagination": {"options": options}})
    }

    #[test]
    fn resolves_all_but_first_page() {
        let url = Url::parse("https://www.rightmove.co.uk/property-to-rent/find.html?index=0&foo=bar").unwrap();
        let pages = resolve_pages(&url, &model(&["0", "24", "48"])).unwrap();
        let pages: Vec<String> = pages.iter().map(Url::to_string).collect();
        assert_eq!(
            pages,
            vec![
                "https://www.rightmove.co.uk/property-to-rent/find.html?index=24&foo=bar",
                "https://www.rightmove.co.uk/property-to-rent/find.html?index=48&foo=bar",
            ]
        );
    }

    #[test]
    fn adds_index_when_absent_and_keeps_fragment() {
        let url = Url::parse("https://example.com/search?foo=bar#results").unwrap();
        let pages = resolve_pages(&url, &model(&["0", "24"])).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].as_str(), "https://example.com/search?foo=bar&index=24#results");
    }

    #[test]
    fn numeric_option_values_are_accepted() {
        let url = Url::parse("https://example.com/search?index=0").unwrap();
        let model = json!({"pagination": {"options": [{"value": 0}, {"value": 24}]}});
        let pages = resolve_pages(&url, &model).unwrap();
        assert_eq!(pages[0].as_str(), "https://example.com/search?index=24");
    }

    #[test]
    fn single_page_yields_nothing() {
        let url = Url::parse("https://example.com/search?index=0").unwrap();
        assert!(resolve_pages(&url, &model(&["0"])).unwrap().is_empty());
    }

    #[test]
    fn missing_pagination_is_schema_error() {
        let url = Url::parse("https://example.com/search").unwrap();
        let err = resolve_pages(&url, &json!({"properties": []})).unwrap_err();
        assert!(matches!(err, ScrapeError::Schema { stage: "search", .. }));
    }
}
