use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Source of the property listing
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Source {
    Rightmove,
}

impl Source {
    /// Tag prefixed to listing ids so ids stay unique across sites.
    pub fn tag(&self) -> &'static str {
        match self {
            Source::Rightmove => "RM",
        }
    }

    /// Origin used to absolutize site-relative URLs.
    pub fn base_url(&self) -> &'static str {
        match self {
            Source::Rightmove => "https://www.rightmove.co.uk",
        }
    }

    /// Globally namespaced id for a site-local listing id.
    pub fn namespaced_id(&self, local_id: &str) -> String {
        format!("{}-{}", self.tag(), local_id)
    }
}

/// Geo position exactly as published by the site. Never interpreted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Location(pub serde_json::Value);

/// Rent, always expressed per month once normalized
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Price {
    pub amount: i64,
    pub currency_code: String,
    pub frequency: String,
}

/// Core property data model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: String,
    pub bedrooms: u32,
    pub display_address: String,
    #[serde(default)]
    pub featured_property: bool,
    pub fees_apply: bool,
    #[serde(default)]
    pub fees_apply_text: String,
    pub first_visible_date: DateTime<Utc>,
    pub floorplan_images: Vec<String>,
    pub property_images: Vec<String>,
    pub key_features: Vec<String>,
    pub letting_information: BTreeMap<String, String>,
    pub location: Location,
    pub price: Price,
    pub property_sub_type: String,
    pub property_type_full_description: String,
    pub property_url: String,
    pub students: bool,
    pub summary: String,
    pub transaction_type: String,
    /// Square meters read off the floor plan, 0.0 when unknown.
    #[serde(default)]
    pub floor_area: f64,
    #[serde(default)]
    pub favorite: bool,
    /// Commute information attached by the user, never scraped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_work: Option<serde_json::Value>,
    #[serde(default)]
    pub banned: bool,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::TimeZone;

    pub fn property(id: &str) -> Property {
        Property {
            id: id.to_string(),
            bedrooms: 2,
            display_address: "Camden Road, London NW1".to_string(),
            featured_property: false,
            fees_apply: true,
            fees_apply_text: String::new(),
            first_visible_date: Utc.with_ymd_and_hms(2019, 10, 2, 15, 26, 41).unwrap(),
            floorplan_images: vec![],
            property_images: vec![],
            key_features: vec!["Balcony".to_string()],
            letting_information: BTreeMap::new(),
            location: Location(serde_json::json!({"latitude": 51.54, "longitude": -0.14})),
            price: Price {
                amount: 1500,
                currency_code: "GBP".to_string(),
                frequency: "monthly".to_string(),
            },
            property_sub_type: "Flat".to_string(),
            property_type_full_description: "2 bedroom flat".to_string(),
            property_url: format!("https://www.rightmove.co.uk/properties/{}", id),
            students: false,
            summary: "Bright flat".to_string(),
            transaction_type: "rent".to_string(),
            floor_area: 0.0,
            favorite: false,
            to_work: None,
            banned: false,
        }
    }
}
