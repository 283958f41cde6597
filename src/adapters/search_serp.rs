//! `SEARCH_SERP` adapter (spec §4.1): organic/local search-engine results
//! for a location + industry query. A SERP call first; on an empty
//! organic/local result set it falls back to a geocode + Overpass-style
//! OpenStreetMap POI query, and when that is also empty it synthesizes a
//! small deterministic stand-in set seeded from `(location, industry)`.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::adapters::synth::{synthesize_businesses, FALLBACK_COORDINATE};
use crate::adapters::{fail_result, get_with_retry, ok_result, AdapterRequest, SourceAdapter};
use crate::error::AdapterError;
use crate::model::{SourceCrawlResult, SourceName};

const SERPAPI_BASE: &str = "https://serpapi.com/search.json";
const NOMINATIM_BASE: &str = "https://nominatim.openstreetmap.org/search";
const OVERPASS_BASE: &str = "https://overpass-api.de/api/interpreter";

pub struct SearchSerpAdapter {
    client: Client,
    api_key: Option<String>,
}

impl SearchSerpAdapter {
    pub fn new(client: Client) -> Self {
        Self { client, api_key: std::env::var("SERPAPI_KEY").ok() }
    }

    async fn serp_results(&self, request: &AdapterRequest) -> Option<Vec<Value>> {
        let api_key = self.api_key.as_ref()?;
        let industry = request.params.industry.clone().unwrap_or_else(|| "business".to_string());
        let q = format!("{industry} near {}", request.params.location);

        let payload = get_with_retry(
            &self.client,
            SourceName::SearchSerp,
            SERPAPI_BASE,
            &[
                ("q", q),
                ("engine", "google_local".to_string()),
                ("api_key", api_key.clone()),
            ],
            request.max_retries,
            request.timeout,
        )
        .await
        .ok()?;

        let results: Vec<Value> = payload["local_results"]
            .as_array()
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .map(map_serp_local_result)
            .collect();

        if results.is_empty() {
            None
        } else {
            Some(results)
        }
    }

    /// Geocode a free-text location via Nominatim, falling back to
    /// `FALLBACK_COORDINATE` on any failure. Used directly by the
    /// orchestrator's fallback mode (spec §4.6.1: "a public geocoder call
    /// with a ≥1 fallback default coordinate").
    pub async fn geocode_or_fallback(&self, location: &str) -> (f64, f64) {
        self.geocode(location).await.unwrap_or(FALLBACK_COORDINATE)
    }

    async fn geocode(&self, location: &str) -> Option<(f64, f64)> {
        let payload = get_with_retry(
            &self.client,
            SourceName::SearchSerp,
            NOMINATIM_BASE,
            &[("q", location.to_string()), ("format", "json".to_string()), ("limit", "1".to_string())],
            2,
            Duration::from_secs(10),
        )
        .await
        .ok()?;

        let first = payload.as_array()?.first()?;
        let lat = first["lat"].as_str()?.parse::<f64>().ok()?;
        let lng = first["lon"].as_str()?.parse::<f64>().ok()?;
        Some((lat, lng))
    }

    async fn overpass_fallback(&self, request: &AdapterRequest) -> Option<Vec<Value>> {
        let (lat, lng) = match self.geocode(&request.params.location).await {
            Some(coords) => coords,
            None => {
                debug!(location = %request.params.location, "geocode failed, using fallback coordinate");
                FALLBACK_COORDINATE
            }
        };

        let radius_meters = request.params.radius_miles.unwrap_or(10) as f64 * 1609.34;
        let amenity = overpass_amenity_tag(request.params.industry.as_deref());
        let query = format!(
            "[out:json][timeout:25];node[\"amenity\"=\"{amenity}\"](around:{radius_meters},{lat},{lng});out;"
        );

        let payload = get_with_retry(
            &self.client,
            SourceName::SearchSerp,
            OVERPASS_BASE,
            &[("data", query)],
            2,
            Duration::from_secs(25),
        )
        .await
        .ok()?;

        let elements: Vec<Value> = payload["elements"]
            .as_array()
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter_map(map_overpass_element)
            .collect();

        if elements.is_empty() {
            None
        } else {
            Some(elements)
        }
    }
}

#[async_trait]
impl SourceAdapter for SearchSerpAdapter {
    fn source_name(&self) -> SourceName {
        SourceName::SearchSerp
    }

    async fn fetch(&self, request: &AdapterRequest) -> SourceCrawlResult {
        if let Some(results) = self.serp_results(request).await {
            let mut metadata = HashMap::new();
            metadata.insert("strategy".to_string(), json!("serp"));
            return ok_result(SourceName::SearchSerp, results, metadata);
        }

        if let Some(results) = self.overpass_fallback(request).await {
            warn!(location = %request.params.location, "serp unavailable, used overpass fallback");
            let mut metadata = HashMap::new();
            metadata.insert("strategy".to_string(), json!("overpass_fallback"));
            return ok_result(SourceName::SearchSerp, results, metadata);
        }

        let (lat, lng) = FALLBACK_COORDINATE;
        let synthetic = synthesize_businesses(
            &request.params.location,
            request.params.industry.as_deref(),
            lat,
            lng,
            5,
        );
        let mut metadata = HashMap::new();
        metadata.insert("strategy".to_string(), json!("synthetic_stand_in"));
        ok_result(SourceName::SearchSerp, synthetic, metadata)
    }
}

fn map_serp_local_result(item: Value) -> Value {
    json!({
        "name": item.get("title"),
        "address": item.get("address"),
        "phone": item.get("phone"),
        "website": item.get("website"),
        "rating": item.get("rating"),
        "review_count": item.get("reviews"),
        "categories": item.get("type"),
        "coordinates": item.get("gps_coordinates").map(|g| json!([g.get("latitude"), g.get("longitude")])),
        "source": "search_serp",
    })
}

fn overpass_amenity_tag(industry: Option<&str>) -> &'static str {
    let industry = industry.unwrap_or("").to_lowercase();
    if industry.contains("restaurant") || industry.contains("food") {
        "restaurant"
    } else if industry.contains("auto") || industry.contains("car") {
        "car_repair"
    } else if industry.contains("bank") {
        "bank"
    } else if industry.contains("pharma") {
        "pharmacy"
    } else {
        "shop"
    }
}

fn map_overpass_element(el: Value) -> Option<Value> {
    let tags = el.get("tags")?;
    Some(json!({
        "name": tags.get("name"),
        "address": tags.get("addr:full").or_else(|| tags.get("addr:street")),
        "phone": tags.get("phone"),
        "website": tags.get("website"),
        "categories": tags.get("amenity"),
        "coordinates": [el.get("lat"), el.get("lon")],
        "source": "search_serp_overpass",
    }))
}
