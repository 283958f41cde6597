//! `MAPS_PRIMARY` adapter (spec §4.1): the richer map/business-listing
//! variant, backed by a real Google Places Text Search call. When its
//! credential is absent the adapter transparently delegates to
//! `MAPS_SECONDARY` for the same logical query.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::info;

use crate::adapters::maps_secondary::MapsSecondaryAdapter;
use crate::adapters::{fail_result, get_with_retry, ok_result, AdapterRequest, SourceAdapter};
use crate::error::AdapterError;
use crate::model::{SourceCrawlResult, SourceName};
use crate::priors::{employee_count_from_review_count, revenue_from_rating};

const PLACES_TEXT_SEARCH: &str = "https://maps.googleapis.com/maps/api/place/textsearch/json";

pub struct MapsPrimaryAdapter {
    client: Client,
    api_key: Option<String>,
    fallback: Arc<MapsSecondaryAdapter>,
}

impl MapsPrimaryAdapter {
    pub fn new(client: Client, fallback: Arc<MapsSecondaryAdapter>) -> Self {
        Self { client: client.clone(), api_key: std::env::var("GOOGLE_PLACES_API_KEY").ok(), fallback }
    }
}

#[async_trait]
impl SourceAdapter for MapsPrimaryAdapter {
    fn source_name(&self) -> SourceName {
        SourceName::MapsPrimary
    }

    async fn fetch(&self, request: &AdapterRequest) -> SourceCrawlResult {
        let Some(api_key) = &self.api_key else {
            info!("maps_primary has no credentials; delegating to maps_secondary");
            let mut delegated = self.fallback.fetch(request).await;
            delegated
                .metadata
                .insert("delegated_from".to_string(), json!(SourceName::MapsPrimary.as_str()));
            return delegated;
        };

        let industry = request.params.industry.clone().unwrap_or_else(|| "business".to_string());
        let query = format!("{industry} in {}", request.params.location);
        let radius_meters = request.params.radius_miles.unwrap_or(25) as f64 * 1609.34;

        let result = get_with_retry(
            &self.client,
            SourceName::MapsPrimary,
            PLACES_TEXT_SEARCH,
            &[
                ("query", query),
                ("radius", radius_meters.to_string()),
                ("key", api_key.clone()),
            ],
            request.max_retries,
            request.timeout,
        )
        .await;

        let payload = match result {
            Ok(v) => v,
            Err(e) => return fail_result(SourceName::MapsPrimary, vec![e]),
        };

        let status = payload["status"].as_str().unwrap_or("UNKNOWN_ERROR");
        if status != "OK" && status != "ZERO_RESULTS" {
            return fail_result(
                SourceName::MapsPrimary,
                vec![AdapterError::PayloadMalformed {
                    source_name: SourceName::MapsPrimary.as_str().to_string(),
                    detail: format!("places API status {status}"),
                }],
            );
        }

        let records: Vec<Value> = payload["results"]
            .as_array()
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .map(map_place)
            .collect();

        let mut metadata = HashMap::new();
        metadata.insert("status".to_string(), json!(status));
        ok_result(SourceName::MapsPrimary, records, metadata)
    }
}

fn map_place(place: Value) -> Value {
    let rating = place.get("rating").and_then(Value::as_f64);
    let review_count = place.get("user_ratings_total").and_then(Value::as_u64);
    let estimated_revenue = revenue_from_rating(rating, review_count);
    let employee_count = employee_count_from_review_count(review_count);

    json!({
        "name": place.get("name"),
        "address": place.get("formatted_address"),
        "rating": rating,
        "review_count": review_count,
        "estimated_revenue": estimated_revenue,
        "employee_count": employee_count,
        "coordinates": place.get("geometry").and_then(|g| g.get("location")).map(|loc| {
            json!([loc.get("lat"), loc.get("lng")])
        }),
        "categories": place.get("types"),
        "source": "maps_primary",
    })
}
