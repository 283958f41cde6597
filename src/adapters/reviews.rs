//! `REVIEWS` adapter (spec §4.1): rating/review-volume data for businesses
//! already discovered by an earlier crawl source. Calls the Yelp Fusion API
//! (the same underlying dataset a scrape would reach, without a headless
//! browser). When no Yelp key is configured it degrades to
//! `CredentialsMissing` without inventing data — the `REVIEWS` source only
//! ever supplements records the hub already has.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::adapters::{fail_result, get_with_retry, ok_result, AdapterRequest, SourceAdapter};
use crate::error::AdapterError;
use crate::model::{SourceCrawlResult, SourceName};
use crate::priors::{employee_count_from_review_count, revenue_from_rating};

const YELP_FUSION_BASE: &str = "https://api.yelp.com/v3/businesses/search";

pub struct ReviewsAdapter {
    client: Client,
    api_key: Option<String>,
}

impl ReviewsAdapter {
    pub fn new(client: Client) -> Self {
        Self { client, api_key: std::env::var("YELP_API_KEY").ok() }
    }
}

#[async_trait]
impl SourceAdapter for ReviewsAdapter {
    fn source_name(&self) -> SourceName {
        SourceName::Reviews
    }

    async fn fetch(&self, request: &AdapterRequest) -> SourceCrawlResult {
        let Some(api_key) = &self.api_key else {
            return fail_result(
                SourceName::Reviews,
                vec![AdapterError::CredentialsMissing {
                    source_name: SourceName::Reviews.as_str().to_string(),
                    detail: "YELP_API_KEY not set".to_string(),
                }],
            );
        };

        let term = request.params.industry.clone().unwrap_or_else(|| "business".to_string());
        let mut req = self
            .client
            .get(YELP_FUSION_BASE)
            .bearer_auth(api_key)
            .query(&[("location", request.params.location.as_str()), ("term", term.as_str())]);
        if let Some(radius_miles) = request.params.radius_miles {
            let radius_meters = (radius_miles as f64 * 1609.34).min(40_000.0) as u32;
            req = req.query(&[("radius", radius_meters.to_string())]);
        }

        let payload = match tokio::time::timeout(request.timeout, req.send()).await {
            Ok(Ok(resp)) if resp.status().is_success() => match resp.json::<Value>().await {
                Ok(v) => v,
                Err(e) => {
                    return fail_result(
                        SourceName::Reviews,
                        vec![AdapterError::PayloadMalformed {
                            source_name: SourceName::Reviews.as_str().to_string(),
                            detail: e.to_string(),
                        }],
                    )
                }
            },
            Ok(Ok(resp)) => {
                return fail_result(
                    SourceName::Reviews,
                    vec![AdapterError::PayloadMalformed {
                        source_name: SourceName::Reviews.as_str().to_string(),
                        detail: format!("yelp fusion returned {}", resp.status()),
                    }],
                )
            }
            Ok(Err(e)) => {
                return fail_result(
                    SourceName::Reviews,
                    vec![AdapterError::Network {
                        source_name: SourceName::Reviews.as_str().to_string(),
                        attempts: 1,
                        detail: e.to_string(),
                    }],
                )
            }
            Err(_) => {
                return fail_result(
                    SourceName::Reviews,
                    vec![AdapterError::Timeout {
                        source_name: SourceName::Reviews.as_str().to_string(),
                        timeout_secs: request.timeout.as_secs(),
                    }],
                )
            }
        };

        let records: Vec<Value> = payload["businesses"]
            .as_array()
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .map(map_yelp_business)
            .collect();

        let mut metadata = HashMap::new();
        metadata.insert("total".to_string(), json!(payload.get("total")));
        ok_result(SourceName::Reviews, records, metadata)
    }
}

fn map_yelp_business(item: Value) -> Value {
    let rating = item.get("rating").and_then(Value::as_f64);
    let review_count = item.get("review_count").and_then(Value::as_u64);

    json!({
        "name": item.get("name"),
        "address": item.get("location").and_then(|l| l.get("display_address")),
        "phone": item.get("display_phone"),
        "website": item.get("url"),
        "rating": rating,
        "review_count": review_count,
        "estimated_revenue": revenue_from_rating(rating, review_count),
        "employee_count": employee_count_from_review_count(review_count),
        "categories": item.get("categories"),
        "coordinates": item.get("coordinates").map(|c| json!([c.get("latitude"), c.get("longitude")])),
        "source": "reviews",
    })
}
