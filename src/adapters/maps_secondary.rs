//! `MAPS_SECONDARY` adapter (spec §4.1): the actor-based scraper variant of
//! the map/business-listing capability. Starts an actor run on the Apify
//! platform, then polls its status with bounded sleeps (spec §5: "poll their
//! run status with bounded sleeps, <=60 polls, 2s each") before pulling the
//! run's dataset items.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::adapters::{fail_result, get_with_retry, ok_result, AdapterRequest, SourceAdapter};
use crate::error::AdapterError;
use crate::model::{SourceCrawlResult, SourceName};

const APIFY_BASE: &str = "https://api.apify.com/v2";
const GMAPS_ACTOR: &str = "compass~crawler-google-places";
const MAX_POLLS: u32 = 60;
const POLL_INTERVAL: Duration = Duration::from_secs(2);

pub struct MapsSecondaryAdapter {
    client: Client,
    token: Option<String>,
}

impl MapsSecondaryAdapter {
    pub fn new(client: Client) -> Self {
        Self { client, token: std::env::var("APIFY_TOKEN").ok() }
    }
}

#[async_trait]
impl SourceAdapter for MapsSecondaryAdapter {
    fn source_name(&self) -> SourceName {
        SourceName::MapsSecondary
    }

    async fn fetch(&self, request: &AdapterRequest) -> SourceCrawlResult {
        let Some(token) = &self.token else {
            return fail_result(
                SourceName::MapsSecondary,
                vec![AdapterError::CredentialsMissing {
                    source_name: SourceName::MapsSecondary.as_str().to_string(),
                    detail: "APIFY_TOKEN not set".to_string(),
                }],
            );
        };

        let search_term = request
            .params
            .industry
            .clone()
            .unwrap_or_else(|| "business".to_string());

        let run_url = format!("{APIFY_BASE}/acts/{GMAPS_ACTOR}/runs?token={token}");
        let body = json!({
            "searchStringsArray": [search_term],
            "locationQuery": request.params.location,
            "maxCrawledPlacesPerSearch": request.params.extra
                .get("max_results")
                .and_then(|s| s.parse::<u32>().ok())
                .unwrap_or(20),
        });

        let run = match self.client.post(&run_url).json(&body).send().await {
            Ok(resp) if resp.status().is_success() => match resp.json::<Value>().await {
                Ok(v) => v,
                Err(e) => {
                    return fail_result(
                        SourceName::MapsSecondary,
                        vec![AdapterError::PayloadMalformed {
                            source_name: SourceName::MapsSecondary.as_str().to_string(),
                            detail: e.to_string(),
                        }],
                    )
                }
            },
            Ok(resp) => {
                return fail_result(
                    SourceName::MapsSecondary,
                    vec![AdapterError::PayloadMalformed {
                        source_name: SourceName::MapsSecondary.as_str().to_string(),
                        detail: format!("actor start returned {}", resp.status()),
                    }],
                )
            }
            Err(e) => {
                return fail_result(
                    SourceName::MapsSecondary,
                    vec![AdapterError::Network {
                        source_name: SourceName::MapsSecondary.as_str().to_string(),
                        attempts: 1,
                        detail: e.to_string(),
                    }],
                )
            }
        };

        let Some(run_id) = run["data"]["id"].as_str().map(str::to_string) else {
            return fail_result(
                SourceName::MapsSecondary,
                vec![AdapterError::PayloadMalformed {
                    source_name: SourceName::MapsSecondary.as_str().to_string(),
                    detail: "actor run response missing id".to_string(),
                }],
            );
        };
        let Some(dataset_id) = run["data"]["defaultDatasetId"].as_str().map(str::to_string) else {
            return fail_result(
                SourceName::MapsSecondary,
                vec![AdapterError::PayloadMalformed {
                    source_name: SourceName::MapsSecondary.as_str().to_string(),
                    detail: "actor run response missing defaultDatasetId".to_string(),
                }],
            );
        };

        let status_url = format!("{APIFY_BASE}/actor-runs/{run_id}?token={token}");
        let mut finished = false;
        for poll in 0..MAX_POLLS {
            tokio::time::sleep(POLL_INTERVAL).await;
            match self.client.get(&status_url).send().await {
                Ok(resp) => match resp.json::<Value>().await {
                    Ok(v) => {
                        let status = v["data"]["status"].as_str().unwrap_or("");
                        debug!(run_id, poll, status, "polling apify actor run");
                        if status == "SUCCEEDED" {
                            finished = true;
                            break;
                        }
                        if status == "FAILED" || status == "ABORTED" || status == "TIMED-OUT" {
                            return fail_result(
                                SourceName::MapsSecondary,
                                vec![AdapterError::PayloadMalformed {
                                    source_name: SourceName::MapsSecondary.as_str().to_string(),
                                    detail: format!("actor run ended with status {status}"),
                                }],
                            );
                        }
                    }
                    Err(_) => continue,
                },
                Err(e) => {
                    warn!(run_id, error = %e, "poll request failed, retrying");
                }
            }
        }

        if !finished {
            return fail_result(
                SourceName::MapsSecondary,
                vec![AdapterError::Timeout {
                    source_name: SourceName::MapsSecondary.as_str().to_string(),
                    timeout_secs: (MAX_POLLS as u64) * POLL_INTERVAL.as_secs(),
                }],
            );
        }

        let items_url = format!("{APIFY_BASE}/datasets/{dataset_id}/items?token={token}");
        let items = match get_with_retry(
            &self.client,
            SourceName::MapsSecondary,
            &items_url,
            &[],
            request.max_retries,
            request.timeout,
        )
        .await
        {
            Ok(v) => v,
            Err(e) => return fail_result(SourceName::MapsSecondary, vec![e]),
        };

        let records: Vec<Value> = items
            .as_array()
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .map(map_actor_item)
            .collect();

        let mut metadata = HashMap::new();
        metadata.insert("run_id".to_string(), json!(run_id));
        metadata.insert("dataset_id".to_string(), json!(dataset_id));
        ok_result(SourceName::MapsSecondary, records, metadata)
    }
}

/// Map one Apify Google-Maps actor item into the common raw-record shape.
fn map_actor_item(item: Value) -> Value {
    json!({
        "name": item.get("title").or_else(|| item.get("name")),
        "address": item.get("address"),
        "phone": item.get("phone").or_else(|| item.get("phoneUnformatted")),
        "website": item.get("website"),
        "rating": item.get("totalScore").or_else(|| item.get("rating")),
        "review_count": item.get("reviewsCount"),
        "coordinates": item.get("location").map(|loc| {
            json!([loc.get("lat"), loc.get("lng")])
        }),
        "categories": item.get("categoryName"),
        "source": "maps_secondary",
    })
}
