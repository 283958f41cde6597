//! `SIGNALS_SOCIAL` adapter (spec §4.1): posts/hashtags/engagement counts
//! for a location + industry. Per spec.md §4.1, "may return a fixed sample
//! when credentials are missing" — unlike every other adapter, this is an
//! explicit allowance, not a degrade-to-failure path.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::adapters::{fail_result, get_with_retry, ok_result, seeded_unit_interval, AdapterRequest, SourceAdapter};
use crate::error::AdapterError;
use crate::model::{SourceCrawlResult, SourceName};

const SIGNALS_BASE: &str = "https://graph.facebook.com/v19.0/search";

pub struct SignalsSocialAdapter {
    client: Client,
    api_key: Option<String>,
}

impl SignalsSocialAdapter {
    pub fn new(client: Client) -> Self {
        Self { client, api_key: std::env::var("SIGNALS_SOCIAL_TOKEN").ok() }
    }
}

#[async_trait]
impl SourceAdapter for SignalsSocialAdapter {
    fn source_name(&self) -> SourceName {
        SourceName::SignalsSocial
    }

    async fn fetch(&self, request: &AdapterRequest) -> SourceCrawlResult {
        let Some(token) = &self.api_key else {
            let sample = fixed_sample(&request.params.location, request.params.industry.as_deref());
            let mut metadata = HashMap::new();
            metadata.insert("strategy".to_string(), json!("fixed_sample"));
            return ok_result(SourceName::SignalsSocial, sample, metadata);
        };

        let q = format!(
            "{} {}",
            request.params.industry.clone().unwrap_or_default(),
            request.params.location
        );

        let result = get_with_retry(
            &self.client,
            SourceName::SignalsSocial,
            SIGNALS_BASE,
            &[("q", q), ("type", "page".to_string()), ("access_token", token.clone())],
            request.max_retries,
            request.timeout,
        )
        .await;

        match result {
            Ok(payload) => {
                let records: Vec<Value> = payload["data"]
                    .as_array()
                    .cloned()
                    .unwrap_or_default()
                    .into_iter()
                    .map(map_signal_item)
                    .collect();
                let mut metadata = HashMap::new();
                metadata.insert("strategy".to_string(), json!("live"));
                ok_result(SourceName::SignalsSocial, records, metadata)
            }
            Err(e) => fail_result(SourceName::SignalsSocial, vec![e]),
        }
    }
}

fn map_signal_item(item: Value) -> Value {
    json!({
        "name": item.get("name"),
        "post_count": item.get("posts").and_then(|p| p.get("summary")).and_then(|s| s.get("total_count")),
        "engagement": item.get("engagement").and_then(|e| e.get("count")),
        "source": "signals_social",
    })
}

/// Deterministic fixed sample: one social-signal record seeded from the
/// query, used whenever no social API token is configured.
fn fixed_sample(location: &str, industry: Option<&str>) -> Vec<Value> {
    let industry = industry.unwrap_or("business");
    let seed = format!("{location}|{industry}|signals");
    let r1 = seeded_unit_interval(&seed, 1);
    let r2 = seeded_unit_interval(&seed, 2);
    let r3 = seeded_unit_interval(&seed, 3);

    vec![json!({
        "name": format!("{industry} community sample"),
        "post_count": 20 + (r1 * 300.0) as u64,
        "engagement": 50 + (r2 * 2000.0) as u64,
        "hashtags": [format!("#{}", industry.replace(' ', "")), format!("#{}", location.split(',').next().unwrap_or(location).replace(' ', ""))],
        "sentiment_score": 0.3 + r3 * 0.5,
        "source": "synthetic_signals_social",
    })]
}
