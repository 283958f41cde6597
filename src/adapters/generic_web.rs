//! `GENERIC_WEB` adapter (spec §4.1): a generic web search fallback for raw
//! text about a business, used when no direct page URL is known.
//!
//! Grounded the same way as [[search_serp]]: a DuckDuckGo HTML-results call
//! (no API key required), returning each hit's snippet text as crawlable
//! content rather than structured listing fields — [[page_crawl]] handles
//! the structured-listing case, this one the unstructured-snippet case.

use std::collections::HashMap;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde_json::{json, Value};

use crate::adapters::{fail_result, ok_result, AdapterRequest, SourceAdapter};
use crate::error::AdapterError;
use crate::model::{SourceCrawlResult, SourceName};

const DUCKDUCKGO_HTML: &str = "https://html.duckduckgo.com/html/";

pub struct GenericWebAdapter {
    client: Client,
    snippet_re: Regex,
}

impl GenericWebAdapter {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            snippet_re: Regex::new(r#"(?s)class="result__snippet"[^>]*>(.*?)</a>"#).expect("static pattern"),
        }
    }
}

#[async_trait]
impl SourceAdapter for GenericWebAdapter {
    fn source_name(&self) -> SourceName {
        SourceName::GenericWeb
    }

    async fn fetch(&self, request: &AdapterRequest) -> SourceCrawlResult {
        let q = format!(
            "{} {}",
            request.params.extra.get("name").cloned().unwrap_or_default(),
            request.params.location
        );

        let result = tokio::time::timeout(
            request.timeout,
            self.client.get(DUCKDUCKGO_HTML).query(&[("q", q.trim())]).send(),
        )
        .await;

        let body = match result {
            Ok(Ok(resp)) if resp.status().is_success() => match resp.text().await {
                Ok(t) => t,
                Err(e) => {
                    return fail_result(
                        SourceName::GenericWeb,
                        vec![AdapterError::PayloadMalformed {
                            source_name: SourceName::GenericWeb.as_str().to_string(),
                            detail: e.to_string(),
                        }],
                    )
                }
            },
            Ok(Ok(resp)) => {
                return fail_result(
                    SourceName::GenericWeb,
                    vec![AdapterError::PayloadMalformed {
                        source_name: SourceName::GenericWeb.as_str().to_string(),
                        detail: format!("search returned {}", resp.status()),
                    }],
                )
            }
            Ok(Err(e)) => {
                return fail_result(
                    SourceName::GenericWeb,
                    vec![AdapterError::Network {
                        source_name: SourceName::GenericWeb.as_str().to_string(),
                        attempts: 1,
                        detail: e.to_string(),
                    }],
                )
            }
            Err(_) => {
                return fail_result(
                    SourceName::GenericWeb,
                    vec![AdapterError::Timeout {
                        source_name: SourceName::GenericWeb.as_str().to_string(),
                        timeout_secs: request.timeout.as_secs(),
                    }],
                )
            }
        };

        let snippets: Vec<Value> = self
            .snippet_re
            .captures_iter(&body)
            .take(10)
            .map(|cap| {
                let raw = cap.get(1).map(|m| m.as_str()).unwrap_or("");
                let clean: String = raw.split_whitespace().collect::<Vec<_>>().join(" ");
                json!({ "text": clean, "source": "generic_web" })
            })
            .collect();

        let mut metadata = HashMap::new();
        metadata.insert("query".to_string(), json!(q));
        ok_result(SourceName::GenericWeb, snippets, metadata)
    }
}
