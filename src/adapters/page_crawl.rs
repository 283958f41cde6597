//! `PAGE_CRAWL` adapter (spec §4.1): fetches a business's own website and
//! returns raw text, suitable input for the enricher's text-analysis pass.
//!
//! A plain GET + HTML-tag strip, no JS rendering.

use std::collections::HashMap;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde_json::{json, Value};

use crate::adapters::{fail_result, ok_result, AdapterRequest, SourceAdapter};
use crate::error::AdapterError;
use crate::model::{SourceCrawlResult, SourceName};

pub struct PageCrawlAdapter {
    client: Client,
    tag_re: Regex,
}

impl PageCrawlAdapter {
    pub fn new(client: Client) -> Self {
        Self { client, tag_re: Regex::new("<[^>]+>").expect("static pattern") }
    }

    fn strip_html(&self, html: &str) -> String {
        let text = self.tag_re.replace_all(html, " ");
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

#[async_trait]
impl SourceAdapter for PageCrawlAdapter {
    fn source_name(&self) -> SourceName {
        SourceName::PageCrawl
    }

    async fn fetch(&self, request: &AdapterRequest) -> SourceCrawlResult {
        let Some(url) = request.params.extra.get("url").cloned() else {
            return fail_result(
                SourceName::PageCrawl,
                vec![AdapterError::PayloadMalformed {
                    source_name: SourceName::PageCrawl.as_str().to_string(),
                    detail: "no url supplied for page crawl".to_string(),
                }],
            );
        };

        let result = tokio::time::timeout(request.timeout, self.client.get(&url).send()).await;
        let body = match result {
            Ok(Ok(resp)) if resp.status().is_success() => match resp.text().await {
                Ok(text) => text,
                Err(e) => {
                    return fail_result(
                        SourceName::PageCrawl,
                        vec![AdapterError::PayloadMalformed {
                            source_name: SourceName::PageCrawl.as_str().to_string(),
                            detail: e.to_string(),
                        }],
                    )
                }
            },
            Ok(Ok(resp)) => {
                return fail_result(
                    SourceName::PageCrawl,
                    vec![AdapterError::PayloadMalformed {
                        source_name: SourceName::PageCrawl.as_str().to_string(),
                        detail: format!("page fetch returned {}", resp.status()),
                    }],
                )
            }
            Ok(Err(e)) => {
                return fail_result(
                    SourceName::PageCrawl,
                    vec![AdapterError::Network {
                        source_name: SourceName::PageCrawl.as_str().to_string(),
                        attempts: 1,
                        detail: e.to_string(),
                    }],
                )
            }
            Err(_) => {
                return fail_result(
                    SourceName::PageCrawl,
                    vec![AdapterError::Timeout {
                        source_name: SourceName::PageCrawl.as_str().to_string(),
                        timeout_secs: request.timeout.as_secs(),
                    }],
                )
            }
        };

        let text = self.strip_html(&body);
        let mut metadata = HashMap::new();
        metadata.insert("url".to_string(), json!(url));
        metadata.insert("char_count".to_string(), json!(text.len()));
        ok_result(SourceName::PageCrawl, vec![json!({ "url": url, "text": text, "source": "page_crawl" })], metadata)
    }
}
