//! Crawler Hub (spec §4.2): fans a single logical query out across the
//! selected source adapters concurrently, gated by a per-source rate floor,
//! and never lets one adapter's failure affect the others.
//!
//! A per-source rate gate plus bounded concurrent dispatch, so a slow or
//! failing source never blocks the rest of the fan-out.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::stream::{FuturesUnordered, StreamExt};
use parking_lot::Mutex;
use tracing::{info_span, warn, Instrument};

use crate::adapters::{AdapterRegistry, AdapterRequest, SearchParams};
use crate::config::PipelineConfig;
use crate::model::{SourceCrawlResult, SourceName};

/// Per-source last-request-at bookkeeping, gating callers to the configured
/// minimum inter-request interval (spec §4.1/§5).
struct RateGate {
    last_request_at: Mutex<HashMap<SourceName, Instant>>,
}

impl RateGate {
    fn new() -> Self {
        Self { last_request_at: Mutex::new(HashMap::new()) }
    }

    /// Suspend the caller, if needed, until `source`'s minimum interval has
    /// elapsed since its last request.
    async fn acquire(&self, source: SourceName) {
        let min_interval = PipelineConfig::rate_policy(source).min_interval;
        let wait = {
            let mut last = self.last_request_at.lock();
            let now = Instant::now();
            let wait = match last.get(&source) {
                Some(prev) if now.duration_since(*prev) < min_interval => {
                    min_interval - now.duration_since(*prev)
                }
                _ => Duration::ZERO,
            };
            last.insert(source, now + wait);
            wait
        };
        if wait > Duration::ZERO {
            tokio::time::sleep(wait).await;
        }
    }
}

pub struct CrawlerHub {
    adapters: Arc<AdapterRegistry>,
    rate_gate: RateGate,
}

impl CrawlerHub {
    pub fn new(adapters: Arc<AdapterRegistry>) -> Self {
        Self { adapters, rate_gate: RateGate::new() }
    }

    /// Run the given sources concurrently for one logical query, returning
    /// one result per source regardless of individual adapter outcomes.
    pub async fn crawl(
        &self,
        sources: &[SourceName],
        location: &str,
        industry: Option<&str>,
        radius_miles: u32,
        config: &PipelineConfig,
    ) -> Vec<SourceCrawlResult> {
        let mut tasks = FuturesUnordered::new();

        for &source in sources {
            let adapter = self.adapters.resolve(source);
            let params = SearchParams {
                location: location.to_string(),
                industry: industry.map(str::to_string),
                radius_miles: Some(radius_miles),
                extra: HashMap::new(),
            };
            let request = AdapterRequest {
                source,
                params,
                max_retries: config.adapter_max_retries,
                timeout: config.adapter_timeout,
            };

            tasks.push(
                async move {
                    self.rate_gate.acquire(source).await;
                    let fut = adapter.fetch(&request);
                    match tokio::time::timeout(config.adapter_timeout + Duration::from_secs(5), fut).await {
                        Ok(result) => result,
                        Err(_) => crate::adapters::fail_result(
                            source,
                            vec![crate::error::AdapterError::Timeout {
                                source_name: source.as_str().to_string(),
                                timeout_secs: config.adapter_timeout.as_secs(),
                            }],
                        ),
                    }
                }
                .instrument(info_span!("crawl_source", source = source.as_str())),
            );
        }

        let mut results = Vec::with_capacity(sources.len());
        while let Some(result) = tasks.next().await {
            if !result.success {
                warn!(source = result.source_name.as_str(), errors = ?result.errors, "source crawl failed");
            }
            results.push(result);
        }
        // spec §5: "final per-source result ordering in the response is
        // stable (sorted by source name)" — `FuturesUnordered` yields in
        // completion order, not request order, so restore determinism here.
        results.sort_by_key(|r| r.source_name.as_str());
        results
    }
}
