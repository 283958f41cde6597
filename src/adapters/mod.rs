//! Source adapters (spec §4.1): each issues one logical query to one
//! external source and returns a normalized-shape raw result. Adapters never
//! raise upward — failures come back as `AdapterResult { success: false, .. }`.

pub mod biz_registry;
pub mod demographics;
pub mod generic_web;
pub mod maps_primary;
pub mod maps_secondary;
pub mod page_crawl;
pub mod registry;
pub mod reviews;
pub mod search_serp;
pub mod signals_social;
pub mod state_registry;
pub mod synth;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

use crate::adapters::biz_registry::BizRegistryAdapter;
use crate::adapters::demographics::DemographicsAdapter;
use crate::adapters::generic_web::GenericWebAdapter;
use crate::adapters::maps_primary::MapsPrimaryAdapter;
use crate::adapters::maps_secondary::MapsSecondaryAdapter;
use crate::adapters::page_crawl::PageCrawlAdapter;
use crate::adapters::registry::RegistryAdapter;
use crate::adapters::reviews::ReviewsAdapter;
use crate::adapters::search_serp::SearchSerpAdapter;
use crate::adapters::signals_social::SignalsSocialAdapter;
use crate::adapters::state_registry::StateRegistryAdapter;
use crate::error::AdapterError;
use crate::model::{SourceCrawlResult, SourceName};

/// Search parameters common to every adapter call (spec §4.1).
#[derive(Debug, Clone)]
pub struct SearchParams {
    pub location: String,
    pub industry: Option<String>,
    pub radius_miles: Option<u32>,
    /// Source-specific extras: free-text query, actor slug, mapping hint, …
    pub extra: HashMap<String, String>,
}

/// A single logical request record (spec §4.1).
#[derive(Debug, Clone)]
pub struct AdapterRequest {
    pub source: SourceName,
    pub params: SearchParams,
    pub max_retries: u32,
    pub timeout: Duration,
}

impl AdapterRequest {
    pub fn new(source: SourceName, location: impl Into<String>) -> Self {
        Self {
            source,
            params: SearchParams {
                location: location.into(),
                industry: None,
                radius_miles: None,
                extra: HashMap::new(),
            },
            max_retries: 3,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_industry(mut self, industry: Option<String>) -> Self {
        self.params.industry = industry;
        self
    }

    pub fn with_radius(mut self, radius: Option<u32>) -> Self {
        self.params.radius_miles = radius;
        self
    }
}

/// A capability that issues one call to one external source.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn source_name(&self) -> SourceName;

    async fn fetch(&self, request: &AdapterRequest) -> SourceCrawlResult;
}

/// Build a successful result record.
pub fn ok_result(
    source: SourceName,
    data: Vec<Value>,
    metadata: HashMap<String, Value>,
) -> SourceCrawlResult {
    SourceCrawlResult {
        source_name: source,
        success: true,
        data,
        metadata,
        timestamp: Utc::now(),
        errors: Vec::new(),
    }
}

/// Build a failure result record from one or more `AdapterError`s.
pub fn fail_result(source: SourceName, errors: Vec<AdapterError>) -> SourceCrawlResult {
    SourceCrawlResult {
        source_name: source,
        success: false,
        data: Vec::new(),
        metadata: HashMap::new(),
        timestamp: Utc::now(),
        errors: errors.into_iter().map(|e| e.to_string()).collect(),
    }
}

/// Shared HTTP GET-with-retry helper. Transient network failures and 429s
/// are retried up to `max_retries` with exponential backoff; non-2xx
/// responses other than 429 are treated as a single malformed-payload
/// failure (no point retrying a 4xx/5xx that isn't a rate limit).
pub async fn get_with_retry(
    client: &Client,
    source: SourceName,
    url: &str,
    query: &[(&str, String)],
    max_retries: u32,
    per_attempt_timeout: Duration,
) -> Result<Value, AdapterError> {
    let mut backoff_ms: u64 = 200;
    let mut last_err: Option<AdapterError> = None;

    for attempt in 0..max_retries.max(1) {
        let mut req = client.get(url);
        if !query.is_empty() {
            req = req.query(query);
        }

        match tokio::time::timeout(per_attempt_timeout, req.send()).await {
            Ok(Ok(resp)) if resp.status().is_success() => {
                return resp.json::<Value>().await.map_err(|e| AdapterError::PayloadMalformed {
                    source_name: source.as_str().to_string(),
                    detail: e.to_string(),
                });
            }
            Ok(Ok(resp)) if resp.status() == StatusCode::TOO_MANY_REQUESTS => {
                warn!(source = source.as_str(), attempt, "rate limited, backing off");
                last_err = Some(AdapterError::RateLimited { source_name: source.as_str().to_string() });
            }
            Ok(Ok(resp)) => {
                return Err(AdapterError::PayloadMalformed {
                    source_name: source.as_str().to_string(),
                    detail: format!("http status {}", resp.status()),
                });
            }
            Ok(Err(e)) => {
                debug!(source = source.as_str(), attempt, error = %e, "request failed");
                last_err = Some(AdapterError::Network {
                    source_name: source.as_str().to_string(),
                    attempts: attempt + 1,
                    detail: e.to_string(),
                });
            }
            Err(_) => {
                last_err = Some(AdapterError::Timeout {
                    source_name: source.as_str().to_string(),
                    timeout_secs: per_attempt_timeout.as_secs(),
                });
            }
        }

        if attempt + 1 < max_retries {
            let jitter_ms = deterministic_jitter_ms(url, attempt);
            tokio::time::sleep(Duration::from_millis(backoff_ms + jitter_ms)).await;
            backoff_ms = (backoff_ms * 2).min(5_000);
        }
    }

    Err(last_err.unwrap_or_else(|| AdapterError::Network {
        source_name: source.as_str().to_string(),
        attempts: max_retries,
        detail: "max retries exceeded".to_string(),
    }))
}

/// Small deterministic jitter (0-250ms) derived from the URL and attempt
/// number, so retries of the same call don't produce a thundering herd
/// without pulling in a global RNG that would make retries nondeterministic
/// in tests.
fn deterministic_jitter_ms(url: &str, attempt: u32) -> u64 {
    let mut hash: u64 = 1469598103934665603; // FNV offset basis
    for b in url.bytes().chain(attempt.to_le_bytes()) {
        hash ^= b as u64;
        hash = hash.wrapping_mul(1099511628211);
    }
    hash % 250
}

/// Deterministic pseudo-random float in [0, 1) derived from a seed string,
/// used by adapters that synthesize stand-in data (spec §4.1: "synthesizes a
/// small deterministic stand-in set seeded from the query").
pub fn seeded_unit_interval(seed: &str, salt: u64) -> f64 {
    let mut hash: u64 = 1469598103934665603;
    for b in seed.bytes().chain(salt.to_le_bytes()) {
        hash ^= b as u64;
        hash = hash.wrapping_mul(1099511628211);
    }
    (hash % 1_000_000) as f64 / 1_000_000.0
}

/// All source-adapter instances, built once and shared between the hub and
/// the enricher (spec §4.1: "adapter instances are stateless and may be
/// freely shared"). Built around a single `reqwest::Client` per spec §4.1's
/// ambient detail.
pub struct AdapterRegistry {
    pub maps_primary: Arc<MapsPrimaryAdapter>,
    pub maps_secondary: Arc<MapsSecondaryAdapter>,
    pub search_serp: Arc<SearchSerpAdapter>,
    pub reviews: Arc<ReviewsAdapter>,
    pub signals_social: Arc<SignalsSocialAdapter>,
    pub registry: Arc<RegistryAdapter>,
    pub page_crawl: Arc<PageCrawlAdapter>,
    pub generic_web: Arc<GenericWebAdapter>,
    pub demographics: Arc<DemographicsAdapter>,
    pub biz_registry: Arc<BizRegistryAdapter>,
    pub state_registry: Arc<StateRegistryAdapter>,
}

impl AdapterRegistry {
    pub fn from_env() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("okapiq/0.1 (+https://okapiq.example)")
            .build()
            .expect("reqwest client config is static and known-valid");

        let maps_secondary = Arc::new(MapsSecondaryAdapter::new(client.clone()));
        let maps_primary = Arc::new(MapsPrimaryAdapter::new(client.clone(), maps_secondary.clone()));

        Self {
            maps_primary,
            maps_secondary,
            search_serp: Arc::new(SearchSerpAdapter::new(client.clone())),
            reviews: Arc::new(ReviewsAdapter::new(client.clone())),
            signals_social: Arc::new(SignalsSocialAdapter::new(client.clone())),
            registry: Arc::new(RegistryAdapter::new(client.clone())),
            page_crawl: Arc::new(PageCrawlAdapter::new(client.clone())),
            generic_web: Arc::new(GenericWebAdapter::new(client.clone())),
            demographics: Arc::new(DemographicsAdapter::new(client.clone())),
            biz_registry: Arc::new(BizRegistryAdapter::new(client.clone())),
            state_registry: Arc::new(StateRegistryAdapter::new(client)),
        }
    }

    /// Resolve the crawl-facing adapter for a given source. Adapters that
    /// are only ever invoked directly by the enricher (demographics,
    /// biz_registry, state_registry) still implement `SourceAdapter` so the
    /// hub can dispatch to them when a caller explicitly lists them as a
    /// crawl source.
    pub fn resolve(&self, source: SourceName) -> Arc<dyn SourceAdapter> {
        match source {
            SourceName::MapsPrimary => self.maps_primary.clone(),
            SourceName::MapsSecondary => self.maps_secondary.clone(),
            SourceName::SearchSerp => self.search_serp.clone(),
            SourceName::Reviews => self.reviews.clone(),
            SourceName::SignalsSocial => self.signals_social.clone(),
            SourceName::Registry => self.registry.clone(),
            SourceName::PageCrawl => self.page_crawl.clone(),
            SourceName::GenericWeb => self.generic_web.clone(),
            SourceName::Demographics => self.demographics.clone(),
            SourceName::BizRegistry => self.biz_registry.clone(),
            SourceName::StateRegistry => self.state_registry.clone(),
            SourceName::Manual => unreachable!("manual is not a crawlable source"),
        }
    }
}
