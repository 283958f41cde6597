//! Pipeline configuration, loaded via `dotenv::dotenv().ok()` followed by
//! typed `std::env::var` parsing with fallback defaults.

use std::env;
use std::time::Duration;

use crate::model::{AnalysisKind, EnrichmentKind, SourceName};

/// Per-source minimum inter-request delay (spec §4.1).
#[derive(Debug, Clone)]
pub struct RatePolicy {
    pub min_interval: Duration,
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Default adapter set used when a request omits `crawl_sources`.
    pub default_crawl_sources: Vec<SourceName>,
    /// Default enrichment passes used when a request omits `enrichment_types`.
    pub default_enrichment_types: Vec<EnrichmentKind>,
    /// Default analyses run when a request omits `analysis_types`.
    pub default_analysis_types: Vec<AnalysisKind>,

    /// Per-adapter-call timeout (spec §5).
    pub adapter_timeout: Duration,
    /// Per-adapter retry budget (spec §5).
    pub adapter_max_retries: u32,

    /// Entities enriched concurrently per batch (spec §4.4).
    pub enrichment_batch_size: usize,

    /// Cache TTL (spec §4.7, §9 Open Questions: fixed at 6h).
    pub cache_ttl: Duration,
    /// Max cache entries before oldest-first eviction (spec §9).
    pub cache_capacity: usize,

    /// Fallback-mode entity count bounds (spec §4.6.1).
    pub fallback_min_entities: usize,
    pub fallback_max_entities: usize,

    /// Fixed seed for deterministic k-means clustering (spec §5).
    pub clustering_seed: u64,

    /// Soft wall-clock deadline for the whole pipeline; enrichments still
    /// running past it are skipped and tagged `enrichment_timeout` (spec §5).
    pub request_soft_deadline: Duration,
}

impl PipelineConfig {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        let adapter_timeout_secs = env_u64("OKAPIQ_ADAPTER_TIMEOUT_SECS").unwrap_or(30);
        let adapter_max_retries = env::var("OKAPIQ_ADAPTER_MAX_RETRIES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3);
        let enrichment_batch_size = env::var("OKAPIQ_ENRICHMENT_BATCH_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|&v: &usize| v > 0)
            .unwrap_or(10);
        let cache_ttl_secs = env_u64("OKAPIQ_CACHE_TTL_SECS").unwrap_or(6 * 3600);
        let cache_capacity = env::var("OKAPIQ_CACHE_CAPACITY")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(10_000);
        let clustering_seed = env_u64("OKAPIQ_CLUSTERING_SEED").unwrap_or(42);
        let deadline_secs = env_u64("OKAPIQ_SOFT_DEADLINE_SECS").unwrap_or(45);

        Self {
            default_crawl_sources: SourceName::default_crawl_set(),
            default_enrichment_types: EnrichmentKind::default_set(),
            default_analysis_types: AnalysisKind::all(),
            adapter_timeout: Duration::from_secs(adapter_timeout_secs),
            adapter_max_retries,
            enrichment_batch_size,
            cache_ttl: Duration::from_secs(cache_ttl_secs),
            cache_capacity,
            fallback_min_entities: 3,
            fallback_max_entities: 5,
            clustering_seed,
            request_soft_deadline: Duration::from_secs(deadline_secs),
        }
    }

    /// The per-source minimum inter-request delay floor (spec §4.1).
    pub fn rate_policy(source: SourceName) -> RatePolicy {
        let secs = match source {
            SourceName::MapsPrimary => 3,
            SourceName::MapsSecondary => 2,
            SourceName::SignalsSocial => 5,
            SourceName::Registry => 1,
            _ => 2,
        };
        RatePolicy { min_interval: Duration::from_secs(secs) }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            default_crawl_sources: SourceName::default_crawl_set(),
            default_enrichment_types: EnrichmentKind::default_set(),
            default_analysis_types: AnalysisKind::all(),
            adapter_timeout: Duration::from_secs(30),
            adapter_max_retries: 3,
            enrichment_batch_size: 10,
            cache_ttl: Duration::from_secs(6 * 3600),
            cache_capacity: 10_000,
            fallback_min_entities: 3,
            fallback_max_entities: 5,
            clustering_seed: 42,
            request_soft_deadline: Duration::from_secs(45),
        }
    }
}

fn env_u64(key: &str) -> Option<u64> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}
